//! An in-memory store standing in for the Admin API
//!
//! It answers the operations the tools send, by operation name, and keeps
//! enough state to check behaviour across calls.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject, RawContent};
use serde_json::{Value, json};
use shopify_admin_client::{AdminApi, ClientError, GraphqlRequest};
use shopify_mcp_server::errors::McpError;
use shopify_mcp_server::registry::ToolRegistry;

#[derive(Default)]
struct State {
    next_id: u64,
    calls: Vec<String>,
    products: Vec<Value>,
    metafield_definitions: Vec<Value>,
    metafields: Vec<Value>,
    metaobject_definitions: Vec<Value>,
    metaobjects: Vec<Value>,
}

impl State {
    fn id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("gid://shopify/{kind}/{}", self.next_id)
    }

    fn metafields_count(&self, definition: &Value) -> usize {
        self.metafields
            .iter()
            .filter(|metafield| {
                metafield["namespace"] == definition["namespace"] && metafield["key"] == definition["key"]
            })
            .count()
    }

    fn metaobject_definition(&self, metaobject_type: &Value) -> Option<&Value> {
        self.metaobject_definitions
            .iter()
            .find(|definition| &definition["type"] == metaobject_type)
    }

    fn metaobjects_count(&self, definition: &Value) -> usize {
        self.metaobjects
            .iter()
            .filter(|metaobject| metaobject["type"] == definition["type"])
            .count()
    }

    /// The metaobject as the Admin API would return it, with every defined field present
    fn render_metaobject(&self, metaobject: &Value) -> Value {
        let Some(definition) = self.metaobject_definition(&metaobject["type"]) else {
            return Value::Null;
        };
        let fields: Vec<Value> = definition["fieldDefinitions"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|field| {
                json!({
                    "key": field["key"],
                    "type": field["type"]["name"],
                    "value": metaobject["values"].get(field["key"].as_str().unwrap_or_default()).cloned().unwrap_or(Value::Null)
                })
            })
            .collect();
        let publishable = if definition["publishable"] == json!(true) {
            json!({ "status": metaobject["status"] })
        } else {
            Value::Null
        };
        json!({
            "id": metaobject["id"],
            "type": metaobject["type"],
            "handle": metaobject["handle"],
            "updatedAt": "2025-01-01T00:00:00Z",
            "capabilities": { "publishable": publishable },
            "definition": { "id": definition["id"], "displayNameKey": definition["displayNameKey"] },
            "fields": fields
        })
    }

    fn render_metaobject_definition(&self, definition: &Value) -> Value {
        json!({
            "id": definition["id"],
            "type": definition["type"],
            "name": definition["name"],
            "displayNameKey": definition["displayNameKey"],
            "metaobjectsCount": self.metaobjects_count(definition),
            "capabilities": {
                "publishable": { "enabled": definition["publishable"] == json!(true) },
                "translatable": { "enabled": false }
            },
            "fieldDefinitions": definition["fieldDefinitions"]
        })
    }

    /// Apply field values, reporting a blank required field as a user error
    fn write_fields(&self, metaobject: &mut Value, fields: &Value) -> Result<(), Value> {
        for field in fields.as_array().into_iter().flatten() {
            if let Some(key) = field["key"].as_str() {
                metaobject["values"][key] = field["value"].clone();
            }
        }
        let definition = self
            .metaobject_definition(&metaobject["type"])
            .ok_or_else(|| user_error(&["metaobject", "type"], "Definition not found", "NOT_FOUND"))?;
        for field in definition["fieldDefinitions"].as_array().into_iter().flatten() {
            let key = field["key"].as_str().unwrap_or_default();
            let blank = metaobject["values"]
                .get(key)
                .and_then(Value::as_str)
                .is_none_or(|value| value.is_empty());
            if field["required"] == json!(true) && blank {
                return Err(user_error(
                    &["metaobject", "fields"],
                    &format!("{key} can't be blank"),
                    "BLANK",
                ));
            }
        }
        Ok(())
    }

    fn apply_status(&self, metaobject: &mut Value, capabilities: &Value) {
        if let Some(status) = capabilities["publishable"]["status"].as_str() {
            metaobject["status"] = json!(status);
        }
    }
}

fn present(value: &Value) -> Option<Value> {
    (!value.is_null()).then(|| value.clone())
}

fn user_error(field: &[&str], message: &str, code: &str) -> Value {
    json!({ "field": field, "message": message, "code": code })
}

/// A cursor-paginated connection over `items`
fn connection(items: &[Value], variables: &Value) -> Value {
    let first = variables["first"].as_u64().unwrap_or(50) as usize;
    let start = variables["after"]
        .as_str()
        .and_then(|cursor| cursor.strip_prefix("cursor:"))
        .and_then(|index| index.parse::<usize>().ok())
        .map_or(0, |index| index + 1);
    let end = (start + first).min(items.len());
    let edges: Vec<Value> = items
        .iter()
        .enumerate()
        .skip(start)
        .take(end.saturating_sub(start))
        .map(|(index, node)| json!({ "cursor": format!("cursor:{index}"), "node": node }))
        .collect();
    json!({
        "edges": edges,
        "pageInfo": {
            "hasNextPage": end < items.len(),
            "hasPreviousPage": start > 0,
            "startCursor": edges.first().map(|edge| edge["cursor"].clone()),
            "endCursor": edges.last().map(|edge| edge["cursor"].clone())
        }
    })
}

/// A stateful fake of a single store
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<State>,
}

impl FakeStore {
    pub fn with_products(count: usize) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap();
            for index in 0..count {
                let id = state.id("Product");
                state.products.push(json!({ "id": id, "title": format!("Product {index}") }));
            }
        }
        store
    }

    /// The operation names received, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn handle(&self, operation: &str, variables: &Value) -> Option<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(operation.to_string());

        let data = match operation {
            "ListProducts" => json!({ "products": connection(&state.products, variables) }),
            "CreateProduct" => {
                let id = state.id("Product");
                let mut product = variables["product"].clone();
                product["id"] = json!(id);
                state.products.push(product.clone());
                json!({ "productCreate": { "product": product, "userErrors": [] } })
            }
            "CreateMetafieldDefinition" => {
                let id = state.id("MetafieldDefinition");
                let mut definition = variables["definition"].clone();
                definition["id"] = json!(id);
                state.metafield_definitions.push(definition.clone());
                definition["metafieldsCount"] = json!(state.metafields_count(&definition));
                json!({ "metafieldDefinitionCreate": { "createdDefinition": definition, "userErrors": [] } })
            }
            "MetafieldDefinitionUsage" => {
                let definition = state
                    .metafield_definitions
                    .iter()
                    .find(|definition| definition["id"] == variables["id"])
                    .map(|definition| json!({ "id": definition["id"], "metafieldsCount": state.metafields_count(definition) }));
                json!({ "metafieldDefinition": definition })
            }
            "DeleteMetafieldDefinition" => {
                let Some(position) = state
                    .metafield_definitions
                    .iter()
                    .position(|definition| definition["id"] == variables["id"])
                else {
                    return Some(json!({ "metafieldDefinitionDelete": {
                        "deletedDefinitionId": null,
                        "userErrors": [user_error(&["id"], "Definition not found", "NOT_FOUND")]
                    } }));
                };
                let definition = state.metafield_definitions.remove(position);
                if variables["deleteAllAssociatedMetafields"] == json!(true) {
                    state.metafields.retain(|metafield| {
                        metafield["namespace"] != definition["namespace"] || metafield["key"] != definition["key"]
                    });
                }
                json!({ "metafieldDefinitionDelete": { "deletedDefinitionId": definition["id"], "userErrors": [] } })
            }
            "SetMetafields" => {
                let mut written = Vec::new();
                for input in variables["metafields"].as_array().into_iter().flatten() {
                    let existing = state.metafields.iter().position(|metafield| {
                        metafield["ownerId"] == input["ownerId"]
                            && metafield["namespace"] == input["namespace"]
                            && metafield["key"] == input["key"]
                    });
                    let metafield = match existing {
                        Some(position) => {
                            let metafield = &mut state.metafields[position];
                            metafield["value"] = input["value"].clone();
                            metafield.clone()
                        }
                        None => {
                            let id = state.id("Metafield");
                            let metafield = json!({
                                "id": id,
                                "ownerId": input["ownerId"],
                                "namespace": input["namespace"],
                                "key": input["key"],
                                "type": present(&input["type"]).unwrap_or(json!("single_line_text_field")),
                                "value": input["value"]
                            });
                            state.metafields.push(metafield.clone());
                            metafield
                        }
                    };
                    written.push(metafield);
                }
                json!({ "metafieldsSet": { "metafields": written, "userErrors": [] } })
            }
            "GetMetafields" => {
                let metafields: Vec<Value> = state
                    .metafields
                    .iter()
                    .filter(|metafield| metafield["ownerId"] == variables["ownerId"])
                    .filter(|metafield| {
                        variables["namespace"].is_null() || metafield["namespace"] == variables["namespace"]
                    })
                    .cloned()
                    .collect();
                json!({ "node": { "id": variables["ownerId"], "metafields": connection(&metafields, variables) } })
            }
            "DeleteMetafields" => {
                let mut deleted = Vec::new();
                for identifier in variables["metafields"].as_array().into_iter().flatten() {
                    let before = state.metafields.len();
                    state.metafields.retain(|metafield| {
                        metafield["ownerId"] != identifier["ownerId"]
                            || metafield["namespace"] != identifier["namespace"]
                            || metafield["key"] != identifier["key"]
                    });
                    deleted.push(if state.metafields.len() < before { identifier.clone() } else { Value::Null });
                }
                json!({ "metafieldsDelete": { "deletedMetafields": deleted, "userErrors": [] } })
            }
            "CreateMetaobjectDefinition" => {
                let input = &variables["definition"];
                if state.metaobject_definition(&input["type"]).is_some() {
                    return Some(json!({ "metaobjectDefinitionCreate": {
                        "metaobjectDefinition": null,
                        "userErrors": [user_error(&["definition", "type"], "Type has already been taken", "TAKEN")]
                    } }));
                }
                let id = state.id("MetaobjectDefinition");
                let field_definitions: Vec<Value> = input["fieldDefinitions"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .map(|field| {
                        json!({
                            "key": field["key"],
                            "name": present(&field["name"]).unwrap_or(field["key"].clone()),
                            "required": present(&field["required"]).unwrap_or(json!(false)),
                            "type": { "name": field["type"] },
                            "validations": []
                        })
                    })
                    .collect();
                let definition = json!({
                    "id": id,
                    "type": input["type"],
                    "name": present(&input["name"]).unwrap_or(input["type"].clone()),
                    "displayNameKey": input["displayNameKey"],
                    "publishable": input["capabilities"]["publishable"]["enabled"] == json!(true),
                    "fieldDefinitions": field_definitions
                });
                state.metaobject_definitions.push(definition.clone());
                json!({ "metaobjectDefinitionCreate": {
                    "metaobjectDefinition": state.render_metaobject_definition(&definition),
                    "userErrors": []
                } })
            }
            "MetaobjectDefinitionUsage" => {
                let definition = state
                    .metaobject_definitions
                    .iter()
                    .find(|definition| definition["id"] == variables["id"])
                    .map(|definition| json!({ "id": definition["id"], "metaobjectsCount": state.metaobjects_count(definition) }));
                json!({ "metaobjectDefinition": definition })
            }
            "DeleteMetaobjectDefinition" => {
                let Some(position) = state
                    .metaobject_definitions
                    .iter()
                    .position(|definition| definition["id"] == variables["id"])
                else {
                    return Some(json!({ "metaobjectDefinitionDelete": {
                        "deletedId": null,
                        "userErrors": [user_error(&["id"], "Record not found", "RECORD_NOT_FOUND")]
                    } }));
                };
                let definition = state.metaobject_definitions.remove(position);
                state.metaobjects.retain(|metaobject| metaobject["type"] != definition["type"]);
                json!({ "metaobjectDefinitionDelete": { "deletedId": definition["id"], "userErrors": [] } })
            }
            "CreateMetaobject" => {
                let input = &variables["metaobject"];
                let id = state.id("Metaobject");
                let mut metaobject = json!({
                    "id": id,
                    "type": input["type"],
                    "handle": present(&input["handle"]).unwrap_or(json!(format!("entry-{}", state.next_id))),
                    "status": "DRAFT",
                    "values": {}
                });
                if let Err(error) = state.write_fields(&mut metaobject, &input["fields"]) {
                    return Some(json!({ "metaobjectCreate": { "metaobject": null, "userErrors": [error] } }));
                }
                state.apply_status(&mut metaobject, &input["capabilities"]);
                let rendered = state.render_metaobject(&metaobject);
                state.metaobjects.push(metaobject);
                json!({ "metaobjectCreate": { "metaobject": rendered, "userErrors": [] } })
            }
            "GetMetaobject" => {
                let metaobject = state
                    .metaobjects
                    .iter()
                    .find(|metaobject| metaobject["id"] == variables["id"])
                    .map(|metaobject| state.render_metaobject(metaobject));
                json!({ "metaobject": metaobject })
            }
            "GetMetaobjectByHandle" => {
                let handle = &variables["handle"];
                let metaobject = state
                    .metaobjects
                    .iter()
                    .find(|metaobject| metaobject["type"] == handle["type"] && metaobject["handle"] == handle["handle"])
                    .map(|metaobject| state.render_metaobject(metaobject));
                json!({ "metaobjectByHandle": metaobject })
            }
            "ListMetaobjects" => {
                let metaobjects: Vec<Value> = state
                    .metaobjects
                    .iter()
                    .filter(|metaobject| metaobject["type"] == variables["type"])
                    .map(|metaobject| state.render_metaobject(metaobject))
                    .collect();
                json!({ "metaobjects": connection(&metaobjects, variables) })
            }
            "UpdateMetaobject" | "UpsertMetaobject" => {
                let root = if operation == "UpdateMetaobject" { "metaobjectUpdate" } else { "metaobjectUpsert" };
                let input = &variables["metaobject"];
                let position = if operation == "UpdateMetaobject" {
                    state.metaobjects.iter().position(|metaobject| metaobject["id"] == variables["id"])
                } else {
                    let handle = &variables["handle"];
                    state
                        .metaobjects
                        .iter()
                        .position(|metaobject| metaobject["type"] == handle["type"] && metaobject["handle"] == handle["handle"])
                };
                let mut metaobject = match position {
                    Some(position) => state.metaobjects[position].clone(),
                    None if operation == "UpsertMetaobject" => {
                        let id = state.id("Metaobject");
                        json!({
                            "id": id,
                            "type": variables["handle"]["type"],
                            "handle": variables["handle"]["handle"],
                            "status": "DRAFT",
                            "values": {}
                        })
                    }
                    None => {
                        return Some(json!({ root: {
                            "metaobject": null,
                            "userErrors": [user_error(&["id"], "Record not found", "RECORD_NOT_FOUND")]
                        } }));
                    }
                };
                if let Some(handle) = present(&input["handle"]) {
                    metaobject["handle"] = handle;
                }
                if let Err(error) = state.write_fields(&mut metaobject, &input["fields"]) {
                    return Some(json!({ root: { "metaobject": null, "userErrors": [error] } }));
                }
                state.apply_status(&mut metaobject, &input["capabilities"]);
                let rendered = state.render_metaobject(&metaobject);
                match position {
                    Some(position) => state.metaobjects[position] = metaobject,
                    None => state.metaobjects.push(metaobject),
                }
                json!({ root: { "metaobject": rendered, "userErrors": [] } })
            }
            "DeleteMetaobject" => {
                let before = state.metaobjects.len();
                state.metaobjects.retain(|metaobject| metaobject["id"] != variables["id"]);
                if state.metaobjects.len() == before {
                    json!({ "metaobjectDelete": {
                        "deletedId": null,
                        "userErrors": [user_error(&["id"], "Record not found", "RECORD_NOT_FOUND")]
                    } })
                } else {
                    json!({ "metaobjectDelete": { "deletedId": variables["id"], "userErrors": [] } })
                }
            }
            _ => return None,
        };
        Some(data)
    }
}

#[async_trait]
impl AdminApi for FakeStore {
    async fn execute(&self, request: &GraphqlRequest) -> Result<Value, ClientError> {
        self.handle(request.operation_name, &request.variables)
            .ok_or_else(|| ClientError::GraphQL(vec![format!("Unsupported operation {}", request.operation_name)]))
    }
}

/// A registry bound to a fresh store, plus the store for inspection
pub fn registry(store: FakeStore) -> (ToolRegistry, Arc<FakeStore>) {
    let store = Arc::new(store);
    let registry = ToolRegistry::new(store.clone()).unwrap();
    (registry, store)
}

fn arguments(arguments: Value) -> Option<JsonObject> {
    match arguments {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

pub async fn call(registry: &ToolRegistry, name: &str, args: Value) -> Result<CallToolResult, McpError> {
    registry.call(name, arguments(args)).await
}

/// Call a tool that must succeed and return its JSON output
pub async fn call_ok(registry: &ToolRegistry, name: &str, args: Value) -> Value {
    let result = call(registry, name, args)
        .await
        .unwrap_or_else(|e| panic!("{name} failed: {e:?}"));
    assert_eq!(result.is_error, Some(false), "{name} returned {result:?}");
    serde_json::from_str(&text(&result)).unwrap()
}

/// The first text content of a result
pub fn text(result: &CallToolResult) -> String {
    match result.content.first().map(|content| &content.raw) {
        Some(RawContent::Text(text)) => text.text.clone(),
        other => panic!("Expected text content, got {other:?}"),
    }
}
