//! Metaobject tools
//!
//! Every metaobject returned is reshaped the same way: `displayName` is the
//! value of the field the definition designates as its display name (null
//! when none is designated), and `publishStatus` is only present for types
//! with the publishable capability.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shopify_admin_client::AdminApi;

use super::{IdVariables, PageArgs, PageVariables};
use crate::errors::ToolError;
use crate::graphql::{Document, Operation, ToolDescriptor, fetch_one, fetch_page, mutate};
use crate::validation::{Checks, Validate};

macro_rules! metaobject_fields {
    () => {
        "fragment MetaobjectFields on Metaobject { id type handle updatedAt capabilities { publishable { status } } definition { id displayNameKey } fields { key type value } }"
    };
}

pub(crate) const LIST_METAOBJECTS: Document = Document {
    operation_name: "ListMetaobjects",
    source: concat!(
        "query ListMetaobjects($type: String!, $first: Int!, $after: String, $query: String) { metaobjects(type: $type, first: $first, after: $after, query: $query) { edges { cursor node { ...MetaobjectFields } } ",
        page_info!(),
        " } } ",
        metaobject_fields!()
    ),
};

pub(crate) const GET_METAOBJECT: Document = Document {
    operation_name: "GetMetaobject",
    source: concat!(
        "query GetMetaobject($id: ID!) { metaobject(id: $id) { ...MetaobjectFields } } ",
        metaobject_fields!()
    ),
};

pub(crate) const GET_METAOBJECT_BY_HANDLE: Document = Document {
    operation_name: "GetMetaobjectByHandle",
    source: concat!(
        "query GetMetaobjectByHandle($handle: MetaobjectHandleInput!) { metaobjectByHandle(handle: $handle) { ...MetaobjectFields } } ",
        metaobject_fields!()
    ),
};

pub(crate) const CREATE_METAOBJECT: Document = Document {
    operation_name: "CreateMetaobject",
    source: concat!(
        "mutation CreateMetaobject($metaobject: MetaobjectCreateInput!) { metaobjectCreate(metaobject: $metaobject) { metaobject { ...MetaobjectFields } ",
        coded_user_errors!(),
        " } } ",
        metaobject_fields!()
    ),
};

pub(crate) const UPDATE_METAOBJECT: Document = Document {
    operation_name: "UpdateMetaobject",
    source: concat!(
        "mutation UpdateMetaobject($id: ID!, $metaobject: MetaobjectUpdateInput!) { metaobjectUpdate(id: $id, metaobject: $metaobject) { metaobject { ...MetaobjectFields } ",
        coded_user_errors!(),
        " } } ",
        metaobject_fields!()
    ),
};

pub(crate) const UPSERT_METAOBJECT: Document = Document {
    operation_name: "UpsertMetaobject",
    source: concat!(
        "mutation UpsertMetaobject($handle: MetaobjectHandleInput!, $metaobject: MetaobjectUpsertInput!) { metaobjectUpsert(handle: $handle, metaobject: $metaobject) { metaobject { ...MetaobjectFields } ",
        coded_user_errors!(),
        " } } ",
        metaobject_fields!()
    ),
};

pub(crate) const DELETE_METAOBJECT: Document = Document {
    operation_name: "DeleteMetaobject",
    source: concat!(
        "mutation DeleteMetaobject($id: ID!) { metaobjectDelete(id: $id) { deletedId ",
        coded_user_errors!(),
        " } }"
    ),
};

pub(crate) const DOCUMENTS: &[&Document] = &[
    &LIST_METAOBJECTS,
    &GET_METAOBJECT,
    &GET_METAOBJECT_BY_HANDLE,
    &CREATE_METAOBJECT,
    &UPDATE_METAOBJECT,
    &UPSERT_METAOBJECT,
    &DELETE_METAOBJECT,
];

pub(crate) fn tools(client: &Arc<dyn AdminApi>) -> Vec<Box<dyn ToolDescriptor>> {
    vec![
        ListMetaobjects.bind(client.clone()),
        GetMetaobject.bind(client.clone()),
        CreateMetaobject.bind(client.clone()),
        UpdateMetaobject.bind(client.clone()),
        UpsertMetaobject.bind(client.clone()),
        DeleteMetaobject.bind(client.clone()),
    ]
}

/// Whether a publishable metaobject is visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishStatus {
    Draft,
    Active,
}

/// A field value, serialized as a string
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct FieldValue {
    pub key: String,
    pub value: String,
}

fn check_fields(checks: &mut Checks, fields: &[FieldValue]) {
    for (index, field) in fields.iter().enumerate() {
        checks.min_len(&format!("fields[{index}].key"), &field.key, 1);
    }
}

#[derive(Serialize)]
struct PublishableInput {
    status: PublishStatus,
}

#[derive(Serialize)]
struct CapabilitiesInput {
    publishable: PublishableInput,
}

fn capabilities(publish_status: Option<PublishStatus>) -> Option<CapabilitiesInput> {
    publish_status.map(|status| CapabilitiesInput {
        publishable: PublishableInput { status },
    })
}

#[derive(Serialize)]
struct HandleInput<'a> {
    #[serde(rename = "type")]
    metaobject_type: &'a str,
    handle: &'a str,
}

/// Derive `displayName` and `publishStatus` from the raw metaobject
pub(crate) fn reshape(metaobject: Value) -> Value {
    let Value::Object(mut metaobject) = metaobject else {
        return metaobject;
    };

    let display_name = metaobject
        .get("definition")
        .and_then(|definition| definition.get("displayNameKey"))
        .and_then(Value::as_str)
        .and_then(|key| metaobject.get("fieldsByKey")?.get(key))
        .cloned()
        .unwrap_or(Value::Null);
    metaobject.insert("displayName".to_string(), display_name);

    let status = metaobject
        .remove("capabilities")
        .and_then(|capabilities| capabilities.get("publishable")?.get("status").cloned())
        .filter(|status| !status.is_null());
    if let Some(status) = status {
        metaobject.insert("publishStatus".to_string(), status);
    }

    Value::Object(metaobject)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListMetaobjectsInput {
    /// The metaobject definition's type, e.g. `lookbook`
    #[serde(rename = "type")]
    pub metaobject_type: String,

    /// Search syntax filter, e.g. `display_name:Spring`
    pub query: Option<String>,

    #[serde(flatten)]
    pub page: PageArgs,
}

impl Validate for ListMetaobjectsInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("type", &self.metaobject_type, 1);
        checks.optional_min_len("query", self.query.as_deref(), 1);
        self.page.check(checks);
    }
}

#[derive(Serialize)]
struct ListMetaobjectsVariables<'a> {
    #[serde(rename = "type")]
    metaobject_type: &'a str,

    #[serde(flatten)]
    page: PageVariables<'a>,
}

pub struct ListMetaobjects;

#[async_trait]
impl Operation for ListMetaobjects {
    const NAME: &'static str = "list_metaobjects";
    const DESCRIPTION: &'static str = "List the metaobjects of one type, with their field values.";
    const READ_ONLY: bool = true;
    type Input = ListMetaobjectsInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = ListMetaobjectsVariables {
            metaobject_type: &input.metaobject_type,
            page: input.page.variables(input.query.as_deref()),
        };
        let mut page = fetch_page(client, &LIST_METAOBJECTS, &variables, "metaobjects").await?;
        page.items = page.items.into_iter().map(reshape).collect();
        Ok(serde_json::to_value(page)?)
    }
}

/// Select a metaobject by `id`, or by `type` and `handle` together
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetMetaobjectInput {
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub metaobject_type: Option<String>,

    pub handle: Option<String>,
}

impl Validate for GetMetaobjectInput {
    fn check(&self, checks: &mut Checks) {
        checks.exactly_one(&[
            ("id", self.id.is_some()),
            ("handle", self.handle.is_some()),
        ]);
        if self.handle.is_some() != self.metaobject_type.is_some() {
            checks.violation("type", "must be supplied together with `handle`");
        }
        checks.optional_min_len("id", self.id.as_deref(), 1);
        checks.optional_min_len("type", self.metaobject_type.as_deref(), 1);
        checks.optional_min_len("handle", self.handle.as_deref(), 1);
    }
}

#[derive(Serialize)]
struct ByHandleVariables<'a> {
    handle: HandleInput<'a>,
}

pub struct GetMetaobject;

#[async_trait]
impl Operation for GetMetaobject {
    const NAME: &'static str = "get_metaobject";
    const DESCRIPTION: &'static str = "Get a metaobject by ID, or by type and handle.";
    const READ_ONLY: bool = true;
    type Input = GetMetaobjectInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let metaobject = match (&input.id, &input.metaobject_type, &input.handle) {
            (Some(id), _, _) => {
                fetch_one(
                    client,
                    &GET_METAOBJECT,
                    &IdVariables { id },
                    "metaobject",
                    "Metaobject",
                    id,
                )
                .await?
            }
            (None, Some(metaobject_type), Some(handle)) => {
                let variables = ByHandleVariables {
                    handle: HandleInput {
                        metaobject_type,
                        handle,
                    },
                };
                fetch_one(
                    client,
                    &GET_METAOBJECT_BY_HANDLE,
                    &variables,
                    "metaobjectByHandle",
                    "Metaobject",
                    &format!("{metaobject_type}/{handle}"),
                )
                .await?
            }
            _ => return Err(ToolError::invalid("id", "`id` or `type` and `handle` must be supplied")),
        };
        Ok(reshape(metaobject))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateMetaobjectInput {
    /// The metaobject definition's type
    #[serde(rename = "type")]
    pub metaobject_type: String,

    /// Generated from the display name field when omitted
    pub handle: Option<String>,

    pub fields: Vec<FieldValue>,

    /// Only for publishable types. Left to the Admin API's default when omitted.
    pub publish_status: Option<PublishStatus>,
}

impl Validate for CreateMetaobjectInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("type", &self.metaobject_type, 1);
        checks.optional_min_len("handle", self.handle.as_deref(), 1);
        check_fields(checks, &self.fields);
    }
}

#[derive(Serialize)]
struct CreateInput<'a> {
    #[serde(rename = "type")]
    metaobject_type: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<&'a str>,

    fields: &'a [FieldValue],

    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<CapabilitiesInput>,
}

#[derive(Serialize)]
struct CreateVariables<'a> {
    metaobject: CreateInput<'a>,
}

pub struct CreateMetaobject;

#[async_trait]
impl Operation for CreateMetaobject {
    const NAME: &'static str = "create_metaobject";
    const DESCRIPTION: &'static str = "Create a metaobject of an existing type.";
    const READ_ONLY: bool = false;
    type Input = CreateMetaobjectInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = CreateVariables {
            metaobject: CreateInput {
                metaobject_type: &input.metaobject_type,
                handle: input.handle.as_deref(),
                fields: &input.fields,
                capabilities: capabilities(input.publish_status),
            },
        };
        let created = mutate(client, &CREATE_METAOBJECT, &variables, "metaobjectCreate", "metaobject").await?;
        Ok(reshape(created))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateMetaobjectInput {
    /// The metaobject's global ID
    pub id: String,

    pub handle: Option<String>,

    /// Values to set. Fields not listed keep their values.
    pub fields: Option<Vec<FieldValue>>,

    pub publish_status: Option<PublishStatus>,

    /// Redirect the old handle's storefront URL to the new one
    pub redirect_new_handle: Option<bool>,
}

impl Validate for UpdateMetaobjectInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("id", &self.id, 1);
        checks.optional_min_len("handle", self.handle.as_deref(), 1);
        if let Some(fields) = &self.fields {
            check_fields(checks, fields);
        }
        if self.redirect_new_handle.is_some() && self.handle.is_none() {
            checks.violation("redirect_new_handle", "requires a new `handle`");
        }
        checks.any_of(&[
            ("handle", self.handle.is_some()),
            ("fields", self.fields.as_ref().is_some_and(|fields| !fields.is_empty())),
            ("publish_status", self.publish_status.is_some()),
        ]);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateInput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldValue]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<CapabilitiesInput>,

    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_new_handle: Option<bool>,
}

#[derive(Serialize)]
struct UpdateVariables<'a> {
    id: &'a str,
    metaobject: UpdateInput<'a>,
}

pub struct UpdateMetaobject;

#[async_trait]
impl Operation for UpdateMetaobject {
    const NAME: &'static str = "update_metaobject";
    const DESCRIPTION: &'static str = "Update a metaobject's handle, field values or publish status.";
    const READ_ONLY: bool = false;
    type Input = UpdateMetaobjectInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = UpdateVariables {
            id: &input.id,
            metaobject: UpdateInput {
                handle: input.handle.as_deref(),
                fields: input.fields.as_deref(),
                capabilities: capabilities(input.publish_status),
                redirect_new_handle: input.redirect_new_handle,
            },
        };
        let updated = mutate(client, &UPDATE_METAOBJECT, &variables, "metaobjectUpdate", "metaobject").await?;
        Ok(reshape(updated))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpsertMetaobjectInput {
    #[serde(rename = "type")]
    pub metaobject_type: String,

    /// Identifies the metaobject within its type
    pub handle: String,

    pub fields: Vec<FieldValue>,

    pub publish_status: Option<PublishStatus>,
}

impl Validate for UpsertMetaobjectInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("type", &self.metaobject_type, 1);
        checks.min_len("handle", &self.handle, 1);
        check_fields(checks, &self.fields);
    }
}

#[derive(Serialize)]
struct UpsertInput<'a> {
    fields: &'a [FieldValue],

    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<CapabilitiesInput>,
}

#[derive(Serialize)]
struct UpsertVariables<'a> {
    handle: HandleInput<'a>,
    metaobject: UpsertInput<'a>,
}

pub struct UpsertMetaobject;

#[async_trait]
impl Operation for UpsertMetaobject {
    const NAME: &'static str = "upsert_metaobject";
    const DESCRIPTION: &'static str = "Create a metaobject with the given type and handle, or update it if it already exists.";
    const READ_ONLY: bool = false;
    type Input = UpsertMetaobjectInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = UpsertVariables {
            handle: HandleInput {
                metaobject_type: &input.metaobject_type,
                handle: &input.handle,
            },
            metaobject: UpsertInput {
                fields: &input.fields,
                capabilities: capabilities(input.publish_status),
            },
        };
        let upserted = mutate(client, &UPSERT_METAOBJECT, &variables, "metaobjectUpsert", "metaobject").await?;
        Ok(reshape(upserted))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteMetaobjectInput {
    /// The metaobject's global ID
    pub id: String,
}

impl Validate for DeleteMetaobjectInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("id", &self.id, 1);
    }
}

pub struct DeleteMetaobject;

#[async_trait]
impl Operation for DeleteMetaobject {
    const NAME: &'static str = "delete_metaobject";
    const DESCRIPTION: &'static str = "Delete a metaobject.";
    const READ_ONLY: bool = false;
    type Input = DeleteMetaobjectInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let deleted = mutate(
            client,
            &DELETE_METAOBJECT,
            &IdVariables { id: &input.id },
            "metaobjectDelete",
            "deletedId",
        )
        .await?;
        Ok(json!({ "deletedId": deleted }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::test_support::Canned;
    use crate::normalize::normalize;

    fn arguments(value: Value) -> Option<rmcp::model::JsonObject> {
        value.as_object().cloned()
    }

    fn raw(display_name_key: Value, publishable: Value) -> Value {
        json!({
            "id": "gid://shopify/Metaobject/1",
            "type": "lookbook",
            "handle": "spring-2025",
            "capabilities": { "publishable": publishable },
            "definition": { "id": "gid://shopify/MetaobjectDefinition/1", "displayNameKey": display_name_key },
            "fields": [
                { "key": "title", "type": "single_line_text_field", "value": "Spring" },
                { "key": "season", "type": "single_line_text_field", "value": "2025" }
            ]
        })
    }

    #[test]
    fn display_name_comes_from_the_designated_field() {
        let metaobject = reshape(normalize(raw(json!("title"), Value::Null)));

        assert_eq!(metaobject["displayName"], "Spring");
        assert!(metaobject.get("capabilities").is_none());
        assert!(metaobject.get("publishStatus").is_none());
    }

    #[test]
    fn display_name_is_null_without_a_designated_field() {
        let metaobject = reshape(normalize(raw(Value::Null, Value::Null)));

        assert_eq!(metaobject["displayName"], Value::Null);
        assert_eq!(metaobject["handle"], "spring-2025");
    }

    #[test]
    fn publishable_types_report_publish_status() {
        let metaobject = reshape(normalize(raw(json!("title"), json!({ "status": "DRAFT" }))));

        assert_eq!(metaobject["publishStatus"], "DRAFT");
    }

    #[tokio::test]
    async fn publish_status_is_only_sent_when_supplied() {
        let client = Arc::new(Canned::new(vec![
            json!({ "metaobjectUpdate": { "metaobject": raw(json!("title"), Value::Null), "userErrors": [] } }),
            json!({ "metaobjectUpdate": { "metaobject": raw(json!("title"), json!({ "status": "ACTIVE" })), "userErrors": [] } }),
        ]));
        let tool = UpdateMetaobject.bind(client.clone());

        tool.call(arguments(json!({
            "id": "gid://shopify/Metaobject/1",
            "fields": [{ "key": "title", "value": "Summer" }]
        })))
        .await
        .unwrap();
        let published = tool
            .call(arguments(json!({ "id": "gid://shopify/Metaobject/1", "publish_status": "ACTIVE" })))
            .await
            .unwrap();

        let requests = client.requests();
        assert_eq!(
            requests[0].1,
            json!({ "id": "gid://shopify/Metaobject/1", "metaobject": { "fields": [{ "key": "title", "value": "Summer" }] } })
        );
        assert_eq!(
            requests[1].1,
            json!({ "id": "gid://shopify/Metaobject/1", "metaobject": { "capabilities": { "publishable": { "status": "ACTIVE" } } } })
        );
        assert_eq!(published["publishStatus"], "ACTIVE");
    }

    #[tokio::test]
    async fn get_by_handle_needs_a_type() {
        let client = Arc::new(Canned::default());

        let result = GetMetaobject
            .bind(client.clone())
            .call(arguments(json!({ "handle": "spring-2025" })))
            .await;

        assert!(matches!(result, Err(ToolError::InvalidInput(_))));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn get_by_handle_sends_handle_input() {
        let client = Arc::new(Canned::new(vec![json!({ "metaobjectByHandle": null })]));

        let result = GetMetaobject
            .bind(client.clone())
            .call(arguments(json!({ "type": "lookbook", "handle": "autumn" })))
            .await;

        assert!(matches!(
            result,
            Err(ToolError::NotFound { resource: "Metaobject", id }) if id == "lookbook/autumn"
        ));
        assert_eq!(
            client.requests()[0].1,
            json!({ "handle": { "type": "lookbook", "handle": "autumn" } })
        );
    }

    #[tokio::test]
    async fn upsert_is_keyed_by_type_and_handle() {
        let client = Arc::new(Canned::new(vec![json!({
            "metaobjectUpsert": { "metaobject": raw(json!("title"), Value::Null), "userErrors": [] }
        })]));

        let upserted = UpsertMetaobject
            .bind(client.clone())
            .call(arguments(json!({
                "type": "lookbook",
                "handle": "spring-2025",
                "fields": [{ "key": "title", "value": "Spring" }]
            })))
            .await
            .unwrap();

        assert_eq!(upserted["fieldsByKey"]["season"], "2025");
        assert_eq!(
            client.requests()[0].1,
            json!({
                "handle": { "type": "lookbook", "handle": "spring-2025" },
                "metaobject": { "fields": [{ "key": "title", "value": "Spring" }] }
            })
        );
    }

    #[tokio::test]
    async fn list_reshapes_every_item() {
        let client = Arc::new(Canned::new(vec![json!({
            "metaobjects": {
                "edges": [{ "cursor": "a", "node": raw(json!("title"), Value::Null) }],
                "pageInfo": { "hasNextPage": false, "hasPreviousPage": false, "startCursor": "a", "endCursor": "a" }
            }
        })]));

        let page = ListMetaobjects
            .bind(client.clone())
            .call(arguments(json!({ "type": "lookbook", "first": 10 })))
            .await
            .unwrap();

        assert_eq!(page["items"][0]["displayName"], "Spring");
        assert_eq!(client.requests()[0].1, json!({ "type": "lookbook", "first": 10 }));
    }
}
