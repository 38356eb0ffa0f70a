//! Reshape raw Admin API payloads into flatter, ergonomic structures
//!
//! Connections (`edges[].node` or `nodes`) become plain ordered arrays with
//! their `pageInfo` lifted into a `<field>PageInfo` sibling. Lists of
//! key/value records keep their order and gain a `<field>ByKey` lookup map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const EDGES: &str = "edges";
const NODES: &str = "nodes";
const PAGE_INFO: &str = "pageInfo";

/// Fields that always carry key/value records, even when empty
const KEYED_FIELDS: [&str; 2] = ["fields", "metafields"];

/// Cursor state for a page of results
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,

    #[serde(default)]
    pub has_previous_page: bool,

    #[serde(default)]
    pub start_cursor: Option<String>,

    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// One page of a list tool's results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<Value>,
    pub page_info: PageInfo,
}

impl Page {
    /// Flatten a connection into a page, or `None` if the value is not a connection
    pub fn from_connection(value: Value) -> Option<Page> {
        let (nodes, page_info) = into_connection(value).ok()?;
        let page_info = page_info
            .and_then(|page_info| serde_json::from_value(page_info).ok())
            .unwrap_or_default();
        Some(Page {
            items: nodes.into_iter().map(normalize).collect(),
            page_info,
        })
    }
}

/// Recursively flatten connections and add key lookups
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(map) => normalize_object(map),
        other => other,
    }
}

fn normalize_object(map: Map<String, Value>) -> Value {
    let mut normalized = Map::with_capacity(map.len());
    for (key, value) in map {
        match into_connection(value) {
            Ok((nodes, page_info)) => {
                if let Some(page_info) = page_info {
                    normalized.insert(format!("{key}PageInfo"), page_info);
                }
                let nodes = normalize(Value::Array(nodes));
                insert_with_lookup(&mut normalized, key, nodes);
            }
            Err(value) => {
                let value = normalize(value);
                insert_with_lookup(&mut normalized, key, value);
            }
        }
    }
    Value::Object(normalized)
}

/// Split a connection into its nodes and page info, handing back anything else untouched
fn into_connection(value: Value) -> Result<(Vec<Value>, Option<Value>), Value> {
    let is_connection = match &value {
        Value::Object(map) => {
            (map.get(EDGES).is_some_and(Value::is_array)
                || map.get(NODES).is_some_and(Value::is_array))
                && map
                    .keys()
                    .all(|key| key == EDGES || key == NODES || key == PAGE_INFO)
        }
        _ => false,
    };
    if !is_connection {
        return Err(value);
    }
    let Value::Object(mut map) = value else {
        return Err(value);
    };

    let page_info = map.remove(PAGE_INFO);
    let nodes = match (map.remove(EDGES), map.remove(NODES)) {
        (Some(Value::Array(edges)), _) => edges
            .into_iter()
            .map(|edge| match edge {
                Value::Object(mut edge) => edge.remove("node").unwrap_or(Value::Null),
                other => other,
            })
            .collect(),
        (_, Some(Value::Array(nodes))) => nodes,
        _ => Vec::new(),
    };
    Ok((nodes, page_info))
}

fn insert_with_lookup(target: &mut Map<String, Value>, key: String, value: Value) {
    if let Some(lookup) = key_lookup(&key, &value) {
        target.insert(format!("{key}ByKey"), lookup);
    }
    target.insert(key, value);
}

/// A `key -> value` map for an array of key/value records.
///
/// Records with a namespace are keyed as `namespace.key`.
fn key_lookup(field: &str, value: &Value) -> Option<Value> {
    let Value::Array(items) = value else {
        return None;
    };
    if items.is_empty() && !KEYED_FIELDS.contains(&field) {
        return None;
    }

    let mut lookup = Map::with_capacity(items.len());
    for item in items {
        let record = item.as_object()?;
        let key = record.get("key")?.as_str()?;
        let value = record.get("value")?;
        let lookup_key = match record.get("namespace").and_then(Value::as_str) {
            Some(namespace) => format!("{namespace}.{key}"),
            None => key.to_string(),
        };
        lookup.insert(lookup_key, value.clone());
    }
    Some(Value::Object(lookup))
}
