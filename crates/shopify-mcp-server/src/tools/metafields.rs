//! Metafield value tools
//!
//! A metafield is identified by its owner, namespace and key. Setting one
//! creates it when absent and overwrites it otherwise.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shopify_admin_client::AdminApi;

use super::PageArgs;
use crate::errors::ToolError;
use crate::graphql::{Document, Operation, ToolDescriptor, fetch_one, mutate};
use crate::validation::{Checks, Validate, page_size};

/// The most metafields a single set call accepts
pub const MAX_SET: usize = 25;

/// The most metafields a single delete call accepts
pub const MAX_DELETE: usize = 250;

pub(crate) const GET_METAFIELDS: Document = Document {
    operation_name: "GetMetafields",
    source: concat!(
        "query GetMetafields($ownerId: ID!, $first: Int!, $after: String, $namespace: String) { node(id: $ownerId) { id ... on HasMetafields { metafields(first: $first, after: $after, namespace: $namespace) { edges { cursor node { id namespace key type value updatedAt } } ",
        page_info!(),
        " } } } }"
    ),
};

pub(crate) const SET_METAFIELDS: Document = Document {
    operation_name: "SetMetafields",
    source: concat!(
        "mutation SetMetafields($metafields: [MetafieldsSetInput!]!) { metafieldsSet(metafields: $metafields) { metafields { id namespace key type value ownerType updatedAt owner { ... on Node { id } } } ",
        coded_user_errors!(),
        " } }"
    ),
};

pub(crate) const DELETE_METAFIELDS: Document = Document {
    operation_name: "DeleteMetafields",
    source: concat!(
        "mutation DeleteMetafields($metafields: [MetafieldIdentifierInput!]!) { metafieldsDelete(metafields: $metafields) { deletedMetafields { ownerId namespace key } ",
        user_errors!(),
        " } }"
    ),
};

pub(crate) const DOCUMENTS: &[&Document] = &[&GET_METAFIELDS, &SET_METAFIELDS, &DELETE_METAFIELDS];

pub(crate) fn tools(client: &Arc<dyn AdminApi>) -> Vec<Box<dyn ToolDescriptor>> {
    vec![
        GetMetafields.bind(client.clone()),
        SetMetafields.bind(client.clone()),
        DeleteMetafields.bind(client.clone()),
    ]
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetMetafieldsInput {
    /// The global ID of the resource owning the metafields
    pub owner_id: String,

    /// Only return metafields in this namespace
    pub namespace: Option<String>,

    #[serde(flatten)]
    pub page: PageArgs,
}

impl Validate for GetMetafieldsInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("owner_id", &self.owner_id, 1);
        checks.optional_min_len("namespace", self.namespace.as_deref(), 1);
        self.page.check(checks);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetMetafieldsVariables<'a> {
    owner_id: &'a str,
    first: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

pub struct GetMetafields;

#[async_trait]
impl Operation for GetMetafields {
    const NAME: &'static str = "get_metafields";
    const DESCRIPTION: &'static str = "Get the metafields of any resource. Returns them in order and as a `namespace.key` lookup.";
    const READ_ONLY: bool = true;
    type Input = GetMetafieldsInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = GetMetafieldsVariables {
            owner_id: &input.owner_id,
            first: page_size(input.page.first),
            after: input.page.after.as_deref(),
            namespace: input.namespace.as_deref(),
        };
        let owner = fetch_one(
            client,
            &GET_METAFIELDS,
            &variables,
            "node",
            "Resource",
            &input.owner_id,
        )
        .await?;
        // Resources that cannot carry metafields do not match the `HasMetafields` fragment
        if owner.get("metafields").is_none() {
            return Err(ToolError::NotFound {
                resource: "Metafield owner",
                id: input.owner_id,
            });
        }
        Ok(owner)
    }
}

/// A value to set on a resource
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MetafieldValue {
    /// The global ID of the owning resource
    pub owner_id: String,

    pub namespace: String,

    pub key: String,

    /// The value, serialized as a string. Lists and JSON are JSON-encoded.
    pub value: String,

    /// The value type. Only needed when creating a metafield without a definition, or changing its type.
    #[serde(rename = "type")]
    pub value_type: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetMetafieldsInput {
    /// Between 1 and 25 metafields, set atomically
    #[schemars(length(min = 1, max = 25))]
    pub metafields: Vec<MetafieldValue>,
}

impl Validate for SetMetafieldsInput {
    fn check(&self, checks: &mut Checks) {
        checks.items("metafields", self.metafields.len(), 1, MAX_SET);
        for (index, metafield) in self.metafields.iter().enumerate() {
            let path = format!("metafields[{index}]");
            checks.min_len(&format!("{path}.owner_id"), &metafield.owner_id, 1);
            checks.len_between(&format!("{path}.namespace"), &metafield.namespace, 3, 255);
            checks.len_between(&format!("{path}.key"), &metafield.key, 2, 64);
            checks.optional_min_len(&format!("{path}.type"), metafield.value_type.as_deref(), 1);
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetafieldsSetInput<'a> {
    owner_id: &'a str,
    namespace: &'a str,
    key: &'a str,
    value: &'a str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    value_type: Option<&'a str>,
}

#[derive(Serialize)]
struct SetMetafieldsVariables<'a> {
    metafields: Vec<MetafieldsSetInput<'a>>,
}

pub struct SetMetafields;

#[async_trait]
impl Operation for SetMetafields {
    const NAME: &'static str = "set_metafields";
    const DESCRIPTION: &'static str = "Set metafield values, creating any that do not exist yet. Each metafield is identified by owner, namespace and key.";
    const READ_ONLY: bool = false;
    type Input = SetMetafieldsInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = SetMetafieldsVariables {
            metafields: input
                .metafields
                .iter()
                .map(|metafield| MetafieldsSetInput {
                    owner_id: &metafield.owner_id,
                    namespace: &metafield.namespace,
                    key: &metafield.key,
                    value: &metafield.value,
                    value_type: metafield.value_type.as_deref(),
                })
                .collect(),
        };
        let metafields = mutate(client, &SET_METAFIELDS, &variables, "metafieldsSet", "metafields").await?;
        Ok(json!({ "metafields": metafields }))
    }
}

/// Identifies a metafield to delete
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all(deserialize = "snake_case", serialize = "camelCase"))]
pub struct MetafieldIdentifier {
    pub owner_id: String,
    pub namespace: String,
    pub key: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteMetafieldsInput {
    /// Between 1 and 250 metafields
    #[schemars(length(min = 1, max = 250))]
    pub metafields: Vec<MetafieldIdentifier>,
}

impl Validate for DeleteMetafieldsInput {
    fn check(&self, checks: &mut Checks) {
        checks.items("metafields", self.metafields.len(), 1, MAX_DELETE);
        for (index, metafield) in self.metafields.iter().enumerate() {
            let path = format!("metafields[{index}]");
            checks.min_len(&format!("{path}.owner_id"), &metafield.owner_id, 1);
            checks.min_len(&format!("{path}.namespace"), &metafield.namespace, 1);
            checks.min_len(&format!("{path}.key"), &metafield.key, 1);
        }
    }
}

#[derive(Serialize)]
struct DeleteMetafieldsVariables<'a> {
    metafields: &'a [MetafieldIdentifier],
}

pub struct DeleteMetafields;

#[async_trait]
impl Operation for DeleteMetafields {
    const NAME: &'static str = "delete_metafields";
    const DESCRIPTION: &'static str = "Delete metafield values. Entries that did not exist come back as null.";
    const READ_ONLY: bool = false;
    type Input = DeleteMetafieldsInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = DeleteMetafieldsVariables {
            metafields: &input.metafields,
        };
        let deleted = mutate(
            client,
            &DELETE_METAFIELDS,
            &variables,
            "metafieldsDelete",
            "deletedMetafields",
        )
        .await?;
        Ok(json!({ "deletedMetafields": deleted }))
    }
}
