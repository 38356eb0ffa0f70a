//! Metafield definition tools
//!
//! A definition declares the namespace, key and value type of a custom field
//! for one kind of owner resource. Deleting a definition that still has
//! values attached fails unless the caller explicitly asks for the values to
//! be deleted too.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shopify_admin_client::AdminApi;
use tracing::info;

use super::{IdVariables, PageArgs};
use crate::errors::ToolError;
use crate::graphql::{Document, Operation, ToolDescriptor, fetch_page, mutate, query, take};
use crate::validation::{Checks, Validate};

macro_rules! definition_fields {
    () => {
        "fragment MetafieldDefinitionFields on MetafieldDefinition { id name namespace key description ownerType pinnedPosition metafieldsCount type { name category } validations { name type value } }"
    };
}

pub(crate) const LIST_METAFIELD_DEFINITIONS: Document = Document {
    operation_name: "ListMetafieldDefinitions",
    source: concat!(
        "query ListMetafieldDefinitions($ownerType: MetafieldOwnerType!, $first: Int!, $after: String, $namespace: String, $key: String, $query: String) { metafieldDefinitions(ownerType: $ownerType, first: $first, after: $after, namespace: $namespace, key: $key, query: $query) { edges { cursor node { ...MetafieldDefinitionFields } } ",
        page_info!(),
        " } } ",
        definition_fields!()
    ),
};

pub(crate) const CREATE_METAFIELD_DEFINITION: Document = Document {
    operation_name: "CreateMetafieldDefinition",
    source: concat!(
        "mutation CreateMetafieldDefinition($definition: MetafieldDefinitionInput!) { metafieldDefinitionCreate(definition: $definition) { createdDefinition { ...MetafieldDefinitionFields } ",
        coded_user_errors!(),
        " } } ",
        definition_fields!()
    ),
};

pub(crate) const UPDATE_METAFIELD_DEFINITION: Document = Document {
    operation_name: "UpdateMetafieldDefinition",
    source: concat!(
        "mutation UpdateMetafieldDefinition($definition: MetafieldDefinitionUpdateInput!) { metafieldDefinitionUpdate(definition: $definition) { updatedDefinition { ...MetafieldDefinitionFields } ",
        coded_user_errors!(),
        " } } ",
        definition_fields!()
    ),
};

pub(crate) const METAFIELD_DEFINITION_USAGE: Document = Document {
    operation_name: "MetafieldDefinitionUsage",
    source: "query MetafieldDefinitionUsage($id: ID!) { metafieldDefinition(id: $id) { id metafieldsCount } }",
};

pub(crate) const DELETE_METAFIELD_DEFINITION: Document = Document {
    operation_name: "DeleteMetafieldDefinition",
    source: concat!(
        "mutation DeleteMetafieldDefinition($id: ID!, $deleteAllAssociatedMetafields: Boolean) { metafieldDefinitionDelete(id: $id, deleteAllAssociatedMetafields: $deleteAllAssociatedMetafields) { deletedDefinitionId ",
        coded_user_errors!(),
        " } }"
    ),
};

pub(crate) const DOCUMENTS: &[&Document] = &[
    &LIST_METAFIELD_DEFINITIONS,
    &CREATE_METAFIELD_DEFINITION,
    &UPDATE_METAFIELD_DEFINITION,
    &METAFIELD_DEFINITION_USAGE,
    &DELETE_METAFIELD_DEFINITION,
];

pub(crate) fn tools(client: &Arc<dyn AdminApi>) -> Vec<Box<dyn ToolDescriptor>> {
    vec![
        ListMetafieldDefinitions.bind(client.clone()),
        CreateMetafieldDefinition.bind(client.clone()),
        UpdateMetafieldDefinition.bind(client.clone()),
        DeleteMetafieldDefinition.bind(client.clone()),
    ]
}

/// The kind of resource a metafield definition applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetafieldOwnerType {
    Article,
    Blog,
    Collection,
    Company,
    CompanyLocation,
    Customer,
    #[serde(rename = "DRAFTORDER")]
    DraftOrder,
    Location,
    Market,
    Order,
    Page,
    Product,
    #[serde(rename = "PRODUCTVARIANT")]
    ProductVariant,
    Shop,
}

/// A constraint on a field's values, e.g. `{"name": "max", "value": "100"}`.
/// The rule's meaning is determined by the Admin API.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ValidationRule {
    pub name: String,
    pub value: String,
}

pub(crate) fn check_validations(checks: &mut Checks, path: &str, validations: &[ValidationRule]) {
    for (index, rule) in validations.iter().enumerate() {
        checks.min_len(&format!("{path}[{index}].name"), &rule.name, 1);
    }
}

/// Namespaces are 3 to 255 characters long and keys 2 to 64
fn check_identity(checks: &mut Checks, namespace: &str, key: &str) {
    checks.len_between("namespace", namespace, 3, 255);
    checks.len_between("key", key, 2, 64);
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListMetafieldDefinitionsInput {
    pub owner_type: MetafieldOwnerType,

    pub namespace: Option<String>,

    pub key: Option<String>,

    /// Search syntax filter
    pub query: Option<String>,

    #[serde(flatten)]
    pub page: PageArgs,
}

impl Validate for ListMetafieldDefinitionsInput {
    fn check(&self, checks: &mut Checks) {
        checks.optional_min_len("namespace", self.namespace.as_deref(), 1);
        checks.optional_min_len("key", self.key.as_deref(), 1);
        checks.optional_min_len("query", self.query.as_deref(), 1);
        self.page.check(checks);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListDefinitionsVariables<'a> {
    owner_type: MetafieldOwnerType,

    #[serde(flatten)]
    page: super::PageVariables<'a>,

    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<&'a str>,
}

pub struct ListMetafieldDefinitions;

#[async_trait]
impl Operation for ListMetafieldDefinitions {
    const NAME: &'static str = "list_metafield_definitions";
    const DESCRIPTION: &'static str = "List the metafield definitions for one owner type, with how many values each has.";
    const READ_ONLY: bool = true;
    type Input = ListMetafieldDefinitionsInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = ListDefinitionsVariables {
            owner_type: input.owner_type,
            page: input.page.variables(input.query.as_deref()),
            namespace: input.namespace.as_deref(),
            key: input.key.as_deref(),
        };
        let page = fetch_page(
            client,
            &LIST_METAFIELD_DEFINITIONS,
            &variables,
            "metafieldDefinitions",
        )
        .await?;
        Ok(serde_json::to_value(page)?)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateMetafieldDefinitionInput {
    /// Human-readable name
    pub name: String,

    /// Groups related definitions, e.g. `custom`
    pub namespace: String,

    pub key: String,

    pub owner_type: MetafieldOwnerType,

    /// The value type, e.g. `single_line_text_field`, `number_integer`, `list.product_reference`
    #[serde(rename = "type")]
    pub value_type: String,

    pub description: Option<String>,

    /// Ordered constraints on the definition's values
    #[serde(default)]
    pub validations: Vec<ValidationRule>,

    /// Pin the definition in the admin
    pub pin: Option<bool>,
}

impl Validate for CreateMetafieldDefinitionInput {
    fn check(&self, checks: &mut Checks) {
        checks.len_between("name", &self.name, 1, 255);
        check_identity(checks, &self.namespace, &self.key);
        checks.min_len("type", &self.value_type, 1);
        check_validations(checks, "validations", &self.validations);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionInput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,

    namespace: &'a str,

    key: &'a str,

    owner_type: MetafieldOwnerType,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    value_type: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    validations: Option<&'a [ValidationRule]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pin: Option<bool>,
}

#[derive(Serialize)]
struct DefinitionVariables<'a> {
    definition: DefinitionInput<'a>,
}

pub struct CreateMetafieldDefinition;

#[async_trait]
impl Operation for CreateMetafieldDefinition {
    const NAME: &'static str = "create_metafield_definition";
    const DESCRIPTION: &'static str = "Create a metafield definition, declaring a typed custom field for one kind of resource.";
    const READ_ONLY: bool = false;
    type Input = CreateMetafieldDefinitionInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = DefinitionVariables {
            definition: DefinitionInput {
                name: Some(&input.name),
                namespace: &input.namespace,
                key: &input.key,
                owner_type: input.owner_type,
                value_type: Some(&input.value_type),
                description: input.description.as_deref(),
                validations: (!input.validations.is_empty()).then_some(input.validations.as_slice()),
                pin: input.pin,
            },
        };
        mutate(
            client,
            &CREATE_METAFIELD_DEFINITION,
            &variables,
            "metafieldDefinitionCreate",
            "createdDefinition",
        )
        .await
    }
}

/// The definition is identified by namespace, key and owner type, which cannot change
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateMetafieldDefinitionInput {
    pub namespace: String,

    pub key: String,

    pub owner_type: MetafieldOwnerType,

    pub name: Option<String>,

    pub description: Option<String>,

    /// Replaces all validations
    pub validations: Option<Vec<ValidationRule>>,

    /// Pin or unpin the definition
    pub pin: Option<bool>,
}

impl Validate for UpdateMetafieldDefinitionInput {
    fn check(&self, checks: &mut Checks) {
        check_identity(checks, &self.namespace, &self.key);
        if let Some(name) = &self.name {
            checks.len_between("name", name, 1, 255);
        }
        if let Some(validations) = &self.validations {
            check_validations(checks, "validations", validations);
        }
        checks.any_of(&[
            ("name", self.name.is_some()),
            ("description", self.description.is_some()),
            ("validations", self.validations.is_some()),
            ("pin", self.pin.is_some()),
        ]);
    }
}

pub struct UpdateMetafieldDefinition;

#[async_trait]
impl Operation for UpdateMetafieldDefinition {
    const NAME: &'static str = "update_metafield_definition";
    const DESCRIPTION: &'static str = "Update a metafield definition's name, description, validations or pinning. Its type cannot change.";
    const READ_ONLY: bool = false;
    type Input = UpdateMetafieldDefinitionInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = DefinitionVariables {
            definition: DefinitionInput {
                name: input.name.as_deref(),
                namespace: &input.namespace,
                key: &input.key,
                owner_type: input.owner_type,
                value_type: None,
                description: input.description.as_deref(),
                validations: input.validations.as_deref(),
                pin: input.pin,
            },
        };
        mutate(
            client,
            &UPDATE_METAFIELD_DEFINITION,
            &variables,
            "metafieldDefinitionUpdate",
            "updatedDefinition",
        )
        .await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteMetafieldDefinitionInput {
    /// The definition's global ID
    pub id: String,

    /// Also delete every metafield value using this definition.
    /// Without it, a definition that still has values is not deleted.
    #[serde(default)]
    pub delete_all_associated_metafields: bool,
}

impl Validate for DeleteMetafieldDefinitionInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("id", &self.id, 1);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteDefinitionVariables<'a> {
    id: &'a str,
    delete_all_associated_metafields: bool,
}

pub struct DeleteMetafieldDefinition;

#[async_trait]
impl Operation for DeleteMetafieldDefinition {
    const NAME: &'static str = "delete_metafield_definition";
    const DESCRIPTION: &'static str = "Delete a metafield definition. Fails if values still use it, unless `delete_all_associated_metafields` is set.";
    const READ_ONLY: bool = false;
    type Input = DeleteMetafieldDefinitionInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let usage = take(
            query(
                client,
                &METAFIELD_DEFINITION_USAGE,
                &IdVariables { id: &input.id },
            )
            .await?,
            "metafieldDefinition",
        );
        let dependents = dependents(&usage, "metafieldsCount").ok_or_else(|| ToolError::NotFound {
            resource: "MetafieldDefinition",
            id: input.id.clone(),
        })?;

        if dependents > 0 {
            if !input.delete_all_associated_metafields {
                return Err(ToolError::DefinitionInUse {
                    resource: "MetafieldDefinition",
                    id: input.id,
                    dependents,
                    cascade_flag: "delete_all_associated_metafields",
                });
            }
            info!(
                id = %input.id,
                dependents,
                "Deleting metafield definition together with its values"
            );
        }

        let variables = DeleteDefinitionVariables {
            id: &input.id,
            delete_all_associated_metafields: input.delete_all_associated_metafields,
        };
        let deleted = mutate(
            client,
            &DELETE_METAFIELD_DEFINITION,
            &variables,
            "metafieldDefinitionDelete",
            "deletedDefinitionId",
        )
        .await?;
        Ok(json!({ "deletedDefinitionId": deleted, "deletedDependents": dependents }))
    }
}

/// The dependent count of a definition, or `None` if the definition does not exist
pub(crate) fn dependents(definition: &Value, count_field: &str) -> Option<u64> {
    if definition.is_null() {
        return None;
    }
    Some(definition.get(count_field).and_then(Value::as_u64).unwrap_or(0))
}
