//! Metaobject definition tools
//!
//! A metaobject definition is a custom object type: a type name plus an
//! ordered list of typed field definitions. Changes to the field list are
//! forwarded as one batch of tagged operations, in the order given.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shopify_admin_client::AdminApi;
use tracing::info;

use super::metafield_definitions::{ValidationRule, check_validations, dependents};
use super::{IdVariables, PageArgs};
use crate::errors::ToolError;
use crate::graphql::{Document, Operation, ToolDescriptor, fetch_one, fetch_page, mutate, query, take};
use crate::validation::{Checks, Validate};

macro_rules! definition_fields {
    () => {
        "fragment MetaobjectDefinitionFields on MetaobjectDefinition { id type name description displayNameKey metaobjectsCount access { admin storefront } capabilities { publishable { enabled } translatable { enabled } } fieldDefinitions { key name description required type { name } validations { name value } } }"
    };
}

pub(crate) const LIST_METAOBJECT_DEFINITIONS: Document = Document {
    operation_name: "ListMetaobjectDefinitions",
    source: concat!(
        "query ListMetaobjectDefinitions($first: Int!, $after: String) { metaobjectDefinitions(first: $first, after: $after) { edges { cursor node { ...MetaobjectDefinitionFields } } ",
        page_info!(),
        " } } ",
        definition_fields!()
    ),
};

pub(crate) const GET_METAOBJECT_DEFINITION: Document = Document {
    operation_name: "GetMetaobjectDefinition",
    source: concat!(
        "query GetMetaobjectDefinition($id: ID!) { metaobjectDefinition(id: $id) { ...MetaobjectDefinitionFields } } ",
        definition_fields!()
    ),
};

pub(crate) const GET_METAOBJECT_DEFINITION_BY_TYPE: Document = Document {
    operation_name: "GetMetaobjectDefinitionByType",
    source: concat!(
        "query GetMetaobjectDefinitionByType($type: String!) { metaobjectDefinitionByType(type: $type) { ...MetaobjectDefinitionFields } } ",
        definition_fields!()
    ),
};

pub(crate) const CREATE_METAOBJECT_DEFINITION: Document = Document {
    operation_name: "CreateMetaobjectDefinition",
    source: concat!(
        "mutation CreateMetaobjectDefinition($definition: MetaobjectDefinitionCreateInput!) { metaobjectDefinitionCreate(definition: $definition) { metaobjectDefinition { ...MetaobjectDefinitionFields } ",
        coded_user_errors!(),
        " } } ",
        definition_fields!()
    ),
};

pub(crate) const UPDATE_METAOBJECT_DEFINITION: Document = Document {
    operation_name: "UpdateMetaobjectDefinition",
    source: concat!(
        "mutation UpdateMetaobjectDefinition($id: ID!, $definition: MetaobjectDefinitionUpdateInput!) { metaobjectDefinitionUpdate(id: $id, definition: $definition) { metaobjectDefinition { ...MetaobjectDefinitionFields } ",
        coded_user_errors!(),
        " } } ",
        definition_fields!()
    ),
};

pub(crate) const METAOBJECT_DEFINITION_USAGE: Document = Document {
    operation_name: "MetaobjectDefinitionUsage",
    source: "query MetaobjectDefinitionUsage($id: ID!) { metaobjectDefinition(id: $id) { id metaobjectsCount } }",
};

pub(crate) const DELETE_METAOBJECT_DEFINITION: Document = Document {
    operation_name: "DeleteMetaobjectDefinition",
    source: concat!(
        "mutation DeleteMetaobjectDefinition($id: ID!) { metaobjectDefinitionDelete(id: $id) { deletedId ",
        coded_user_errors!(),
        " } }"
    ),
};

pub(crate) const DOCUMENTS: &[&Document] = &[
    &LIST_METAOBJECT_DEFINITIONS,
    &GET_METAOBJECT_DEFINITION,
    &GET_METAOBJECT_DEFINITION_BY_TYPE,
    &CREATE_METAOBJECT_DEFINITION,
    &UPDATE_METAOBJECT_DEFINITION,
    &METAOBJECT_DEFINITION_USAGE,
    &DELETE_METAOBJECT_DEFINITION,
];

pub(crate) fn tools(client: &Arc<dyn AdminApi>) -> Vec<Box<dyn ToolDescriptor>> {
    vec![
        ListMetaobjectDefinitions.bind(client.clone()),
        GetMetaobjectDefinition.bind(client.clone()),
        CreateMetaobjectDefinition.bind(client.clone()),
        UpdateMetaobjectDefinition.bind(client.clone()),
        DeleteMetaobjectDefinition.bind(client.clone()),
    ]
}

/// Who can read and write metaobjects of a type through the Admin API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminAccess {
    MerchantRead,
    MerchantReadWrite,
}

/// Whether metaobjects of a type are visible to the Storefront API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorefrontAccess {
    None,
    PublicRead,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all(deserialize = "snake_case", serialize = "camelCase"))]
pub struct Access {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminAccess>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storefront: Option<StorefrontAccess>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema)]
pub struct Capability {
    pub enabled: bool,
}

/// Optional behaviours of a metaobject type
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Capabilities {
    /// Metaobjects get a `DRAFT` or `ACTIVE` publish status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishable: Option<Capability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub translatable: Option<Capability>,
}

impl Capabilities {
    fn is_empty(&self) -> bool {
        self.publishable.is_none() && self.translatable.is_none()
    }
}

/// A field of a new metaobject type
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all(deserialize = "snake_case", serialize = "camelCase"))]
pub struct FieldDefinition {
    pub key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The value type, e.g. `single_line_text_field` or `file_reference`
    #[serde(rename = "type")]
    pub value_type: String,

    /// Whether every metaobject must have a value for this field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<ValidationRule>,
}

/// A change to an existing field. The key selects the field; its type cannot change.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all(deserialize = "snake_case", serialize = "camelCase"))]
pub struct FieldDefinitionPatch {
    pub key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub validations: Option<Vec<ValidationRule>>,
}

#[derive(Debug, Serialize)]
struct FieldKey<'a> {
    key: &'a str,
}

/// One entry of the `fieldDefinitions` batch
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum FieldDefinitionOperation<'a> {
    Create(&'a FieldDefinition),
    Update(&'a FieldDefinitionPatch),
    Delete(FieldKey<'a>),
}

fn check_field_definition(checks: &mut Checks, path: &str, field: &FieldDefinition) {
    checks.len_between(&format!("{path}.key"), &field.key, 2, 64);
    checks.min_len(&format!("{path}.type"), &field.value_type, 1);
    if let Some(name) = &field.name {
        checks.min_len(&format!("{path}.name"), name, 1);
    }
    check_validations(checks, &format!("{path}.validations"), &field.validations);
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListMetaobjectDefinitionsInput {
    #[serde(flatten)]
    pub page: PageArgs,
}

impl Validate for ListMetaobjectDefinitionsInput {
    fn check(&self, checks: &mut Checks) {
        self.page.check(checks);
    }
}

pub struct ListMetaobjectDefinitions;

#[async_trait]
impl Operation for ListMetaobjectDefinitions {
    const NAME: &'static str = "list_metaobject_definitions";
    const DESCRIPTION: &'static str = "List metaobject definitions with their field definitions and how many metaobjects each has.";
    const READ_ONLY: bool = true;
    type Input = ListMetaobjectDefinitionsInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let page = fetch_page(
            client,
            &LIST_METAOBJECT_DEFINITIONS,
            &input.page.variables(None),
            "metaobjectDefinitions",
        )
        .await?;
        Ok(serde_json::to_value(page)?)
    }
}

/// Select a definition by ID or by type, not both
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetMetaobjectDefinitionInput {
    pub id: Option<String>,

    /// The definition's type, e.g. `lookbook`
    #[serde(rename = "type")]
    pub definition_type: Option<String>,
}

impl Validate for GetMetaobjectDefinitionInput {
    fn check(&self, checks: &mut Checks) {
        checks.exactly_one(&[
            ("id", self.id.is_some()),
            ("type", self.definition_type.is_some()),
        ]);
        checks.optional_min_len("id", self.id.as_deref(), 1);
        checks.optional_min_len("type", self.definition_type.as_deref(), 1);
    }
}

#[derive(Serialize)]
struct TypeVariables<'a> {
    #[serde(rename = "type")]
    definition_type: &'a str,
}

pub struct GetMetaobjectDefinition;

#[async_trait]
impl Operation for GetMetaobjectDefinition {
    const NAME: &'static str = "get_metaobject_definition";
    const DESCRIPTION: &'static str = "Get a metaobject definition by ID or by type.";
    const READ_ONLY: bool = true;
    type Input = GetMetaobjectDefinitionInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        match (&input.id, &input.definition_type) {
            (Some(id), _) => {
                fetch_one(
                    client,
                    &GET_METAOBJECT_DEFINITION,
                    &IdVariables { id },
                    "metaobjectDefinition",
                    "MetaobjectDefinition",
                    id,
                )
                .await
            }
            (None, Some(definition_type)) => {
                fetch_one(
                    client,
                    &GET_METAOBJECT_DEFINITION_BY_TYPE,
                    &TypeVariables { definition_type },
                    "metaobjectDefinitionByType",
                    "MetaobjectDefinition",
                    definition_type,
                )
                .await
            }
            (None, None) => Err(ToolError::invalid("id", "`id` or `type` must be supplied")),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateMetaobjectDefinitionInput {
    /// The type name, unique per shop, e.g. `lookbook`
    #[serde(rename = "type")]
    pub definition_type: String,

    pub name: Option<String>,

    pub description: Option<String>,

    /// The key of the field used as each metaobject's display name
    pub display_name_key: Option<String>,

    /// The type's fields, in display order
    pub field_definitions: Vec<FieldDefinition>,

    pub access: Option<Access>,

    pub capabilities: Option<Capabilities>,
}

impl Validate for CreateMetaobjectDefinitionInput {
    fn check(&self, checks: &mut Checks) {
        checks.len_between("type", &self.definition_type, 3, 255);
        checks.optional_min_len("name", self.name.as_deref(), 1);
        checks.items("field_definitions", self.field_definitions.len(), 1, usize::MAX);
        for (index, field) in self.field_definitions.iter().enumerate() {
            check_field_definition(checks, &format!("field_definitions[{index}]"), field);
        }
        if let Some(key) = &self.display_name_key {
            if !self.field_definitions.iter().any(|field| &field.key == key) {
                checks.violation("display_name_key", "must be the key of one of the field definitions");
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDefinitionInput<'a> {
    #[serde(rename = "type")]
    definition_type: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    display_name_key: Option<&'a str>,

    field_definitions: &'a [FieldDefinition],

    #[serde(skip_serializing_if = "Option::is_none")]
    access: Option<&'a Access>,

    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<&'a Capabilities>,
}

#[derive(Serialize)]
struct CreateDefinitionVariables<'a> {
    definition: CreateDefinitionInput<'a>,
}

pub struct CreateMetaobjectDefinition;

#[async_trait]
impl Operation for CreateMetaobjectDefinition {
    const NAME: &'static str = "create_metaobject_definition";
    const DESCRIPTION: &'static str = "Create a metaobject definition: a custom object type with typed fields.";
    const READ_ONLY: bool = false;
    type Input = CreateMetaobjectDefinitionInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = CreateDefinitionVariables {
            definition: CreateDefinitionInput {
                definition_type: &input.definition_type,
                name: input.name.as_deref(),
                description: input.description.as_deref(),
                display_name_key: input.display_name_key.as_deref(),
                field_definitions: &input.field_definitions,
                access: input.access.as_ref(),
                capabilities: input.capabilities.as_ref(),
            },
        };
        mutate(
            client,
            &CREATE_METAOBJECT_DEFINITION,
            &variables,
            "metaobjectDefinitionCreate",
            "metaobjectDefinition",
        )
        .await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateMetaobjectDefinitionInput {
    /// The definition's global ID
    pub id: String,

    pub name: Option<String>,

    pub description: Option<String>,

    pub display_name_key: Option<String>,

    /// New fields to add
    #[serde(default)]
    pub fields_to_create: Vec<FieldDefinition>,

    /// Changes to existing fields, selected by key
    #[serde(default)]
    pub fields_to_update: Vec<FieldDefinitionPatch>,

    /// Keys of fields to remove, along with their values on every metaobject
    #[serde(default)]
    pub fields_to_delete: Vec<String>,

    pub access: Option<Access>,

    pub capabilities: Option<Capabilities>,

    /// Reorder fields to match the order of `fields_to_create` and `fields_to_update`
    pub reset_field_order: Option<bool>,
}

impl Validate for UpdateMetaobjectDefinitionInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("id", &self.id, 1);
        checks.optional_min_len("name", self.name.as_deref(), 1);
        for (index, field) in self.fields_to_create.iter().enumerate() {
            check_field_definition(checks, &format!("fields_to_create[{index}]"), field);
        }
        for (index, field) in self.fields_to_update.iter().enumerate() {
            checks.min_len(&format!("fields_to_update[{index}].key"), &field.key, 1);
            if let Some(validations) = &field.validations {
                check_validations(checks, &format!("fields_to_update[{index}].validations"), validations);
            }
        }
        for (index, key) in self.fields_to_delete.iter().enumerate() {
            checks.min_len(&format!("fields_to_delete[{index}]"), key, 1);
        }
        checks.any_of(&[
            ("name", self.name.is_some()),
            ("description", self.description.is_some()),
            ("display_name_key", self.display_name_key.is_some()),
            ("fields_to_create", !self.fields_to_create.is_empty()),
            ("fields_to_update", !self.fields_to_update.is_empty()),
            ("fields_to_delete", !self.fields_to_delete.is_empty()),
            ("access", self.access.is_some()),
            (
                "capabilities",
                self.capabilities.as_ref().is_some_and(|capabilities| !capabilities.is_empty()),
            ),
            ("reset_field_order", self.reset_field_order.is_some()),
        ]);
    }
}

impl UpdateMetaobjectDefinitionInput {
    /// Creates, then updates, then deletes, each in the order given
    fn field_operations(&self) -> Vec<FieldDefinitionOperation<'_>> {
        let creates = self.fields_to_create.iter().map(FieldDefinitionOperation::Create);
        let updates = self.fields_to_update.iter().map(FieldDefinitionOperation::Update);
        let deletes = self
            .fields_to_delete
            .iter()
            .map(|key| FieldDefinitionOperation::Delete(FieldKey { key }));
        creates.chain(updates).chain(deletes).collect()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDefinitionInput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    display_name_key: Option<&'a str>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    field_definitions: Vec<FieldDefinitionOperation<'a>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    access: Option<&'a Access>,

    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<&'a Capabilities>,

    #[serde(skip_serializing_if = "Option::is_none")]
    reset_field_order: Option<bool>,
}

#[derive(Serialize)]
struct UpdateDefinitionVariables<'a> {
    id: &'a str,
    definition: UpdateDefinitionInput<'a>,
}

pub struct UpdateMetaobjectDefinition;

#[async_trait]
impl Operation for UpdateMetaobjectDefinition {
    const NAME: &'static str = "update_metaobject_definition";
    const DESCRIPTION: &'static str = "Update a metaobject definition. Field creates, updates and deletes are applied together in one call.";
    const READ_ONLY: bool = false;
    type Input = UpdateMetaobjectDefinitionInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = UpdateDefinitionVariables {
            id: &input.id,
            definition: UpdateDefinitionInput {
                name: input.name.as_deref(),
                description: input.description.as_deref(),
                display_name_key: input.display_name_key.as_deref(),
                field_definitions: input.field_operations(),
                access: input.access.as_ref(),
                capabilities: input.capabilities.as_ref(),
                reset_field_order: input.reset_field_order,
            },
        };
        mutate(
            client,
            &UPDATE_METAOBJECT_DEFINITION,
            &variables,
            "metaobjectDefinitionUpdate",
            "metaobjectDefinition",
        )
        .await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteMetaobjectDefinitionInput {
    /// The definition's global ID
    pub id: String,

    /// Also delete every metaobject of this type.
    /// Without it, a definition that still has metaobjects is not deleted.
    #[serde(default)]
    pub delete_all_metaobjects: bool,
}

impl Validate for DeleteMetaobjectDefinitionInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("id", &self.id, 1);
    }
}

pub struct DeleteMetaobjectDefinition;

#[async_trait]
impl Operation for DeleteMetaobjectDefinition {
    const NAME: &'static str = "delete_metaobject_definition";
    const DESCRIPTION: &'static str = "Delete a metaobject definition. Fails if metaobjects of the type exist, unless `delete_all_metaobjects` is set. The store always deletes a type's metaobjects with it, so metaobjects created after the check but before the delete are removed even without the flag.";
    const READ_ONLY: bool = false;
    type Input = DeleteMetaobjectDefinitionInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let usage = take(
            query(client, &METAOBJECT_DEFINITION_USAGE, &IdVariables { id: &input.id }).await?,
            "metaobjectDefinition",
        );
        let dependents = dependents(&usage, "metaobjectsCount").ok_or_else(|| ToolError::NotFound {
            resource: "MetaobjectDefinition",
            id: input.id.clone(),
        })?;

        if dependents > 0 {
            if !input.delete_all_metaobjects {
                return Err(ToolError::DefinitionInUse {
                    resource: "MetaobjectDefinition",
                    id: input.id,
                    dependents,
                    cascade_flag: "delete_all_metaobjects",
                });
            }
            info!(
                id = %input.id,
                dependents,
                "Deleting metaobject definition together with its metaobjects"
            );
        }

        // The remote delete always removes the type's metaobjects along with it
        let deleted = mutate(
            client,
            &DELETE_METAOBJECT_DEFINITION,
            &IdVariables { id: &input.id },
            "metaobjectDefinitionDelete",
            "deletedId",
        )
        .await?;
        Ok(json!({ "deletedId": deleted, "deletedDependents": dependents }))
    }
}
