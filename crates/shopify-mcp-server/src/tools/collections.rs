//! Collection tools

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shopify_admin_client::AdminApi;

use super::{IdInput, IdVariables, PageArgs};
use crate::errors::ToolError;
use crate::graphql::{Document, Operation, ToolDescriptor, fetch_one, fetch_page, mutate};
use crate::validation::{Checks, Validate};

macro_rules! collection_fields {
    () => {
        "fragment CollectionFields on Collection { id title handle descriptionHtml sortOrder updatedAt productsCount { count } ruleSet { appliedDisjunctively rules { column relation condition } } }"
    };
}

pub(crate) const LIST_COLLECTIONS: Document = Document {
    operation_name: "ListCollections",
    source: concat!(
        "query ListCollections($first: Int!, $after: String, $query: String) { collections(first: $first, after: $after, query: $query) { edges { cursor node { ...CollectionFields } } ",
        page_info!(),
        " } } ",
        collection_fields!()
    ),
};

pub(crate) const GET_COLLECTION: Document = Document {
    operation_name: "GetCollection",
    source: concat!(
        "query GetCollection($id: ID!, $productsFirst: Int!) { collection(id: $id) { ...CollectionFields products(first: $productsFirst) { nodes { id title handle status } ",
        page_info!(),
        " } } } ",
        collection_fields!()
    ),
};

pub(crate) const CREATE_COLLECTION: Document = Document {
    operation_name: "CreateCollection",
    source: concat!(
        "mutation CreateCollection($input: CollectionInput!) { collectionCreate(input: $input) { collection { ...CollectionFields } ",
        user_errors!(),
        " } } ",
        collection_fields!()
    ),
};

pub(crate) const UPDATE_COLLECTION: Document = Document {
    operation_name: "UpdateCollection",
    source: concat!(
        "mutation UpdateCollection($input: CollectionInput!) { collectionUpdate(input: $input) { collection { ...CollectionFields } ",
        user_errors!(),
        " } } ",
        collection_fields!()
    ),
};

pub(crate) const DELETE_COLLECTION: Document = Document {
    operation_name: "DeleteCollection",
    source: concat!(
        "mutation DeleteCollection($input: CollectionDeleteInput!) { collectionDelete(input: $input) { deletedCollectionId ",
        user_errors!(),
        " } }"
    ),
};

pub(crate) const ADD_PRODUCTS_TO_COLLECTION: Document = Document {
    operation_name: "AddProductsToCollection",
    source: concat!(
        "mutation AddProductsToCollection($id: ID!, $productIds: [ID!]!) { collectionAddProducts(id: $id, productIds: $productIds) { collection { ...CollectionFields } ",
        user_errors!(),
        " } } ",
        collection_fields!()
    ),
};

pub(crate) const DOCUMENTS: &[&Document] = &[
    &LIST_COLLECTIONS,
    &GET_COLLECTION,
    &CREATE_COLLECTION,
    &UPDATE_COLLECTION,
    &DELETE_COLLECTION,
    &ADD_PRODUCTS_TO_COLLECTION,
];

pub(crate) fn tools(client: &Arc<dyn AdminApi>) -> Vec<Box<dyn ToolDescriptor>> {
    vec![
        ListCollections.bind(client.clone()),
        GetCollection.bind(client.clone()),
        CreateCollection.bind(client.clone()),
        UpdateCollection.bind(client.clone()),
        DeleteCollection.bind(client.clone()),
        AddProductsToCollection.bind(client.clone()),
    ]
}

/// How products in a collection are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionSortOrder {
    AlphaAsc,
    AlphaDesc,
    BestSelling,
    Created,
    CreatedDesc,
    Manual,
    PriceAsc,
    PriceDesc,
}

/// A condition for automatically including products in a smart collection
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CollectionRule {
    /// The product attribute to compare, e.g. `TAG`, `TITLE`, `VENDOR`, `VARIANT_PRICE`
    pub column: String,

    /// The comparison, e.g. `EQUALS`, `CONTAINS`, `GREATER_THAN`
    pub relation: String,

    pub condition: String,
}

/// Rules that make a collection smart. Products matching the rules are added automatically.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRuleSet {
    /// Match any rule rather than all of them
    #[serde(alias = "applied_disjunctively")]
    pub applied_disjunctively: bool,

    pub rules: Vec<CollectionRule>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListCollectionsInput {
    #[serde(flatten)]
    pub page: PageArgs,

    /// Search syntax filter, e.g. `title:summer collection_type:smart`
    pub query: Option<String>,
}

impl Validate for ListCollectionsInput {
    fn check(&self, checks: &mut Checks) {
        self.page.check(checks);
        checks.optional_min_len("query", self.query.as_deref(), 1);
    }
}

pub struct ListCollections;

#[async_trait]
impl Operation for ListCollections {
    const NAME: &'static str = "list_collections";
    const DESCRIPTION: &'static str = "List custom and smart collections, optionally filtered with Shopify search syntax.";
    const READ_ONLY: bool = true;
    type Input = ListCollectionsInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = input.page.variables(input.query.as_deref());
        let page = fetch_page(client, &LIST_COLLECTIONS, &variables, "collections").await?;
        Ok(serde_json::to_value(page)?)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetCollectionInput {
    /// The collection's global ID
    pub id: String,

    /// How many of the collection's products to include, from 1 to 250. Defaults to 50.
    #[schemars(range(min = 1, max = 250))]
    pub products_first: Option<i64>,
}

impl Validate for GetCollectionInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("id", &self.id, 1);
        if let Some(first) = self.products_first {
            checks.range("products_first", first, 1, 250);
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetCollectionVariables<'a> {
    id: &'a str,
    products_first: u32,
}

pub struct GetCollection;

#[async_trait]
impl Operation for GetCollection {
    const NAME: &'static str = "get_collection";
    const DESCRIPTION: &'static str = "Get a collection by ID, with the first page of its products.";
    const READ_ONLY: bool = true;
    type Input = GetCollectionInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = GetCollectionVariables {
            id: &input.id,
            products_first: crate::validation::page_size(input.products_first),
        };
        fetch_one(client, &GET_COLLECTION, &variables, "collection", "Collection", &input.id).await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateCollectionInput {
    pub title: String,

    /// Description as HTML
    pub description_html: Option<String>,

    pub handle: Option<String>,

    pub sort_order: Option<CollectionSortOrder>,

    /// Makes this a smart collection
    pub rule_set: Option<CollectionRuleSet>,

    /// Products to add to a custom collection. Not allowed with `rule_set`.
    pub products: Option<Vec<String>>,
}

impl Validate for CreateCollectionInput {
    fn check(&self, checks: &mut Checks) {
        checks.len_between("title", &self.title, 1, 255);
        checks.optional_min_len("handle", self.handle.as_deref(), 1);
        if let Some(rule_set) = &self.rule_set {
            checks.items("rule_set.rules", rule_set.rules.len(), 1, 60);
            if self.products.is_some() {
                checks.violation("products", "cannot be combined with `rule_set`");
            }
        }
        if let Some(products) = &self.products {
            checks.items("products", products.len(), 0, 250);
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionInput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description_html: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    sort_order: Option<CollectionSortOrder>,

    #[serde(skip_serializing_if = "Option::is_none")]
    rule_set: Option<&'a CollectionRuleSet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    products: Option<&'a [String]>,
}

#[derive(Serialize)]
struct CollectionVariables<'a> {
    input: CollectionInput<'a>,
}

pub struct CreateCollection;

#[async_trait]
impl Operation for CreateCollection {
    const NAME: &'static str = "create_collection";
    const DESCRIPTION: &'static str = "Create a collection. Supply `rule_set` for a smart collection, or `products` for a custom one.";
    const READ_ONLY: bool = false;
    type Input = CreateCollectionInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = CollectionVariables {
            input: CollectionInput {
                id: None,
                title: Some(&input.title),
                description_html: input.description_html.as_deref(),
                handle: input.handle.as_deref(),
                sort_order: input.sort_order,
                rule_set: input.rule_set.as_ref(),
                products: input.products.as_deref(),
            },
        };
        mutate(client, &CREATE_COLLECTION, &variables, "collectionCreate", "collection").await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateCollectionInput {
    /// The collection's global ID
    pub id: String,

    pub title: Option<String>,

    pub description_html: Option<String>,

    pub handle: Option<String>,

    pub sort_order: Option<CollectionSortOrder>,

    /// Replaces the rules of a smart collection
    pub rule_set: Option<CollectionRuleSet>,
}

impl Validate for UpdateCollectionInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("id", &self.id, 1);
        if let Some(title) = &self.title {
            checks.len_between("title", title, 1, 255);
        }
        checks.optional_min_len("handle", self.handle.as_deref(), 1);
        if let Some(rule_set) = &self.rule_set {
            checks.items("rule_set.rules", rule_set.rules.len(), 1, 60);
        }
        checks.any_of(&[
            ("title", self.title.is_some()),
            ("description_html", self.description_html.is_some()),
            ("handle", self.handle.is_some()),
            ("sort_order", self.sort_order.is_some()),
            ("rule_set", self.rule_set.is_some()),
        ]);
    }
}

pub struct UpdateCollection;

#[async_trait]
impl Operation for UpdateCollection {
    const NAME: &'static str = "update_collection";
    const DESCRIPTION: &'static str = "Update a collection. Only the supplied fields change.";
    const READ_ONLY: bool = false;
    type Input = UpdateCollectionInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = CollectionVariables {
            input: CollectionInput {
                id: Some(&input.id),
                title: input.title.as_deref(),
                description_html: input.description_html.as_deref(),
                handle: input.handle.as_deref(),
                sort_order: input.sort_order,
                rule_set: input.rule_set.as_ref(),
                products: None,
            },
        };
        mutate(client, &UPDATE_COLLECTION, &variables, "collectionUpdate", "collection").await
    }
}

#[derive(Serialize)]
struct DeleteCollectionVariables<'a> {
    input: IdVariables<'a>,
}

pub struct DeleteCollection;

#[async_trait]
impl Operation for DeleteCollection {
    const NAME: &'static str = "delete_collection";
    const DESCRIPTION: &'static str = "Delete a collection. The products in it are not deleted.";
    const READ_ONLY: bool = false;
    type Input = IdInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = DeleteCollectionVariables {
            input: input.variables(),
        };
        let deleted = mutate(
            client,
            &DELETE_COLLECTION,
            &variables,
            "collectionDelete",
            "deletedCollectionId",
        )
        .await?;
        Ok(json!({ "deletedCollectionId": deleted }))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddProductsToCollectionInput {
    /// The custom collection's global ID
    pub id: String,

    /// Product IDs to add, at most 250
    #[schemars(length(min = 1, max = 250))]
    pub product_ids: Vec<String>,
}

impl Validate for AddProductsToCollectionInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("id", &self.id, 1);
        checks.items("product_ids", self.product_ids.len(), 1, 250);
        for (index, product_id) in self.product_ids.iter().enumerate() {
            checks.min_len(&format!("product_ids[{index}]"), product_id, 1);
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddProductsVariables<'a> {
    id: &'a str,
    product_ids: &'a [String],
}

pub struct AddProductsToCollection;

#[async_trait]
impl Operation for AddProductsToCollection {
    const NAME: &'static str = "add_products_to_collection";
    const DESCRIPTION: &'static str = "Add products to a custom collection in one call. Smart collections cannot be changed this way.";
    const READ_ONLY: bool = false;
    type Input = AddProductsToCollectionInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = AddProductsVariables {
            id: &input.id,
            product_ids: &input.product_ids,
        };
        mutate(
            client,
            &ADD_PRODUCTS_TO_COLLECTION,
            &variables,
            "collectionAddProducts",
            "collection",
        )
        .await
    }
}
