//! Product tools

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shopify_admin_client::AdminApi;

use super::{IdInput, PageArgs};
use crate::errors::ToolError;
use crate::graphql::{Document, Operation, ToolDescriptor, fetch_one, fetch_page, mutate};
use crate::validation::{Checks, Validate};

macro_rules! product_fields {
    () => {
        "fragment ProductFields on Product { id title handle status vendor productType tags descriptionHtml totalInventory createdAt updatedAt variants(first: 50) { nodes { id title sku price inventoryQuantity inventoryItem { id } } } }"
    };
}

pub(crate) const LIST_PRODUCTS: Document = Document {
    operation_name: "ListProducts",
    source: concat!(
        "query ListProducts($first: Int!, $after: String, $query: String, $reverse: Boolean) { products(first: $first, after: $after, query: $query, reverse: $reverse) { edges { cursor node { ...ProductFields } } ",
        page_info!(),
        " } } ",
        product_fields!()
    ),
};

pub(crate) const GET_PRODUCT: Document = Document {
    operation_name: "GetProduct",
    source: concat!(
        "query GetProduct($id: ID!) { product(id: $id) { ...ProductFields } } ",
        product_fields!()
    ),
};

pub(crate) const CREATE_PRODUCT: Document = Document {
    operation_name: "CreateProduct",
    source: concat!(
        "mutation CreateProduct($product: ProductCreateInput!) { productCreate(product: $product) { product { ...ProductFields } ",
        user_errors!(),
        " } } ",
        product_fields!()
    ),
};

pub(crate) const UPDATE_PRODUCT: Document = Document {
    operation_name: "UpdateProduct",
    source: concat!(
        "mutation UpdateProduct($product: ProductUpdateInput!) { productUpdate(product: $product) { product { ...ProductFields } ",
        user_errors!(),
        " } } ",
        product_fields!()
    ),
};

pub(crate) const DELETE_PRODUCT: Document = Document {
    operation_name: "DeleteProduct",
    source: concat!(
        "mutation DeleteProduct($input: ProductDeleteInput!) { productDelete(input: $input) { deletedProductId ",
        user_errors!(),
        " } }"
    ),
};

pub(crate) const DOCUMENTS: &[&Document] = &[
    &LIST_PRODUCTS,
    &GET_PRODUCT,
    &CREATE_PRODUCT,
    &UPDATE_PRODUCT,
    &DELETE_PRODUCT,
];

pub(crate) fn tools(client: &Arc<dyn AdminApi>) -> Vec<Box<dyn ToolDescriptor>> {
    vec![
        ListProducts.bind(client.clone()),
        GetProduct.bind(client.clone()),
        CreateProduct.bind(client.clone()),
        UpdateProduct.bind(client.clone()),
        DeleteProduct.bind(client.clone()),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Active,
    Archived,
    Draft,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListProductsInput {
    #[serde(flatten)]
    pub page: PageArgs,

    /// Search syntax filter, e.g. `title:shirt status:active vendor:Acme`
    pub query: Option<String>,

    /// Reverse the default ordering
    pub reverse: Option<bool>,
}

impl Validate for ListProductsInput {
    fn check(&self, checks: &mut Checks) {
        self.page.check(checks);
        checks.optional_min_len("query", self.query.as_deref(), 1);
    }
}

#[derive(Serialize)]
struct ListProductsVariables<'a> {
    #[serde(flatten)]
    page: super::PageVariables<'a>,

    #[serde(skip_serializing_if = "Option::is_none")]
    reverse: Option<bool>,
}

pub struct ListProducts;

#[async_trait]
impl Operation for ListProducts {
    const NAME: &'static str = "list_products";
    const DESCRIPTION: &'static str = "List products, optionally filtered with Shopify search syntax. Returns one page of products with their variants, and page info to fetch the next page.";
    const READ_ONLY: bool = true;
    type Input = ListProductsInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = ListProductsVariables {
            page: input.page.variables(input.query.as_deref()),
            reverse: input.reverse,
        };
        let page = fetch_page(client, &LIST_PRODUCTS, &variables, "products").await?;
        Ok(serde_json::to_value(page)?)
    }
}

pub struct GetProduct;

#[async_trait]
impl Operation for GetProduct {
    const NAME: &'static str = "get_product";
    const DESCRIPTION: &'static str = "Get a product by ID, including its variants and inventory totals.";
    const READ_ONLY: bool = true;
    type Input = IdInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        fetch_one(client, &GET_PRODUCT, &input.variables(), "product", "Product", &input.id).await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProductInput {
    pub title: String,

    /// Description as HTML
    pub description_html: Option<String>,

    /// URL handle. Generated from the title when omitted.
    pub handle: Option<String>,

    pub vendor: Option<String>,

    pub product_type: Option<String>,

    pub tags: Option<Vec<String>>,

    /// Defaults to ACTIVE
    pub status: Option<ProductStatus>,
}

impl Validate for CreateProductInput {
    fn check(&self, checks: &mut Checks) {
        checks.len_between("title", &self.title, 1, 255);
        checks.optional_min_len("handle", self.handle.as_deref(), 1);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductInput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description_html: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    vendor: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    product_type: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<ProductStatus>,
}

#[derive(Serialize)]
struct ProductVariables<'a> {
    product: ProductInput<'a>,
}

pub struct CreateProduct;

#[async_trait]
impl Operation for CreateProduct {
    const NAME: &'static str = "create_product";
    const DESCRIPTION: &'static str = "Create a product. Only the title is required.";
    const READ_ONLY: bool = false;
    type Input = CreateProductInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = ProductVariables {
            product: ProductInput {
                id: None,
                title: Some(&input.title),
                description_html: input.description_html.as_deref(),
                handle: input.handle.as_deref(),
                vendor: input.vendor.as_deref(),
                product_type: input.product_type.as_deref(),
                tags: input.tags.as_deref(),
                status: input.status,
            },
        };
        mutate(client, &CREATE_PRODUCT, &variables, "productCreate", "product").await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateProductInput {
    /// The product's global ID
    pub id: String,

    pub title: Option<String>,

    pub description_html: Option<String>,

    pub handle: Option<String>,

    pub vendor: Option<String>,

    pub product_type: Option<String>,

    /// Replaces all existing tags
    pub tags: Option<Vec<String>>,

    pub status: Option<ProductStatus>,
}

impl Validate for UpdateProductInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("id", &self.id, 1);
        if let Some(title) = &self.title {
            checks.len_between("title", title, 1, 255);
        }
        checks.optional_min_len("handle", self.handle.as_deref(), 1);
        checks.any_of(&[
            ("title", self.title.is_some()),
            ("description_html", self.description_html.is_some()),
            ("handle", self.handle.is_some()),
            ("vendor", self.vendor.is_some()),
            ("product_type", self.product_type.is_some()),
            ("tags", self.tags.is_some()),
            ("status", self.status.is_some()),
        ]);
    }
}

pub struct UpdateProduct;

#[async_trait]
impl Operation for UpdateProduct {
    const NAME: &'static str = "update_product";
    const DESCRIPTION: &'static str = "Update a product. Only the supplied fields change.";
    const READ_ONLY: bool = false;
    type Input = UpdateProductInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = ProductVariables {
            product: ProductInput {
                id: Some(&input.id),
                title: input.title.as_deref(),
                description_html: input.description_html.as_deref(),
                handle: input.handle.as_deref(),
                vendor: input.vendor.as_deref(),
                product_type: input.product_type.as_deref(),
                tags: input.tags.as_deref(),
                status: input.status,
            },
        };
        mutate(client, &UPDATE_PRODUCT, &variables, "productUpdate", "product").await
    }
}

#[derive(Serialize)]
struct DeleteProductVariables<'a> {
    input: super::IdVariables<'a>,
}

pub struct DeleteProduct;

#[async_trait]
impl Operation for DeleteProduct {
    const NAME: &'static str = "delete_product";
    const DESCRIPTION: &'static str = "Permanently delete a product and all of its variants.";
    const READ_ONLY: bool = false;
    type Input = IdInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = DeleteProductVariables {
            input: input.variables(),
        };
        let deleted = mutate(
            client,
            &DELETE_PRODUCT,
            &variables,
            "productDelete",
            "deletedProductId",
        )
        .await?;
        Ok(serde_json::json!({ "deletedProductId": deleted }))
    }
}
