//! Online store page tools

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shopify_admin_client::AdminApi;

use super::{IdInput, PageArgs};
use crate::errors::ToolError;
use crate::graphql::{Document, Operation, ToolDescriptor, fetch_one, fetch_page, mutate};
use crate::validation::{Checks, Validate};

macro_rules! page_fields {
    () => {
        "fragment PageFields on Page { id title handle body bodySummary isPublished publishedAt templateSuffix createdAt updatedAt }"
    };
}

pub(crate) const LIST_PAGES: Document = Document {
    operation_name: "ListPages",
    source: concat!(
        "query ListPages($first: Int!, $after: String, $query: String) { pages(first: $first, after: $after, query: $query) { edges { cursor node { ...PageFields } } ",
        page_info!(),
        " } } ",
        page_fields!()
    ),
};

pub(crate) const GET_PAGE: Document = Document {
    operation_name: "GetPage",
    source: concat!(
        "query GetPage($id: ID!) { page(id: $id) { ...PageFields } } ",
        page_fields!()
    ),
};

pub(crate) const CREATE_PAGE: Document = Document {
    operation_name: "CreatePage",
    source: concat!(
        "mutation CreatePage($page: PageCreateInput!) { pageCreate(page: $page) { page { ...PageFields } ",
        coded_user_errors!(),
        " } } ",
        page_fields!()
    ),
};

pub(crate) const UPDATE_PAGE: Document = Document {
    operation_name: "UpdatePage",
    source: concat!(
        "mutation UpdatePage($id: ID!, $page: PageUpdateInput!) { pageUpdate(id: $id, page: $page) { page { ...PageFields } ",
        coded_user_errors!(),
        " } } ",
        page_fields!()
    ),
};

pub(crate) const DELETE_PAGE: Document = Document {
    operation_name: "DeletePage",
    source: concat!(
        "mutation DeletePage($id: ID!) { pageDelete(id: $id) { deletedPageId ",
        coded_user_errors!(),
        " } }"
    ),
};

pub(crate) const DOCUMENTS: &[&Document] = &[
    &LIST_PAGES,
    &GET_PAGE,
    &CREATE_PAGE,
    &UPDATE_PAGE,
    &DELETE_PAGE,
];

pub(crate) fn tools(client: &Arc<dyn AdminApi>) -> Vec<Box<dyn ToolDescriptor>> {
    vec![
        ListPages.bind(client.clone()),
        GetPage.bind(client.clone()),
        CreatePage.bind(client.clone()),
        UpdatePage.bind(client.clone()),
        DeletePage.bind(client.clone()),
    ]
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListPagesInput {
    #[serde(flatten)]
    pub page: PageArgs,

    /// Search syntax filter, e.g. `title:about published_status:published`
    pub query: Option<String>,
}

impl Validate for ListPagesInput {
    fn check(&self, checks: &mut Checks) {
        self.page.check(checks);
        checks.optional_min_len("query", self.query.as_deref(), 1);
    }
}

pub struct ListPages;

#[async_trait]
impl Operation for ListPages {
    const NAME: &'static str = "list_pages";
    const DESCRIPTION: &'static str = "List online store pages.";
    const READ_ONLY: bool = true;
    type Input = ListPagesInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = input.page.variables(input.query.as_deref());
        let page = fetch_page(client, &LIST_PAGES, &variables, "pages").await?;
        Ok(serde_json::to_value(page)?)
    }
}

pub struct GetPage;

#[async_trait]
impl Operation for GetPage {
    const NAME: &'static str = "get_page";
    const DESCRIPTION: &'static str = "Get an online store page by ID, including its HTML body.";
    const READ_ONLY: bool = true;
    type Input = IdInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        fetch_one(client, &GET_PAGE, &input.variables(), "page", "Page", &input.id).await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreatePageInput {
    pub title: String,

    /// Page content as HTML
    pub body: Option<String>,

    pub handle: Option<String>,

    /// Whether the page is visible on the storefront. Defaults to published.
    pub is_published: Option<bool>,

    /// The theme template suffix, e.g. `contact` for `page.contact.liquid`
    pub template_suffix: Option<String>,
}

impl Validate for CreatePageInput {
    fn check(&self, checks: &mut Checks) {
        checks.len_between("title", &self.title, 1, 255);
        checks.optional_min_len("handle", self.handle.as_deref(), 1);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageInput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    is_published: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    template_suffix: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageVariables<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    page: PageInput<'a>,
}

pub struct CreatePage;

#[async_trait]
impl Operation for CreatePage {
    const NAME: &'static str = "create_page";
    const DESCRIPTION: &'static str = "Create an online store page.";
    const READ_ONLY: bool = false;
    type Input = CreatePageInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = PageVariables {
            id: None,
            page: PageInput {
                title: Some(&input.title),
                body: input.body.as_deref(),
                handle: input.handle.as_deref(),
                is_published: input.is_published,
                template_suffix: input.template_suffix.as_deref(),
            },
        };
        mutate(client, &CREATE_PAGE, &variables, "pageCreate", "page").await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdatePageInput {
    /// The page's global ID
    pub id: String,

    pub title: Option<String>,

    pub body: Option<String>,

    pub handle: Option<String>,

    pub is_published: Option<bool>,

    pub template_suffix: Option<String>,
}

impl Validate for UpdatePageInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("id", &self.id, 1);
        if let Some(title) = &self.title {
            checks.len_between("title", title, 1, 255);
        }
        checks.optional_min_len("handle", self.handle.as_deref(), 1);
        checks.any_of(&[
            ("title", self.title.is_some()),
            ("body", self.body.is_some()),
            ("handle", self.handle.is_some()),
            ("is_published", self.is_published.is_some()),
            ("template_suffix", self.template_suffix.is_some()),
        ]);
    }
}

pub struct UpdatePage;

#[async_trait]
impl Operation for UpdatePage {
    const NAME: &'static str = "update_page";
    const DESCRIPTION: &'static str = "Update an online store page. Only the supplied fields change.";
    const READ_ONLY: bool = false;
    type Input = UpdatePageInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = PageVariables {
            id: Some(&input.id),
            page: PageInput {
                title: input.title.as_deref(),
                body: input.body.as_deref(),
                handle: input.handle.as_deref(),
                is_published: input.is_published,
                template_suffix: input.template_suffix.as_deref(),
            },
        };
        mutate(client, &UPDATE_PAGE, &variables, "pageUpdate", "page").await
    }
}

pub struct DeletePage;

#[async_trait]
impl Operation for DeletePage {
    const NAME: &'static str = "delete_page";
    const DESCRIPTION: &'static str = "Delete an online store page.";
    const READ_ONLY: bool = false;
    type Input = IdInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let deleted = mutate(
            client,
            &DELETE_PAGE,
            &input.variables(),
            "pageDelete",
            "deletedPageId",
        )
        .await?;
        Ok(json!({ "deletedPageId": deleted }))
    }
}
