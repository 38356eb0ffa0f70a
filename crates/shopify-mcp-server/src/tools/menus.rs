//! Navigation menu tools
//!
//! A menu's whole item tree, up to three levels deep, is sent in a single
//! call. Updating a menu replaces its items: existing items are kept by
//! passing their `id`.

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

/// The deepest nesting of menu items the storefront supports
pub const MAX_MENU_DEPTH: usize = 3;

macro_rules! menu_fields {
    () => {
        "fragment MenuFields on Menu { id handle title isDefault items { ...MenuItemFields items { ...MenuItemFields items { ...MenuItemFields } } } } fragment MenuItemFields on MenuItem { id title type url resourceId tags }"
    };
}

pub(crate) const LIST_MENUS: Document = Document {
    operation_name: "ListMenus",
    source: concat!(
        "query ListMenus($first: Int!, $after: String, $query: String) { menus(first: $first, after: $after, query: $query) { edges { cursor node { ...MenuFields } } ",
        page_info!(),
        " } } ",
        menu_fields!()
    ),
};

pub(crate) const GET_MENU: Document = Document {
    operation_name: "GetMenu",
    source: concat!(
        "query GetMenu($id: ID!) { menu(id: $id) { ...MenuFields } } ",
        menu_fields!()
    ),
};

pub(crate) const CREATE_MENU: Document = Document {
    operation_name: "CreateMenu",
    source: concat!(
        "mutation CreateMenu($title: String!, $handle: String!, $items: [MenuItemCreateInput!]!) { menuCreate(title: $title, handle: $handle, items: $items) { menu { ...MenuFields } ",
        coded_user_errors!(),
        " } } ",
        menu_fields!()
    ),
};

pub(crate) const UPDATE_MENU: Document = Document {
    operation_name: "UpdateMenu",
    source: concat!(
        "mutation UpdateMenu($id: ID!, $title: String!, $handle: String, $items: [MenuItemUpdateInput!]!) { menuUpdate(id: $id, title: $title, handle: $handle, items: $items) { menu { ...MenuFields } ",
        coded_user_errors!(),
        " } } ",
        menu_fields!()
    ),
};

pub(crate) const DELETE_MENU: Document = Document {
    operation_name: "DeleteMenu",
    source: concat!(
        "mutation DeleteMenu($id: ID!) { menuDelete(id: $id) { deletedMenuId ",
        coded_user_errors!(),
        " } }"
    ),
};

pub(crate) const DOCUMENTS: &[&Document] = &[
    &LIST_MENUS,
    &GET_MENU,
    &CREATE_MENU,
    &UPDATE_MENU,
    &DELETE_MENU,
];

pub(crate) fn tools(client: &Arc<dyn AdminApi>) -> Vec<Box<dyn ToolDescriptor>> {
    vec![
        ListMenus.bind(client.clone()),
        GetMenu.bind(client.clone()),
        CreateMenu.bind(client.clone()),
        UpdateMenu.bind(client.clone()),
        DeleteMenu.bind(client.clone()),
    ]
}

/// What a menu item links to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MenuItemType {
    Article,
    Blog,
    Catalog,
    Collection,
    Collections,
    CustomerAccountPage,
    Frontpage,
    Http,
    Metaobject,
    Page,
    Product,
    Search,
    ShopPolicy,
}

/// A menu item and its children
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all(deserialize = "snake_case", serialize = "camelCase"))]
pub struct MenuItemInput {
    /// An existing item's ID. Only used when updating a menu.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub title: String,

    #[serde(rename = "type")]
    pub item_type: MenuItemType,

    /// The link target. Required for `HTTP` items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// The linked resource, e.g. a collection ID for `COLLECTION` items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    /// Tags used to filter a collection item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Nested items
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<MenuItemInput>,
}

fn check_items(checks: &mut Checks, path: &str, items: &[MenuItemInput], depth: usize, allow_ids: bool) {
    if !items.is_empty() && depth > MAX_MENU_DEPTH {
        checks.violation(path, format!("menus can be at most {MAX_MENU_DEPTH} levels deep"));
        return;
    }
    for (index, item) in items.iter().enumerate() {
        let path = format!("{path}[{index}]");
        checks.min_len(&format!("{path}.title"), &item.title, 1);
        if item.item_type == MenuItemType::Http && item.url.as_deref().is_none_or(str::is_empty) {
            checks.violation(format!("{path}.url"), "is required for HTTP items");
        }
        if item.id.is_some() && !allow_ids {
            checks.violation(format!("{path}.id"), "is only allowed when updating a menu");
        }
        check_items(checks, &format!("{path}.items"), &item.items, depth + 1, allow_ids);
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListMenusInput {
    #[serde(flatten)]
    pub page: PageArgs,

    /// Search syntax filter, e.g. `title:footer`
    pub query: Option<String>,
}

impl Validate for ListMenusInput {
    fn check(&self, checks: &mut Checks) {
        self.page.check(checks);
        checks.optional_min_len("query", self.query.as_deref(), 1);
    }
}

pub struct ListMenus;

#[async_trait]
impl Operation for ListMenus {
    const NAME: &'static str = "list_menus";
    const DESCRIPTION: &'static str = "List navigation menus with their item trees.";
    const READ_ONLY: bool = true;
    type Input = ListMenusInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = input.page.variables(input.query.as_deref());
        let page = fetch_page(client, &LIST_MENUS, &variables, "menus").await?;
        Ok(serde_json::to_value(page)?)
    }
}

pub struct GetMenu;

#[async_trait]
impl Operation for GetMenu {
    const NAME: &'static str = "get_menu";
    const DESCRIPTION: &'static str = "Get a navigation menu by ID with up to three levels of items.";
    const READ_ONLY: bool = true;
    type Input = IdInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        fetch_one(client, &GET_MENU, &input.variables(), "menu", "Menu", &input.id).await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateMenuInput {
    pub title: String,

    /// A unique handle, e.g. `footer`
    pub handle: String,

    /// The item tree, up to three levels deep
    #[serde(default)]
    pub items: Vec<MenuItemInput>,
}

impl Validate for CreateMenuInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("title", &self.title, 1);
        checks.min_len("handle", &self.handle, 1);
        check_items(checks, "items", &self.items, 1, false);
    }
}

#[derive(Serialize)]
struct MenuVariables<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,

    title: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<&'a str>,

    items: &'a [MenuItemInput],
}

pub struct CreateMenu;

#[async_trait]
impl Operation for CreateMenu {
    const NAME: &'static str = "create_menu";
    const DESCRIPTION: &'static str = "Create a navigation menu together with its nested items.";
    const READ_ONLY: bool = false;
    type Input = CreateMenuInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = MenuVariables {
            id: None,
            title: &input.title,
            handle: Some(&input.handle),
            items: &input.items,
        };
        mutate(client, &CREATE_MENU, &variables, "menuCreate", "menu").await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateMenuInput {
    /// The menu's global ID
    pub id: String,

    pub title: String,

    pub handle: Option<String>,

    /// The complete new item tree. Items left out are removed from the menu.
    pub items: Vec<MenuItemInput>,
}

impl Validate for UpdateMenuInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("id", &self.id, 1);
        checks.min_len("title", &self.title, 1);
        checks.optional_min_len("handle", self.handle.as_deref(), 1);
        check_items(checks, "items", &self.items, 1, true);
    }
}

pub struct UpdateMenu;

#[async_trait]
impl Operation for UpdateMenu {
    const NAME: &'static str = "update_menu";
    const DESCRIPTION: &'static str = "Replace a navigation menu's title and item tree. Pass each existing item's `id` to keep it.";
    const READ_ONLY: bool = false;
    type Input = UpdateMenuInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = MenuVariables {
            id: Some(&input.id),
            title: &input.title,
            handle: input.handle.as_deref(),
            items: &input.items,
        };
        mutate(client, &UPDATE_MENU, &variables, "menuUpdate", "menu").await
    }
}

pub struct DeleteMenu;

#[async_trait]
impl Operation for DeleteMenu {
    const NAME: &'static str = "delete_menu";
    const DESCRIPTION: &'static str = "Delete a navigation menu. Default menus cannot be deleted.";
    const READ_ONLY: bool = false;
    type Input = IdInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let deleted = mutate(
            client,
            &DELETE_MENU,
            &input.variables(),
            "menuDelete",
            "deletedMenuId",
        )
        .await?;
        Ok(json!({ "deletedMenuId": deleted }))
    }
}
