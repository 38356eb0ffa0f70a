//! Every Admin API tool the server exposes, grouped by resource

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shopify_admin_client::AdminApi;

use crate::graphql::{Document, ToolDescriptor};
use crate::validation::{Checks, MAX_PAGE_SIZE, Validate, page_size};

macro_rules! page_info {
    () => {
        "pageInfo { hasNextPage hasPreviousPage startCursor endCursor }"
    };
}

/// User errors for mutations reporting the generic `UserError` type
macro_rules! user_errors {
    () => {
        "userErrors { field message }"
    };
}

/// User errors for mutations whose error type carries a code
macro_rules! coded_user_errors {
    () => {
        "userErrors { field message code }"
    };
}

pub mod collections;
pub mod inventory;
pub mod menus;
pub mod metafield_definitions;
pub mod metafields;
pub mod metaobject_definitions;
pub mod metaobjects;
pub mod pages;
pub mod products;

/// Bind every tool to the given client
pub fn all(client: &Arc<dyn AdminApi>) -> Vec<Box<dyn ToolDescriptor>> {
    [
        products::tools(client),
        collections::tools(client),
        pages::tools(client),
        menus::tools(client),
        inventory::tools(client),
        metafield_definitions::tools(client),
        metafields::tools(client),
        metaobject_definitions::tools(client),
        metaobjects::tools(client),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Every GraphQL document sent by any tool
pub fn documents() -> impl Iterator<Item = &'static Document> {
    [
        products::DOCUMENTS,
        collections::DOCUMENTS,
        pages::DOCUMENTS,
        menus::DOCUMENTS,
        inventory::DOCUMENTS,
        metafield_definitions::DOCUMENTS,
        metafields::DOCUMENTS,
        metaobject_definitions::DOCUMENTS,
        metaobjects::DOCUMENTS,
    ]
    .into_iter()
    .flatten()
    .copied()
}

/// Forward pagination arguments shared by list tools
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct PageArgs {
    /// Number of items to return, from 1 to 250. Defaults to 50.
    #[schemars(range(min = 1, max = 250))]
    pub first: Option<i64>,

    /// The `endCursor` of a previous page, to continue after it
    pub after: Option<String>,
}

impl PageArgs {
    fn check(&self, checks: &mut Checks) {
        checks.page(self.first, self.after.as_deref(), MAX_PAGE_SIZE);
    }

    fn variables<'a>(&'a self, query: Option<&'a str>) -> PageVariables<'a> {
        PageVariables {
            first: page_size(self.first),
            after: self.after.as_deref(),
            query,
        }
    }
}

#[derive(Debug, Serialize)]
struct PageVariables<'a> {
    first: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
}

/// A resource addressed by its global ID
#[derive(Debug, Deserialize, JsonSchema)]
pub struct IdInput {
    /// The resource's global ID, e.g. `gid://shopify/Product/123`
    pub id: String,
}

impl Validate for IdInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("id", &self.id, 1);
    }
}

#[derive(Debug, Serialize)]
struct IdVariables<'a> {
    id: &'a str,
}

impl IdInput {
    fn variables(&self) -> IdVariables<'_> {
        IdVariables { id: &self.id }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use apollo_compiler::ast;
    use insta::assert_snapshot;

    use super::*;
    use crate::graphql::test_support::Canned;

    #[test]
    fn every_document_holds_one_named_operation() {
        for document in documents() {
            let parsed = ast::Document::parse(document.source, "operation.graphql")
                .unwrap_or_else(|e| panic!("{} does not parse: {e}", document.operation_name));

            let names: Vec<_> = parsed
                .definitions
                .iter()
                .filter_map(|definition| match definition {
                    ast::Definition::OperationDefinition(operation) => Some(operation.name.clone()),
                    _ => None,
                })
                .collect();

            assert_eq!(names.len(), 1, "{}", document.operation_name);
            assert_eq!(
                names[0].as_ref().map(|name| name.as_str()),
                Some(document.operation_name)
            );
        }
    }

    #[test]
    fn every_fragment_is_defined_once_and_used() {
        for document in documents() {
            let parsed = ast::Document::parse(document.source, "operation.graphql").unwrap();
            let fragments: Vec<_> = parsed
                .definitions
                .iter()
                .filter_map(|definition| match definition {
                    ast::Definition::FragmentDefinition(fragment) => {
                        Some(fragment.name.to_string())
                    }
                    _ => None,
                })
                .collect();

            let unique: HashSet<_> = fragments.iter().collect();
            assert_eq!(unique.len(), fragments.len(), "{}", document.operation_name);
            for fragment in &fragments {
                assert!(
                    document.source.contains(&format!("...{fragment}")),
                    "{} defines unused fragment {fragment}",
                    document.operation_name
                );
            }
        }
    }

    #[test]
    fn tool_names() {
        let client: Arc<dyn AdminApi> = Arc::new(Canned::default());
        let names: Vec<_> = all(&client)
            .iter()
            .map(|tool| tool.tool().name.to_string())
            .collect();

        assert_snapshot!(names.join("\n"), @r"
        list_products
        get_product
        create_product
        update_product
        delete_product
        list_collections
        get_collection
        create_collection
        update_collection
        delete_collection
        add_products_to_collection
        list_pages
        get_page
        create_page
        update_page
        delete_page
        list_menus
        get_menu
        create_menu
        update_menu
        delete_menu
        get_inventory_levels
        adjust_inventory
        list_metafield_definitions
        create_metafield_definition
        update_metafield_definition
        delete_metafield_definition
        get_metafields
        set_metafields
        delete_metafields
        list_metaobject_definitions
        get_metaobject_definition
        create_metaobject_definition
        update_metaobject_definition
        delete_metaobject_definition
        list_metaobjects
        get_metaobject
        create_metaobject
        update_metaobject
        upsert_metaobject
        delete_metaobject
        ");
    }

    #[test]
    fn read_only_hints_match_tool_names() {
        let client: Arc<dyn AdminApi> = Arc::new(Canned::default());
        for tool in all(&client) {
            let tool = tool.tool();
            let read_only = tool
                .annotations
                .as_ref()
                .and_then(|annotations| annotations.read_only_hint);
            let expected = tool.name.starts_with("list_") || tool.name.starts_with("get_");
            assert_eq!(read_only, Some(expected), "{}", tool.name);
        }
    }

    #[test]
    fn page_args_default_to_fifty() {
        let args = PageArgs::default();
        assert_eq!(args.variables(None).first, 50);
    }
}
