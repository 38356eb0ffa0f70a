//! An MCP server exposing a Shopify store's GraphQL Admin API as typed tools

pub mod errors;
pub mod graphql;
pub mod json_schema;
pub mod normalize;
pub mod registry;
pub mod server;
pub mod server_handler;
pub mod tools;
pub mod validation;
