use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use tracing::debug;

use crate::errors::McpError;
use crate::registry::ToolRegistry;

/// Serves the tool registry over MCP
#[derive(Clone)]
pub struct ShopifyMcpServerHandler {
    registry: Arc<ToolRegistry>,
}

impl ShopifyMcpServerHandler {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

impl ServerHandler for ShopifyMcpServerHandler {
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        debug!(tool = %request.name, "Tool call");
        self.registry.call(&request.name, request.arguments).await
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: self.registry.tools(),
        })
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "Shopify Admin MCP Server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Tools for managing a Shopify store through the Admin GraphQL API. \
                 IDs are global IDs such as gid://shopify/Product/1. \
                 List tools page with `first` and `after`."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::test_support::Canned;

    #[test]
    fn advertises_tools_capability() {
        let registry = ToolRegistry::new(Arc::new(Canned::default())).unwrap();
        let handler = ShopifyMcpServerHandler::new(Arc::new(registry));

        let info = handler.get_info();

        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
    }
}
