//! The set of tools the server exposes, keyed by name

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, ErrorCode, JsonObject, Tool};
use shopify_admin_client::AdminApi;
use tracing::{debug, warn};

use crate::errors::{McpError, ServerError};
use crate::graphql::ToolDescriptor;
use crate::tools;

/// Every tool, bound once to the Admin API client at startup
pub struct ToolRegistry {
    tools: Vec<Box<dyn ToolDescriptor>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Bind every tool in the catalogue to the given client
    pub fn new(client: Arc<dyn AdminApi>) -> Result<Self, ServerError> {
        let mut registry = Self::empty();
        for tool in tools::all(&client) {
            registry.register(tool)?;
        }
        debug!(tools = registry.tools.len(), "Registered tools");
        Ok(registry)
    }

    pub fn empty() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a tool, rejecting a name that is already registered
    pub fn register(&mut self, tool: Box<dyn ToolDescriptor>) -> Result<(), ServerError> {
        let name = tool.tool().name.to_string();
        if self.index.contains_key(&name) {
            return Err(ServerError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Every tool definition, in registration order
    pub fn tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|tool| tool.tool().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self
            .index
            .get(name)
            .and_then(|index| self.tools.get(*index))
            .ok_or_else(|| tool_not_found(name))?;

        match tool.call(arguments).await {
            Ok(value) => Ok(CallToolResult {
                content: vec![Content::json(value)?],
                is_error: Some(false),
            }),
            Err(error) => {
                warn!(tool = name, %error, "Tool call failed");
                error.into_call_result()
            }
        }
    }
}

fn tool_not_found(name: &str) -> McpError {
    McpError::new(
        ErrorCode::METHOD_NOT_FOUND,
        format!("Tool {name} not found"),
        None,
    )
}
