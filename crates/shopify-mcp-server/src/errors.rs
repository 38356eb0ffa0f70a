use std::fmt;

use rmcp::model::{CallToolResult, Content, ErrorCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shopify_admin_client::ClientError;
use tokio::task::JoinError;

/// An MCP tool error
pub type McpError = rmcp::model::ErrorData;

/// A single input constraint that was not met
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// The argument path, e.g. `fields[2].key`
    pub field: String,

    /// What was expected of the argument
    pub constraint: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

/// A business rule rejection reported by the Admin API alongside a well-formed response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = self.field.as_ref().filter(|field| !field.is_empty()) {
            write!(f, "{}: ", field.join("."))?;
        }
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " ({code})")?;
        }
        Ok(())
    }
}

fn join_all<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A failed tool invocation
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The arguments did not satisfy the tool's declared schema. No remote call was made.
    #[error("Invalid input: {}", join_all(.0))]
    InvalidInput(Vec<Violation>),

    /// The Admin API rejected the request with one or more user errors
    #[error("{operation} was rejected: {}", join_all(.errors))]
    UserErrors {
        operation: &'static str,
        errors: Vec<UserError>,
    },

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// A definition still has instances and the caller did not ask for a cascading delete
    #[error(
        "{resource} {id} still has {dependents} dependent value(s); set `{cascade_flag}` to delete them as well"
    )]
    DefinitionInUse {
        resource: &'static str,
        id: String,
        dependents: u64,
        cascade_flag: &'static str,
    },

    /// No user errors were reported, but the expected payload was absent
    #[error("{operation} returned neither `{payload}` nor any user errors")]
    EmptyPayload {
        operation: &'static str,
        payload: &'static str,
    },

    #[error(transparent)]
    Remote(#[from] ClientError),

    #[error("Unexpected Admin API payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    pub(crate) fn invalid(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        ToolError::InvalidInput(vec![Violation {
            field: field.into(),
            constraint: constraint.into(),
        }])
    }

    /// Convert into the MCP result for a call.
    ///
    /// Errors the caller can act on by changing its input come back as a tool
    /// result flagged `is_error`; malformed arguments become `INVALID_PARAMS`;
    /// transport failures and empty payloads become `INTERNAL_ERROR`.
    pub fn into_call_result(self) -> Result<CallToolResult, McpError> {
        let message = self.to_string();
        match self {
            ToolError::InvalidInput(violations) => Err(McpError::new(
                ErrorCode::INVALID_PARAMS,
                message,
                Some(json!({ "violations": violations })),
            )),
            ToolError::UserErrors { errors, .. } => Ok(tool_failure(
                message,
                json!({ "userErrors": errors }),
            )),
            ToolError::NotFound { resource, id } => Ok(tool_failure(
                message,
                json!({ "notFound": { "resource": resource, "id": id } }),
            )),
            ToolError::DefinitionInUse { id, dependents, .. } => Ok(tool_failure(
                message,
                json!({ "definitionInUse": { "id": id, "dependents": dependents } }),
            )),
            ToolError::EmptyPayload { .. } | ToolError::Remote(_) | ToolError::Json(_) => {
                Err(McpError::new(ErrorCode::INTERNAL_ERROR, message, None))
            }
        }
    }
}

fn tool_failure(message: String, details: serde_json::Value) -> CallToolResult {
    CallToolResult {
        content: vec![
            Content::text(message),
            Content::json(&details).unwrap_or(Content::text(details.to_string())),
        ],
        is_error: Some(true),
    }
}

/// An error in server initialization
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Two tools share the name `{0}`")]
    DuplicateTool(String),

    #[error("Missing configuration: set {0} or the matching `shop` key in the config file")]
    MissingConfig(&'static str),

    #[error("Could not bind server: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to initialize MCP service: {0}")]
    McpInitialize(Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to start server")]
    StartupError(#[from] JoinError),
}
