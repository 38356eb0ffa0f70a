//! Execute Admin API operations as MCP tools

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shopify_admin_client::{AdminApi, GraphqlRequest, request};
use tracing::debug;

use crate::errors::{ToolError, UserError};
use crate::normalize::{Page, normalize};
use crate::schema_from_type;
use crate::validation::{Validate, parse_arguments};

/// A GraphQL document holding exactly one named operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document {
    pub operation_name: &'static str,
    pub source: &'static str,
}

impl Document {
    /// Build a request for this document, serializing the typed variables
    pub fn request<V: Serialize + ?Sized>(&self, variables: &V) -> Result<GraphqlRequest, ToolError> {
        Ok(request(
            self.source,
            self.operation_name,
            serde_json::to_value(variables)?,
        ))
    }
}

/// A single Admin API operation exposed as a tool.
///
/// Implementations declare their input type and map a validated input to one
/// remote request (or a small, bounded sequence of them). An operation only
/// becomes callable once [`Operation::bind`] hands it a client.
#[async_trait]
pub trait Operation: Send + Sync + Sized + 'static {
    /// The stable tool name
    const NAME: &'static str;

    const DESCRIPTION: &'static str;

    /// Whether the tool only reads from the store
    const READ_ONLY: bool;

    type Input: DeserializeOwned + JsonSchema + Validate + Send + 'static;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError>;

    /// The MCP tool definition, with the input schema generated from [`Operation::Input`]
    fn tool() -> Tool {
        Tool::new(
            Self::NAME,
            Self::DESCRIPTION,
            schema_from_type!(Self::Input),
        )
        .annotate(ToolAnnotations::new().read_only(Self::READ_ONLY))
    }

    /// Bind this operation to the client it will call
    fn bind(self, client: Arc<dyn AdminApi>) -> Box<dyn ToolDescriptor> {
        Box::new(BoundOperation {
            tool: Self::tool(),
            operation: self,
            client,
        })
    }
}

/// A callable tool: its MCP definition plus an entry point taking raw arguments
#[async_trait]
pub trait ToolDescriptor: Send + Sync {
    fn tool(&self) -> &Tool;

    async fn call(&self, arguments: Option<JsonObject>) -> Result<Value, ToolError>;
}

struct BoundOperation<O> {
    tool: Tool,
    operation: O,
    client: Arc<dyn AdminApi>,
}

#[async_trait]
impl<O: Operation> ToolDescriptor for BoundOperation<O> {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Option<JsonObject>) -> Result<Value, ToolError> {
        let input: O::Input = parse_arguments(arguments.map(Value::Object).unwrap_or(Value::Null))?;
        input.validate()?;

        debug!(tool = O::NAME, "Executing tool");
        self.operation.execute(self.client.as_ref(), input).await
    }
}

/// Run a query and return its raw `data`
pub async fn query<V: Serialize + Sync + ?Sized>(
    client: &dyn AdminApi,
    document: &Document,
    variables: &V,
) -> Result<Value, ToolError> {
    Ok(client.execute(&document.request(variables)?).await?)
}

/// Run a query for a single resource. A null root field means the resource does not exist.
pub async fn fetch_one<V: Serialize + Sync + ?Sized>(
    client: &dyn AdminApi,
    document: &Document,
    variables: &V,
    root: &str,
    resource: &'static str,
    id: &str,
) -> Result<Value, ToolError> {
    match take(query(client, document, variables).await?, root) {
        Value::Null => Err(ToolError::NotFound {
            resource,
            id: id.to_string(),
        }),
        found => Ok(normalize(found)),
    }
}

/// Run a query whose root field is a connection and return it as a [`Page`].
///
/// A root that is null or not a connection is an empty payload error.
pub async fn fetch_page<V: Serialize + Sync + ?Sized>(
    client: &dyn AdminApi,
    document: &Document,
    variables: &V,
    root: &'static str,
) -> Result<Page, ToolError> {
    let connection = take(query(client, document, variables).await?, root);
    Page::from_connection(connection).ok_or(ToolError::EmptyPayload {
        operation: root,
        payload: "edges",
    })
}

/// Run a mutation and return its normalized payload.
///
/// Any user errors fail the call with every message reported. A response with
/// neither user errors nor the expected payload is an empty payload error.
pub async fn mutate<V: Serialize + Sync + ?Sized>(
    client: &dyn AdminApi,
    document: &Document,
    variables: &V,
    root: &'static str,
    payload: &'static str,
) -> Result<Value, ToolError> {
    let mut result = take(query(client, document, variables).await?, root);
    check_user_errors(root, &mut result)?;

    match take(result, payload) {
        Value::Null => Err(ToolError::EmptyPayload {
            operation: root,
            payload,
        }),
        found => Ok(normalize(found)),
    }
}

fn check_user_errors(operation: &'static str, result: &mut Value) -> Result<(), ToolError> {
    let errors = match result.as_object_mut().and_then(|result| result.remove("userErrors")) {
        Some(Value::Array(errors)) if !errors.is_empty() => errors,
        _ => return Ok(()),
    };
    let errors: Vec<UserError> = serde_json::from_value(Value::Array(errors))?;
    Err(ToolError::UserErrors { operation, errors })
}

/// Remove a field from an object, yielding null if it is absent
pub(crate) fn take(value: Value, field: &str) -> Value {
    match value {
        Value::Object(mut map) => map.remove(field).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
