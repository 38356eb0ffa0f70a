//! Execute GraphQL documents against the Admin API

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::AdminApiConfig;
use crate::error::ClientError;

const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";

/// A single GraphQL request: document, operation name and variables.
pub type GraphqlRequest = graphql_client::QueryBody<Value>;

/// Builds a request for a named operation.
pub fn request(query: &'static str, operation_name: &'static str, variables: Value) -> GraphqlRequest {
    GraphqlRequest {
        variables,
        query,
        operation_name,
    }
}

/// Able to execute a GraphQL request against the Admin API.
///
/// Implementations return the `data` member of a response. They perform no
/// retries and never interpret the payload.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn execute(&self, request: &GraphqlRequest) -> Result<Value, ClientError>;
}

/// The reqwest-backed Admin API client.
#[derive(Clone, Debug)]
pub struct AdminClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: SecretString,
}

impl AdminClient {
    /// Creates a client for a fully configured store.
    ///
    /// Fails if the access token is blank or no endpoint can be derived from
    /// the store URL and API version.
    pub fn new(config: &AdminApiConfig) -> Result<Self, ClientError> {
        if !config.has_access_token() {
            return Err(ClientError::NotConfigured("access_token"));
        }
        let endpoint = config.graphql_endpoint()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_token: config.access_token.clone(),
        })
    }

    /// The GraphQL endpoint this client posts to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn headers(&self) -> Result<HeaderMap, ClientError> {
        let mut token = HeaderValue::from_str(self.access_token.expose_secret())?;
        token.set_sensitive(true);

        Ok(HeaderMap::from_iter(vec![
            (CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (HeaderName::from_static(ACCESS_TOKEN_HEADER), token),
        ]))
    }
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn execute(&self, request: &GraphqlRequest) -> Result<Value, ClientError> {
        debug!(
            operation = request.operation_name,
            endpoint = %self.endpoint,
            "Sending Admin API request"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ClientError::Unauthorized(status));
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status { status, body });
        }

        let response_body: graphql_client::Response<Value> = serde_json::from_str(&body)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;

        if let Some(errors) = response_body.errors.filter(|errors| !errors.is_empty()) {
            return Err(ClientError::GraphQL(
                errors.into_iter().map(|error| error.message).collect(),
            ));
        }

        response_body
            .data
            .filter(|data| !data.is_null())
            .ok_or(ClientError::MissingData)
    }
}
