use secrecy::{ExposeSecret, SecretString};
use std::fmt::Debug;
use std::time::Duration;
use url::Url;

use crate::error::ClientError;

/// The Admin API version used when none is configured
pub const DEFAULT_API_VERSION: &str = "2025-01";

/// The HTTP timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a single store's GraphQL Admin API.
#[derive(Clone, Debug)]
pub struct AdminApiConfig {
    /// The base address of the store, e.g. `https://my-store.myshopify.com`
    pub store_url: Url,

    /// The dated Admin API version, e.g. `2025-01`
    pub api_version: String,

    /// The Admin API access token sent as `X-Shopify-Access-Token`
    pub access_token: SecretString,

    /// The HTTP client timeout for each request
    pub timeout: Duration,
}

impl AdminApiConfig {
    /// Creates a new `AdminApiConfig`, falling back to the default API version and timeout.
    pub fn new(
        store_url: Url,
        access_token: SecretString,
        api_version: Option<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            store_url,
            api_version: api_version.unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            access_token,
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }

    /// The GraphQL endpoint for the configured store and API version.
    pub fn graphql_endpoint(&self) -> Result<Url, ClientError> {
        if self.api_version.trim().is_empty() {
            return Err(ClientError::NotConfigured("api_version"));
        }
        if self.store_url.cannot_be_a_base() {
            return Err(ClientError::NotConfigured("store_url"));
        }
        // Without a trailing slash, `join` would replace the last path segment
        let mut base = self.store_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        base.join(&format!("admin/api/{}/graphql.json", self.api_version.trim()))
            .map_err(|_| ClientError::NotConfigured("store_url"))
    }

    pub(crate) fn has_access_token(&self) -> bool {
        !self.access_token.expose_secret().trim().is_empty()
    }
}
