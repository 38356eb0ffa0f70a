use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;
use shopify_admin_client::{AdminApiConfig, SecretString};
use shopify_mcp_server::errors::ServerError;
use url::Url;

const STORE_URL_ENV: &str = "SHOPIFY_STORE_URL";
const ACCESS_TOKEN_ENV: &str = "SHOPIFY_ACCESS_TOKEN";

/// Connection settings for the store's Admin API
#[derive(Debug, Deserialize, Default, JsonSchema)]
#[serde(default)]
pub struct ShopConfig {
    /// The store's base address, e.g. `https://my-store.myshopify.com`
    pub store_url: Option<Url>,

    /// The Admin API access token
    #[schemars(with = "Option<String>")]
    pub access_token: Option<SecretString>,

    /// The dated Admin API version
    /// [default: 2025-01]
    pub api_version: Option<String>,

    /// Timeout for each Admin API request, in seconds
    /// [default: 30]
    pub timeout: Option<u64>,
}

impl ShopConfig {
    /// Build the client settings, failing if the store or token is missing
    pub fn admin_api_config(&self) -> Result<AdminApiConfig, ServerError> {
        let store_url = self
            .store_url
            .clone()
            .ok_or(ServerError::MissingConfig(STORE_URL_ENV))?;
        let access_token = self
            .access_token
            .clone()
            .ok_or(ServerError::MissingConfig(ACCESS_TOKEN_ENV))?;

        Ok(AdminApiConfig::new(
            store_url,
            access_token,
            self.api_version.clone(),
            self.timeout.map(Duration::from_secs),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_requires_a_token() {
        let shop = ShopConfig {
            store_url: Some(Url::parse("https://my-store.myshopify.com").unwrap()),
            ..Default::default()
        };

        assert!(matches!(
            shop.admin_api_config(),
            Err(ServerError::MissingConfig(ACCESS_TOKEN_ENV))
        ));
    }

    #[test]
    fn it_fills_in_defaults() {
        let shop = ShopConfig {
            store_url: Some(Url::parse("https://my-store.myshopify.com").unwrap()),
            access_token: Some(SecretString::from("shpat_test")),
            ..Default::default()
        };

        let config = shop.admin_api_config().unwrap();

        assert_eq!(config.api_version, "2025-01");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
