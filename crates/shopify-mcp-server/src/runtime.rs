//! Runtime utilites
//!
//! This module is only used by the binaries and provides helper code
//! related to runtime configuration.

mod config;
mod logging;
mod shop;

use std::path::Path;

pub use config::Config;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
pub use logging::Logging;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Separator to use when drilling down into nested options in the env figment
const ENV_NESTED_SEPARATOR: &str = "__";

/// Prefix for environment variables that mirror the config file
const ENV_PREFIX: &str = "SHOPIFY_MCP_";

/// Read configuration from environment variables only (when no config file is provided)
#[allow(clippy::result_large_err)]
pub fn read_config_from_env() -> Result<Config, figment::Error> {
    Figment::new()
        .join(shopify_common_env())
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .extract()
}

/// Read in a config from a YAML file, filling in any missing values from the environment
#[allow(clippy::result_large_err)]
pub fn read_config(yaml_path: impl AsRef<Path>) -> Result<Config, figment::Error> {
    Figment::new()
        .join(shopify_common_env())
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .join(Yaml::file(yaml_path))
        .extract()
}

/// Install the global subscriber. The returned guard must live as long as
/// file logging is needed.
pub fn setup_logging(config: &Config) -> Result<Option<WorkerGuard>, anyhow::Error> {
    let env_filter = Logging::env_filter(&config.logging)?;
    let (logging_layer, logging_guard) = Logging::logging_layer(&config.logging)?;

    tracing_subscriber::registry()
        .with(logging_layer)
        .with(env_filter)
        .init();

    Ok(logging_guard)
}

/// Figment provider that maps the conventional Shopify environment variables
/// into the nested `shop` section of the config
fn shopify_common_env() -> Env {
    Env::prefixed("SHOPIFY_")
        .only(&["store_url", "access_token", "api_version"])
        .map(|key| match key.to_string().to_lowercase().as_str() {
            "store_url" => "SHOP:STORE_URL".into(),
            "access_token" => "SHOP:ACCESS_TOKEN".into(),
            "api_version" => "SHOP:API_VERSION".into(),

            // Filtered by `only` above
            other => other.to_string().into(),
        })
        .split(":")
}

#[cfg(test)]
mod test {
    use secrecy::ExposeSecret;
    use shopify_mcp_server::server::Transport;

    use super::{read_config, read_config_from_env};

    #[test]
    fn it_prioritizes_env_vars() {
        let config = r#"
            shop:
                store_url: https://from-file.myshopify.com
        "#;

        figment::Jail::expect_with(move |jail| {
            let path = "config.yaml";
            let store_url = "https://from-env.myshopify.com/";

            jail.create_file(path, config)?;
            jail.set_env("SHOPIFY_MCP_SHOP__STORE_URL", store_url);

            let config = read_config(path)?;

            assert_eq!(
                config.shop.store_url.as_ref().map(|url| url.as_str()),
                Some(store_url)
            );
            Ok(())
        });
    }

    #[test]
    fn it_reads_shopify_shorthands() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SHOPIFY_STORE_URL", "https://my-store.myshopify.com");
            jail.set_env("SHOPIFY_ACCESS_TOKEN", "shpat_from_env");
            jail.set_env("SHOPIFY_API_VERSION", "2025-04");

            let config = read_config_from_env()?;

            assert_eq!(
                config
                    .shop
                    .access_token
                    .as_ref()
                    .map(|token| token.expose_secret().to_string()),
                Some("shpat_from_env".to_string())
            );
            assert_eq!(config.shop.api_version.as_deref(), Some("2025-04"));
            Ok(())
        });
    }

    #[test]
    fn it_extracts_nested_env() {
        let config = r#"
            transport:
                type: streamable_http
                port: 8000
        "#;

        figment::Jail::expect_with(move |jail| {
            let path = "config.yaml";

            jail.create_file(path, config)?;
            jail.set_env("SHOPIFY_MCP_TRANSPORT__PORT", "9000");

            let config = read_config(path)?;

            assert!(matches!(
                config.transport,
                Transport::StreamableHttp { port: 9000, .. }
            ));
            Ok(())
        });
    }

    #[test]
    fn it_merges_env_and_file() {
        let config = "
            shop:
                store_url: https://from-file.myshopify.com/
        ";

        figment::Jail::expect_with(move |jail| {
            let path = "config.yaml";

            jail.create_file(path, config)?;
            jail.set_env("SHOPIFY_ACCESS_TOKEN", "shpat_from_env");
            jail.set_env("SHOPIFY_MCP_LOGGING__LEVEL", "debug");

            let config = read_config(path)?;

            assert_eq!(
                config.shop.store_url.as_ref().map(|url| url.as_str()),
                Some("https://from-file.myshopify.com/")
            );
            assert!(config.shop.access_token.is_some());
            assert_eq!(config.logging.level, tracing::Level::DEBUG);
            Ok(())
        });
    }
}
