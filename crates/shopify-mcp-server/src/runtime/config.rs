use schemars::JsonSchema;
use serde::Deserialize;
use shopify_mcp_server::server::Transport;

use super::{logging::Logging, shop::ShopConfig};

/// Configuration for the MCP server
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: Logging,

    /// The store to manage and how to reach its Admin API
    pub shop: ShopConfig,

    /// The type of server transport to use
    pub transport: Transport,
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    fn it_parses_a_minimal_config() {
        serde_json::from_str::<Config>("{}").unwrap();
    }

    #[test]
    fn it_contains_no_keys_with_double_underscore() {
        // Env variables use __ to reach nested fields, so no field name may contain it.
        // See [runtime::read_config]
        let schema = schemars::schema_for!(Config).to_value().to_string();

        assert!(!schema.contains("__"))
    }
}
