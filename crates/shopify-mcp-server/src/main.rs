use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use shopify_admin_client::AdminClient;
use shopify_mcp_server::server::Server;
use tracing::{debug, info};

mod runtime;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the MCP server
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = STYLES,
    about = "Shopify Admin MCP Server - manage a Shopify store from an AI agent",
)]
struct Args {
    /// Path to the config file. Without one, configuration is read from
    /// SHOPIFY_MCP_* and SHOPIFY_* environment variables.
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: runtime::Config = match Args::parse().config {
        Some(config_path) => runtime::read_config(config_path)?,
        None => runtime::read_config_from_env()?,
    };

    let _guard = runtime::setup_logging(&config)?;

    info!(
        "Shopify Admin MCP Server v{} // Licensed under MIT",
        std::env!("CARGO_PKG_VERSION")
    );

    let admin_api = config.shop.admin_api_config()?;
    let client = AdminClient::new(&admin_api)?;
    debug!(endpoint = %client.endpoint(), api_version = %admin_api.api_version, "Admin API client ready");

    Ok(Server::builder()
        .transport(config.transport)
        .client(Arc::new(client))
        .build()
        .start()
        .await?)
}
