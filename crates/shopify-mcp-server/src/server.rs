use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use bon::bon;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::StreamableHttpService;
use schemars::JsonSchema;
use serde::Deserialize;
use shopify_admin_client::AdminApi;
use tracing::{error, info};

use crate::errors::ServerError;
use crate::registry::ToolRegistry;
use crate::server_handler::ShopifyMcpServerHandler;

/// A Shopify Admin MCP Server
pub struct Server {
    transport: Transport,
    client: Arc<dyn AdminApi>,
}

/// How the server talks to MCP clients
#[derive(Debug, Clone, Default, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transport {
    /// Standard input and output, for clients that launch the server as a subprocess
    #[default]
    Stdio,

    /// Streamable HTTP, served at `/mcp`
    StreamableHttp {
        #[serde(default = "defaults::address")]
        address: IpAddr,

        #[serde(default = "defaults::port")]
        port: u16,
    },
}

mod defaults {
    use super::*;

    pub(super) fn address() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    pub(super) fn port() -> u16 {
        5000
    }
}

#[bon]
impl Server {
    #[builder]
    pub fn new(transport: Transport, client: Arc<dyn AdminApi>) -> Self {
        Self { transport, client }
    }

    pub async fn start(self) -> Result<(), ServerError> {
        let registry = Arc::new(ToolRegistry::new(self.client)?);
        info!(tools = registry.len(), "Tool registry ready");
        let handler = ShopifyMcpServerHandler::new(registry);

        match self.transport {
            Transport::StreamableHttp { address, port } => {
                info!(port = ?port, address = ?address, "Starting MCP server in Streamable HTTP mode");
                let listen_address = SocketAddr::new(address, port);
                let service = StreamableHttpService::new(
                    move || Ok(handler.clone()),
                    LocalSessionManager::default().into(),
                    Default::default(),
                );
                let router = axum::Router::new().nest_service("/mcp", service);
                let tcp_listener = tokio::net::TcpListener::bind(listen_address).await?;
                axum::serve(tcp_listener, router)
                    .with_graceful_shutdown(shutdown_signal())
                    .await?;
                info!("MCP server stopped");
            }
            Transport::Stdio => {
                info!("Starting MCP server in stdio mode");
                let service = handler
                    .serve(stdio())
                    .await
                    .inspect_err(|e| {
                        error!("serving error: {:?}", e);
                    })
                    .map_err(|e| ServerError::McpInitialize(Box::new(e)))?;
                service.waiting().await.map_err(ServerError::StartupError)?;
            }
        }

        Ok(())
    }
}

#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
