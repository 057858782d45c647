//! Web server
//!
//! Serves the applicant form, the result page, the report download and a
//! small JSON API. The explain context is built before the listener binds, so
//! no request can observe partially loaded artifacts.

mod api;
mod error;
mod handlers;
pub mod page;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use crate::pipeline::ExplainContext;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
        }
    }
}

impl ServerConfig {
    /// `API_HOST` / `API_PORT` defaults with explicit values taking precedence
    pub fn with_overrides(host: Option<String>, port: Option<u16>) -> Self {
        let defaults = Self::default();
        Self {
            host: host.unwrap_or(defaults.host),
            port: port.unwrap_or(defaults.port),
        }
    }
}

/// Start the server with the given configuration and loaded context
pub async fn run_server(config: ServerConfig, context: ExplainContext) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    let state = Arc::new(AppState::new(context));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        address = %addr,
        started_at = %start_time.to_rfc3339(),
        "Loan risk explainer starting"
    );
    info!(url = %format!("http://{}", addr), "Web form available");
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    // Graceful shutdown on ctrl+c
    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert!(!config.host.is_empty());
        assert!(config.port > 0);
    }

    #[test]
    fn test_overrides_fall_back_to_defaults() {
        assert_eq!(ServerConfig::with_overrides(None, None), ServerConfig::default());

        let config = ServerConfig::with_overrides(Some("127.0.0.1".to_string()), Some(9000));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);

        let config = ServerConfig::with_overrides(None, Some(9001));
        assert_eq!(config.host, ServerConfig::default().host);
        assert_eq!(config.port, 9001);
    }
}
