//! HTTPS server startup logic.
//!
//! Provisions the certificate, binds the TLS listener, prints the operator
//! banner once the socket is listening, and drives the lifecycle through to
//! `Stopped` after the shutdown signal.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;

use crate::banner;
use crate::cert::{self, CertError};
use crate::config::{AppConfig, HttpServerConfig, FALLBACK_HOST};
use crate::net;
use crate::routes::create_router;
use crate::state::AppState;
use crate::templates::init_templates;

use super::lifecycle::{Lifecycle, LifecycleError, ServerPhase};
use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to provision certificate: {0}")]
    Provision(#[from] CertError),

    #[error("Failed to initialize templates: {0}")]
    Template(#[from] tera::Error),

    #[error("Invalid listen address: {0}")]
    Address(String),

    #[error("Failed to load TLS configuration: {0}")]
    TlsConfig(String),

    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// A single HTTPS server run. Not restartable once stopped.
pub struct Server {
    config: Arc<AppConfig>,
    lifecycle: Lifecycle,
    handle: Handle,
}

impl Server {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            lifecycle: Lifecycle::new(),
            handle: Handle::new(),
        }
    }

    /// Lifecycle of this server, for observing phase changes.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Handle to the listener; `listening()` yields the bound address.
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Run until `shutdown` resolves, then drain in-flight connections.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.lifecycle.advance(ServerPhase::Provisioning)?;
        let paths = cert::ensure_certificate(&self.config.tls)?;

        let addr = listen_addr(&self.config.http)?;
        let state = AppState::new(self.config.clone(), init_templates()?);
        let app = create_router(state);

        install_crypto_provider();
        let rustls_config = RustlsConfig::from_pem_file(&paths.cert, &paths.key)
            .await
            .map_err(|e| ServerError::TlsConfig(format!("Failed to load certificates: {}", e)))?;

        tracing::info!(
            %addr,
            cert = %paths.cert.display(),
            key = %paths.key.display(),
            root = %self.config.serve.root.display(),
            "Starting HTTPS server"
        );

        tokio::spawn(supervise(
            self.handle.clone(),
            self.lifecycle.clone(),
            shutdown,
        ));

        axum_server::bind_rustls(addr, rustls_config)
            .handle(self.handle.clone())
            .serve(app.into_make_service())
            .await?;

        self.lifecycle.advance(ServerPhase::Stopped)?;
        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Start the HTTPS server and block until Ctrl+C or SIGTERM.
pub async fn start_server(config: AppConfig) -> Result<(), ServerError> {
    Server::new(config).run(shutdown::shutdown_signal()).await
}

/// Waits for the listener, announces it, then turns the shutdown signal into
/// a graceful shutdown.
async fn supervise<F>(handle: Handle, lifecycle: Lifecycle, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    // None means the bind failed; `run` reports that error.
    let Some(addr) = handle.listening().await else {
        return;
    };

    if let Err(e) = lifecycle.advance(ServerPhase::Listening) {
        tracing::error!(error = %e, "Unexpected lifecycle state");
        return;
    }
    tracing::info!(%addr, "HTTPS server listening");

    let lan_host = tokio::task::spawn_blocking(net::local_ip)
        .await
        .unwrap_or_else(|_| FALLBACK_HOST.to_string());
    banner::print_banner(&lan_host, addr.port());

    shutdown.await;

    if let Err(e) = lifecycle.advance(ServerPhase::ShuttingDown) {
        tracing::error!(error = %e, "Unexpected lifecycle state");
    }
    banner::print_shutdown();

    // No drain timeout: in-flight responses are allowed to complete.
    handle.graceful_shutdown(None);
}

fn listen_addr(http: &HttpServerConfig) -> Result<SocketAddr, ServerError> {
    let ip: IpAddr = http
        .host
        .parse()
        .map_err(|e| ServerError::Address(format!("{}: {}", http.host, e)))?;
    Ok(SocketAddr::new(ip, http.port))
}

/// Both rustls backends can end up in the dependency graph; pick one for the
/// process so `ServerConfig::builder()` does not have to guess.
///
/// Installing fails once a provider is already in place, which happens for
/// every server after the first in the same process.
fn install_crypto_provider() {
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_provider_install_is_repeatable() {
        install_crypto_provider();
        install_crypto_provider();
        assert!(rustls::crypto::CryptoProvider::get_default().is_some());
    }

    #[test]
    fn test_listen_addr_ipv4() {
        let addr = listen_addr(&HttpServerConfig::default()).unwrap();
        assert_eq!(addr, "0.0.0.0:8443".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_listen_addr_ipv6() {
        let http = HttpServerConfig {
            host: "::".to_string(),
            port: 9000,
        };
        let addr = listen_addr(&http).unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn test_listen_addr_rejects_hostname() {
        let http = HttpServerConfig {
            host: "example.com".to_string(),
            port: 8443,
        };
        assert!(matches!(listen_addr(&http), Err(ServerError::Address(_))));
    }
}
