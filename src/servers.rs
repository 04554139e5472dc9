//! Running the HTTP listener

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use tracing::{error, info};

use crate::config::ConfigFile;
use crate::error::ZipApiError;

/// How long in-flight requests get to finish once shutdown starts
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

async fn shutdown_signal(handle: Handle<SocketAddr>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {err}");
        return;
    }
    info!("Shutdown requested, finishing in-flight requests");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}

/// Serve the API until ctrl-c, over HTTPS when a cert and key are configured.
pub async fn api_server(config: &ConfigFile, router: Router) -> Result<(), ZipApiError> {
    let addr: SocketAddr = config.api_listener_address().parse().map_err(|err| {
        ZipApiError::StartupError(format!(
            "Failed to parse listen address {:?}: {err}",
            config.api_listener_address()
        ))
    })?;

    let handle: Handle<SocketAddr> = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    match (&config.api_tls_cert, &config.api_tls_key) {
        (Some(cert), Some(key)) => {
            // more than one provider ends up compiled in, so rustls needs telling
            if rustls::crypto::aws_lc_rs::default_provider()
                .install_default()
                .is_err()
            {
                info!("rustls crypto provider was already installed");
            }
            let tls_config = RustlsConfig::from_pem_file(cert, key)
                .await
                .map_err(|err| {
                    ZipApiError::StartupError(format!("Failed to load TLS cert/key: {err}"))
                })?;
            info!("Started API server on https://{addr}");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
        _ => {
            info!("Started API server on http://{addr}");
            axum_server::bind(addr)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
    }

    info!("API server stopped");
    Ok(())
}
