pub mod api;
pub mod page;

use crate::cli::Args;
use self::api::AppState;
use axum_server::tls_rustls::RustlsConfig;
use log::{ error, info };
use std::error::Error;
use std::net::SocketAddr;

pub struct Server {
    addr: String,
    state: AppState,
    args: Args,
}

impl Server {
    pub fn new(addr: String, state: AppState, args: Args) -> Self {
        Self { addr, state, args }
    }

    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let app = api::router(self.state);

        if self.args.enable_tls {
            let (cert_path, key_path) = match (&self.args.tls_cert_path, &self.args.tls_key_path) {
                (Some(cert), Some(key)) => (cert, key),
                (Some(_), None) | (None, Some(_)) => {
                    error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                    return Err("Missing TLS certificate or key path".into());
                }
                (None, None) => {
                    error!("--enable-tls was set but no certificate/key paths provided.");
                    return Err("TLS enabled without cert/key".into());
                }
            };
            info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
            let tls_config = RustlsConfig::from_pem_file(cert_path, key_path).await?;

            info!("HTTPS server listening on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        } else {
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                e
            })?;
            info!("HTTP server listening on: http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}
