pub mod admission_review;
mod api;
mod certs;
pub mod cli;
pub mod codec;
pub mod config;
pub mod mutation;
pub mod tracing;

use std::{sync::Arc, time::Duration};

use ::tracing::{debug, error, info};
use anyhow::{anyhow, Result};
use axum::{
    routing::{get, post},
    Router,
};
use axum_server::Handle;
use tokio::signal;
use tower_http::trace::TraceLayer;

use api::{handlers, state::ApiServerState};
use codec::{Codec, KindRegistry};
use config::Config;

pub fn run(config: Config) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        tracing::setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;
        debug!("tracing system ready");

        WebhookServer::new(config).run().await
    })
}

pub struct WebhookServer {
    addr: std::net::SocketAddr,
    tls_config: Option<config::TlsConfig>,
    state: Arc<ApiServerState>,
}

impl WebhookServer {
    pub fn new(config: Config) -> Self {
        // the kind registry is built once here and read-only afterwards
        let state = Arc::new(ApiServerState {
            codec: Codec::new(KindRegistry::webhook_defaults()),
            rule: config.rule,
        });

        WebhookServer {
            addr: config.addr,
            tls_config: config.tls_config,
            state,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/mutate", post(handlers::mutate_handler))
            .route("/readiness", get(handlers::readiness_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve until a termination signal arrives, then stop accepting new
    /// connections and drain the in-flight requests.
    pub async fn run(self) -> Result<()> {
        let handle = Handle::new();
        tokio::spawn(wait_for_shutdown_signal(handle.clone()));

        let router = self.router();
        match self.tls_config {
            Some(tls_config) => {
                // a broken certificate source is fatal: limping on without
                // TLS would only postpone the failure to the first request
                let rustls_config = certs::build_tls_config(&tls_config)
                    .await
                    .map_err(|e| anyhow!("cannot load TLS credentials: {e}"))?;

                info!(address = %self.addr, "started HTTPS webhook server");
                axum_server::bind_rustls(self.addr, rustls_config)
                    .handle(handle)
                    .serve(router.into_make_service())
                    .await?;
            }
            None => {
                info!(address = %self.addr, "started HTTP webhook server");
                axum_server::bind(self.addr)
                    .handle(handle)
                    .serve(router.into_make_service())
                    .await?;
            }
        }

        info!("webhook server stopped");
        Ok(())
    }
}

async fn wait_for_shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "cannot install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining in-flight requests");
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
