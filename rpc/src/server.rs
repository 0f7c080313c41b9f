//! Axum-based RPC server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use points_ledger::PointsLedger;
use points_store::GrantStore;
use tracing::{info, warn};

use crate::error::RpcError;
use crate::handlers;
use crate::metrics::RpcMetrics;

/// State shared by every request handler.
pub struct AppState<S> {
    pub ledger: PointsLedger<S>,
    pub metrics: RpcMetrics,
}

impl<S: GrantStore> AppState<S> {
    pub fn new(ledger: PointsLedger<S>) -> Self {
        Self {
            ledger,
            metrics: RpcMetrics::new(),
        }
    }

    /// Count and log a client error before it is returned.
    pub(crate) fn reject(&self, err: RpcError) -> RpcError {
        if err.is_rejection() {
            self.metrics.requests_rejected.inc();
            warn!("request rejected: {}", err);
        }
        err
    }
}

/// Build the HTTP router over a shared ledger.
pub fn router<S>(state: Arc<AppState<S>>) -> Router
where
    S: GrantStore + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handlers::home))
        .route("/add", post(handlers::add::<S>))
        .route("/spend", post(handlers::spend::<S>))
        .route("/balance", get(handlers::balance::<S>))
        .route("/metrics", get(handlers::metrics::<S>))
        .with_state(state)
}

pub struct RpcServer<S> {
    pub addr: SocketAddr,
    state: Arc<AppState<S>>,
}

impl<S> RpcServer<S>
where
    S: GrantStore + Send + Sync + 'static,
{
    pub fn new(addr: SocketAddr, state: Arc<AppState<S>>) -> Self {
        Self { addr, state }
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {}: {}", self.addr, e)))?;
        let local = listener
            .local_addr()
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!(addr = %local, "RPC server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;

        info!("RPC server stopped");
        Ok(())
    }
}
