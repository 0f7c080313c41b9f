//! HTTP JSON server for the points ledger.
//!
//! Provides endpoints for:
//! - Recording grants and clawbacks (`POST /add`)
//! - Spending points oldest-first (`POST /spend`)
//! - Per-payer balances (`GET /balance`)
//! - Prometheus metrics (`GET /metrics`)

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;

pub use error::RpcError;
pub use metrics::RpcMetrics;
pub use server::{router, AppState, RpcServer};
