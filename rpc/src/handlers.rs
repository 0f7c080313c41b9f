//! RPC request handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use points_ledger::SpendReceipt;
use points_store::{Balances, GrantStore};
use points_types::{PayerId, Timestamp};

use crate::error::RpcError;
use crate::server::AppState;

const ADD_USAGE: &str =
    "Invalid Request. Please provide 'payer', 'points', and 'timestamp' in the JSON body.";
const SPEND_USAGE: &str = "Invalid Request. Please provide 'points' in the JSON body.";
const TIMESTAMP_USAGE: &str =
    "Invalid Request. 'timestamp' must be in 'YYYY-MM-DDTHH:MM:SS' format.";

// ── Home ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn home() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello World!".into(),
    })
}

// ── Add ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub payer: String,
    pub points: i64,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddResponse {
    pub message: String,
    pub id: u64,
}

pub async fn add<S>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<AddRequest>, JsonRejection>,
) -> Result<Json<AddResponse>, RpcError>
where
    S: GrantStore + Send + Sync + 'static,
{
    let Json(req) = payload.map_err(|e| {
        debug!("add: unreadable body: {}", e);
        state.reject(RpcError::MalformedInput(ADD_USAGE.into()))
    })?;
    let payer = PayerId::parse(req.payer).map_err(|e| {
        state.reject(RpcError::MalformedInput(format!("Invalid Request. {}.", e)))
    })?;
    let occurred_at = parse_timestamp(&req.timestamp).map_err(|e| state.reject(e))?;
    let points = req.points;

    let worker = Arc::clone(&state);
    let id = tokio::task::spawn_blocking(move || worker.ledger.submit(payer, points, occurred_at))
        .await
        .map_err(|e| RpcError::Server(e.to_string()))?
        .map_err(|e| state.reject(e.into()))?;

    if points < 0 {
        state.metrics.clawbacks.inc();
    } else {
        state.metrics.grants_submitted.inc();
    }
    Ok(Json(AddResponse {
        message: "Transaction created successfully.".into(),
        id: id.as_u64(),
    }))
}

// ── Spend ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SpendRequest {
    pub points: i64,
}

pub async fn spend<S>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<SpendRequest>, JsonRejection>,
) -> Result<Json<SpendReceipt>, RpcError>
where
    S: GrantStore + Send + Sync + 'static,
{
    let Json(req) = payload.map_err(|e| {
        debug!("spend: unreadable body: {}", e);
        state.reject(RpcError::MalformedInput(SPEND_USAGE.into()))
    })?;
    let amount = req.points;

    let worker = Arc::clone(&state);
    let receipt = tokio::task::spawn_blocking(move || worker.ledger.spend(amount))
        .await
        .map_err(|e| RpcError::Server(e.to_string()))?
        .map_err(|e| state.reject(e.into()))?;

    state.metrics.spends.inc();
    state.metrics.points_spent.inc_by(receipt.total());
    Ok(Json(receipt))
}

// ── Balance ──────────────────────────────────────────────────────────────

pub async fn balance<S>(State(state): State<Arc<AppState<S>>>) -> Result<Json<Balances>, RpcError>
where
    S: GrantStore + Send + Sync + 'static,
{
    let balances = tokio::task::spawn_blocking(move || state.ledger.balances())
        .await
        .map_err(|e| RpcError::Server(e.to_string()))??;
    Ok(Json(balances))
}

// ── Metrics ──────────────────────────────────────────────────────────────

pub async fn metrics<S>(State(state): State<Arc<AppState<S>>>) -> Result<impl IntoResponse, RpcError>
where
    S: GrantStore + Send + Sync + 'static,
{
    let body = state
        .metrics
        .encode()
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

// ── Timestamps ───────────────────────────────────────────────────────────

/// Parse a request timestamp to whole seconds since the Unix epoch.
///
/// Accepts RFC 3339 (`2020-11-02T14:00:00Z`, `2020-11-02T14:00:00+02:00`) and
/// naive ISO-8601 date-times or dates, which are read as UTC. Fractional
/// seconds are truncated.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, RpcError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Timestamp::new(dt.timestamp()));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Timestamp::new(dt.and_utc().timestamp()));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Timestamp::new(dt.and_utc().timestamp()))
        .ok_or_else(|| RpcError::MalformedInput(TIMESTAMP_USAGE.into()))
}
