//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use points_ledger::{FundsScope, LedgerError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedInput(_) => StatusCode::BAD_REQUEST,
            Self::Ledger(LedgerError::Storage(_)) | Self::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Ledger(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether the caller is at fault, as opposed to the server.
    pub fn is_rejection(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Message placed in the `error` field of the response body.
    ///
    /// Internal failures are reported generically; their detail goes to the log.
    fn client_message(&self) -> String {
        match self {
            Self::MalformedInput(msg) => msg.clone(),
            Self::Ledger(LedgerError::InvalidAmount(_)) => {
                "Invalid Request. 'points' cannot be non-positive.".into()
            }
            Self::Ledger(LedgerError::InsufficientFunds {
                scope: FundsScope::Payer(_),
                ..
            }) => "Not enough points to complete the transaction.".into(),
            Self::Ledger(LedgerError::InsufficientFunds {
                scope: FundsScope::AllPayers,
                ..
            }) => "Invalid request. Not enough points available to spend.".into(),
            Self::Ledger(LedgerError::Storage(_)) | Self::Server(_) => {
                "Internal server error.".into()
            }
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        let body = serde_json::json!({ "error": self.client_message() });
        (status, Json(body)).into_response()
    }
}
