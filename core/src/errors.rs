use crate::parser::ParserError;
use crate::token::TokenError;
use crate::transfer::TransferError;
use alloy::primitives::{TxHash, U256};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Internal server error")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Contract not deployed or loaded")]
    ContractNotReady,

    #[error("Insufficient balance in from address. Balance: {observed}, required: {required}")]
    InsufficientBalance { observed: U256, required: U256 },

    #[error("Insufficient allowance. Current: {observed}, required: {required}")]
    InsufficientAllowance { observed: U256, required: U256 },

    #[error("{message}")]
    ExecutionFailed {
        message: String,
        status: Option<String>,
        tx_hash: Option<TxHash>,
    },

    #[error("Blockchain RPC failure: {0}")]
    Transport(String),

    #[error("{message}")]
    Timeout {
        message: String,
        tx_hash: Option<TxHash>,
    },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ContractNotReady => StatusCode::SERVICE_UNAVAILABLE,
            Self::InsufficientBalance { .. } | Self::InsufficientAllowance { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::ExecutionFailed { .. } => StatusCode::CONFLICT,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::ContractNotReady => "CONTRACT_NOT_READY",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "INSUFFICIENT_ALLOWANCE",
            Self::ExecutionFailed { .. } => "EXECUTION_FAILED",
            Self::Transport(_) => "TRANSPORT_FAILURE",
            Self::Timeout { .. } => "TIMEOUT",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::InsufficientBalance { observed, required }
            | Self::InsufficientAllowance { observed, required } => Some(json!({
                "observed": observed.to_string(),
                "required": required.to_string(),
            })),
            Self::ExecutionFailed {
                status, tx_hash, ..
            } => Some(json!({
                "status": status,
                "transactionHash": tx_hash.as_ref().map(|h| h.to_string()),
            })),
            Self::Timeout {
                tx_hash: Some(hash),
                ..
            } => Some(json!({ "transactionHash": hash.to_string() })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = Json(ErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
            details: self.details(),
        });

        (status, body).into_response()
    }
}

impl From<ParserError> for AppError {
    fn from(err: ParserError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::ContractNotReady => Self::ContractNotReady,
            TokenError::Transport(msg) => Self::Transport(msg),
            TokenError::Reverted { .. } => Self::ExecutionFailed {
                message: err.to_string(),
                status: None,
                tx_hash: None,
            },
            TokenError::Timeout => Self::Timeout {
                message: err.to_string(),
                tx_hash: None,
            },
            TokenError::ReceiptTimeout { tx_hash } => Self::Timeout {
                message: err.to_string(),
                tx_hash: Some(tx_hash),
            },
            TokenError::NoContractCode(_) => Self::BadRequest(err.to_string()),
            TokenError::DeploymentFailed { tx_hash, .. } => Self::ExecutionFailed {
                message: err.to_string(),
                status: None,
                tx_hash,
            },
            TokenError::InvalidSettings(msg) => Self::Internal(msg),
        }
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::InsufficientBalance { observed, required } => {
                Self::InsufficientBalance { observed, required }
            }
            TransferError::InsufficientAllowance { observed, required } => {
                Self::InsufficientAllowance { observed, required }
            }
            TransferError::ExecutionFailed {
                ref status,
                tx_hash,
                ..
            } => Self::ExecutionFailed {
                message: err.to_string(),
                status: status.clone(),
                tx_hash,
            },
            TransferError::Token(inner) => inner.into(),
        }
    }
}
