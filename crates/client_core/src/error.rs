use shared::error::ErrorCode;
use thiserror::Error;

/// Failure of a single content API request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to {path} failed: {message}")]
    Transport { path: String, message: String },
    #[error("{path} returned HTTP {status}")]
    Status {
        path: String,
        status: u16,
        detail: Option<String>,
    },
    #[error("failed to decode {path} response: {message}")]
    Decode { path: String, message: String },
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Status { status, .. } => ErrorCode::from_status(*status),
            _ => ErrorCode::Unexpected,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == ErrorCode::NotFound
    }

    /// Server-provided `detail`, if the error body carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }
}
