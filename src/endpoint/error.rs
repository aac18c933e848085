//! Endpoint error types

use thiserror::Error;

/// Endpoint error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EndpointError {
    pub kind: EndpointErrorKind,
    pub message: String,
}

impl EndpointError {
    pub fn new(kind: EndpointErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn division_by_zero(message: impl Into<String>) -> Self {
        Self::new(EndpointErrorKind::DivisionByZero, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(EndpointErrorKind::Rejected, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(EndpointErrorKind::Transport, message)
    }

    pub fn status(status: reqwest::StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("Unknown status");
        Self::new(
            EndpointErrorKind::Status,
            format!("Request failed with status {}: {reason}", status.as_u16()),
        )
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(EndpointErrorKind::Malformed, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointErrorKind {
    /// Endpoint refused to divide by zero
    DivisionByZero,
    /// Endpoint returned a failure payload
    Rejected,
    /// Connection, timeout or other network failure
    Transport,
    /// Non-2xx response without a failure payload
    Status,
    /// Response body could not be understood
    Malformed,
}
