//! API request and response types

use crate::display::View;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Largest magnitude emitted as a JSON integer
const MAX_INTEGER_RESULT: f64 = 9_007_199_254_740_992.0;

/// Successful calculation
#[derive(Debug, Serialize)]
pub struct CalculateResponse {
    pub success: bool,
    pub result: Number,
}

impl CalculateResponse {
    /// Integral results are emitted as JSON integers, everything else as a
    /// float. `None` for non-finite values.
    #[allow(clippy::cast_possible_truncation)] // Guarded by the integral range check
    pub fn from_value(value: f64) -> Option<Self> {
        let result = if value.fract() == 0.0 && value.abs() <= MAX_INTEGER_RESULT {
            Number::from(value as i64)
        } else {
            Number::from_f64(value)?
        };
        Some(Self {
            success: true,
            result,
        })
    }
}

/// Health check payload
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Request to feed a key press into a session
#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub key: String,
}

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub view: View,
}

/// Response with the latest view of a session
#[derive(Debug, Serialize)]
pub struct SessionViewResponse {
    pub view: View,
}

/// Response for input action
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Failure payload shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

impl ErrorResponse {
    pub fn new(code: &'static str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code,
        }
    }
}
