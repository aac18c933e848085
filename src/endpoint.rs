//! HTTP client for the arithmetic endpoint
//!
//! Speaks the `/api/calculate` and `/api/health` contract. Every failure is
//! classified so the state machine can report it.

mod error;

pub use error::{EndpointError, EndpointErrorKind};

use crate::arith::Operator;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DIVISION_BY_ZERO_CODE: &str = "division_by_zero";

/// Client for a remote (or local) arithmetic endpoint
#[derive(Clone)]
pub struct HttpEndpoint {
    client: Client,
    base_url: String,
}

impl HttpEndpoint {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EndpointError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EndpointError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the endpoint to compute `lhs op rhs`
    pub async fn calculate(&self, lhs: f64, op: Operator, rhs: f64) -> Result<f64, EndpointError> {
        let request = CalculateRequest {
            num1: lhs,
            operator: op,
            num2: rhs,
        };

        let response = self
            .client
            .post(format!("{}/api/calculate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EndpointError::transport(format!("Failed to read response: {e}")))?;

        let Ok(payload) = serde_json::from_str::<CalculateResponse>(&body) else {
            if status.is_success() {
                return Err(EndpointError::malformed(format!(
                    "Failed to parse response: {body}"
                )));
            }
            return Err(EndpointError::status(status));
        };

        if !payload.success || !status.is_success() {
            let Some(message) = payload.error else {
                return Err(EndpointError::status(status));
            };
            return Err(if payload.code.as_deref() == Some(DIVISION_BY_ZERO_CODE) {
                EndpointError::division_by_zero(message)
            } else {
                EndpointError::rejected(message)
            });
        }

        match payload.result {
            Some(value) if value.is_finite() => Ok(value),
            _ => Err(EndpointError::malformed("Response is missing a numeric result")),
        }
    }

    /// Confirm the endpoint is reachable and healthy
    pub async fn health(&self) -> Result<(), EndpointError> {
        let response = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(EndpointError::status(status));
        }

        let health: HealthResponse = response
            .json()
            .await
            .map_err(|e| EndpointError::malformed(format!("Failed to parse health response: {e}")))?;

        if health.status == "healthy" {
            Ok(())
        } else {
            Err(EndpointError::rejected(format!(
                "Endpoint reports status {}",
                health.status
            )))
        }
    }
}

fn classify_send_error(e: reqwest::Error) -> EndpointError {
    if e.is_timeout() {
        EndpointError::transport(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        EndpointError::transport(format!("Connection failed: {e}"))
    } else {
        EndpointError::transport(format!("Request failed: {e}"))
    }
}

// Wire types as seen by the client

#[derive(Debug, Serialize)]
struct CalculateRequest {
    num1: f64,
    operator: Operator,
    num2: f64,
}

#[derive(Debug, Deserialize)]
struct CalculateResponse {
    success: bool,
    #[serde(default)]
    result: Option<f64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}
