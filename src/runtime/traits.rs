//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::arith::Operator;
use crate::endpoint::{EndpointError, HttpEndpoint};
use async_trait::async_trait;
use std::sync::Arc;

/// Client for the arithmetic endpoint
#[async_trait]
pub trait ArithmeticClient: Send + Sync {
    /// Compute `lhs op rhs`
    async fn calculate(&self, lhs: f64, op: Operator, rhs: f64) -> Result<f64, EndpointError>;

    /// Connectivity check
    async fn health(&self) -> Result<(), EndpointError>;
}

#[async_trait]
impl<T: ArithmeticClient + ?Sized> ArithmeticClient for Arc<T> {
    async fn calculate(&self, lhs: f64, op: Operator, rhs: f64) -> Result<f64, EndpointError> {
        (**self).calculate(lhs, op, rhs).await
    }

    async fn health(&self) -> Result<(), EndpointError> {
        (**self).health().await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl ArithmeticClient for HttpEndpoint {
    async fn calculate(&self, lhs: f64, op: Operator, rhs: f64) -> Result<f64, EndpointError> {
        HttpEndpoint::calculate(self, lhs, op, rhs).await
    }

    async fn health(&self) -> Result<(), EndpointError> {
        HttpEndpoint::health(self).await
    }
}
