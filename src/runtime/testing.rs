//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use super::{SessionEvent, SessionManager, SessionSettings};
use crate::arith::{self, Operator};
use crate::display::View;
use crate::endpoint::EndpointError;
use crate::state_machine::Event;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

// ============================================================================
// Mock Arithmetic Client
// ============================================================================

/// Mock arithmetic client.
///
/// Returns queued outcomes first, then falls back to computing locally.
pub struct MockArithmeticClient {
    outcomes: Mutex<VecDeque<Result<f64, EndpointError>>>,
    healthy: bool,
    latency: Duration,
    /// Record of all requests made
    pub requests: Mutex<Vec<(f64, Operator, f64)>>,
}

impl MockArithmeticClient {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            healthy: true,
            latency: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Delay every calculation
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue an error response
    pub fn queue_error(&self, error: EndpointError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<(f64, Operator, f64)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArithmeticClient for MockArithmeticClient {
    async fn calculate(&self, lhs: f64, op: Operator, rhs: f64) -> Result<f64, EndpointError> {
        self.requests.lock().unwrap().push((lhs, op, rhs));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let queued = self.outcomes.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            arith::calculate(lhs, op, rhs).map_err(|e| match e {
                arith::ArithError::DivisionByZero => EndpointError::division_by_zero(e.to_string()),
                other => EndpointError::rejected(other.to_string()),
            })
        })
    }

    async fn health(&self) -> Result<(), EndpointError> {
        if self.healthy {
            Ok(())
        } else {
            Err(EndpointError::transport("Connection failed: mock endpoint down"))
        }
    }
}

// ============================================================================
// Test Session Builder
// ============================================================================

pub fn test_settings() -> SessionSettings {
    SessionSettings {
        error_reset_delay: Duration::from_secs(2),
        status_duration: Duration::from_secs(3),
        idle_timeout: Duration::from_secs(3600),
    }
}

/// A live session backed by a mock client
pub struct TestSession {
    pub manager: SessionManager,
    pub client: Arc<MockArithmeticClient>,
    pub session_id: String,
    pub events: broadcast::Receiver<SessionEvent>,
}

impl TestSession {
    pub async fn start(client: MockArithmeticClient) -> Self {
        let client = Arc::new(client);
        let manager = SessionManager::new(client.clone(), test_settings());
        let (session_id, _) = manager.create().await;
        let (_, events) = manager.subscribe(&session_id).await.unwrap();
        Self {
            manager,
            client,
            session_id,
            events,
        }
    }

    pub async fn press(&self, keys: &[&str]) {
        for key in keys {
            let event = Event::from_key(key).unwrap();
            self.manager.send_event(&self.session_id, event).await.unwrap();
        }
    }

    /// Wait for a view matching `predicate`
    pub async fn wait_for_view(&mut self, predicate: impl Fn(&View) -> bool) -> View {
        let wait = async {
            loop {
                match self.events.recv().await {
                    Ok(SessionEvent::View { view }) if predicate(&view) => return view,
                    Ok(_) => {}
                    Err(e) => panic!("session stream ended: {e}"),
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(60), wait)
            .await
            .expect("timed out waiting for view")
    }

    /// Wait for a user-facing error event
    pub async fn wait_for_error(&mut self) -> String {
        let wait = async {
            loop {
                match self.events.recv().await {
                    Ok(SessionEvent::Error { message }) => return message,
                    Ok(_) => {}
                    Err(e) => panic!("session stream ended: {e}"),
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(60), wait)
            .await
            .expect("timed out waiting for error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::ERROR_INDICATOR;
    use crate::endpoint::EndpointErrorKind;
    use crate::state_machine::{CalcMode, StatusLevel};

    #[tokio::test]
    async fn test_mock_client_computes_locally() {
        let mock = MockArithmeticClient::new();
        assert_eq!(mock.calculate(7.0, Operator::Multiply, 6.0).await.unwrap(), 42.0);

        mock.queue_error(EndpointError::transport("down"));
        let err = mock.calculate(1.0, Operator::Add, 1.0).await.unwrap_err();
        assert_eq!(err.kind, EndpointErrorKind::Transport);

        let err = mock.calculate(5.0, Operator::Divide, 0.0).await.unwrap_err();
        assert_eq!(err.kind, EndpointErrorKind::DivisionByZero);
        assert_eq!(mock.recorded_requests().len(), 3);
    }

    /// Integration test: the four basic scenarios through the runtime
    #[tokio::test(start_paused = true)]
    async fn test_evaluate_scenarios() {
        let cases: [(&[&str], &str); 4] = [
            (&["1", "0", "+", "5"], "15"),
            (&["2", "0", "-", "8"], "12"),
            (&["7", "*", "6"], "42"),
            (&["1", "5", "/", "3"], "5"),
        ];
        let mut session = TestSession::start(MockArithmeticClient::new()).await;

        for (keys, expected) in cases {
            session.press(&["Escape"]).await;
            session.press(keys).await;
            session.press(&["Enter"]).await;
            let view = session
                .wait_for_view(|v| v.mode == CalcMode::Result && !v.busy)
                .await;
            assert_eq!(view.display, expected, "keys {keys:?}");
        }

        assert_eq!(session.client.recorded_requests().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_divide_by_zero_shows_error_then_auto_clears() {
        let mut session = TestSession::start(MockArithmeticClient::new()).await;
        session.press(&["5", "/", "0", "Enter"]).await;

        let view = session.wait_for_view(|v| v.error).await;
        assert_eq!(view.display, ERROR_INDICATOR);
        let status = view.status.unwrap();
        assert_eq!(status.level, StatusLevel::Error);
        assert_eq!(status.text, "Division by zero is not allowed");

        let start = tokio::time::Instant::now();
        let view = session.wait_for_view(|v| !v.error).await;
        assert_eq!(view.display, "0");
        assert_eq!(view.mode, CalcMode::Idle);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_uses_error_path() {
        let client = MockArithmeticClient::new();
        client.queue_error(EndpointError::transport("Connection failed: refused"));
        let mut session = TestSession::start(client).await;
        session.press(&["2", "+", "2", "Enter"]).await;

        let view = session.wait_for_view(|v| v.error).await;
        assert_eq!(
            view.status.map(|s| s.text),
            Some("Connection failed: refused".to_string())
        );
        session.wait_for_view(|v| !v.error && v.display == "0").await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_during_evaluation_is_rejected() {
        let client = MockArithmeticClient::new().with_latency(Duration::from_millis(500));
        let mut session = TestSession::start(client).await;
        session.press(&["7", "*", "6", "Enter"]).await;
        session.wait_for_view(|v| v.busy).await;

        session.press(&["+"]).await;
        let message = session.wait_for_error().await;
        assert_eq!(message, "A calculation is in progress");

        let view = session.wait_for_view(|v| !v.busy).await;
        assert_eq!(view.display, "42");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all_supersedes_in_flight_evaluation() {
        let client = MockArithmeticClient::new().with_latency(Duration::from_millis(500));
        let mut session = TestSession::start(client).await;
        session.press(&["7", "*", "6", "Enter"]).await;
        session.wait_for_view(|v| v.busy).await;
        session.press(&["Escape", "9"]).await;
        session.wait_for_view(|v| v.display == "9").await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        let view = session
            .manager
            .snapshot(&session.session_id)
            .await
            .unwrap();
        assert_eq!(view.display, "9");
        assert!(!view.busy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unhealthy_endpoint_shows_transient_warning() {
        let mut session = TestSession::start(MockArithmeticClient::new().unhealthy()).await;

        let view = session.wait_for_view(|v| v.status.is_some()).await;
        let status = view.status.unwrap();
        assert_eq!(status.level, StatusLevel::Warning);
        assert!(status.text.contains("mock endpoint down"));

        // Interaction is not blocked
        session.press(&["4"]).await;
        let view = session.wait_for_view(|v| v.display == "4").await;
        assert!(view.status.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_warning_expires_on_its_own() {
        let mut session = TestSession::start(MockArithmeticClient::new().unhealthy()).await;
        session.wait_for_view(|v| v.status.is_some()).await;
        session.wait_for_view(|v| v.status.is_none()).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_session_rejects_events() {
        let session = TestSession::start(MockArithmeticClient::new()).await;
        assert_eq!(session.manager.live_sessions().await, 1);

        session.manager.close(&session.session_id).await.unwrap();
        assert_eq!(session.manager.live_sessions().await, 0);
        assert!(session
            .manager
            .send_event(&session.session_id, Event::Digit(1))
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_shuts_down() {
        let client = Arc::new(MockArithmeticClient::new());
        let settings = SessionSettings {
            idle_timeout: Duration::from_secs(60),
            ..test_settings()
        };
        let manager = SessionManager::new(client, settings);
        let (session_id, _) = manager.create().await;

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(manager.live_sessions().await, 0);
        assert!(manager.snapshot(&session_id).await.is_err());
    }
}
