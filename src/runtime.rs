//! Runtime for calculator sessions
//!
//! One session per page view, held in memory only. Each session runs on its
//! own task; the manager just routes events and subscriptions to it.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::display::{render, View};
use crate::state_machine::{CalcState, Event, SessionContext};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tokio_util::sync::CancellationToken;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = SessionRuntime<Arc<dyn ArithmeticClient>>;

/// Timing knobs applied to every new session
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub error_reset_delay: Duration,
    pub status_duration: Duration,
    pub idle_timeout: Duration,
}

/// Events sent to connected pages
#[derive(Debug, Clone)]
pub enum SessionEvent {
    View { view: View },
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Session closed: {0}")]
    Closed(String),
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_tx: broadcast::Sender<SessionEvent>,
    pub view_rx: watch::Receiver<View>,
    pub shutdown: CancellationToken,
}

impl SessionHandle {
    fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// Manager for all live sessions
pub struct SessionManager {
    client: Arc<dyn ArithmeticClient>,
    settings: SessionSettings,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(client: Arc<dyn ArithmeticClient>, settings: SessionSettings) -> Self {
        Self {
            client,
            settings,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new session and return its id and initial view
    pub async fn create(&self) -> (String, View) {
        let session_id = uuid::Uuid::new_v4().to_string();
        let context = SessionContext::new(&session_id)
            .with_delays(self.settings.error_reset_delay, self.settings.status_duration);

        let initial_view = render(&CalcState::default());
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (view_tx, view_rx) = watch::channel(initial_view.clone());
        let shutdown = CancellationToken::new();

        let runtime: ProductionRuntime = SessionRuntime::new(
            context,
            self.client.clone(),
            event_rx,
            event_tx.clone(),
            broadcast_tx.clone(),
            view_tx,
            shutdown.clone(),
            self.settings.idle_timeout,
        );

        tokio::spawn(runtime.run());

        let mut sessions = self.sessions.write().await;
        // Drop sessions whose runtime has already shut down
        sessions.retain(|_, handle| !handle.is_closed());
        sessions.insert(
            session_id.clone(),
            SessionHandle {
                event_tx,
                broadcast_tx,
                view_rx,
                shutdown,
            },
        );
        tracing::info!(session_id = %session_id, live = sessions.len(), "Session created");

        (session_id, initial_view)
    }

    async fn handle(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        let sessions = self.sessions.read().await;
        match sessions.get(session_id) {
            Some(handle) if handle.is_closed() => Err(SessionError::Closed(session_id.to_string())),
            Some(handle) => Ok(handle.clone()),
            None => Err(SessionError::NotFound(session_id.to_string())),
        }
    }

    /// Send an event to a session
    pub async fn send_event(&self, session_id: &str, event: Event) -> Result<(), SessionError> {
        let handle = self.handle(session_id).await?;
        handle
            .event_tx
            .send(event)
            .await
            .map_err(|_| SessionError::Closed(session_id.to_string()))
    }

    /// Current view plus a receiver for subsequent updates
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<(View, broadcast::Receiver<SessionEvent>), SessionError> {
        let handle = self.handle(session_id).await?;
        // Subscribe first so no update between snapshot and stream is lost
        let rx = handle.broadcast_tx.subscribe();
        let view = handle.view_rx.borrow().clone();
        Ok((view, rx))
    }

    /// Latest rendered view
    pub async fn snapshot(&self, session_id: &str) -> Result<View, SessionError> {
        let handle = self.handle(session_id).await?;
        let view = handle.view_rx.borrow().clone();
        Ok(view)
    }

    /// Stop a session's runtime and forget it
    pub async fn close(&self, session_id: &str) -> Result<(), SessionError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        handle.shutdown.cancel();
        tracing::info!(session_id = %session_id, "Session closed");
        Ok(())
    }

    /// Number of sessions whose runtime is still running
    #[cfg(test)]
    pub async fn live_sessions(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|h| !h.is_closed())
            .count()
    }
}
