//! Session runtime executor

use super::traits::ArithmeticClient;
use super::SessionEvent;

use crate::display::{render, View};
use crate::state_machine::{
    transition, CalcState, Effect, EvaluationFailure, Event, SessionContext, Timer,
    TransitionError,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Runtime owning one calculator session. Processes one event at a time;
/// network calls and timers run as spawned tasks that report back through
/// the event channel.
pub struct SessionRuntime<C>
where
    C: ArithmeticClient + 'static,
{
    context: SessionContext,
    state: CalcState,
    client: Arc<C>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    view_tx: watch::Sender<View>,
    shutdown: CancellationToken,
    idle_timeout: Duration,
    /// Pending timers, at most one per kind
    timers: HashMap<Timer, CancellationToken>,
}

impl<C> SessionRuntime<C>
where
    C: ArithmeticClient + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: SessionContext,
        client: C,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<SessionEvent>,
        view_tx: watch::Sender<View>,
        shutdown: CancellationToken,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            context,
            state: CalcState::default(),
            client: Arc::new(client),
            event_rx,
            event_tx,
            broadcast_tx,
            view_tx,
            shutdown,
            idle_timeout,
            timers: HashMap::new(),
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");

        // Connectivity check once per page view; failure is only a warning
        self.execute_effect(Effect::CheckHealth);
        self.execute_effect(Effect::Render);

        // Only key presses keep a session alive
        let mut idle_deadline = tokio::time::Instant::now() + self.idle_timeout;

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                event = self.event_rx.recv() => {
                    let Some(event) = event else { break };
                    if event.is_user_input() {
                        idle_deadline = tokio::time::Instant::now() + self.idle_timeout;
                    }
                    if let Err(e) = self.process_event(event) {
                        tracing::debug!(session_id = %self.context.session_id, error = %e, "Event rejected");
                    }
                }

                () = tokio::time::sleep_until(idle_deadline) => {
                    tracing::info!(session_id = %self.context.session_id, "Session idle, closing");
                    self.shutdown.cancel();
                    break;
                }
            }
        }

        for (_, token) in self.timers.drain() {
            token.cancel();
        }

        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                // Transition errors are user-facing (e.g., "calculation in progress")
                let _ = self.broadcast_tx.send(SessionEvent::Error {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }

        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestEvaluation {
                request_id,
                lhs,
                operator,
                rhs,
            } => {
                let client = self.client.clone();
                let event_tx = self.event_tx.clone();
                let session_id = self.context.session_id.clone();

                tokio::spawn(async move {
                    let event = match client.calculate(lhs, operator, rhs).await {
                        Ok(value) => {
                            tracing::info!(
                                session_id = %session_id,
                                lhs, operator = %operator, rhs, value,
                                "Evaluation succeeded"
                            );
                            Event::EvaluateSucceeded { request_id, value }
                        }
                        Err(e) => {
                            tracing::warn!(
                                session_id = %session_id,
                                lhs, operator = %operator, rhs,
                                kind = ?e.kind, error = %e,
                                "Evaluation failed"
                            );
                            Event::EvaluateFailed {
                                request_id,
                                failure: EvaluationFailure {
                                    kind: e.kind,
                                    message: e.message,
                                },
                            }
                        }
                    };
                    let _ = event_tx.send(event).await;
                });
            }

            Effect::CheckHealth => {
                let client = self.client.clone();
                let event_tx = self.event_tx.clone();

                tokio::spawn(async move {
                    let event = match client.health().await {
                        Ok(()) => Event::HealthCheckPassed,
                        Err(e) => {
                            tracing::warn!(error = %e, "Arithmetic endpoint health check failed");
                            Event::HealthCheckFailed { message: e.message }
                        }
                    };
                    let _ = event_tx.send(event).await;
                });
            }

            Effect::ScheduleTimer {
                timer,
                delay,
                generation,
            } => {
                let token = CancellationToken::new();
                if let Some(previous) = self.timers.insert(timer, token.clone()) {
                    previous.cancel();
                }

                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        biased;

                        () = token.cancelled() => {}

                        () = tokio::time::sleep(delay) => {
                            let _ = event_tx.send(Event::TimerFired { timer, generation }).await;
                        }
                    }
                });
            }

            Effect::CancelTimer { timer } => {
                if let Some(token) = self.timers.remove(&timer) {
                    token.cancel();
                }
            }

            Effect::Render => {
                let view = render(&self.state);
                self.view_tx.send_replace(view.clone());
                let _ = self.broadcast_tx.send(SessionEvent::View { view });
            }
        }
    }
}
