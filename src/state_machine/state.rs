//! Calculator session state types

use crate::arith::Operator;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Operand shown after reset and after clear-entry
pub const ZERO_OPERAND: &str = "0";

/// Longest operand the user can type; further digits are ignored
pub const MAX_OPERAND_LEN: usize = 24;

/// Default delay before an error display clears itself
pub const DEFAULT_ERROR_RESET_DELAY: Duration = Duration::from_secs(2);

/// Default lifetime of a status notification
pub const DEFAULT_STATUS_DURATION: Duration = Duration::from_secs(3);

// ============================================================================
// Session Context
// ============================================================================

/// Immutable per-session settings passed to every transition
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub error_reset_delay: Duration,
    pub status_duration: Duration,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            error_reset_delay: DEFAULT_ERROR_RESET_DELAY,
            status_duration: DEFAULT_STATUS_DURATION,
        }
    }

    pub fn with_delays(mut self, error_reset_delay: Duration, status_duration: Duration) -> Self {
        self.error_reset_delay = error_reset_delay;
        self.status_duration = status_duration;
        self
    }
}

// ============================================================================
// Calculator State
// ============================================================================

/// Whether the session is accepting input, waiting on the endpoint, or
/// showing an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Ready,
    /// Evaluation request in flight; responses with another id are stale
    Evaluating { request_id: u64 },
    /// Display shows the error indicator until auto-reset or user input
    Error { message: String },
}

/// Conceptual calculator mode derived from the state attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcMode {
    Idle,
    OperatorPending,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Warning,
    Error,
}

/// Transient status notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

impl Status {
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

/// State of one calculator session (one page view)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcState {
    /// Operand being typed or displayed; always a valid (possibly partial)
    /// numeric literal
    pub current_operand: String,
    pub pending_operand: Option<String>,
    pub pending_operator: Option<Operator>,
    /// Next digit starts a fresh operand instead of appending
    pub awaiting_new_operand: bool,
    pub phase: Phase,
    /// Bumped on every accepted user input and every reset
    pub generation: u64,
    pub status: Option<Status>,
}

impl Default for CalcState {
    fn default() -> Self {
        Self {
            current_operand: ZERO_OPERAND.to_string(),
            pending_operand: None,
            pending_operator: None,
            awaiting_new_operand: false,
            phase: Phase::Ready,
            generation: 0,
            status: None,
        }
    }
}

impl CalcState {
    /// Fresh state that keeps the generation counter moving forward
    pub fn reset_from(previous: &CalcState) -> Self {
        Self {
            generation: previous.generation + 1,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> CalcMode {
        if self.pending_operator.is_some() {
            CalcMode::OperatorPending
        } else if self.awaiting_new_operand {
            CalcMode::Result
        } else {
            CalcMode::Idle
        }
    }

    /// Evaluation in flight
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Evaluating { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self.phase, Phase::Error { .. })
    }
}
