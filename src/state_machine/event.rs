//! Events that can occur in a calculator session

use crate::arith::Operator;
use crate::endpoint::EndpointErrorKind;
use serde::Serialize;

/// Scheduled callbacks, keyed to the state generation that scheduled them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Timer {
    /// Clears the error display
    AutoReset,
    /// Dismisses the status notification
    StatusExpiry,
}

/// Why an evaluation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationFailure {
    pub kind: EndpointErrorKind,
    pub message: String,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // User input
    Digit(u8),
    DecimalPoint,
    Operator(Operator),
    Evaluate,
    Backspace,
    ClearEntry,
    ClearAll,

    // Endpoint responses
    EvaluateSucceeded {
        request_id: u64,
        value: f64,
    },
    EvaluateFailed {
        request_id: u64,
        failure: EvaluationFailure,
    },
    HealthCheckPassed,
    HealthCheckFailed {
        message: String,
    },

    // Timers
    TimerFired {
        timer: Timer,
        generation: u64,
    },
}

impl Event {
    /// Map a key name (from a button label or a keyboard event) to an input
    /// event
    pub fn from_key(key: &str) -> Option<Self> {
        let event = match key {
            "." | "," => Event::DecimalPoint,
            "=" | "Enter" => Event::Evaluate,
            "Escape" | "C" | "c" => Event::ClearAll,
            "Delete" | "CE" => Event::ClearEntry,
            "Backspace" => Event::Backspace,
            "x" | "X" => Event::Operator(Operator::Multiply),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_digit() => {
                        Event::Digit(u8::try_from(c.to_digit(10)?).ok()?)
                    }
                    _ => Event::Operator(Operator::parse(key).ok()?),
                }
            }
        };
        Some(event)
    }

    /// Events that originate from the user rather than from the runtime
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Event::Digit(_)
                | Event::DecimalPoint
                | Event::Operator(_)
                | Event::Evaluate
                | Event::Backspace
                | Event::ClearEntry
                | Event::ClearAll
        )
    }
}
