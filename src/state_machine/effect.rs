//! Effects produced by state transitions

use super::event::Timer;
use crate::arith::Operator;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send the operand pair to the arithmetic endpoint
    RequestEvaluation {
        request_id: u64,
        lhs: f64,
        operator: Operator,
        rhs: f64,
    },

    /// Probe the arithmetic endpoint once
    CheckHealth,

    /// Fire `Event::TimerFired` after `delay`, replacing any timer of the
    /// same kind
    ScheduleTimer {
        timer: Timer,
        delay: Duration,
        generation: u64,
    },

    /// Drop a scheduled timer if one is pending
    CancelTimer { timer: Timer },

    /// Publish a fresh view to connected clients
    Render,
}

impl Effect {
    pub fn schedule(timer: Timer, delay: Duration, generation: u64) -> Self {
        Effect::ScheduleTimer {
            timer,
            delay,
            generation,
        }
    }
}
