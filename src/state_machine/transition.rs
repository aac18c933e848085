//! Pure state transition function
//!
//! Every mutation of a calculator session goes through [`transition`]. It
//! performs no I/O: network calls, timers and display refreshes are returned
//! as effects for the runtime to execute.

use super::event::{EvaluationFailure, Timer};
use super::state::{CalcState, Phase, SessionContext, Status, MAX_OPERAND_LEN, ZERO_OPERAND};
use super::{Effect, Event};
use crate::arith::{self, ArithError, Operator};
use crate::display::format_plain;
use crate::endpoint::EndpointErrorKind;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: CalcState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: CalcState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    /// The state is unchanged and nothing needs to happen
    pub fn unchanged(state: &CalcState) -> Self {
        Self::new(state.clone())
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A calculation is in progress")]
    Busy,
    #[error("Invalid digit: {0}")]
    InvalidDigit(u8),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs.
pub fn transition(
    state: &CalcState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // User Input
        // ============================================================
        Event::Digit(digit) => {
            if digit > 9 {
                return Err(TransitionError::InvalidDigit(digit));
            }
            accept_input(state, context, false, |next| {
                enter_digit(next, digit);
                Ok(vec![])
            })
        }

        Event::DecimalPoint => accept_input(state, context, false, |next| {
            enter_decimal_point(next);
            Ok(vec![])
        }),

        Event::Operator(op) => accept_input(state, context, false, |next| {
            select_operator(next, op)?;
            Ok(vec![])
        }),

        Event::Evaluate => accept_input(state, context, false, begin_evaluation),

        Event::Backspace => accept_input(state, context, false, |next| {
            backspace(next);
            Ok(vec![])
        }),

        Event::ClearEntry => accept_input(state, context, false, |next| {
            next.current_operand = ZERO_OPERAND.to_string();
            Ok(vec![])
        }),

        // Allowed even while evaluating; the late response becomes stale
        Event::ClearAll => accept_input(state, context, true, |_| Ok(vec![])),

        // ============================================================
        // Endpoint Responses
        // ============================================================
        Event::EvaluateSucceeded { request_id, value } => {
            if !awaits_response(state, request_id) {
                return Ok(TransitionResult::unchanged(state));
            }
            let mut next = state.clone();
            if !value.is_finite() {
                return Ok(enter_error(next, &ArithError::OutOfRange.to_string(), context));
            }
            next.current_operand = format_plain(arith::normalize(value));
            next.pending_operand = None;
            next.pending_operator = None;
            next.awaiting_new_operand = true;
            next.phase = Phase::Ready;
            Ok(TransitionResult::new(next).with_effect(Effect::Render))
        }

        Event::EvaluateFailed {
            request_id,
            failure: EvaluationFailure { kind, message },
        } => {
            if !awaits_response(state, request_id) {
                return Ok(TransitionResult::unchanged(state));
            }
            let message = match kind {
                EndpointErrorKind::DivisionByZero => ArithError::DivisionByZero.to_string(),
                _ => message,
            };
            Ok(enter_error(state.clone(), &message, context))
        }

        Event::HealthCheckPassed => Ok(TransitionResult::unchanged(state)),

        Event::HealthCheckFailed { message } => {
            if state.is_error() {
                return Ok(TransitionResult::unchanged(state));
            }
            let mut next = state.clone();
            next.status = Some(Status::warning(format!(
                "Calculator API unreachable: {message}"
            )));
            let expiry = Effect::schedule(Timer::StatusExpiry, context.status_duration, next.generation);
            Ok(TransitionResult::new(next)
                .with_effect(expiry)
                .with_effect(Effect::Render))
        }

        // ============================================================
        // Timers
        // ============================================================
        Event::TimerFired { generation, .. } if generation != state.generation => {
            // Superseded by a later user action
            Ok(TransitionResult::unchanged(state))
        }

        Event::TimerFired {
            timer: Timer::AutoReset,
            ..
        } => {
            if !state.is_error() {
                return Ok(TransitionResult::unchanged(state));
            }
            Ok(TransitionResult::new(CalcState::reset_from(state)).with_effect(Effect::Render))
        }

        Event::TimerFired {
            timer: Timer::StatusExpiry,
            ..
        } => {
            if state.status.is_none() {
                return Ok(TransitionResult::unchanged(state));
            }
            let mut next = state.clone();
            next.status = None;
            Ok(TransitionResult::new(next).with_effect(Effect::Render))
        }
    }
}

/// Common handling for user input.
///
/// Rejects input while an evaluation is in flight (except clear-all), leaves
/// the error phase by clearing first, bumps the generation so pending timers
/// go stale, dismisses the status notification, then applies the edit.
fn accept_input<F>(
    state: &CalcState,
    context: &SessionContext,
    clears_all: bool,
    apply: F,
) -> Result<TransitionResult, TransitionError>
where
    F: FnOnce(&mut CalcState) -> Result<Vec<Effect>, ArithError>,
{
    if state.is_busy() && !clears_all {
        return Err(TransitionError::Busy);
    }

    let mut next = if clears_all || state.is_error() {
        CalcState::reset_from(state)
    } else {
        CalcState {
            generation: state.generation + 1,
            status: None,
            ..state.clone()
        }
    };

    let mut effects = Vec::new();
    if state.is_error() {
        effects.push(Effect::CancelTimer {
            timer: Timer::AutoReset,
        });
    }
    if state.status.is_some() {
        effects.push(Effect::CancelTimer {
            timer: Timer::StatusExpiry,
        });
    }

    match apply(&mut next) {
        Ok(extra) => Ok(TransitionResult::new(next)
            .with_effects(effects)
            .with_effects(extra)
            .with_effect(Effect::Render)),
        Err(e) => {
            // Cancellations go first so they never hit the freshly scheduled reset
            let errored = enter_error(next, &e.to_string(), context);
            Ok(TransitionResult::new(errored.new_state)
                .with_effects(effects)
                .with_effects(errored.effects))
        }
    }
}

/// Switch to the error phase and schedule the automatic clear.
///
/// Bumps the generation so timers scheduled before the failure go stale.
fn enter_error(mut next: CalcState, message: &str, context: &SessionContext) -> TransitionResult {
    next.generation += 1;
    next.phase = Phase::Error {
        message: message.to_string(),
    };
    next.status = Some(Status::error(message));
    let reset = Effect::schedule(Timer::AutoReset, context.error_reset_delay, next.generation);
    TransitionResult::new(next)
        .with_effect(reset)
        .with_effect(Effect::Render)
}

fn awaits_response(state: &CalcState, request_id: u64) -> bool {
    matches!(state.phase, Phase::Evaluating { request_id: id } if id == request_id)
}

fn enter_digit(state: &mut CalcState, digit: u8) {
    let digit = char::from(b'0' + digit);
    if state.awaiting_new_operand {
        state.current_operand = digit.to_string();
        state.awaiting_new_operand = false;
    } else if state.current_operand == ZERO_OPERAND {
        state.current_operand = digit.to_string();
    } else if state.current_operand == "-0" {
        state.current_operand = format!("-{digit}");
    } else if state.current_operand.len() < MAX_OPERAND_LEN {
        state.current_operand.push(digit);
    }
}

fn enter_decimal_point(state: &mut CalcState) {
    if state.awaiting_new_operand {
        state.current_operand = format!("{ZERO_OPERAND}.");
        state.awaiting_new_operand = false;
    } else if !state.current_operand.contains('.') {
        state.current_operand.push('.');
    }
}

fn backspace(state: &mut CalcState) {
    state.current_operand.pop();
    if state.current_operand.is_empty() || state.current_operand == "-" {
        state.current_operand = ZERO_OPERAND.to_string();
    }
}

/// Select an operator, folding a complete pending pair first.
fn select_operator(state: &mut CalcState, op: Operator) -> Result<(), ArithError> {
    let pending = state.pending_operand.clone();
    match (state.pending_operator, pending) {
        // Operator pressed twice in a row: the later one wins
        (Some(_), Some(_)) if state.awaiting_new_operand => {}
        (Some(previous), Some(pending)) => {
            let lhs = arith::parse_operand(&pending)?;
            let rhs = arith::parse_operand(&state.current_operand)?;
            let folded = format_plain(arith::calculate(lhs, previous, rhs)?);
            state.current_operand.clone_from(&folded);
            state.pending_operand = Some(folded);
        }
        _ => {
            state.pending_operand = Some(state.current_operand.clone());
        }
    }
    state.pending_operator = Some(op);
    state.awaiting_new_operand = true;
    Ok(())
}

/// Start an evaluation when an operator, its pending operand and a fresh
/// second operand are all present; otherwise nothing happens.
fn begin_evaluation(state: &mut CalcState) -> Result<Vec<Effect>, ArithError> {
    let (Some(operator), Some(pending)) = (state.pending_operator, state.pending_operand.as_deref())
    else {
        return Ok(vec![]);
    };
    if state.awaiting_new_operand {
        return Ok(vec![]);
    }

    let lhs = arith::parse_operand(pending)?;
    let rhs = arith::parse_operand(&state.current_operand)?;
    let request_id = state.generation;
    state.phase = Phase::Evaluating { request_id };

    Ok(vec![Effect::RequestEvaluation {
        request_id,
        lhs,
        operator,
        rhs,
    }])
}
