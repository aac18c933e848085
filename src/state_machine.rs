//! Calculator input state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::{EvaluationFailure, Event, Timer};
pub use state::{CalcMode, CalcState, Phase, SessionContext, Status, StatusLevel};
pub use transition::{transition, TransitionError};
