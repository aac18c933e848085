//! Display formatting and view rendering
//!
//! `render` is a pure function of the session state; the runtime pushes its
//! output to connected pages.

use crate::arith::parse_operand;
use crate::state_machine::{CalcMode, CalcState, Phase, StatusLevel};
use serde::Serialize;

/// Literal shown on the display while in the error phase
pub const ERROR_INDICATOR: &str = "Error";

/// Magnitude at and above which values are shown in exponential notation
const EXPONENTIAL_UPPER: f64 = 1e15;
/// Nonzero magnitude below which values are shown in exponential notation
const EXPONENTIAL_LOWER: f64 = 1e-10;
/// Fractional digits of the exponential mantissa
const EXPONENTIAL_DIGITS: usize = 5;

/// Snapshot of everything the page draws
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub display: String,
    /// Pending operand and operator, e.g. `12 ×`
    pub expression: String,
    pub status: Option<StatusView>,
    pub busy: bool,
    pub error: bool,
    pub mode: CalcMode,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub level: StatusLevel,
    pub text: String,
}

/// Render the session state
pub fn render(state: &CalcState) -> View {
    let display = match &state.phase {
        Phase::Error { .. } => ERROR_INDICATOR.to_string(),
        Phase::Ready | Phase::Evaluating { .. } => format_operand(&state.current_operand),
    };

    let expression = match (&state.pending_operand, state.pending_operator) {
        (Some(operand), Some(op)) => format!("{} {}", format_operand(operand), op.display_symbol()),
        _ => String::new(),
    };

    View {
        display,
        expression,
        status: state.status.as_ref().map(|s| StatusView {
            level: s.level,
            text: s.text.clone(),
        }),
        busy: state.is_busy(),
        error: matches!(state.phase, Phase::Error { .. }),
        mode: state.mode(),
        generation: state.generation,
    }
}

/// Format a numeric value for the display.
///
/// Values with magnitude at least 1e15, or nonzero values below 1e-10, use
/// exponential notation with five fractional digits (`1.23457e+15`).
/// Everything else is the plain decimal string, with thousands separators in
/// the integer portion once the magnitude reaches 1000.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return ERROR_INDICATOR.to_string();
    }
    if is_exponential(value) {
        return format_exponential(value);
    }

    let plain = format_plain(value);
    if value.abs() >= 1000.0 {
        group_thousands(&plain)
    } else {
        plain
    }
}

/// Format an operand string as typed.
///
/// Partial literals keep their fractional text verbatim (`"1234."` renders
/// as `1,234.`, `"0.50"` as `0.50`); only the integer portion is grouped.
pub fn format_operand(operand: &str) -> String {
    let Ok(value) = parse_operand(operand) else {
        return operand.to_string();
    };

    // Whole numbers carry no partial text to preserve
    if !operand.contains('.') || is_exponential(value) {
        return format_number(value);
    }

    if value.abs() >= 1000.0 {
        group_thousands(operand)
    } else {
        operand.to_string()
    }
}

/// Plain decimal string of a value; never exponential, `-0` prints as `0`
pub fn format_plain(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

fn is_exponential(value: f64) -> bool {
    let magnitude = value.abs();
    magnitude >= EXPONENTIAL_UPPER || (value != 0.0 && magnitude < EXPONENTIAL_LOWER)
}

fn format_exponential(value: f64) -> String {
    // Rust renders `1.23457e15`; the browser convention signs the exponent.
    let raw = format!("{value:.prec$e}", prec = EXPONENTIAL_DIGITS);
    match raw.split_once('e') {
        Some((mantissa, exponent)) if exponent.starts_with('-') => {
            format!("{mantissa}e{exponent}")
        }
        Some((mantissa, exponent)) => format!("{mantissa}e+{exponent}"),
        None => raw,
    }
}

/// Insert `,` separators into the integer portion of a decimal literal
fn group_thousands(literal: &str) -> String {
    let (sign, unsigned) = match literal.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", literal),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let digits: Vec<char> = integer.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}
