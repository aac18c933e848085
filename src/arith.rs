//! Four-function arithmetic
//!
//! Shared by the `/api/calculate` handler and the client-side chaining fold
//! so both apply identical rules, including the divide-by-zero guard.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of decimal places non-integral results are rounded to
pub const RESULT_DECIMALS: usize = 10;

/// Arithmetic errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithError {
    #[error("Division by zero is not allowed")]
    DivisionByZero,
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),
    #[error("Invalid number format")]
    InvalidNumber,
    #[error("Result is out of range")]
    OutOfRange,
}

impl ArithError {
    /// Machine-readable code carried in failure payloads
    pub fn code(&self) -> &'static str {
        match self {
            ArithError::DivisionByZero => "division_by_zero",
            ArithError::InvalidOperator(_) => "invalid_operator",
            ArithError::InvalidNumber => "invalid_number",
            ArithError::OutOfRange => "out_of_range",
        }
    }
}

/// The four supported operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// Wire symbol (`+ - * /`)
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
        }
    }

    /// Symbol shown on the calculator display
    pub fn display_symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "\u{2212}",
            Operator::Multiply => "\u{00d7}",
            Operator::Divide => "\u{00f7}",
        }
    }

    /// Parse a wire symbol. `×` and `÷` are accepted as aliases.
    pub fn parse(symbol: &str) -> Result<Self, ArithError> {
        match symbol {
            "+" => Ok(Operator::Add),
            "-" | "\u{2212}" => Ok(Operator::Subtract),
            "*" | "\u{00d7}" => Ok(Operator::Multiply),
            "/" | "\u{00f7}" => Ok(Operator::Divide),
            other => Err(ArithError::InvalidOperator(other.to_string())),
        }
    }

    /// Apply the operator to two operands.
    ///
    /// Division by an operand equal to zero fails instead of producing an
    /// infinite or NaN value. Non-finite results are rejected as well.
    pub fn apply(self, lhs: f64, rhs: f64) -> Result<f64, ArithError> {
        let value = match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
            Operator::Multiply => lhs * rhs,
            Operator::Divide => {
                if rhs == 0.0 {
                    return Err(ArithError::DivisionByZero);
                }
                lhs / rhs
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(ArithError::OutOfRange)
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TryFrom<String> for Operator {
    type Error = ArithError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Operator::parse(&value)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.symbol().to_string()
    }
}

/// Parse an operand the way the endpoint accepts it: a finite decimal
/// literal, surrounding whitespace allowed, trailing `.` allowed.
pub fn parse_operand(text: &str) -> Result<f64, ArithError> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .strip_suffix('.')
        .unwrap_or(trimmed)
        .parse()
        .map_err(|_| ArithError::InvalidNumber)?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(ArithError::InvalidNumber)
    }
}

/// Round a result the way the endpoint reports it: integral values are kept,
/// others are rounded to [`RESULT_DECIMALS`] places. Negative zero becomes zero.
pub fn normalize(value: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    if value.fract() == 0.0 {
        return value;
    }
    format!("{value:.prec$}", prec = RESULT_DECIMALS)
        .parse()
        .unwrap_or(value)
}

/// Apply `op` and normalize the result
pub fn calculate(lhs: f64, op: Operator, rhs: f64) -> Result<f64, ArithError> {
    op.apply(lhs, rhs).map(normalize)
}
