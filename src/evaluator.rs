use crate::input::Operation;
use compact_str::{format_compact, CompactString, ToCompactString};
use std::fmt;
use thiserror::Error;

/// A number as typed, e.g. `"12."` while the user is still entering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    text: CompactString,
}

impl Operand {
    pub fn digit(digit: u8) -> Self {
        Operand {
            text: (char::from(b'0' + digit)).to_compact_string(),
        }
    }

    pub fn from_value(value: f64) -> Self {
        Operand {
            text: format_number(value),
        }
    }

    pub fn zero_dot() -> Self {
        Operand { text: "0.".into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_dot(&self) -> bool {
        self.text.contains('.')
    }

    pub fn push_digit(&mut self, digit: u8) {
        // No leading zeros
        if self.text == "0" {
            self.text.clear();
        }
        self.text.push(char::from(b'0' + digit));
    }

    pub fn push_dot(&mut self) {
        if !self.has_dot() {
            self.text.push('.');
        }
    }

    pub fn value(&self) -> Result<f64, EvalError> {
        self.text
            .parse()
            .map_err(|_| EvalError::MalformedOperand(self.text.clone()))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Renders a value the way the display shows it: shortest round-trip text,
/// no fractional part for integers, exponent form (`1e-7`, `1.5e+21`) below
/// 1e-6 and from 1e21 up.
pub fn format_number(value: f64) -> CompactString {
    if value == 0.0 {
        // Covers -0
        return "0".into();
    }
    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format_compact!("{}", value);
    }
    let text = format_compact!("{:e}", value);
    if let Some((mantissa, exp)) = text.split_once('e') {
        if !exp.starts_with('-') {
            return format_compact!("{mantissa}e+{exp}");
        }
    }
    text
}

/// Applies one operator to two operands.
///
/// `a % b` is "b percent of a", i.e. `a * b / 100`.
pub fn evaluate(l: &Operand, op: Operation, r: &Operand) -> Result<f64, EvalError> {
    let (l, r) = (l.value()?, r.value()?);
    let result = match op {
        Operation::Add => l + r,
        Operation::Sub => l - r,
        Operation::Mul => l * r,
        Operation::Div => l / r,
        Operation::Percent => l * r / 100.0,
    };
    if result.is_finite() {
        Ok(result)
    } else {
        Err(EvalError::NonFinite)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EvalError {
    #[error("Malformed operand: {0}")]
    MalformedOperand(CompactString),
    #[error("Result is not a finite number")]
    NonFinite,
    #[error("Expression has no right operand")]
    Incomplete,
}
