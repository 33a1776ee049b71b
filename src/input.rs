use crate::tokenizer::Key;
use compact_str::{CompactString, ToCompactString};
use std::fmt;
use thiserror::Error;

/// A classified press, shared by the keyboard and the on-screen buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Digit(u8),
    Dot,
    Op(Operation),
    ClearAll,
    ClearEntry,
    Evaluate,
    Copy,
    Paste,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
    Percent,
}

impl Operation {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operation::Add),
            '-' => Some(Operation::Sub),
            '*' => Some(Operation::Mul),
            '/' => Some(Operation::Div),
            '%' => Some(Operation::Percent),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Sub => '-',
            Operation::Mul => '*',
            Operation::Div => '/',
            Operation::Percent => '%',
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Input {
    /// Classifies a key press or button activation.
    ///
    /// Physical keys without a meaning yield `None`; unknown buttons are an error.
    pub fn from_key(key: &Key) -> Result<Option<Input>, InputError> {
        let input = match key {
            Key::Button(id) => Input::from_button(id)?,
            Key::Escape => Input::ClearAll,
            Key::Backspace => Input::ClearEntry,
            Key::Enter | Key::Char('=') => Input::Evaluate,
            Key::Char('.' | ',') => Input::Dot,
            Key::Char(c @ '0'..='9') => Input::Digit(*c as u8 - b'0'),
            Key::Char(c) => match Operation::from_char(*c) {
                Some(op) => Input::Op(op),
                None => return Ok(None),
            },
            Key::Ctrl('c') => Input::Copy,
            Key::Ctrl('v') => Input::Paste,
            Key::Ctrl(_) => return Ok(None),
        };
        Ok(Some(input))
    }

    /// Classifies an on-screen button by its logical identifier.
    pub fn from_button(id: &str) -> Result<Input, InputError> {
        let input = match id {
            "ac" => Input::ClearAll,
            "ce" => Input::ClearEntry,
            "add" => Input::Op(Operation::Add),
            "subtract" => Input::Op(Operation::Sub),
            "multiply" => Input::Op(Operation::Mul),
            "divide" => Input::Op(Operation::Div),
            "percent" => Input::Op(Operation::Percent),
            "equals" => Input::Evaluate,
            "dot" => Input::Dot,
            _ => match id.as_bytes() {
                [d @ b'0'..=b'9'] => Input::Digit(d - b'0'),
                _ => return Err(InputError::UnknownButton(id.to_compact_string())),
            },
        };
        Ok(input)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("Unknown button: {0}")]
    UnknownButton(CompactString),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_and_buttons_agree() {
        let pairs = [
            (Key::Char('7'), "7"),
            (Key::Char('0'), "0"),
            (Key::Char('+'), "add"),
            (Key::Char('-'), "subtract"),
            (Key::Char('*'), "multiply"),
            (Key::Char('/'), "divide"),
            (Key::Char('%'), "percent"),
            (Key::Char('.'), "dot"),
            (Key::Enter, "equals"),
            (Key::Escape, "ac"),
            (Key::Backspace, "ce"),
        ];
        for (key, button) in pairs {
            let from_button = Input::from_key(&Key::Button(button.into()));
            assert_eq!(Input::from_key(&key), from_button);
            assert!(matches!(from_button, Ok(Some(_))));
        }
    }

    #[test]
    fn test_comma_and_equals_aliases() {
        assert_eq!(Input::from_key(&Key::Char(',')), Ok(Some(Input::Dot)));
        assert_eq!(Input::from_key(&Key::Char('=')), Ok(Some(Input::Evaluate)));
    }

    #[test]
    fn test_shortcuts() {
        assert_eq!(Input::from_key(&Key::Ctrl('c')), Ok(Some(Input::Copy)));
        assert_eq!(Input::from_key(&Key::Ctrl('v')), Ok(Some(Input::Paste)));
        assert_eq!(Input::from_key(&Key::Ctrl('x')), Ok(None));
    }

    #[test]
    fn test_unrecognized_keys_are_ignored() {
        assert_eq!(Input::from_key(&Key::Char('q')), Ok(None));
        assert_eq!(Input::from_key(&Key::Char('c')), Ok(None));
    }

    #[test]
    fn test_unknown_button() {
        assert_eq!(
            Input::from_key(&Key::Button("sqrt".into())),
            Err(InputError::UnknownButton("sqrt".into()))
        );
        assert!(Input::from_button("10").is_err());
    }
}
