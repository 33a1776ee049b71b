use compact_str::{CompactString, ToCompactString};
use std::fmt;

/// Widest text the display can show.
pub const DISPLAY_WIDTH: usize = 10;
pub const ERROR_INDICATOR: &str = "Error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    text: CompactString,
}

impl Default for Display {
    fn default() -> Self {
        Display { text: "0".into() }
    }
}

impl Display {
    /// Shows `value`, or the error indicator when it doesn't fit.
    pub fn set(&mut self, value: impl fmt::Display) {
        let text = value.to_compact_string();
        if text.chars().count() > DISPLAY_WIDTH {
            tracing::debug!(%text, "display overflow");
            self.show_error();
        } else {
            self.text = text;
        }
    }

    pub fn show_error(&mut self) {
        self.text = ERROR_INDICATOR.into();
    }

    #[cfg(test)]
    pub fn is_error(&self) -> bool {
        self.text == ERROR_INDICATOR
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
