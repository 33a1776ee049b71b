//! The dispatch layer between key presses and the calculator core.

use crate::calculator::Calculator;
use crate::clipboard::{parse_float, Clipboard};
use crate::clock::{Clock, Readout};
use crate::config::Config;
use crate::display::Display;
use crate::evaluator::format_number;
use crate::input::Input;
use crate::tokenizer::Key;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

pub trait Speaker {
    fn click(&mut self);
}

/// Rings the terminal bell.
pub struct TerminalSpeaker;

impl Speaker for TerminalSpeaker {
    fn click(&mut self) {
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07").and_then(|_| stderr.flush());
    }
}

pub struct Widget {
    calculator: Calculator,
    display: Display,
    clock: Clock,
    readout: Readout,
    audio_on: bool,
    double_press: Duration,
    last_clear_all: Option<Instant>,
    clipboard: Box<dyn Clipboard>,
    speaker: Box<dyn Speaker>,
}

impl Widget {
    pub fn new(config: &Config, clipboard: Box<dyn Clipboard>, speaker: Box<dyn Speaker>) -> Self {
        let clock = Clock {
            locale: config.locale,
            utc_offset_minutes: config.utc_offset_minutes,
        };
        Widget {
            calculator: Calculator::default(),
            display: Display::default(),
            readout: clock.readout(),
            clock,
            audio_on: config.audio,
            double_press: config.double_press_window(),
            last_clear_all: None,
            clipboard,
            speaker,
        }
    }

    pub fn press(&mut self, key: &Key) {
        self.press_at(key, Instant::now())
    }

    pub fn press_at(&mut self, key: &Key, now: Instant) {
        if self.audio_on {
            self.speaker.click();
        }

        match Input::from_key(key) {
            Ok(Some(input)) => {
                self.apply(input);
                // Only the on-screen button toggles the click
                if input == Input::ClearAll && matches!(key, Key::Button(_)) {
                    self.clear_all_pressed(now);
                }
            }
            Ok(None) => trace!(?key, "ignored key"),
            Err(e) => {
                debug!(%e, "rejected button");
                self.display.show_error();
            }
        }
    }

    pub fn apply(&mut self, input: Input) {
        trace!(?input, "dispatch");
        let outcome = match input {
            Input::Digit(digit) => self.calculator.push_digit(digit),
            Input::Dot => self.calculator.push_dot(),
            Input::Op(op) => self.calculator.push_operator(op),
            Input::Evaluate => self.calculator.calc(),
            Input::ClearAll => {
                self.calculator.clear_all();
                Ok(())
            }
            Input::ClearEntry => {
                self.calculator.clear_entry();
                Ok(())
            }
            Input::Copy => return self.copy(),
            Input::Paste => return self.paste_from_clipboard(),
        };

        self.refresh();
        // Applied after the refresh so it isn't overwritten
        if let Err(e) = outcome {
            debug!(%e, "evaluation failed");
            self.display.show_error();
        }
    }

    /// Shows pasted text directly; the operation buffer is left untouched.
    pub fn paste(&mut self, text: &str) {
        match parse_float(text) {
            Some(value) if value.is_finite() => self.display.set(format_number(value)),
            _ => self.display.show_error(),
        }
    }

    pub fn tick(&mut self) {
        self.readout = self.clock.readout();
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn readout(&self) -> &Readout {
        &self.readout
    }

    #[cfg(test)]
    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    #[cfg(test)]
    pub fn audio_on(&self) -> bool {
        self.audio_on
    }

    fn refresh(&mut self) {
        match self.calculator.current_operand() {
            Some(operand) => self.display.set(operand),
            None => self.display.set(0),
        }
    }

    fn copy(&mut self) {
        if let Err(e) = self.clipboard.set_text(self.display.text()) {
            warn!(%e, "copy failed");
        }
    }

    fn paste_from_clipboard(&mut self) {
        match self.clipboard.get_text() {
            Ok(text) => self.paste(&text),
            Err(e) => warn!(%e, "paste failed"),
        }
    }

    fn clear_all_pressed(&mut self, now: Instant) {
        match self.last_clear_all.take() {
            Some(prev) if now.duration_since(prev) <= self.double_press => {
                self.audio_on = !self.audio_on;
                debug!(audio_on = self.audio_on, "audio toggled");
            }
            _ => self.last_clear_all = Some(now),
        }
    }
}
