use compact_str::{CompactString, ToCompactString};
use thiserror::Error;

#[derive(Debug, Default)]
enum TokenizerState {
    #[default]
    Clean,
    InKeyName(CompactString),
    InButton(CompactString),
}

/// Splits a line of text into key presses.
///
/// Plain characters are single key presses, `<Name>` is a named key and
/// `{id}` activates an on-screen button.
#[derive(Debug, Default)]
pub struct Tokenizer {
    state: TokenizerState,
}

impl Tokenizer {
    pub fn update(&mut self, c: char) -> Result<Option<Key>, TokenizeError> {
        use TokenizerState::*;

        match self.state {
            Clean => match c {
                '<' => {
                    self.state = InKeyName(CompactString::default());
                    Ok(None)
                }
                '{' => {
                    self.state = InButton(CompactString::default());
                    Ok(None)
                }
                '>' | '}' => Err(TokenizeError::UnexpectedToken(c)),
                // Ignore whitespace between presses
                _ if c.is_whitespace() => Ok(None),
                _ => Ok(Some(Key::Char(c))),
            },
            InKeyName(ref mut name) => match c {
                '>' => {
                    let key = named_key(name)?;
                    self.state = Clean;
                    Ok(Some(key))
                }
                '<' | '{' | '}' => Err(TokenizeError::UnexpectedToken(c)),
                _ => {
                    name.push(c);
                    Ok(None)
                }
            },
            InButton(ref mut id) => match c {
                '}' => {
                    let key = Key::Button(id.trim().to_compact_string());
                    self.state = Clean;
                    Ok(Some(key))
                }
                '<' | '>' | '{' => Err(TokenizeError::UnexpectedToken(c)),
                _ => {
                    id.push(c);
                    Ok(None)
                }
            },
        }
    }

    pub fn finalize(&mut self) -> Result<(), TokenizeError> {
        let state = std::mem::take(&mut self.state);
        match state {
            TokenizerState::Clean => Ok(()),
            TokenizerState::InKeyName(name) => Err(TokenizeError::Unterminated('<', name)),
            TokenizerState::InButton(id) => Err(TokenizeError::Unterminated('{', id)),
        }
    }

    /// Drops any half-read group, e.g. after an error.
    pub fn reset(&mut self) {
        self.state = TokenizerState::Clean;
    }
}

fn named_key(name: &str) -> Result<Key, TokenizeError> {
    let key = match name.trim() {
        "Escape" | "Esc" => Key::Escape,
        "Backspace" | "BS" => Key::Backspace,
        "Enter" | "CR" => Key::Enter,
        "C-c" => Key::Ctrl('c'),
        "C-v" => Key::Ctrl('v'),
        other => return Err(TokenizeError::UnknownKey(other.to_compact_string())),
    };
    Ok(key)
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("Unexpected '{0}'")]
    UnexpectedToken(char),
    #[error("Unknown key: <{0}>")]
    UnknownKey(CompactString),
    #[error("Unterminated '{0}{1}'")]
    Unterminated(char, CompactString),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Backspace,
    Enter,
    Ctrl(char),
    Button(CompactString),
}
