//! Keyboard shortcut combos
//!
//! Combos are normalized to the order the host builds them from key
//! events: `Ctrl`, `Cmd`, `Alt`, `Shift`, then the key, with single
//! characters upper-cased ("ctrl+shift+s" → "Ctrl+Shift+S").

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyComboError {
    #[error("Empty key combo")]
    Empty,

    #[error("Key combo '{0}' has no key after its modifiers")]
    MissingKey(String),

    #[error("Key combo '{0}' has more than one key")]
    MultipleKeys(String),
}

/// A modifier set plus one key
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub struct KeyCombo {
    pub ctrl: bool,
    pub cmd: bool,
    pub alt: bool,
    pub shift: bool,
    /// Empty for an unbound palette entry
    pub key: String,
}

impl KeyCombo {
    /// Parse "Ctrl+Shift+1" style text (case-insensitive modifiers)
    pub fn parse(text: &str) -> Result<Self, KeyComboError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(KeyComboError::Empty);
        }

        let mut combo = KeyCombo::default();
        for part in text.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => combo.ctrl = true,
                "cmd" | "meta" | "command" => combo.cmd = true,
                "alt" | "option" => combo.alt = true,
                "shift" => combo.shift = true,
                _ => {
                    if !combo.key.is_empty() {
                        return Err(KeyComboError::MultipleKeys(text.to_string()));
                    }
                    combo.key = normalize_key(part);
                }
            }
        }

        if combo.key.is_empty() {
            return Err(KeyComboError::MissingKey(text.to_string()));
        }
        Ok(combo)
    }

    /// Build a combo from the fields of a keyboard event
    pub fn from_event(ctrl: bool, cmd: bool, alt: bool, shift: bool, key: &str) -> Self {
        KeyCombo {
            ctrl,
            cmd,
            alt,
            shift,
            key: normalize_key(key),
        }
    }

    /// Palette placeholder that never matches an event
    pub fn unbound() -> Self {
        KeyCombo::default()
    }

    pub fn is_unbound(&self) -> bool {
        self.key.is_empty()
    }
}

fn normalize_key(key: &str) -> String {
    if key.chars().count() == 1 {
        key.to_uppercase()
    } else {
        key.to_string()
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.cmd {
            parts.push("Cmd");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(&self.key);
        f.write_str(&parts.join("+"))
    }
}

impl TryFrom<String> for KeyCombo {
    type Error = KeyComboError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Ok(KeyCombo::unbound());
        }
        KeyCombo::parse(&value)
    }
}

impl From<KeyCombo> for String {
    fn from(combo: KeyCombo) -> Self {
        if combo.is_unbound() {
            return String::new();
        }
        combo.to_string()
    }
}
