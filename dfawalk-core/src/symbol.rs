//! Input symbols and case folding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display form of the epsilon sentinel.
pub const EPSILON: char = '\u{03B5}';

/// A single input symbol as seen by the engine.
///
/// `Epsilon` is substituted when a position has no real character behind it
/// (empty input). It never matches an explicit trigger, so it always takes
/// the fallback transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    Char(char),
    Epsilon,
}

impl Symbol {
    /// Returns the character for real symbols.
    pub fn as_char(&self) -> Option<char> {
        match self {
            Symbol::Char(c) => Some(*c),
            Symbol::Epsilon => None,
        }
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        Symbol::Char(normalize(c))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Char(c) => write!(f, "{}", c),
            Symbol::Epsilon => write!(f, "{}", EPSILON),
        }
    }
}

/// Folds a character to its canonical lower-case form.
///
/// Characters whose lower-case mapping expands to several scalar values are
/// returned unchanged.
pub fn normalize(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(folded), None) => folded,
        _ => c,
    }
}

/// Returns the normalized symbol at a character position of `input`, or
/// `Epsilon` when the position is past the end.
pub fn symbol_at(input: &str, position: usize) -> Symbol {
    input
        .chars()
        .nth(position)
        .map(Symbol::from)
        .unwrap_or(Symbol::Epsilon)
}
