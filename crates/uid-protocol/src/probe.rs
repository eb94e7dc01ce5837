//! Probe patterns
//!
//! The scanner grows a probe body one symbol at a time. Internally the
//! body is kept in the order symbols were appended; on the wire it is
//! sent reversed after the prefix, so appending a symbol lengthens the
//! right-anchored UID suffix by one character on its left:
//!
//! ```text
//! body:  A 7       (A appended first)
//! wire:  C B 7 A   (matches UIDs ending in "7A")
//! ```

use std::fmt;

use crate::alphabet::is_alphabet_char;
use crate::error::ParseError;
use crate::{MAX_BODY_LEN, PREFIX_LEN};

/// Two-character vendor prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Prefix(String);

impl Prefix {
    /// Validate and wrap a prefix
    pub fn new(prefix: impl Into<String>) -> Result<Self, ParseError> {
        let prefix = prefix.into();

        if prefix.chars().count() != PREFIX_LEN {
            return Err(ParseError::PrefixLength {
                prefix,
                expected: PREFIX_LEN,
            });
        }
        if let Some(ch) = prefix.chars().find(|c| !is_alphabet_char(*c)) {
            return Err(ParseError::InvalidCharacter { value: prefix, ch });
        }

        Ok(Self(prefix))
    }

    /// The prefix text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Prefix {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Prefix::new(value)
    }
}

impl From<Prefix> for String {
    fn from(prefix: Prefix) -> Self {
        prefix.0
    }
}

/// A probe: prefix plus body in natural (append) order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Probe {
    prefix: Prefix,
    body: String,
}

impl Probe {
    /// The bare-prefix probe every search starts from
    pub fn root(prefix: Prefix) -> Self {
        Self {
            prefix,
            body: String::new(),
        }
    }

    /// A probe one symbol deeper than this one
    pub fn child(&self, symbol: char) -> Self {
        let mut body = String::with_capacity(self.body.len() + 1);
        body.push_str(&self.body);
        body.push(symbol);
        Self {
            prefix: self.prefix.clone(),
            body,
        }
    }

    /// The vendor prefix
    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// The body in natural order
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Body length in symbols
    pub fn depth(&self) -> usize {
        self.body.len()
    }

    /// True once the body pins the entire UID and cannot be refined further
    pub fn is_full(&self) -> bool {
        self.depth() >= MAX_BODY_LEN
    }

    /// The line sent to responders: prefix followed by the reversed body
    pub fn wire(&self) -> String {
        let mut line = String::with_capacity(PREFIX_LEN + self.body.len());
        line.push_str(self.prefix.as_str());
        line.extend(self.body.chars().rev());
        line
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire())
    }
}
