//! Error types for UID protocol parsing

use thiserror::Error;

/// Errors that can occur while validating protocol values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Prefix has the wrong length
    #[error("prefix {prefix:?} must be exactly {expected} characters")]
    PrefixLength { prefix: String, expected: usize },

    /// Character outside the UID alphabet
    #[error("invalid character {ch:?} in {value:?}")]
    InvalidCharacter { value: String, ch: char },

    /// UID has the wrong length
    #[error("uid {uid:?} must be exactly {expected} characters")]
    UidLength { uid: String, expected: usize },
}
