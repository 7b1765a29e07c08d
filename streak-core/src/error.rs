//! Error types for streak-core.
//!
//! Transition functions are total; errors only arise at the boundary where
//! persisted strings are turned back into typed state.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreakError {
    /// Input is not a `YYYY-MM-DD` calendar date.
    #[error("malformed date '{input}' (expected YYYY-MM-DD)")]
    MalformedDate { input: String },

    /// A persisted counter is negative, fractional, or not a number at all.
    #[error("corrupted value for '{key}': '{value}' is not a non-negative integer")]
    NegativeOrNonIntegerCount { key: String, value: String },

    #[error("Type a name first.")]
    InvalidName,

    #[error("unknown theme '{input}' (expected light or dark)")]
    InvalidTheme { input: String },

    #[error("invalid time '{input}' (expected HH:MM)")]
    InvalidTime { input: String },

    /// The backing key/value store failed.
    #[error("store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, StreakError>;
