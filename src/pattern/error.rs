// Tue Jan 20 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Pattern is empty")]
    Empty,
    #[error("Invalid token \"{token}\" at index {index} (column {position})")]
    InvalidToken {
        token: String,
        /// Ordinal of the token among the whitespace-separated tokens.
        index: usize,
        /// Byte column of the token in the pattern text.
        position: usize,
    },
}

impl ParseError {
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::InvalidToken { token, .. } => Some(token),
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::InvalidToken { index, .. } => Some(*index),
        }
    }
}
