// Tue Jan 20 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed signature file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed signature file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] crate::pattern::ParseError),
    #[error("Signature file contains no signatures")]
    NoSignatures,
    #[error("Address 0x{0:X} is not inside any region")]
    UnknownAddress(u64),
    #[error("No unique pattern found within {0} bytes")]
    PatternTooLong(usize),
}

/// Errors from parsing or evaluating an `ops` expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
    #[error("Unexpected '{found}' at column {position}")]
    Unexpected { found: char, position: usize },
    #[error("Invalid number \"{text}\" at column {position}")]
    InvalidNumber { text: String, position: usize },
    #[error("Unknown symbol \"{name}\" at column {position}")]
    UnknownSymbol { name: String, position: usize },
    #[error("Invalid load suffix at column {position}")]
    InvalidLoadSize { position: usize },
    #[error("Division by zero")]
    DivideByZero,
    #[error("Cannot read {size} bytes at 0x{address:X}")]
    Unreadable { address: u64, size: usize },
}
