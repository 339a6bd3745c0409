// Tue Jan 20 2026 - Alex

pub mod token;
pub mod error;
pub mod pattern;
pub mod compiler;
pub mod scanner;

pub use token::Token;
pub use error::ParseError;
pub use pattern::{Anchor, CompiledPattern};
pub use compiler::{compile, parse};
pub use scanner::{scan, Matches};
