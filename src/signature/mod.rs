// Tue Jan 20 2026 - Alex

pub mod error;
pub mod expr;
pub mod types;
pub mod resolver;
pub mod generator;

pub use error::{ExprError, SignatureError};
pub use expr::Expression;
pub use types::{Category, Signature, SignatureFile};
pub use resolver::{Resolution, ResolvedSignature, SignatureResolver};
pub use generator::SignatureGenerator;
