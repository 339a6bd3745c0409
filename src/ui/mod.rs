// Tue Jan 20 2026 - Alex

pub mod cli;

pub use cli::{Args, Command, CommandHandler};
