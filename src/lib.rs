// Tue Jan 20 2026 - Alex

//! Wildcard byte-pattern compiler and scanner.
//!
//! A pattern such as `"48 8B 05 ?? ?? ?? ?? C3"` is compiled once into a [`CompiledPattern`]
//! and then scanned against any number of buffers:
//!
//! ```
//! use binpattern::CompiledPattern;
//!
//! let pattern = CompiledPattern::compile("AA ?? CC").unwrap();
//! assert_eq!(pattern.scan(&[0xAA, 0x00, 0xCC, 0xAA, 0xFF, 0xCC], 10), vec![0, 3]);
//! ```
//!
//! Scans are limited to `max_results` matches, leftmost first, and overlapping matches are
//! reported. The compiled pattern is released by dropping it.

pub mod config;
pub mod pattern;
pub mod memory;
pub mod signature;
pub mod output;
pub mod capi;
pub mod ui;

pub use config::ScanConfig;
pub use pattern::{compile, scan, CompiledPattern, ParseError, Token};
pub use memory::{BinaryImage, Region, RegionScanner};
pub use signature::{Signature, SignatureFile, SignatureGenerator, SignatureResolver};
