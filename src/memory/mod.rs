// Tue Jan 20 2026 - Alex

pub mod error;
pub mod region;
pub mod mmap;
pub mod binary;
pub mod scanner;

pub use error::MemoryError;
pub use region::Region;
pub use mmap::MappedFile;
pub use binary::{BinaryFormat, BinaryImage, Segment};
pub use scanner::RegionScanner;

use crate::config::ScanConfig;
use crate::pattern::CompiledPattern;
use std::path::Path;

/// Loads `path` as an executable image and returns the addresses of up to
/// `config.max_results` matches.
pub fn scan_file<P: AsRef<Path>>(
    path: P,
    pattern: &CompiledPattern,
    config: ScanConfig,
) -> Result<Vec<u64>, MemoryError> {
    let image = BinaryImage::load(path)?;
    let scanner = RegionScanner::new(config);
    Ok(scanner.scan(pattern, &image.regions()))
}
