// Tue Jan 20 2026 - Alex

use crate::config::ScanConfig;
use crate::memory::{Region, RegionScanner};
use crate::pattern::CompiledPattern;
use crate::signature::SignatureError;

/// Shortest pattern ever produced.
pub const MIN_LENGTH: usize = 5;
/// Longest pattern tried before giving up.
pub const MAX_LENGTH: usize = 256;

/// Builds a pattern for an address by taking bytes from it until nothing else in the regions
/// matches.
///
/// Every byte is kept as-is; instruction operands are not wildcarded.
pub struct SignatureGenerator {
    scanner: RegionScanner,
    max_length: usize,
}

impl SignatureGenerator {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            // Two matches are enough to tell the pattern is not unique.
            scanner: RegionScanner::new(config.with_max_results(2)),
            max_length: MAX_LENGTH,
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length.max(1);
        self
    }

    pub fn generate(&self, regions: &[Region<'_>], address: u64) -> Result<CompiledPattern, SignatureError> {
        let region = regions.iter()
            .find(|r| r.contains(address))
            .ok_or(SignatureError::UnknownAddress(address))?;

        let offset = (address - region.base()) as usize;
        let available = &region.data()[offset..];
        let limit = self.max_length.min(available.len());

        for len in MIN_LENGTH.min(limit)..=limit {
            let pattern = CompiledPattern::from_bytes(&available[..len])?;
            if self.scanner.scan(&pattern, regions) == [address] {
                log::info!("Generated pattern for 0x{:X}: \"{}\"", address, pattern);
                return Ok(pattern);
            }
        }

        log::error!("No unique pattern for 0x{:X} within {} bytes", address, limit);
        Err(SignatureError::PatternTooLong(limit))
    }
}

impl Default for SignatureGenerator {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}
