// Tue Jan 20 2026 - Alex

use crate::config::ScanConfig;
use crate::memory::{Region, RegionScanner};
use crate::pattern::CompiledPattern;
use crate::signature::{Category, Expression, Signature, SignatureFile};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved { address: u64 },
    NotFound,
    CountMismatch { expected: usize, found: usize },
    IndexOutOfRange { index: usize, found: usize },
    InvalidPattern { reason: String },
    InvalidOps { reason: String },
}

impl Resolution {
    pub fn address(&self) -> Option<u64> {
        match self {
            Self::Resolved { address } => Some(*address),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.address().is_some()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved { address } => write!(f, "0x{:X}", address),
            Self::NotFound => write!(f, "not found"),
            Self::CountMismatch { expected, found } => {
                write!(f, "invalid count (got {}, expected {})", found, expected)
            }
            Self::IndexOutOfRange { index, found } => {
                write!(f, "invalid index {} ({} results)", index, found)
            }
            Self::InvalidPattern { reason } => write!(f, "invalid pattern: {}", reason),
            Self::InvalidOps { reason } => write!(f, "invalid ops: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSignature {
    pub name: String,
    pub category: Category,
    #[serde(flatten)]
    pub resolution: Resolution,
}

/// Turns signatures into single addresses.
///
/// Every match of a signature is collected (no result cap applies here) and passed through the
/// signature's `ops` expression. If the results all agree, that address wins. Otherwise the number of matches must equal the
/// signature's `count`, and `index` picks one of them.
pub struct SignatureResolver {
    scanner: RegionScanner,
}

impl SignatureResolver {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            scanner: RegionScanner::new(config.with_max_results(usize::MAX)),
        }
    }

    pub fn resolve(&self, signature: &Signature, regions: &[Region<'_>]) -> Resolution {
        let pattern = match CompiledPattern::compile(&signature.pattern) {
            Ok(pattern) => pattern,
            Err(e) => {
                log::error!("Pattern \"{}\" is empty or malformed: {}", signature.pattern, e);
                return Resolution::InvalidPattern { reason: e.to_string() };
            }
        };

        let ops = match signature.ops.as_deref().map(Expression::parse).transpose() {
            Ok(ops) => ops,
            Err(e) => {
                log::error!("Error parsing \"{}\": {}", signature.ops.as_deref().unwrap_or(""), e);
                return Resolution::InvalidOps { reason: e.to_string() };
            }
        };

        let matches = self.scanner.scan(&pattern, regions);
        let results = match &ops {
            Some(ops) => evaluate(signature, ops, &matches, regions),
            None => matches,
        };
        let resolution = select(signature, &results);

        match &resolution {
            Resolution::Resolved { address } => {
                log::info!("Found {} @ 0x{:X}", signature.name, address)
            }
            Resolution::NotFound => {
                log::error!("Pattern \"{}\" (\"{}\") not found", signature.name, signature.pattern)
            }
            other => log::error!("{}: {}", signature.name, other),
        }

        resolution
    }

    pub fn resolve_all(&self, file: &SignatureFile, regions: &[Region<'_>]) -> Vec<ResolvedSignature> {
        let start = Instant::now();

        let results: Vec<_> = file.signatures.iter()
            .map(|signature| ResolvedSignature {
                name: signature.name.clone(),
                category: signature.category,
                resolution: self.resolve(signature, regions),
            })
            .collect();

        let elapsed_ms = start.elapsed().as_millis();
        log::info!(
            "Found {} patterns in {} ms ({:.2} ms avg)",
            results.iter().filter(|r| r.resolution.is_resolved()).count(),
            elapsed_ms,
            elapsed_ms as f64 / file.len().max(1) as f64
        );

        results
    }
}

impl Default for SignatureResolver {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

/// Runs `ops` on every match; matches it cannot be evaluated for are dropped.
fn evaluate(signature: &Signature, ops: &Expression, matches: &[u64], regions: &[Region<'_>]) -> Vec<u64> {
    matches.iter()
        .filter_map(|&here| match ops.evaluate(here, regions) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("{}: eval failed at 0x{:X}: {}", signature.name, here, e);
                None
            }
        })
        .collect()
}

/// Applies the count/index rules to the results of `signature`.
fn select(signature: &Signature, results: &[u64]) -> Resolution {
    if results.is_empty() {
        return Resolution::NotFound;
    }

    let unique: BTreeSet<u64> = results.iter().copied().collect();
    if unique.len() == 1 {
        return Resolution::Resolved { address: results[0] };
    }

    if results.len() != signature.count {
        return Resolution::CountMismatch {
            expected: signature.count,
            found: results.len(),
        };
    }

    match results.get(signature.index) {
        Some(&address) => Resolution::Resolved { address },
        None => Resolution::IndexOutOfRange {
            index: signature.index,
            found: results.len(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> SignatureResolver {
        SignatureResolver::new(ScanConfig::new().with_parallel(false))
    }

    const CODE: [u8; 12] = [
        0x55, 0x48, 0x89, 0xE5, 0xC3, 0xCC,
        0x55, 0x48, 0x89, 0xE5, 0x90, 0xC3,
    ];

    #[test]
    fn test_unique_match_resolves() {
        let region = Region::new(0x1000, &CODE);
        let signature = Signature::new("ret_pad", "C3 CC");
        assert_eq!(resolver().resolve(&signature, &[region]), Resolution::Resolved { address: 0x1004 });
    }

    #[test]
    fn test_ops_offset_applied() {
        let region = Region::new(0x1000, &CODE);
        let signature = Signature::new("after_pad", "C3 CC").with_ops("$ + 2");
        assert_eq!(resolver().resolve(&signature, &[region]).address(), Some(0x1006));

        let signature = Signature::new("before_pad", "C3 CC").with_ops("$ - 4");
        assert_eq!(resolver().resolve(&signature, &[region]).address(), Some(0x1000));
    }

    #[test]
    fn test_call_target_resolved() {
        // two calls to 0x2000 from 0x1000 and 0x1010
        let mut code = [0x90u8; 0x20];
        code[0x00..0x05].copy_from_slice(&[0xE8, 0xFB, 0x0F, 0x00, 0x00]);
        code[0x10..0x15].copy_from_slice(&[0xE8, 0xEB, 0x0F, 0x00, 0x00]);
        let region = Region::new(0x1000, &code);

        let signature = Signature::new("Target", "E8 ?? ?? ?? ??")
            .with_category(Category::Function)
            .with_ops("[$+1].r+4");
        assert_eq!(resolver().resolve(&signature, &[region]), Resolution::Resolved { address: 0x2000 });
    }

    #[test]
    fn test_failed_eval_drops_match() {
        // the second call's operand runs off the end of the region
        let code = [0xE8, 0xFB, 0x0F, 0x00, 0x00, 0x90, 0xE8, 0x01, 0x02];
        let region = Region::new(0x1000, &code);

        let signature = Signature::new("calls", "E8").with_ops("[$+1].r+4");
        assert_eq!(resolver().resolve(&signature, &[region]), Resolution::Resolved { address: 0x2000 });

        let signature = Signature::new("operand", "E8 01 02").with_ops("[$+1].d");
        assert_eq!(resolver().resolve(&signature, &[region]), Resolution::NotFound);
    }

    #[test]
    fn test_invalid_ops() {
        let region = Region::new(0, &CODE);
        let signature = Signature::new("broken", "C3 CC").with_ops("[$+1");
        assert!(matches!(
            resolver().resolve(&signature, &[region]),
            Resolution::InvalidOps { .. }
        ));
    }

    #[test]
    fn test_not_found() {
        let region = Region::new(0, &CODE);
        let signature = Signature::new("missing", "DE AD");
        assert_eq!(resolver().resolve(&signature, &[region]), Resolution::NotFound);
    }

    #[test]
    fn test_multiple_matches_need_count() {
        let region = Region::new(0, &CODE);
        let signature = Signature::new("prologue", "55 48 89 E5");
        assert_eq!(
            resolver().resolve(&signature, &[region]),
            Resolution::CountMismatch { expected: 1, found: 2 }
        );
    }

    #[test]
    fn test_index_selects_match() {
        let region = Region::new(0, &CODE);
        let signature = Signature::new("prologue", "55 48 89 E5").with_count(2).with_index(1);
        assert_eq!(resolver().resolve(&signature, &[region]), Resolution::Resolved { address: 6 });
    }

    #[test]
    fn test_index_out_of_range() {
        let region = Region::new(0, &CODE);
        let signature = Signature::new("prologue", "55 48 89 E5").with_count(2).with_index(5);
        assert_eq!(
            resolver().resolve(&signature, &[region]),
            Resolution::IndexOutOfRange { index: 5, found: 2 }
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let region = Region::new(0, &CODE);
        let signature = Signature::new("broken", "55 XX");
        assert!(matches!(
            resolver().resolve(&signature, &[region]),
            Resolution::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_agreeing_results_ignore_count() {
        let signature = Signature::new("same", "55");
        assert_eq!(select(&signature, &[8, 8, 8]), Resolution::Resolved { address: 8 });
        assert_eq!(select(&signature, &[]), Resolution::NotFound);
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let region = Region::new(0x1000, &CODE);
        let file = SignatureFile {
            signatures: vec![
                Signature::new("pad", "C3 CC").with_category(Category::Data),
                Signature::new("nope", "AB CD EF"),
            ],
        };

        let results = resolver().resolve_all(&file, &[region]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "pad");
        assert_eq!(results[0].resolution.address(), Some(0x1004));
        assert_eq!(results[1].resolution, Resolution::NotFound);
    }

    #[test]
    fn test_serializes_with_status_tag() {
        let resolved = ResolvedSignature {
            name: "pad".to_string(),
            category: Category::Function,
            resolution: Resolution::Resolved { address: 16 },
        };
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["status"], "resolved");
        assert_eq!(json["address"], 16);
        assert_eq!(json["category"], "Function");
    }
}
