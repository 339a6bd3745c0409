// Tue Jan 20 2026 - Alex

use crate::pattern::CompiledPattern;
use crate::signature::ResolvedSignature;
use itertools::Itertools;
use serde::Serialize;
use std::fmt::Write;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Results of scanning one input for one pattern.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub pattern: String,
    pub length: usize,
    pub bytes: String,
    pub masks: String,
    pub elapsed_ms: u128,
    /// Every match in the input, including the ones not listed in `results`.
    pub total: usize,
    pub truncated: bool,
    pub results: Vec<u64>,
}

impl ScanReport {
    /// `results` holds the addresses to list and `total` the number of matches the scan saw.
    pub fn new(pattern: &CompiledPattern, results: Vec<u64>, total: usize, elapsed: Duration) -> Self {
        let truncated = total > results.len();

        Self {
            pattern: pattern.to_string(),
            length: pattern.len(),
            bytes: hex(&pattern.bytes()),
            masks: hex(&pattern.masks()),
            elapsed_ms: elapsed.as_millis(),
            total,
            truncated,
            results,
        }
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Json => serde_json::to_string_pretty(self),
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(
            out,
            "Found {} results for \"{}\" in {} ms:",
            self.total, self.pattern, self.elapsed_ms
        );
        let _ = writeln!(out, "Pattern: Length {}, \"{}\", \"{}\"", self.length, self.bytes, self.masks);

        if self.truncated {
            let _ = writeln!(out, "Too many results, only showing first {}.", self.results.len());
        }

        out.push('\n');

        for result in &self.results {
            let _ = writeln!(out, "0x{:X}", result);
        }

        out
    }
}

pub fn render_signatures(results: &[ResolvedSignature], format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(results),
        ReportFormat::Text => {
            let width = results.iter().map(|r| r.name.len()).max().unwrap_or(0);
            let mut out = String::new();
            for result in results {
                let _ = writeln!(
                    out,
                    "{:<width$}  {:<8}  {}",
                    result.name,
                    result.category.to_string(),
                    result.resolution,
                    width = width
                );
            }
            Ok(out)
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{Category, Resolution};

    fn pattern() -> CompiledPattern {
        CompiledPattern::compile("48 ?? 05").unwrap()
    }

    #[test]
    fn test_text_report() {
        let report = ScanReport::new(&pattern(), vec![0x10, 0x2F], 2, Duration::from_millis(3));
        let text = report.to_text();

        assert!(text.starts_with("Found 2 results for \"48 ?? 05\" in 3 ms:\n"));
        assert!(text.contains("Pattern: Length 3, \"48 00 05\", \"FF 00 FF\""));
        assert!(text.contains("0x10\n0x2F\n"));
        assert!(!text.contains("Too many results"));
    }

    #[test]
    fn test_truncated_report() {
        let report = ScanReport::new(&pattern(), (0..4).collect(), 10, Duration::ZERO);
        assert!(report.truncated);
        let text = report.to_text();
        assert!(text.starts_with("Found 10 results"));
        assert!(text.contains("Too many results, only showing first 4."));
    }

    #[test]
    fn test_json_report() {
        let report = ScanReport::new(&pattern(), vec![7], 1, Duration::ZERO);
        let json: serde_json::Value = serde_json::from_str(&report.render(ReportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["pattern"], "48 ?? 05");
        assert_eq!(json["results"][0], 7);
        assert_eq!(json["truncated"], false);
    }

    #[test]
    fn test_signature_table() {
        let results = vec![
            ResolvedSignature {
                name: "main".to_string(),
                category: Category::Function,
                resolution: Resolution::Resolved { address: 0x401000 },
            },
            ResolvedSignature {
                name: "gVersion".to_string(),
                category: Category::Data,
                resolution: Resolution::NotFound,
            },
        ];
        let text = render_signatures(&results, ReportFormat::Text).unwrap();
        assert!(text.contains("main      Function  0x401000"));
        assert!(text.contains("gVersion  Data      not found"));
    }
}
