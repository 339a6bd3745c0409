// Tue Jan 20 2026 - Alex

use crate::config::ScanConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "binpattern")]
#[command(author = "Alex")]
#[command(version)]
#[command(about = "Wildcard byte-pattern scanner for binaries", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[arg(long, global = true)]
    pub no_color: bool,

    #[arg(long, global = true)]
    pub json: bool,

    /// JSON file with scan settings; command-line flags take precedence.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a file for a pattern
    Scan(ScanArgs),
    /// Parse a pattern and print its canonical form
    Check(CheckArgs),
    /// Resolve every signature in a signature file
    Signatures(SignaturesArgs),
    /// Build the shortest unique pattern starting at an address
    Make(MakeArgs),
}

#[derive(Parser, Debug)]
pub struct ScanOptions {
    /// Scan the file as flat bytes instead of by executable segment
    #[arg(long)]
    pub raw: bool,

    #[arg(long)]
    pub sequential: bool,

    #[arg(long)]
    pub threads: Option<usize>,

    #[arg(long)]
    pub chunk_size: Option<usize>,
}

impl ScanOptions {
    pub fn apply(&self, mut config: ScanConfig) -> ScanConfig {
        if self.sequential {
            config = config.with_parallel(false);
        }
        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }
        if let Some(chunk_size) = self.chunk_size {
            config = config.with_chunk_size(chunk_size);
        }
        config
    }
}

#[derive(Parser, Debug)]
pub struct ScanArgs {
    pub input: PathBuf,

    /// e.g. "48 8B 05 ?? ?? ?? ?? C3"
    pub pattern: String,

    /// Zero lists no addresses but still reports the match count
    #[arg(short, long)]
    pub max_results: Option<usize>,

    #[command(flatten)]
    pub options: ScanOptions,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    pub pattern: String,
}

#[derive(Parser, Debug)]
pub struct SignaturesArgs {
    pub input: PathBuf,

    pub signatures: PathBuf,

    #[command(flatten)]
    pub options: ScanOptions,
}

#[derive(Parser, Debug)]
pub struct MakeArgs {
    pub input: PathBuf,

    /// Hexadecimal, with or without a 0x prefix
    #[arg(value_parser = parse_address)]
    pub address: u64,

    #[arg(long, default_value_t = crate::signature::generator::MAX_LENGTH)]
    pub max_length: usize,

    #[command(flatten)]
    pub options: ScanOptions,
}

fn parse_address(s: &str) -> Result<u64, String> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| format!("Invalid address \"{}\": {}", s, e))
}

impl ScanArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.input.exists() {
            return Err(format!("Input file does not exist: {}", self.input.display()));
        }
        Ok(())
    }
}

impl SignaturesArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.input.exists() {
            return Err(format!("Input file does not exist: {}", self.input.display()));
        }
        if !self.signatures.exists() {
            return Err(format!("Signature file does not exist: {}", self.signatures.display()));
        }
        Ok(())
    }
}

impl MakeArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.input.exists() {
            return Err(format!("Input file does not exist: {}", self.input.display()));
        }
        if self.max_length == 0 {
            return Err("max_length must be greater than 0".to_string());
        }
        Ok(())
    }
}
