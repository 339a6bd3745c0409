// Tue Jan 20 2026 - Alex

use super::args::{Args, CheckArgs, Command, MakeArgs, ScanArgs, ScanOptions, SignaturesArgs};
use crate::config::ScanConfig;
use crate::memory::{BinaryImage, Region, RegionScanner};
use crate::output::{render_signatures, ReportFormat, ScanReport};
use crate::pattern::{CompiledPattern, ParseError};
use crate::signature::{SignatureFile, SignatureGenerator, SignatureResolver};
use anyhow::Context;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};

pub struct CommandHandler {
    format: ReportFormat,
    quiet: bool,
}

impl CommandHandler {
    pub fn new() -> Self {
        Self {
            format: ReportFormat::Text,
            quiet: false,
        }
    }

    pub fn execute(mut self, args: Args) -> anyhow::Result<()> {
        self.setup_logging(&args)?;

        if args.no_color {
            colored::control::set_override(false);
        }
        if args.json {
            self.format = ReportFormat::Json;
        }
        self.quiet = args.quiet || args.json;

        let config = match &args.config {
            Some(path) => ScanConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ScanConfig::default(),
        };

        match args.command {
            Command::Scan(scan_args) => self.handle_scan(scan_args, config),
            Command::Check(check_args) => self.handle_check(check_args),
            Command::Signatures(sig_args) => self.handle_signatures(sig_args, config),
            Command::Make(make_args) => self.handle_make(make_args, config),
        }
    }

    fn setup_logging(&self, args: &Args) -> anyhow::Result<()> {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "off" => log::LevelFilter::Off,
            _ => log::LevelFilter::Info,
        };

        env_logger::Builder::new()
            .filter_level(level)
            .format_timestamp(None)
            .try_init()?;

        Ok(())
    }

    fn handle_scan(&self, args: ScanArgs, config: ScanConfig) -> anyhow::Result<()> {
        args.validate().map_err(|e| anyhow::anyhow!(e))?;

        let pattern = compile_or_explain(&args.pattern)?;

        let mut config = args.options.apply(config);
        if let Some(max_results) = args.max_results {
            config = config.with_max_results(max_results);
        }
        config.validate().map_err(|e| anyhow::anyhow!(e))?;

        let image = self.load_image(&args.input, &args.options)?;

        let spinner = self.spinner(&format!("Scanning for pattern: \"{}\"", pattern));
        let report = scan_report(&pattern, &image.regions(), config);

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        print!("{}", report.render(self.format)?);
        if self.format == ReportFormat::Json {
            println!();
        }

        Ok(())
    }

    fn handle_check(&self, args: CheckArgs) -> anyhow::Result<()> {
        let pattern = compile_or_explain(&args.pattern)?;

        if self.format == ReportFormat::Json {
            let report = ScanReport::new(&pattern, Vec::new(), 0, Duration::ZERO);
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("{} {}", "[+]".green(), pattern.to_string().bold());
        println!(
            "    {} bytes, {} fixed, {} wildcard",
            pattern.len(),
            pattern.fixed_count(),
            pattern.wildcard_count()
        );
        match pattern.anchor() {
            Some(anchor) => println!("    anchored on {:02X} at index {}", anchor.byte, anchor.index),
            None => println!("    {}", "no fixed bytes, every offset matches".yellow()),
        }

        Ok(())
    }

    fn handle_signatures(&self, args: SignaturesArgs, config: ScanConfig) -> anyhow::Result<()> {
        args.validate().map_err(|e| anyhow::anyhow!(e))?;

        let config = args.options.apply(config);
        config.validate().map_err(|e| anyhow::anyhow!(e))?;

        let file = SignatureFile::load(&args.signatures)
            .with_context(|| format!("Failed to load {}", args.signatures.display()))?;
        let image = self.load_image(&args.input, &args.options)?;

        let spinner = self.spinner(&format!("Resolving {} signatures", file.len()));
        let resolver = SignatureResolver::new(config);
        let results = resolver.resolve_all(&file, &image.regions());

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        print!("{}", render_signatures(&results, self.format)?);
        if self.format == ReportFormat::Json {
            println!();
        }

        let resolved = results.iter().filter(|r| r.resolution.is_resolved()).count();
        if !self.quiet {
            let marker = if resolved == results.len() { "[+]".green() } else { "[!]".yellow() };
            eprintln!("{} Resolved {}/{} signatures", marker, resolved, results.len());
        }

        Ok(())
    }

    fn handle_make(&self, args: MakeArgs, config: ScanConfig) -> anyhow::Result<()> {
        args.validate().map_err(|e| anyhow::anyhow!(e))?;

        let config = args.options.apply(config);
        config.validate().map_err(|e| anyhow::anyhow!(e))?;

        let image = self.load_image(&args.input, &args.options)?;

        let spinner = self.spinner(&format!("Creating signature for 0x{:X}", args.address));
        let generator = SignatureGenerator::new(config).with_max_length(args.max_length);
        let result = generator.generate(&image.regions(), args.address);

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        let pattern = result.with_context(|| format!("Failed to create a signature for 0x{:X}", args.address))?;

        if self.format == ReportFormat::Json {
            let report = serde_json::json!({
                "address": args.address,
                "pattern": pattern.to_string(),
                "length": pattern.len(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{} Generated Pattern: \"{}\"", "[+]".green(), pattern);
        }

        Ok(())
    }

    fn load_image(&self, path: &Path, options: &ScanOptions) -> anyhow::Result<BinaryImage> {
        if !self.quiet {
            eprintln!("{} Loading binary: {}", "[*]".blue(), path.display());
        }

        let image = if options.raw {
            BinaryImage::load_raw(path)
        } else {
            BinaryImage::load(path)
        }
        .with_context(|| format!("Failed to load binary {}", path.display()))?;

        if !self.quiet {
            eprintln!(
                "{} Loaded {:?} image with {} segments",
                "[+]".green(),
                image.format(),
                image.segments().len()
            );
        }

        Ok(image)
    }

    fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if self.quiet {
            return None;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Scans `regions` and builds the report, listing up to `config.max_results` addresses while
/// still counting every match.
fn scan_report(pattern: &CompiledPattern, regions: &[Region<'_>], config: ScanConfig) -> ScanReport {
    let start = Instant::now();
    let (results, total) = RegionScanner::new(config).scan_with_total(pattern, regions);
    ScanReport::new(pattern, results, total, start.elapsed())
}

/// Compiles `source`, pointing at the offending token on failure.
fn compile_or_explain(source: &str) -> anyhow::Result<CompiledPattern> {
    CompiledPattern::compile(source).map_err(|e| {
        if let ParseError::InvalidToken { position, token, .. } = &e {
            eprintln!("    {}", source);
            eprintln!("    {}{}", caret_indent(source, *position), "^".repeat(token.chars().count()).red());
        }
        anyhow::Error::new(e).context("Invalid pattern")
    })
}

/// Blanks out `source` up to byte `position`, keeping its whitespace so tabs line up.
fn caret_indent(source: &str, position: usize) -> String {
    source.get(..position)
        .unwrap_or(source)
        .chars()
        .map(|c| if c.is_whitespace() { c } else { ' ' })
        .collect()
}
