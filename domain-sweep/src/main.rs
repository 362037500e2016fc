//! Domain Sweep CLI Application
//!
//! Generates every short name under one or more suffixes, sweeps them through
//! the configured WHOIS sources with retries, and writes the available,
//! registered and failed sets to an output directory.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use console::Term;
use domain_sweep_lib::generate::{
    ensure_within_limit, estimate_total, generate_for_suffixes, normalize_suffix,
};
use domain_sweep_lib::protocols::is_whois_available;
use domain_sweep_lib::report::ERROR_FILE;
use domain_sweep_lib::suffixes::load_suffix_file;
use domain_sweep_lib::utils::{parse_duration, parse_fallback};
use domain_sweep_lib::{
    env_config_path, load_env_config, ConfigManager, OutputWriter, RunInfo, Settings,
    SettingsLayer, SourceKind, Sweep,
};
use std::collections::HashSet;
use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Runs above this many candidates ask for confirmation on a terminal.
const CONFIRM_THRESHOLD: usize = 5000;

/// CLI arguments for domain-sweep
#[derive(Parser, Debug)]
#[command(name = "domain-sweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sweep every short name under a suffix for registration status")]
#[command(
    long_about = "Generate every name of a given length under one or more suffixes and check each \
                  through a primary WHOIS source, a fallback source, and retry passes over failures.\n\n\
                  Results land in the output directory: domain.txt (available), registered.txt, \
                  error.txt (still failing), results.json and a markdown report."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Suffixes to sweep (e.g. im io)
    #[arg(value_name = "SUFFIX", help_heading = "Candidates")]
    pub suffixes: Vec<String>,

    /// File with one suffix per line ('#' comments allowed)
    #[arg(long = "suffix-file", value_name = "FILE", help_heading = "Candidates")]
    pub suffix_file: Option<PathBuf>,

    /// Label length to generate [default: 2]
    #[arg(short = 'l', long = "length", value_name = "N", help_heading = "Candidates")]
    pub length: Option<usize>,

    /// Use letters only in the default alphabet
    #[arg(long = "no-digits", conflicts_with = "alphabet", help_heading = "Candidates")]
    pub no_digits: bool,

    /// Explicit alphabet to generate from (e.g. "abc123")
    #[arg(long = "alphabet", value_name = "CHARS", help_heading = "Candidates")]
    pub alphabet: Option<String>,

    /// Print the candidates without checking them
    #[arg(long = "dry-run", help_heading = "Candidates")]
    pub dry_run: bool,

    /// Max concurrent checks (default: 20, max: 100)
    #[arg(short = 'c', long = "concurrency", value_name = "N", help_heading = "Performance")]
    pub concurrency: Option<usize>,

    /// Retry passes over failed domains after the first [default: 2]
    #[arg(short = 'r', long = "retries", value_name = "N", help_heading = "Performance")]
    pub retries: Option<usize>,

    /// Per-request timeout, e.g. "10s" or "500ms" [default: 10s]
    #[arg(short = 't', long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Pause after each check while holding its slot, e.g. "2s"
    #[arg(long = "delay", value_name = "DURATION", help_heading = "Performance")]
    pub delay: Option<String>,

    /// Skip the confirmation prompt for large sweeps
    #[arg(short = 'y', long = "yes", help_heading = "Performance")]
    pub yes: bool,

    /// Primary source: whois, json-api or raw-api [default: json-api]
    #[arg(long = "primary", value_name = "KIND", value_parser = parse_source_kind, help_heading = "Sources")]
    pub primary: Option<SourceKind>,

    /// Fallback source: whois, json-api, raw-api or none [default: raw-api]
    #[arg(long = "fallback", value_name = "KIND", help_heading = "Sources")]
    pub fallback: Option<String>,

    /// Base URL of the primary HTTP source
    #[arg(long = "primary-url", value_name = "URL", help_heading = "Sources")]
    pub primary_url: Option<String>,

    /// Base URL of the fallback HTTP source
    #[arg(long = "fallback-url", value_name = "URL", help_heading = "Sources")]
    pub fallback_url: Option<String>,

    /// WHOIS client executable [default: whois]
    #[arg(long = "whois-bin", value_name = "NAME", help_heading = "Sources")]
    pub whois_bin: Option<String>,

    /// API key sent as a bearer token to HTTP sources
    #[arg(long = "api-key", value_name = "KEY", help_heading = "Sources")]
    pub api_key: Option<String>,

    /// Output directory [default: output]
    #[arg(short = 'o', long = "output", value_name = "DIR", help_heading = "Output")]
    pub output: Option<PathBuf>,

    /// Print the final report (or dry-run candidates) as JSON
    #[arg(short = 'j', long = "json", help_heading = "Output")]
    pub json: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// Show debug logs
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

fn parse_source_kind(value: &str) -> Result<SourceKind, String> {
    value.parse()
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_sweep(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the flags.
fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,domain_sweep={0},domain_sweep_lib={0}",
            level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.suffixes.is_empty() && args.suffix_file.is_none() {
        return Err(
            "You must specify at least one suffix, or a suffix file with --suffix-file"
                .to_string(),
        );
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    if args.length == Some(0) {
        return Err("Length must be at least 1".to_string());
    }

    Ok(())
}

/// Translate explicit CLI flags into the highest-precedence config layer.
fn args_layer(args: &Args) -> Result<SettingsLayer, String> {
    let duration = |flag: &str, value: &Option<String>| {
        value
            .as_deref()
            .map(|v| {
                parse_duration(v).ok_or_else(|| {
                    format!("Invalid --{} '{}'. Use format like '500ms', '10s', '2m'", flag, v)
                })
            })
            .transpose()
    };

    Ok(SettingsLayer {
        concurrency: args.concurrency,
        retries: args.retries,
        timeout: duration("timeout", &args.timeout)?,
        delay: duration("delay", &args.delay)?,
        primary: args.primary,
        fallback: args
            .fallback
            .as_deref()
            .map(parse_fallback)
            .transpose()?,
        primary_url: args.primary_url.clone(),
        fallback_url: args.fallback_url.clone(),
        whois_binary: args.whois_bin.clone(),
        api_key: args.api_key.clone(),
        length: args.length,
        digits: args.no_digits.then_some(false),
        alphabet: args.alphabet.clone(),
        max_suffix_length: None,
        output_dir: args.output.clone(),
    })
}

/// Build settings with file, environment and CLI layers.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (DS_*)
/// 3. Config file (--config / DS_CONFIG, or discovered files)
/// 4. Built-in defaults
fn build_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let manager = ConfigManager::new(args.verbose);
    let explicit = args.config.clone().or_else(env_config_path);

    let layer = manager
        .load_layer(explicit.as_deref())?
        .merge(load_env_config())
        .merge(args_layer(args)?);

    Ok(layer.resolve()?)
}

/// Positional suffixes first, then the suffix file, without duplicates.
fn collect_suffixes(args: &Args, max_length: usize) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut suffixes = Vec::new();
    for suffix in &args.suffixes {
        suffixes.push(normalize_suffix(suffix)?);
    }
    if let Some(path) = &args.suffix_file {
        suffixes.extend(load_suffix_file(path, max_length)?);
    }

    let mut seen = HashSet::new();
    suffixes.retain(|s| seen.insert(s.clone()));

    if suffixes.is_empty() {
        return Err(format!(
            "No suffixes to sweep: the suffix file has no entries of at most {} characters",
            max_length
        )
        .into());
    }
    Ok(suffixes)
}

/// Ask before a large sweep. Non-interactive runs always proceed.
async fn confirm_large_run(
    count: usize,
    concurrency: usize,
) -> Result<bool, Box<dyn std::error::Error>> {
    let term = Term::stderr();
    if !term.is_term() {
        return Ok(true);
    }

    eprint!(
        "Will sweep {} domains at concurrency {}. Proceed? [Y/n] ",
        count, concurrency
    );
    let answer = tokio::task::spawn_blocking(|| {
        let mut input = String::new();
        std::io::stdin().lock().read_line(&mut input).map(|_| input)
    })
    .await??;
    Ok(is_affirmative(&answer))
}

/// Anything but an explicit "n"/"no" counts as yes.
fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer != "n" && answer != "no"
}

/// Notice printed after Ctrl-C. Points at `error.txt` only once a pass has
/// written it.
fn interrupted_notice(writer: &OutputWriter) -> String {
    let failed = writer.path(ERROR_FILE);
    if failed.exists() {
        format!(
            "Interrupted, sweep stopped. Failures from the last finished pass are in {}",
            failed.display()
        )
    } else {
        "Interrupted, sweep stopped before the first pass finished.".to_string()
    }
}

/// Main sweep logic
async fn run_sweep(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;
    let suffixes = collect_suffixes(&args, settings.max_suffix_length)?;

    // Size the run before generating anything.
    let estimated = estimate_total(&settings.alphabet, settings.length, suffixes.len());
    ensure_within_limit(estimated)?;

    if !args.dry_run
        && estimated > CONFIRM_THRESHOLD
        && !args.yes
        && !confirm_large_run(estimated, settings.sweep.concurrency).await?
    {
        eprintln!("Aborted.");
        return Ok(());
    }

    let domains = generate_for_suffixes(&settings.alphabet, settings.length, &suffixes)?;

    if args.dry_run {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&domains)?);
        } else {
            for domain in &domains {
                println!("{}", domain);
            }
        }
        eprintln!("{} domains would be checked", domains.len());
        return Ok(());
    }

    let config = &settings.sweep;
    if config.sources().any(|s| s.kind == SourceKind::Whois)
        && !is_whois_available(&config.whois_binary).await
    {
        tracing::warn!(
            binary = %config.whois_binary,
            "whois client not found; whois lookups will fail"
        );
    }

    let writer = OutputWriter::new(&settings.output_dir);
    writer.write_input(&domains)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let sweep = Sweep::from_config(config)?.with_events(tx);
    let printer = tokio::spawn(ui::consume_events(rx, writer.clone(), args.json));

    if !args.json {
        ui::print_header(domains.len(), &suffixes, config);
    }

    let started_at = chrono::Local::now();
    let start = Instant::now();

    // Dropping the sweep future on Ctrl-C aborts in-flight checks.
    let outcome = tokio::select! {
        report = sweep.run(&domains) => Some(report),
        _ = tokio::signal::ctrl_c() => None,
    };
    let elapsed = start.elapsed();

    // Closing the event channel lets the printer drain its queue and finish.
    drop(sweep);
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "progress printer stopped unexpectedly");
    }

    let Some(report) = outcome else {
        eprintln!();
        eprintln!("{}", interrupted_notice(&writer));
        return Ok(());
    };

    writer.write_report(&report)?;
    let info = RunInfo {
        started_at,
        suffixes: suffixes.clone(),
        length: settings.length,
        elapsed,
    };
    let markdown = writer.write_markdown(&info, &report)?;
    tracing::info!(path = %markdown.display(), "wrote markdown report");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        ui::print_summary(&report, elapsed, writer.dir());
    }

    Ok(())
}
