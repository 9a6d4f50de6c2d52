//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::{ColoredString, Colorize, control};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use thiserror::Error;

use integrity_inventory::analysis::fit::FitStatus;
use integrity_inventory::analysis::reliability::ReliabilityBand;
use integrity_inventory::analysis::report::{AnalysisReport, Analyzer};
use integrity_inventory::analysis::risk::RiskLevel;
use integrity_inventory::bank::item::ControlKind;
use integrity_inventory::bank::registry::ItemBank;
use integrity_inventory::core::config::Config;
use integrity_inventory::core::errors::InventoryError;
use integrity_inventory::sampler::stratify::FormSampler;
use integrity_inventory::scoring::response::load_responses;

/// Integrity inventory: build test forms and analyze completed responses.
#[derive(Debug, Parser)]
#[command(
    name = "iinv",
    author,
    version,
    about = "Integrity Inventory - form sampling and response analysis",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Assemble a test form from an item bank.
    Form(FormArgs),
    /// Analyze a completed response export.
    Analyze(AnalyzeArgs),
    /// Inspect configuration state.
    Config(ConfigArgs),
    /// Show version and optional build metadata.
    Version(VersionArgs),
}

#[derive(Debug, Clone, Args)]
struct FormArgs {
    /// Item bank file (.toml or .json).
    #[arg(long, value_name = "PATH")]
    bank: PathBuf,
    /// Requested form size.
    #[arg(long, default_value_t = 120, value_name = "N")]
    size: usize,
    /// Seed for a reproducible form; random when omitted.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Args)]
struct AnalyzeArgs {
    /// Response export (.json or .toml).
    #[arg(long, value_name = "PATH")]
    responses: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct VersionArgs {
    /// Include additional build metadata fields.
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<InventoryError> for CliError {
    fn from(error: InventoryError) -> Self {
        if error.is_input_error() {
            Self::User(error.to_string())
        } else {
            Self::Runtime(error.to_string())
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }
    init_tracing(cli.quiet, cli.verbose)?;

    match &cli.command {
        Command::Form(args) => run_form(cli, args),
        Command::Analyze(args) => run_analyze(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Version(args) => emit_version(cli, args),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<(), CliError> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_env("IINV_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| CliError::Internal(format!("failed to initialize tracing subscriber: {e}")))
}

fn run_form(cli: &Cli, args: &FormArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let bank = ItemBank::load(&args.bank)?;
    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    let form = FormSampler::from_config(&config).build_form(&bank, args.size, &mut rng);

    match output_mode(cli) {
        OutputMode::Human => {
            println!(
                "Form: {} items (requested {}, seed {seed})",
                form.len(),
                args.size
            );
            for (position, entry) in form.entries().iter().enumerate() {
                let marker = match entry.item.control_kind {
                    ControlKind::MainControl => "control",
                    ControlKind::Meta if entry.is_meta_injection => "meta*",
                    ControlKind::Meta => "meta",
                    ControlKind::None => "",
                };
                println!(
                    "{:>4}. [{:<8}] {:<20} {}",
                    position + 1,
                    marker,
                    entry.item.category,
                    entry.item.text
                );
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "form",
                "requested_size": args.size,
                "seed": seed,
                "size": form.len(),
                "meta_injections": form.meta_injection_count(),
                "entries": serde_json::to_value(form.entries())?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_analyze(cli: &Cli, args: &AnalyzeArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let responses = load_responses(&args.responses)?;
    let report = Analyzer::from_config(&config).analyze(&responses);

    match output_mode(cli) {
        OutputMode::Human => print_report(&report),
        OutputMode::Json => {
            let payload = json!({
                "command": "analyze",
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "config_hash": config.stable_hash()?,
                "report": serde_json::to_value(&report)?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!("Responses: {}", report.response_count);
    println!();
    println!("{:<24} {:>6} {:>8} {:>6} {:>4}  risk", "category", "mean", "latency", "std", "n");
    for (summary, risk) in report.summaries.iter().zip(&report.risks) {
        println!(
            "{:<24} {:>6.2} {:>7.1}s {:>6.2} {:>4}  {}",
            summary.category,
            summary.mean_score,
            summary.mean_latency,
            summary.score_std,
            summary.sample_count,
            risk_label(risk.level)
        );
    }

    let reliability = &report.reliability;
    println!();
    println!(
        "Reliability: {} ({})",
        reliability.score,
        band_label(reliability.band)
    );
    println!("  {}", reliability.band.description());
    for term in &reliability.penalties {
        println!(
            "  -{:.1} {} (measured {:.2})",
            term.contribution, term.name, term.value
        );
    }
    for record in &reliability.contradictions {
        println!(
            "  [{}] {}",
            record.severity.as_str().to_uppercase(),
            record.message
        );
    }

    println!();
    println!("Profile fit: {}%", report.fit.score);
    for fit in &report.fit.traits {
        println!(
            "  {:<20} {:>5.2} in [{:.1}, {:.1}] {}",
            fit.trait_name,
            fit.mean_score,
            fit.range.low,
            fit.range.high,
            status_label(fit.status)
        );
    }

    println!();
    println!(
        "Latency: {} too fast, {} normal, {} too slow",
        report.latency.too_fast, report.latency.normal, report.latency.too_slow
    );
}

fn band_label(band: ReliabilityBand) -> ColoredString {
    let label = band.as_str();
    match band {
        ReliabilityBand::VeryHigh | ReliabilityBand::High => label.green().bold(),
        ReliabilityBand::Moderate => label.yellow().bold(),
        ReliabilityBand::Low | ReliabilityBand::VeryLow => label.red().bold(),
    }
}

fn risk_label(level: RiskLevel) -> ColoredString {
    let label = level.as_str();
    match level {
        RiskLevel::Low => label.green(),
        RiskLevel::Moderate => label.yellow(),
        RiskLevel::High => label.red(),
    }
}

fn status_label(status: FitStatus) -> ColoredString {
    match status {
        FitStatus::Green => "green".green(),
        FitStatus::Yellow => "yellow".yellow(),
        FitStatus::Red => "red".red(),
    }
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;
                let source = cli.config.clone().unwrap_or_else(Config::default_path);

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", source.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": source.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("Configuration is INVALID: {e}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "code": e.code(),
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

fn emit_version(cli: &Cli, args: &VersionArgs) -> Result<(), CliError> {
    let version = env!("CARGO_PKG_VERSION");
    let package = env!("CARGO_PKG_NAME");
    let target = option_env!("TARGET").unwrap_or("unknown");
    let profile = option_env!("PROFILE").unwrap_or("unknown");
    let git_sha = option_env!("GIT_SHA").unwrap_or("unknown");

    match output_mode(cli) {
        OutputMode::Human => {
            println!("iinv {version}");
            if args.verbose {
                println!("package: {package}");
                println!("target: {target}");
                println!("profile: {profile}");
                println!("git_sha: {git_sha}");
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "binary": "iinv",
                "version": version,
                "package": package,
                "build": {
                    "target": target,
                    "profile": profile,
                    "git_sha": git_sha,
                }
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("IINV_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
