// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use subpace::app_config::{self, Config, Strategy};
use subpace::app_controller::{Controller, FileReport};
use subpace::file_utils::FileManager;

/// CLI Wrapper for Strategy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliStrategy {
    Primary,
    Alternating,
    Legacy,
}

impl From<CliStrategy> for Strategy {
    fn from(cli_strategy: CliStrategy) -> Self {
        match cli_strategy {
            CliStrategy::Primary => Strategy::Primary,
            CliStrategy::Alternating => Strategy::Alternating,
            CliStrategy::Legacy => Strategy::Legacy,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Retime subtitles to a target reading speed (default command)
    Retime(RetimeArgs),

    /// Report reading-speed problems without writing any file
    Check(RetimeArgs),

    /// Generate shell completions for subpace
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct RetimeArgs {
    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    #[command(flatten)]
    options: RetimeOptions,
}

#[derive(clap::Args, Debug, Clone)]
struct RetimeOptions {
    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Maximum reading speed in characters per second
    #[arg(long)]
    target_cps: Option<f64>,

    /// Maximum shift (ms) of a cue's start while making room for a neighbour
    #[arg(long)]
    max_variation: Option<i64>,

    /// Shortest duration (ms) a cue may be shrunk to when lending time
    #[arg(long)]
    min_duration: Option<i64>,

    /// Retiming strategy
    #[arg(short, long, value_enum)]
    strategy: Option<CliStrategy>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Write a JSON report of every processed file
    #[arg(long, value_name = "REPORT_PATH")]
    report: Option<PathBuf>,
}

/// subpace - subtitle reading-speed retiming
///
/// Stretches subtitle cues that read too fast by borrowing idle time and
/// time from slower neighbours, without overlapping cues.
#[derive(Parser, Debug)]
#[command(name = "subpace")]
#[command(version)]
#[command(about = "Subtitle reading-speed retiming tool")]
#[command(long_about = "subpace retimes SRT subtitles so that no cue reads faster than a target speed.

EXAMPLES:
    subpace movie.srt                           # Retime using default config
    subpace -f movie.srt                        # Force overwrite existing output
    subpace --target-cps 15 movie.srt           # Use a stricter reading speed
    subpace -s alternating /series/             # Retime a whole folder
    subpace check --report report.json movie.srt # Report without writing
    subpace completions bash > subpace.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. Command line flags override the file.

STRATEGIES:
    primary     - backward passes at levels 1-3, then forward passes (default)
    alternating - forward then backward at each level
    legacy      - level-1 backward passes only")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    #[command(flatten)]
    options: RetimeOptions,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Record everything; the effective level is set with `log::set_max_level`
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Label for log level
    fn get_label_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "ERROR",
            Level::Warn => "WARN ",
            Level::Info => "INFO ",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_label_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subpace", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Retime(args)) => run_retime(args, false).await,
        Some(Commands::Check(args)) => run_retime(args, true).await,
        None => {
            // Default behavior - use top-level args
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

            let args = RetimeArgs {
                input_path,
                options: cli.options,
            };
            run_retime(args, false).await
        }
    }
}

/// Load the config file and apply command line overrides
fn load_config(options: &RetimeOptions) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(target_cps) = options.target_cps {
        config.retiming.target_cps = target_cps;
    }
    if let Some(max_variation) = options.max_variation {
        config.retiming.max_variation_ms = max_variation;
    }
    if let Some(min_duration) = options.min_duration {
        config.retiming.min_duration_ms = min_duration;
    }
    if let Some(strategy) = &options.strategy {
        config.retiming.strategy = strategy.clone().into();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

async fn run_retime(args: RetimeArgs, check_only: bool) -> Result<()> {
    let config = load_config(&args.options)?;
    let controller = Controller::with_config(config)?;

    if !args.input_path.exists() {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    }

    let reports = if check_only {
        check(&controller, &args.input_path)?
    } else {
        controller.run(args.input_path.clone(), args.options.force_overwrite).await?
    };

    if let Some(report_path) = &args.options.report {
        Controller::write_report(report_path, &reports)?;
    }

    summarize(&reports, check_only);
    Ok(())
}

fn check(controller: &Controller, input_path: &Path) -> Result<Vec<FileReport>> {
    if input_path.is_dir() {
        let suffix = &controller.config().output.suffix;
        FileManager::find_files(input_path, "srt")?
            .iter()
            .filter(|path| !FileManager::has_output_suffix(path, suffix))
            .map(|path| controller.check_file(path))
            .collect()
    } else {
        Ok(vec![controller.check_file(input_path)?])
    }
}

fn summarize(reports: &[FileReport], check_only: bool) {
    for report in reports.iter().filter(|r| !r.skipped) {
        if check_only {
            info!(
                "{}: {} cues, {} over target, {} would remain after retiming",
                report.input.display(),
                report.cues,
                report.violations_before.len(),
                report.violations_after.len()
            );
        }

        if !report.fallback_violations.is_empty() {
            warn!(
                "{}: cues {:?} still read faster than {} cps",
                report.input.display(),
                report.fallback_violations,
                subpace::retiming::FALLBACK_CPS
            );
        }
    }

    let clean = reports.iter().filter(|r| !r.skipped && r.is_clean()).count();
    let processed = reports.iter().filter(|r| !r.skipped).count();
    info!("{} of {} files meet the target speed", clean, processed);
}
