use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Retiming engine settings
    #[serde(default)]
    pub retiming: RetimingConfig,

    /// Output file settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Text correction settings
    #[serde(default)]
    pub correction: CorrectionConfig,

    /// Folder processing settings
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Retiming strategy
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    // @strategy: All backward levels, then all forward levels
    #[default]
    Primary,
    // @strategy: Forward then backward at each level
    Alternating,
    // @strategy: Level-1 backward only
    Legacy,
}

impl Strategy {
    // @returns: Capitalized strategy name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Primary => "Primary",
            Self::Alternating => "Alternating",
            Self::Legacy => "Legacy",
        }
    }

    // @returns: Lowercase strategy identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Primary => "primary".to_string(),
            Self::Alternating => "alternating".to_string(),
            Self::Legacy => "legacy".to_string(),
        }
    }
}

// Implement Display trait for Strategy
impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for Strategy
impl std::str::FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "alternating" => Ok(Self::Alternating),
            "legacy" => Ok(Self::Legacy),
            _ => Err(anyhow!("Invalid strategy: {}", s)),
        }
    }
}

/// Retiming engine configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetimingConfig {
    /// Maximum reading speed in characters per second
    #[serde(default = "default_target_cps")]
    pub target_cps: f64,

    /// How far (ms) a cue may be moved from its authored start while
    /// making room for a neighbour
    #[serde(default = "default_max_variation_ms")]
    pub max_variation_ms: i64,

    /// Shortest duration (ms) a donor cue may be shrunk to
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: i64,

    /// Strategy used to orchestrate the passes
    #[serde(default)]
    pub strategy: Strategy,
}

impl Default for RetimingConfig {
    fn default() -> Self {
        Self {
            target_cps: default_target_cps(),
            max_variation_ms: default_max_variation_ms(),
            min_duration_ms: default_min_duration_ms(),
            strategy: Strategy::default(),
        }
    }
}

/// Output file configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    /// Suffix inserted before the extension (`movie.retimed.srt`)
    #[serde(default = "default_output_suffix")]
    pub suffix: String,

    /// Use CRLF line endings
    #[serde(default = "default_true")]
    pub crlf: bool,

    /// Text of the trailing attribution cue; `null` disables it
    #[serde(default = "default_attribution")]
    pub attribution: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: default_output_suffix(),
            crlf: true,
            attribution: default_attribution(),
        }
    }
}

/// Text correction configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct CorrectionConfig {
    /// Whether to apply correction rules before retiming
    #[serde(default)]
    pub enabled: bool,

    /// JSON rules file
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
}

/// Folder processing configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProcessingConfig {
    /// Maximum number of files retimed at once
    #[serde(default = "default_concurrent_files")]
    pub concurrent_files: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            concurrent_files: default_concurrent_files(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_cps() -> f64 {
    17.0
}

fn default_max_variation_ms() -> i64 {
    300
}

fn default_min_duration_ms() -> i64 {
    500
}

fn default_output_suffix() -> String {
    "retimed".to_string()
}

fn default_attribution() -> Option<String> {
    Some("Retimed with subpace".to_string())
}

fn default_concurrent_files() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Read a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load the configuration, writing a default file first when none exists
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Ok(Self::from_file(path)?);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.retiming.validate()?;

        if self.output.suffix.trim().is_empty() {
            return Err(invalid("Output suffix must not be empty".to_string()));
        }

        if self.correction.enabled && self.correction.rules_path.is_none() {
            return Err(invalid("Text correction is enabled but no rules_path is set".to_string()));
        }

        if self.processing.concurrent_files == 0 {
            return Err(invalid("concurrent_files must be at least 1".to_string()));
        }

        Ok(())
    }
}

impl RetimingConfig {
    /// Validate the engine limits
    pub fn validate(&self) -> Result<()> {
        if !self.target_cps.is_finite() || self.target_cps <= 0.0 {
            return Err(invalid(format!("Target speed must be a positive number, got {}", self.target_cps)));
        }

        if self.min_duration_ms < 1 {
            return Err(invalid(format!("Minimum duration must be at least 1ms, got {}", self.min_duration_ms)));
        }

        if self.max_variation_ms < 0 {
            return Err(invalid(format!("Maximum variation must not be negative, got {}", self.max_variation_ms)));
        }

        Ok(())
    }
}

fn invalid(message: String) -> anyhow::Error {
    ConfigError::Invalid(message).into()
}
