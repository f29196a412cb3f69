/*!
 * Error types for the subpace application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions. The retiming engine
 * itself never fails; these cover the layers around it.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during subtitle parsing
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The content held no usable cue at all
    #[error("No valid subtitle entries were found in the SRT content")]
    NoEntries,

    /// A timing line could not be parsed
    #[error("Invalid timestamp at line {line}: {content}")]
    InvalidTimestamp {
        /// 1-based line number
        line: usize,
        /// Offending line
        content: String,
    },

    /// A cue had an unusable time range
    #[error("Invalid time range in entry {seq_num}: end {end_ms}ms <= start {start_ms}ms")]
    InvalidTimeRange {
        /// Sequence number as written in the file
        seq_num: usize,
        /// Start in milliseconds
        start_ms: i64,
        /// End in milliseconds
        end_ms: i64,
    },
}

/// Errors that can occur while loading or applying correction rules
#[derive(Error, Debug)]
pub enum CorrectionError {
    /// A rule pattern did not compile
    #[error("Invalid correction pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern as written in the rules file
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// The rules file could not be read or parsed
    #[error("Failed to load correction rules from {path:?}: {message}")]
    RulesFile {
        /// Rules file path
        path: PathBuf,
        /// What went wrong
        message: String,
    },
}

/// Errors raised by configuration handling
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be parsed
    #[error("Failed to parse config file {path:?}: {message}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A setting failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from text correction
    #[error("Correction error: {0}")]
    Correction(#[from] CorrectionError),

    /// Error from configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
