/*!
 * # subpace - reading-speed retiming for subtitles
 *
 * A Rust library that retimes SRT subtitles so that no cue reads faster than
 * a target number of characters per second.
 *
 * ## Features
 *
 * - Stretch fast cues into idle space around them
 * - Borrow time from slower neighbours up to three cues away
 * - Keep every cue at least 1ms apart and within a drift budget
 * - Three strategies: primary, alternating and legacy
 * - Optional rule-based text correction before retiming
 * - Concurrent folder processing with JSON reports
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `retiming`: the retiming engine (model, queries, mutators, passes, strategies)
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SRT parsing, export and content digest
 * - `correction`: Rule-based text correction with change highlights
 * - `validation`: Timing checks on retimed output
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod correction;
pub mod errors;
pub mod file_utils;
pub mod retiming;
pub mod subtitle_processor;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::{Config, RetimingConfig, Strategy};
pub use app_controller::{Controller, FileReport};
pub use correction::Corrector;
pub use errors::{AppError, ConfigError, CorrectionError, SubtitleError};
pub use retiming::{Cue, RetimeReport, Timeline};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
