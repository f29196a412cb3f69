use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::{Config, Strategy};
use crate::correction::Corrector;
use crate::file_utils::FileManager;
use crate::retiming::{self, RetimeReport};
use crate::subtitle_processor::SubtitleCollection;
use crate::validation::{TimecodeValidationResult, TimecodeValidator, TimecodeValidatorConfig};

// @module: Application controller for subtitle retiming

/// Summary of one processed file
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileReport {
    /// Input subtitle file
    pub input: PathBuf,
    /// SHA-256 of the input content
    pub digest: String,
    /// Number of cues read
    pub cues: usize,
    /// Number of lines changed by text correction
    pub corrected_lines: usize,
    /// Strategy used
    pub strategy: Strategy,
    /// Cues over the target before retiming
    pub violations_before: Vec<usize>,
    /// Cues over the target after retiming
    pub violations_after: Vec<usize>,
    /// Cues over the fallback limit after retiming
    pub fallback_violations: Vec<usize>,
    /// Cues whose timing changed
    pub retimed_cues: usize,
    /// Overlapping pairs after retiming
    pub overlaps: usize,
    /// Cues drifted past the variation budget
    pub drifted_cues: usize,
    /// Written file, if any
    pub output: Option<PathBuf>,
    /// Whether the file was skipped because its output already exists
    pub skipped: bool,
}

impl FileReport {
    fn skipped(input: &Path, output: PathBuf, strategy: Strategy) -> Self {
        FileReport {
            input: input.to_path_buf(),
            digest: String::new(),
            cues: 0,
            corrected_lines: 0,
            strategy,
            violations_before: Vec::new(),
            violations_after: Vec::new(),
            fallback_violations: Vec::new(),
            retimed_cues: 0,
            overlaps: 0,
            drifted_cues: 0,
            output: Some(output),
            skipped: true,
        }
    }

    fn from_run(
        collection: &SubtitleCollection,
        corrected_lines: usize,
        report: RetimeReport,
        validation: &TimecodeValidationResult,
    ) -> Self {
        FileReport {
            input: collection.source_file.clone(),
            digest: collection.digest.clone(),
            cues: collection.entries.len(),
            corrected_lines,
            strategy: report.strategy,
            violations_before: report.violations_before,
            violations_after: report.violations_after,
            fallback_violations: report.fallback_violations,
            retimed_cues: report.retimed_cues,
            overlaps: validation.overlap_count,
            drifted_cues: validation.drift_count,
            output: None,
            skipped: false,
        }
    }

    /// Whether every cue meets the target after the run
    pub fn is_clean(&self) -> bool {
        self.violations_after.is_empty() && self.overlaps == 0
    }
}

/// Main application controller for subtitle retiming
#[derive(Clone)]
pub struct Controller {
    // @field: App configuration
    config: Arc<Config>,

    // @field: Compiled correction rules, when enabled
    corrector: Option<Arc<Corrector>>,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let corrector = match config.correction.rules_path.as_ref().filter(|_| config.correction.enabled) {
            Some(path) => {
                let corrector = Corrector::from_file(path)?;
                info!("Loaded {} correction rules from {}", corrector.len(), path.display());
                Some(Arc::new(corrector))
            }
            None => None,
        };

        Ok(Self {
            config: Arc::new(config),
            corrector,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Retime a single file or every subtitle file below a folder
    pub async fn run(&self, input: PathBuf, force_overwrite: bool) -> Result<Vec<FileReport>> {
        if input.is_dir() {
            self.run_folder(input, force_overwrite).await
        } else {
            let controller = self.clone();
            let report = tokio::task::spawn_blocking(move || controller.process_file(&input, force_overwrite))
                .await
                .context("Retiming task panicked")??;
            Ok(vec![report])
        }
    }

    /// Read, correct, retime, validate and write one subtitle file
    pub fn process_file(&self, input_file: &Path, force_overwrite: bool) -> Result<FileReport> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = FileManager::generate_output_path(input_file, &self.config.output.suffix);
        if output_path.exists() && !force_overwrite {
            warn!(
                "Skipping {}, output already exists (use -f to force overwrite)",
                input_file.display()
            );
            return Ok(FileReport::skipped(
                input_file,
                output_path,
                self.config.retiming.strategy.clone(),
            ));
        }

        let (collection, mut report) = self.retime(input_file)?;

        collection.write_to_srt(&output_path, &self.config.output)?;
        report.output = Some(output_path);

        info!(
            "{}: {} cues retimed, {} of {} violations resolved in {}",
            input_file.display(),
            report.retimed_cues,
            report.violations_before.len().saturating_sub(report.violations_after.len()),
            report.violations_before.len(),
            Self::format_duration(start_time.elapsed())
        );

        Ok(report)
    }

    /// Run the whole pipeline in memory and report without writing
    pub fn check_file(&self, input_file: &Path) -> Result<FileReport> {
        let (_, report) = self.retime(input_file)?;
        Ok(report)
    }

    fn retime(&self, input_file: &Path) -> Result<(SubtitleCollection, FileReport)> {
        let content = FileManager::read_to_string(input_file)?;
        let mut collection = SubtitleCollection::from_srt_string(input_file.to_path_buf(), &content)
            .with_context(|| format!("Failed to parse subtitle file: {}", input_file.display()))?;

        debug!("{} ({} cues, sha256 {})", input_file.display(), collection.entries.len(), collection.digest);

        let corrected_lines = self.correct(&mut collection);

        let mut timeline = collection.to_timeline();
        if let Some((left, right)) = timeline.first_overlap() {
            warn!(
                "{}: input cues {} and {} overlap; retiming assumes ordered, non-overlapping cues",
                input_file.display(),
                timeline[left].sequence,
                timeline[right].sequence
            );
        }

        let retime_report = retiming::run(&mut timeline, &self.config.retiming);

        let validator = TimecodeValidator::with_config(TimecodeValidatorConfig::from(&self.config.retiming));
        let validation = validator.validate_timeline(&timeline);

        if !retime_report.is_clean() {
            warn!(
                "{}: {} cues still over {} cps: {:?}",
                input_file.display(),
                retime_report.violations_after.len(),
                self.config.retiming.target_cps,
                retime_report.violations_after
            );
        }

        collection.apply_timeline(&timeline);
        let report = FileReport::from_run(&collection, corrected_lines, retime_report, &validation);

        Ok((collection, report))
    }

    /// Apply correction rules to every line; returns the number of changed lines
    fn correct(&self, collection: &mut SubtitleCollection) -> usize {
        let Some(corrector) = &self.corrector else {
            return 0;
        };

        let mut changed = 0;
        for entry in &mut collection.entries {
            for line in &mut entry.lines {
                let correction = corrector.correct(line);
                if correction.changed() {
                    debug!(
                        "Entry {}: {} -> {}",
                        entry.seq_num,
                        correction.found.render(line, "[", "]"),
                        correction.replaced.render(&correction.text, "[", "]")
                    );
                    *line = correction.text;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Run the workflow in folder mode, processing all subtitle files in a directory.
    /// Files that are themselves outputs are ignored.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<Vec<FileReport>> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let suffix = self.config.output.suffix.clone();
        let subtitle_files: Vec<PathBuf> = FileManager::find_files(&input_dir, "srt")?
            .into_iter()
            .filter(|path| !FileManager::has_output_suffix(path, &suffix))
            .collect();

        if subtitle_files.is_empty() {
            return Err(anyhow!("No subtitle files found in directory: {:?}", input_dir));
        }

        let folder_pb = ProgressBar::new(subtitle_files.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Retiming files");

        let results = stream::iter(subtitle_files)
            .map(|file| {
                let controller = self.clone();
                let folder_pb = folder_pb.clone();
                async move {
                    let task_file = file.clone();
                    let result = tokio::task::spawn_blocking(move || controller.process_file(&task_file, force_overwrite))
                        .await
                        .context("Retiming task panicked")
                        .and_then(|r| r);

                    if let Some(name) = file.file_name() {
                        folder_pb.set_message(format!("Done: {}", name.to_string_lossy()));
                    }
                    folder_pb.inc(1);
                    (file, result)
                }
            })
            .buffer_unordered(self.config.processing.concurrent_files)
            .collect::<Vec<_>>()
            .await;

        folder_pb.finish_with_message("Folder processing complete");

        let mut reports = Vec::new();
        let mut error_count = 0;
        for (file, result) in results {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("Error processing file {}: {:#}", file.display(), e);
                    error_count += 1;
                }
            }
        }
        reports.sort_by(|a, b| a.input.cmp(&b.input));

        let skip_count = reports.iter().filter(|r| r.skipped).count();
        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors in {}",
            reports.len() - skip_count,
            skip_count,
            error_count,
            Self::format_duration(start_time.elapsed())
        );

        Ok(reports)
    }

    /// Write reports as pretty JSON
    pub fn write_report<P: AsRef<Path>>(path: P, reports: &[FileReport]) -> Result<()> {
        let json = serde_json::to_string_pretty(reports).context("Failed to serialize report")?;
        FileManager::write_string(&path, &json)?;
        info!("Report written to {}", path.as_ref().display());
        Ok(())
    }

    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
