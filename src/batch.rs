//! Clean every matching file in a directory

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use glob::Pattern;
use rayon::prelude::*;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::cleaner::CleanOptions;
use crate::error::CleanerError;
use crate::{clean_file, FileOptions};

/// Minimum number of files to benefit from parallel processing.
/// Below this threshold, sequential processing is faster due to rayon overhead.
const PARALLEL_THRESHOLD: usize = 8;

/// Default file name pattern for directory mode
pub const DEFAULT_PATTERN: &str = "*.csv";

/// Suffix of the cleaned file written for each input
pub const CLEANED_SUFFIX: &str = "_cleaned.csv";

/// Suffix of the per-file JSON report
pub const REPORT_SUFFIX: &str = "_report.json";

/// Options for cleaning a directory
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory to search (recursively)
    pub input_dir: PathBuf,
    /// Glob matched against file names
    pub pattern: String,
    /// Where cleaned files go; defaults to `input_dir`
    pub output_dir: Option<PathBuf>,
    /// Also write `<stem>_report.json` per file
    pub write_reports: bool,
    pub clean: CleanOptions,
}

impl BatchOptions {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            pattern: DEFAULT_PATTERN.to_string(),
            output_dir: None,
            write_reports: false,
            clean: CleanOptions::default(),
        }
    }
}

/// Outcome for one file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: std::result::Result<PathBuf, String>,
}

/// Outcome for a whole directory run
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> Vec<&FileOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err()).collect()
    }
}

/// Files under `dir` whose names match `pattern`, sorted. Files this tool
/// writes (`*_cleaned.csv` and `*_report.json`) are skipped.
pub fn find_input_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = Pattern::new(pattern).map_err(|e| CleanerError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            matcher.matches(&name)
                && !name.ends_with(CLEANED_SUFFIX)
                && !name.ends_with(REPORT_SUFFIX)
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    Ok(files)
}

fn output_dir_for(options: &BatchOptions, input: &Path) -> PathBuf {
    match &options.output_dir {
        Some(out) => {
            let relative = input
                .parent()
                .and_then(|p| p.strip_prefix(&options.input_dir).ok())
                .unwrap_or(Path::new(""));
            out.join(relative)
        }
        None => input.parent().unwrap_or(Path::new(".")).to_path_buf(),
    }
}

/// Output and report paths for one input
fn file_options_for(options: &BatchOptions, input: &Path) -> FileOptions {
    let dir = output_dir_for(options, input);
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("cleaned_data");

    FileOptions {
        input_path: input.to_path_buf(),
        output_path: Some(dir.join(format!("{}{}", stem, CLEANED_SUFFIX))),
        report_path: options
            .write_reports
            .then(|| dir.join(format!("{}{}", stem, REPORT_SUFFIX))),
        clean: options.clean,
    }
}

/// Plan one job per input. Inputs sharing a stem in the same directory
/// (`a.csv` and `a.xlsx`) would write the same output; every input after
/// the first that claims a path is refused instead of overwriting it.
fn plan_jobs(
    options: &BatchOptions,
    files: Vec<PathBuf>,
) -> Vec<(PathBuf, std::result::Result<FileOptions, String>)> {
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();

    files
        .into_iter()
        .map(|input| {
            let file_options = file_options_for(options, &input);
            let output = file_options.output_path.clone().unwrap_or_default();

            let planned = match claimed.get(&output) {
                Some(first) => {
                    warn!(
                        file = %input.display(),
                        output = %output.display(),
                        "Output path already used by another input"
                    );
                    Err(format!(
                        "Output {} is already written for {}",
                        output.display(),
                        first.display()
                    ))
                }
                None => {
                    claimed.insert(output, input.clone());
                    Ok(file_options)
                }
            };
            (input, planned)
        })
        .collect()
}

fn clean_one(input: &Path, planned: &std::result::Result<FileOptions, String>) -> FileOutcome {
    let result = match planned {
        Ok(file_options) => match clean_file(file_options) {
            Ok(outcome) => Ok(outcome.output_path),
            Err(e) => {
                warn!(file = %input.display(), error = %e, "Failed to clean file");
                Err(format!("{:#}", e))
            }
        },
        Err(message) => Err(message.clone()),
    };

    FileOutcome {
        input: input.to_path_buf(),
        result,
    }
}

/// Clean every matching file. Failures are collected, not propagated.
pub fn clean_directory(options: &BatchOptions) -> Result<BatchSummary> {
    options.clean.validate()?;
    let files = find_input_files(&options.input_dir, &options.pattern)?;
    info!(
        dir = %options.input_dir.display(),
        files = files.len(),
        "Cleaning directory"
    );

    let jobs = plan_jobs(options, files);
    let outcomes = if jobs.len() >= PARALLEL_THRESHOLD {
        jobs.par_iter()
            .map(|(input, planned)| clean_one(input, planned))
            .collect()
    } else {
        jobs.iter()
            .map(|(input, planned)| clean_one(input, planned))
            .collect()
    };

    Ok(BatchSummary { outcomes })
}
