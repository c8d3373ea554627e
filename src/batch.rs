// WHY: file-mode cleaning for the CLI and benchmarks
// Files are read, normalized and written concurrently; per-file stats feed the run_stats JSON

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::incremental::{clean_file_exists, generate_clean_file_path, is_clean_output, write_clean_file_async};
use crate::normalizer::Normalizer;
use crate::reader::{AsyncFileReader, ReaderConfig};

/// Batch run settings
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Re-clean sources whose output already exists
    pub overwrite_all: bool,
    /// Abort on the first failed file
    pub fail_fast: bool,
    /// Files processed at once
    pub concurrency: usize,
    /// Draw a console progress bar
    pub show_progress: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            overwrite_all: false,
            fail_fast: false,
            concurrency: num_cpus::get().max(1),
            show_progress: false,
        }
    }
}

/// Per-file processing statistics
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileStats {
    /// Source file path as given
    pub path: String,
    /// Output path, when one was written
    pub output: Option<String>,
    /// Characters read from the source
    pub chars_in: u64,
    /// Characters written after cleaning
    pub chars_out: u64,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Processing status (success, skipped, failed)
    pub status: String,
    /// Error message if processing failed
    pub error: Option<String>,
}

impl FileStats {
    fn new(path: &Path, status: &str) -> Self {
        Self {
            path: path.display().to_string(),
            output: None,
            chars_in: 0,
            chars_out: 0,
            processing_time_ms: 0,
            status: status.to_string(),
            error: None,
        }
    }

    fn failed(path: &Path, error: String, started: Instant) -> Self {
        Self {
            processing_time_ms: started.elapsed().as_millis() as u64,
            error: Some(error),
            ..Self::new(path, "failed")
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == "failed"
    }
}

/// Clean one file, writing `<stem>_clean.txt` beside it
pub async fn clean_file(
    path: &Path,
    normalizer: &Normalizer,
    reader: &AsyncFileReader,
    overwrite_all: bool,
) -> FileStats {
    let started = Instant::now();

    if is_clean_output(path) || (!overwrite_all && clean_file_exists(path)) {
        info!("Skipping {}", path.display());
        return FileStats::new(path, "skipped");
    }

    let content = match reader.read_file(path).await {
        Ok((_, stats)) if stats.read_error.is_some() => {
            return FileStats::failed(path, stats.read_error.unwrap_or_default(), started);
        }
        Ok((content, _)) => content,
        Err(e) => return FileStats::failed(path, e.to_string(), started),
    };

    let cleaned = normalizer.normalize(&content);

    match write_clean_file_async(path, &cleaned).await {
        Ok(output) => FileStats {
            output: Some(output.display().to_string()),
            chars_in: content.chars().count() as u64,
            chars_out: cleaned.chars().count() as u64,
            processing_time_ms: started.elapsed().as_millis() as u64,
            ..FileStats::new(path, "success")
        },
        Err(e) => FileStats::failed(path, format!("Failed to write output for {}: {}", path.display(), e), started),
    }
}

/// Failed stats for every source whose output path an earlier source already owns
///
/// `notes.txt` and `notes.md` both map to `notes_clean.txt`; the first one
/// listed keeps it.
fn output_collisions(paths: &[PathBuf]) -> BTreeMap<usize, FileStats> {
    let mut owners: HashMap<PathBuf, &Path> = HashMap::new();
    let mut collisions = BTreeMap::new();

    for (index, path) in paths.iter().enumerate() {
        let output = generate_clean_file_path(path);
        match owners.get(&output) {
            Some(owner) => {
                let error = format!(
                    "Output {} is already written by {}",
                    output.display(),
                    owner.display()
                );
                collisions.insert(index, FileStats::failed(path, error, Instant::now()));
            }
            None => {
                owners.insert(output, path.as_path());
            }
        }
    }
    collisions
}

/// Clean many files concurrently; results come back in input order
///
/// Sources that would share an output path with an earlier source are
/// reported as failed and never written.
pub async fn clean_files(paths: &[PathBuf], normalizer: &Normalizer, config: &BatchConfig) -> Result<Vec<FileStats>> {
    info!("Starting batch clean of {} files", paths.len());

    let mut collisions = output_collisions(paths);
    if let Some(first) = collisions.values().next() {
        warn!("{} files share an output path with an earlier file", collisions.len());
        if config.fail_fast {
            anyhow::bail!(
                "Aborting batch: {}",
                first.error.as_deref().unwrap_or("duplicate output path")
            );
        }
    }

    let reader = AsyncFileReader::new(ReaderConfig {
        fail_fast: false,
        ..ReaderConfig::default()
    });

    let progress = if config.show_progress {
        let bar = ProgressBar::new(paths.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                .context("Invalid progress template")?,
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut results: Vec<Option<FileStats>> = (0..paths.len()).map(|index| collisions.remove(&index)).collect();
    progress.inc(results.iter().flatten().count() as u64);

    let queued: Vec<(usize, &PathBuf)> = paths
        .iter()
        .enumerate()
        .filter(|(index, _)| results[*index].is_none())
        .collect();

    let mut pending = stream::iter(queued)
        .map(|(index, path)| {
            let reader = &reader;
            async move { (index, clean_file(path, normalizer, reader, config.overwrite_all).await) }
        })
        .buffer_unordered(config.concurrency.max(1));

    while let Some((index, stats)) = pending.next().await {
        progress.inc(1);
        if stats.is_failed() {
            warn!("Failed {}: {}", stats.path, stats.error.as_deref().unwrap_or("unknown error"));
            if config.fail_fast {
                progress.abandon();
                anyhow::bail!(
                    "Aborting batch: {}",
                    stats.error.unwrap_or_else(|| format!("failed to clean {}", stats.path))
                );
            }
        }
        results[index] = Some(stats);
    }
    progress.finish_and_clear();

    let results: Vec<FileStats> = results.into_iter().flatten().collect();
    let failed = results.iter().filter(|s| s.is_failed()).count();
    let skipped = results.iter().filter(|s| s.status == "skipped").count();
    info!(
        "Batch clean finished: {} cleaned, {} skipped, {} failed",
        results.len() - failed - skipped,
        skipped,
        failed
    );
    Ok(results)
}

/// Write run statistics as pretty JSON
pub async fn write_stats(path: &Path, stats: &[FileStats]) -> Result<()> {
    let content = serde_json::to_string_pretty(stats)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write stats to {}", path.display()))?;
    Ok(())
}
