use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Video files directly inside `input_dir` whose extension (case-insensitive)
/// is one of `extensions`, sorted by file name.
pub fn list_videos(input_dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", input_dir.display());
    }

    let videos: Vec<PathBuf> = WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| input_dir.display().to_string());
                tracing::warn!("Skipping unreadable entry {}: {}", path, e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_extension(e.path(), extensions))
        .map(|e| e.path().to_path_buf())
        .collect();

    Ok(videos)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| {
            let ext = s.to_lowercase();
            extensions.iter().any(|e| *e == ext)
        })
        .unwrap_or(false)
}

/// Creates the output directory (and parents) if absent.
pub fn ensure_output_dir(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))
}

/// `<output_dir>/<stem><suffix>.<extension>`
pub fn derive_output_path(
    output_dir: &Path,
    video: &Path,
    suffix: &str,
    extension: &str,
) -> Result<PathBuf> {
    let stem = video
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid video name: {}", video.display()))?;

    Ok(output_dir.join(format!("{}{}.{}", stem, suffix, extension)))
}

/// What happened to one input file.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Processed { outputs: Vec<PathBuf>, detail: String },
    Failed { reason: String },
}

#[derive(Serialize, Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Per-run summary, optionally persisted as JSON.
#[derive(Serialize, Debug, Clone)]
pub struct BatchReport {
    pub command: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn new(command: &str, input_dir: &Path, output_dir: &Path) -> Self {
        Self {
            command: command.to_string(),
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            started_at: Utc::now(),
            finished_at: None,
            files: Vec::new(),
        }
    }

    /// Records a file's result, logging failures with the file name and reason.
    pub fn record(&mut self, input: &Path, result: Result<(Vec<PathBuf>, String)>) {
        let outcome = match result {
            Ok((outputs, detail)) => FileOutcome::Processed { outputs, detail },
            Err(e) => {
                tracing::warn!("Skipping {}: {:#}", input.display(), e);
                FileOutcome::Failed {
                    reason: format!("{:#}", e),
                }
            }
        };

        self.files.push(FileReport {
            input: input.to_path_buf(),
            outcome,
        });
    }

    pub fn processed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Processed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.processed()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
        tracing::info!(
            "{}: {} file(s) processed, {} failed",
            self.command,
            self.processed(),
            self.failed()
        );
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(())
    }
}
