use crate::error::PipelineError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Sanitize,
    Import,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Sanitize => "sanitize",
            Phase::Import => "import",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one file in one run
#[derive(Debug)]
pub enum FileOutcome {
    /// Reached DONE; `entries` is the number of entries written or inserted.
    Done { entries: usize },
    /// Rejected before any state changed; the file is left where it was.
    Skipped { reason: String },
    /// Failed part way; the unsafe next step was not taken and a rerun retries the file.
    Failed { error: PipelineError },
}

impl FileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FileOutcome::Done { .. } => "done",
            FileOutcome::Skipped { .. } => "skipped",
            FileOutcome::Failed { .. } => "failed",
        }
    }

    pub fn skipped(error: PipelineError) -> Self {
        FileOutcome::Skipped {
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub reason: String,
}

/// Aggregated result of one sweep
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub discovered: usize,
    pub done: usize,
    pub entries: usize,
    pub skipped: Vec<FileReport>,
    pub failed: Vec<FileReport>,
}

impl RunSummary {
    pub fn new(phase: Phase, discovered: usize) -> Self {
        Self {
            phase,
            started_at: Utc::now(),
            finished_at: None,
            discovered,
            done: 0,
            entries: 0,
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn record(&mut self, path: &Path, outcome: FileOutcome) {
        crate::metrics::record_file_outcome(self.phase, &outcome);
        match outcome {
            FileOutcome::Done { entries } => {
                self.done += 1;
                self.entries += entries;
            }
            FileOutcome::Skipped { reason } => {
                warn!("[{}] Skipped {}: {}", self.phase, path.display(), reason);
                self.skipped.push(FileReport {
                    path: path.to_path_buf(),
                    reason,
                });
            }
            FileOutcome::Failed { error } => {
                error!("[{}] Failed {}: {}", self.phase, path.display(), error);
                self.failed.push(FileReport {
                    path: path.to_path_buf(),
                    reason: error.to_string(),
                });
            }
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        if self.discovered == 0 {
            info!("[{}] No reports were found", self.phase);
        } else {
            info!(
                "[{}] {} of {} reports done ({} entries, {} skipped, {} failed)",
                self.phase,
                self.done,
                self.discovered,
                self.entries,
                self.skipped.len(),
                self.failed.len()
            );
        }
        self
    }
}
