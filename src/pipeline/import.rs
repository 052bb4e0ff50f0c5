//! Import phase: sanitized reports -> record store + public directory.
//!
//! Per file: parse, insert the header, insert every entry with a back-reference to the
//! header, then move the file to `<public>/<jurisdiction>/<basename>`. The move is the
//! last step, so the public tree only ever holds fully persisted reports.

use super::outcome::{FileOutcome, Phase, RunSummary};
use crate::config::Config;
use crate::constants::{JURISDICTION_FIELD, REPORT_FILE_FIELD, REPORT_ID_FIELD};
use crate::error::{PipelineError, Result};
use crate::fsops::{discover_reports, relocate};
use crate::report::Report;
use crate::store::ReportStore;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

static JURISDICTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2}$").expect("jurisdiction pattern is valid"));

/// Two-letter jurisdiction code of a header, if present and well formed.
pub fn jurisdiction_of(header: &Mapping) -> Option<&str> {
    header
        .get(JURISDICTION_FIELD)
        .and_then(Value::as_str)
        .filter(|cc| JURISDICTION_PATTERN.is_match(cc))
}

pub struct ImportPipeline<'a> {
    config: &'a Config,
    store: Arc<dyn ReportStore>,
}

impl<'a> ImportPipeline<'a> {
    pub fn new(config: &'a Config, store: Arc<dyn ReportStore>) -> Self {
        Self { config, store }
    }

    /// Sweep the current snapshot of the sanitized directory once.
    pub async fn run(&self) -> Result<RunSummary> {
        let files = discover_reports(
            &self.config.sanitized_directory,
            &self.config.report_extension,
        )?;
        info!(
            "Importing {} reports from {}",
            files.len(),
            self.config.sanitized_directory.display()
        );

        let mut summary = RunSummary::new(Phase::Import, files.len());
        for path in files {
            let outcome = self.process_file(&path).await;
            summary.record(&path, outcome);
        }
        Ok(summary.finish())
    }

    /// `<public>/<jurisdiction>/<basename>`
    pub fn public_path_for(&self, path: &Path, jurisdiction: &str) -> Option<PathBuf> {
        path.file_name()
            .map(|name| self.config.public_directory.join(jurisdiction).join(name))
    }

    #[instrument(skip(self), fields(report = %path.display()))]
    pub async fn process_file(&self, path: &Path) -> FileOutcome {
        // DISCOVERED -> PARSED
        let mut report = match Report::open(path) {
            Ok(report) => report,
            Err(e @ PipelineError::MalformedReport { .. }) => return FileOutcome::skipped(e),
            Err(error) => return FileOutcome::Failed { error },
        };

        let Some(jurisdiction) = jurisdiction_of(&report.header).map(str::to_owned) else {
            let value = report
                .header
                .get(JURISDICTION_FIELD)
                .map(|v| serde_yaml::to_string(v).unwrap_or_default().trim().to_string());
            return FileOutcome::skipped(PipelineError::InvalidJurisdiction {
                path: path.to_path_buf(),
                value,
            });
        };
        let Some(public_path) = self.public_path_for(path, &jurisdiction) else {
            return FileOutcome::Skipped {
                reason: "report path has no file name".to_string(),
            };
        };

        // PARSED -> PERSISTED
        report.header.insert(
            Value::from(REPORT_FILE_FIELD),
            Value::from(public_path.to_string_lossy().into_owned()),
        );
        let report_id = match self.store.insert_header(&report.header).await {
            Ok(id) => id,
            Err(error) => return FileOutcome::Failed { error },
        };
        debug!("Inserted header {} for {}", report_id, path.display());

        let mut entries = 0usize;
        for entry in report.by_ref() {
            let mut entry = match entry {
                Ok(entry) => entry,
                Err(error) => return FileOutcome::Failed { error },
            };
            entry.insert(
                Value::from(REPORT_ID_FIELD),
                Value::from(report_id.to_string()),
            );
            if let Err(error) = self.store.insert_entry(&entry, report_id).await {
                return FileOutcome::Failed { error };
            }
            entries += 1;
        }
        report.close();

        // PERSISTED -> RELOCATED
        if let Err(e) = relocate(path, &public_path) {
            return FileOutcome::Failed { error: e.into() };
        }
        info!(
            "Imported {} ({} entries) to {}",
            path.display(),
            entries,
            public_path.display()
        );
        FileOutcome::Done { entries }
    }
}
