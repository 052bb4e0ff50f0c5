//! Sanitize phase: raw reports -> sanitized copies + gzip archives.
//!
//! Per file: read, sanitize header and entries, write the sanitized copy atomically,
//! archive the raw file, then delete it. The raw file is deleted only after its archive
//! is durably written.

use super::outcome::{FileOutcome, Phase, RunSummary};
use crate::archive::archive_report;
use crate::config::Config;
use crate::constants::REPORT_FILE_FIELD;
use crate::error::{PipelineError, Result};
use crate::fsops::{discover_reports, write_atomically};
use crate::report::{DocumentWriter, Report};
use crate::sanitizer::{sanitize, BridgeDb};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

pub struct SanitizePipeline<'a> {
    config: &'a Config,
    bridge_db: BridgeDb,
}

impl<'a> SanitizePipeline<'a> {
    pub fn new(config: &'a Config, bridge_db: BridgeDb) -> Self {
        Self { config, bridge_db }
    }

    /// Build the pipeline with the bridge mapping named in `config`.
    pub fn from_config(config: &'a Config) -> Result<Self> {
        let bridge_db = BridgeDb::load(&config.bridge_db_mapping_file)?;
        Ok(Self::new(config, bridge_db))
    }

    /// Sweep the current snapshot of the reports directory once.
    pub fn run(&self) -> Result<RunSummary> {
        let files = discover_reports(&self.config.reports_directory, &self.config.report_extension)?;
        info!(
            "Sanitizing {} reports from {}",
            files.len(),
            self.config.reports_directory.display()
        );

        let mut summary = RunSummary::new(Phase::Sanitize, files.len());
        for raw_path in files {
            let outcome = self.process_file(&raw_path);
            summary.record(&raw_path, outcome);
        }
        Ok(summary.finish())
    }

    /// Where the sanitized copy of `raw_path` is written
    pub fn sanitized_path_for(&self, raw_path: &Path) -> Option<PathBuf> {
        raw_path
            .file_name()
            .map(|name| self.config.sanitized_directory.join(name))
    }

    /// `raw_path` relative to the reports root, recorded as `report_file`
    fn relative_report_file(&self, raw_path: &Path) -> String {
        raw_path
            .strip_prefix(&self.config.reports_directory)
            .unwrap_or(raw_path)
            .to_string_lossy()
            .into_owned()
    }

    #[instrument(skip(self), fields(report = %raw_path.display()))]
    pub fn process_file(&self, raw_path: &Path) -> FileOutcome {
        // DISCOVERED -> READ
        let mut report = match Report::open(raw_path) {
            Ok(report) => report,
            Err(e @ PipelineError::MalformedReport { .. }) => return FileOutcome::skipped(e),
            Err(error) => return FileOutcome::Failed { error },
        };

        let Some(target) = self.sanitized_path_for(raw_path) else {
            return FileOutcome::Skipped {
                reason: "report path has no file name".to_string(),
            };
        };

        // READ -> TRANSFORMED -> WRITTEN
        let mut header = sanitize(std::mem::take(&mut report.header), &self.bridge_db);
        header.insert(
            Value::from(REPORT_FILE_FIELD),
            Value::from(self.relative_report_file(raw_path)),
        );

        if target.exists() {
            warn!(
                "Sanitized report name already exists, overwriting: {}",
                target.display()
            );
            crate::metrics::record_overwrite("sanitized");
        } else {
            debug!("New sanitized report file: {}", target.display());
        }

        let mut entries = 0usize;
        let written = write_atomically(&target, |w| -> Result<()> {
            let mut writer = DocumentWriter::new(w);
            writer.write(&header)?;
            for entry in report.by_ref() {
                writer.write(&sanitize(entry?, &self.bridge_db))?;
                entries += 1;
            }
            writer.into_inner()?;
            Ok(())
        });
        report.close();

        match written {
            Ok(()) => {}
            Err(e @ PipelineError::MalformedReport { .. }) => return FileOutcome::skipped(e),
            Err(error) => return FileOutcome::Failed { error },
        }

        // WRITTEN -> ARCHIVED
        info!("Moving original unsanitized file {} to archive", raw_path.display());
        if let Err(error) = archive_report(raw_path, &self.config.archive_directory) {
            // Without an archive the raw file stays; drop the sanitized copy so the
            // report lives in one place until the retry.
            if let Err(e) = fs::remove_file(&target) {
                warn!(
                    "Could not roll back sanitized file {}: {}",
                    target.display(),
                    e
                );
            }
            return FileOutcome::Failed { error };
        }

        // ARCHIVED -> REMOVED
        if let Err(e) = fs::remove_file(raw_path) {
            return FileOutcome::Failed { error: e.into() };
        }

        debug!("Sanitized {} entries into {}", entries, target.display());
        FileOutcome::Done { entries }
    }
}
