use crate::constants::ARCHIVE_EXTENSION;
use crate::error::{PipelineError, Result};
use crate::fsops::write_atomically;
use flate2::{Compression, GzBuilder};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Archive path for a raw report: `<archive_dir>/<basename>.gz`
pub fn archive_path_for(raw_path: &Path, archive_dir: &Path) -> Result<PathBuf> {
    let name = raw_path.file_name().ok_or_else(|| PipelineError::ArchiveWrite {
        path: raw_path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "report path has no file name"),
    })?;
    let mut archive_name = name.to_os_string();
    archive_name.push(".");
    archive_name.push(ARCHIVE_EXTENSION);
    Ok(archive_dir.join(archive_name))
}

/// Store a gzip copy of `raw_path` under `archive_dir`.
///
/// An existing archive of the same name is replaced. The new archive is fsynced before
/// it becomes visible, so once this returns the raw file may be deleted.
pub fn archive_report(raw_path: &Path, archive_dir: &Path) -> Result<PathBuf> {
    let target = archive_path_for(raw_path, archive_dir)?;
    if target.exists() {
        warn!("Archive {} already exists, overwriting", target.display());
        crate::metrics::record_overwrite("archive");
    }

    let member_name = raw_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    write_atomically(&target, |w| -> io::Result<()> {
        let mut input = File::open(raw_path)?;
        let mut encoder = GzBuilder::new()
            .filename(member_name.as_bytes())
            .write(w, Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.flush()
    })
    .map_err(|source| PipelineError::ArchiveWrite {
        path: target.clone(),
        source,
    })?;

    info!("Archived {} to {}", raw_path.display(), target.display());
    Ok(target)
}
