use crate::constants::TEMP_EXTENSION;
use crate::error::Result;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Enumerate every `*.<extension>` file under `root`, depth first.
///
/// The whole snapshot is collected before any file is processed. Sibling order is
/// whatever the filesystem returns.
pub fn discover_reports(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            found.push(path.to_path_buf());
        }
    }
    debug!("Discovered {} report files under {}", found.len(), root.display());
    Ok(found)
}

/// Hidden sibling used while `target` is being written
pub fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{TEMP_EXTENSION}"))
}

/// Write `target` through a temporary sibling, fsync it and rename it into place.
///
/// Readers of `target` see either the previous contents or the complete new contents.
/// The temporary file is removed if `write` fails.
pub fn write_atomically<F, E>(target: &Path, write: F) -> std::result::Result<(), E>
where
    F: FnOnce(&mut BufWriter<File>) -> std::result::Result<(), E>,
    E: From<io::Error>,
{
    let tmp_path = temp_path_for(target);
    let result = (|| -> std::result::Result<(), E> {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&tmp_path, target)?;
        Ok(())
    })();

    if result.is_err() {
        if let Err(e) = fs::remove_file(&tmp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to remove temporary file {}: {}", tmp_path.display(), e);
            }
        }
    }
    result
}

/// Move `src` to `dest`, creating missing parent directories.
///
/// Falls back to copy and delete when the rename crosses filesystems.
pub fn relocate(src: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    if dest.exists() {
        warn!("Destination {} already exists, overwriting", dest.display());
        crate::metrics::record_overwrite("public");
    }

    match fs::rename(src, dest) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                "Rename {} -> {} crosses devices, copying",
                src.display(),
                dest.display()
            );
            move_by_copy(src, dest)
        }
        result => result,
    }
}

/// Copy `src` into place at `dest` through [`write_atomically`], then remove `src`.
fn move_by_copy(src: &Path, dest: &Path) -> io::Result<()> {
    write_atomically(dest, |w| -> io::Result<()> {
        let mut input = File::open(src)?;
        io::copy(&mut input, w)?;
        w.flush()
    })?;
    fs::remove_file(src)
}
