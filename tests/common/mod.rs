#![allow(dead_code)]

use report_pipeline::Config;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated directory layout for one pipeline run
pub struct Sandbox {
    _tmp: TempDir,
    pub config: Config,
}

impl Sandbox {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path();
        for name in ["reports", "sanitised", "archive", "public", "logs"] {
            fs::create_dir_all(root.join(name)).expect("create sandbox dir");
        }
        let config = Config::from_toml_str(&format!(
            r#"
reports_directory = '{0}/reports'
sanitised_directory = '{0}/sanitised'
archive_directory = '{0}/archive'
public_directory = '{0}/public'
bridge_db_mapping_file = '{0}/bridge_db.json'
database_path = '{0}/reports.db'
log_directory = '{0}/logs'
"#,
            root.display()
        ))
        .expect("sandbox config");

        Self { _tmp: tmp, config }
    }

    pub fn write_bridge_db(&self, json: &str) {
        fs::write(&self.config.bridge_db_mapping_file, json).expect("write bridge db");
    }

    pub fn write_raw(&self, relative: &str, content: &str) -> PathBuf {
        write_file(&self.config.reports_directory.join(relative), content)
    }

    pub fn write_sanitized(&self, name: &str, content: &str) -> PathBuf {
        write_file(&self.config.sanitized_directory.join(name), content)
    }

    pub fn sanitized(&self, name: &str) -> PathBuf {
        self.config.sanitized_directory.join(name)
    }

    pub fn archive(&self, name: &str) -> PathBuf {
        self.config.archive_directory.join(format!("{name}.gz"))
    }

    pub fn public(&self, jurisdiction: &str, name: &str) -> PathBuf {
        self.config.public_directory.join(jurisdiction).join(name)
    }
}

fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, content).expect("write file");
    path.to_path_buf()
}

/// Sorted relative paths of every file under `root`
pub fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .expect("under root")
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    files.sort();
    files
}
