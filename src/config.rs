use crate::constants::DEFAULT_REPORT_EXTENSION;
use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "pipeline.toml";

/// Prefix for environment variables that override directory settings
const ENV_PREFIX: &str = "REPORT_PIPELINE_";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub reports_directory: PathBuf,
    #[serde(alias = "sanitised_directory")]
    pub sanitized_directory: PathBuf,
    pub archive_directory: PathBuf,
    pub public_directory: PathBuf,
    pub bridge_db_mapping_file: PathBuf,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_report_extension")]
    pub report_extension: String,
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("reports.db")
}

fn default_report_extension() -> String {
    DEFAULT_REPORT_EXTENSION.to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

impl Config {
    /// Read the TOML file at `path`, then apply `REPORT_PIPELINE_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::from_toml_str(&config_content)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.report_extension.trim().is_empty() {
            return Err(PipelineError::Config(
                "report_extension must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    /// Override directory settings from `lookup`, keyed by `REPORT_PIPELINE_<FIELD>`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields: [(&str, &mut PathBuf); 7] = [
            ("REPORTS_DIRECTORY", &mut self.reports_directory),
            ("SANITIZED_DIRECTORY", &mut self.sanitized_directory),
            ("ARCHIVE_DIRECTORY", &mut self.archive_directory),
            ("PUBLIC_DIRECTORY", &mut self.public_directory),
            ("BRIDGE_DB_MAPPING_FILE", &mut self.bridge_db_mapping_file),
            ("DATABASE_PATH", &mut self.database_path),
            ("LOG_DIRECTORY", &mut self.log_directory),
        ];
        for (suffix, slot) in fields {
            if let Some(value) = lookup(&format!("{ENV_PREFIX}{suffix}")) {
                if !value.trim().is_empty() {
                    *slot = PathBuf::from(value);
                }
            }
        }
    }

    pub fn check_sanitize_preconditions(&self) -> Result<()> {
        require_dir(&self.archive_directory)?;
        require_dir(&self.reports_directory)?;
        require_file(&self.bridge_db_mapping_file)?;
        require_dir(&self.sanitized_directory)
    }

    pub fn check_import_preconditions(&self) -> Result<()> {
        require_dir(&self.sanitized_directory)?;
        require_dir(&self.public_directory)
    }
}

fn require_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(PipelineError::Precondition(format!(
            "{} does not exist",
            path.display()
        )))
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::Precondition(format!(
            "{} does not exist",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"
reports_directory = "/data/reports"
sanitised_directory = "/data/sanitised"
archive_directory = "/data/archive"
public_directory = "/data/public"
bridge_db_mapping_file = "/data/bridge_db.json"
"#;

    #[test]
    fn test_defaults_and_alias() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.sanitized_directory, PathBuf::from("/data/sanitised"));
        assert_eq!(config.report_extension, "yamloo");
        assert_eq!(config.database_path, PathBuf::from("reports.db"));
        assert!(config.metrics_addr.is_none());
    }

    #[test]
    fn test_env_overrides_replace_directories() {
        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.apply_overrides(|key| match key {
            "REPORT_PIPELINE_PUBLIC_DIRECTORY" => Some("/srv/public".to_string()),
            "REPORT_PIPELINE_ARCHIVE_DIRECTORY" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.public_directory, PathBuf::from("/srv/public"));
        assert_eq!(config.archive_directory, PathBuf::from("/data/archive"));
    }

    #[test]
    fn test_empty_extension_is_rejected() {
        let content = format!("{MINIMAL}report_extension = \"\"\n");
        assert!(matches!(
            Config::from_toml_str(&content),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_sanitize_preconditions() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for name in ["reports", "sanitised", "archive", "public"] {
            fs::create_dir(root.join(name)).unwrap();
        }
        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.reports_directory = root.join("reports");
        config.sanitized_directory = root.join("sanitised");
        config.archive_directory = root.join("archive");
        config.public_directory = root.join("public");
        config.bridge_db_mapping_file = root.join("bridge_db.json");

        // mapping file missing
        assert!(matches!(
            config.check_sanitize_preconditions(),
            Err(PipelineError::Precondition(_))
        ));
        assert!(config.check_import_preconditions().is_ok());

        fs::write(&config.bridge_db_mapping_file, "{}").unwrap();
        assert!(config.check_sanitize_preconditions().is_ok());
    }
}
