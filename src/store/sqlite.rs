use super::{ReportId, ReportStore};
use crate::constants::{JURISDICTION_FIELD, REPORT_FILE_FIELD};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde_yaml::Mapping;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const SCHEMA: &str = r#"
    PRAGMA journal_mode=WAL;
    CREATE TABLE IF NOT EXISTS reports (
        id           TEXT PRIMARY KEY,
        report_file  TEXT,
        probe_cc     TEXT,
        header_json  TEXT NOT NULL,
        inserted_at  TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS measurements (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        report_id    TEXT NOT NULL REFERENCES reports(id),
        entry_json   TEXT NOT NULL,
        inserted_at  TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS measurements_report_id ON measurements(report_id);
"#;

/// SQLite-backed record store. Headers go to `reports`, entries to `measurements`,
/// both as JSON documents.
pub struct SqliteReportStore {
    conn: Mutex<Connection>,
}

impl SqliteReportStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(SCHEMA)?;
        info!("Opened record store at {}", db_path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PipelineError::StoreUnavailable("connection lock poisoned".to_string()))
    }

    pub fn count_reports(&self) -> Result<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    pub fn count_measurements(&self, report_id: ReportId) -> Result<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM measurements WHERE report_id = ?1",
            params![report_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    pub fn get_header(&self, report_id: ReportId) -> Result<Option<serde_json::Value>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT header_json FROM reports WHERE id = ?1")?;
        let mut rows = stmt.query(params![report_id.to_string()])?;
        if let Some(row) = rows.next()? {
            let json: String = row.get(0)?;
            Ok(Some(serde_json::from_str(&json)?))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn insert_header(&self, header: &Mapping) -> Result<ReportId> {
        let header_json = serde_json::to_string(header)?;
        let report_file = header.get(REPORT_FILE_FIELD).and_then(|v| v.as_str());
        let probe_cc = header.get(JURISDICTION_FIELD).and_then(|v| v.as_str());
        let id = ReportId::generate();

        self.conn()?.execute(
            "INSERT INTO reports (id, report_file, probe_cc, header_json, inserted_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                report_file,
                probe_cc,
                header_json,
                Utc::now().to_rfc3339()
            ],
        )?;
        debug!("Inserted report header {}", id);
        Ok(id)
    }

    async fn insert_entry(&self, entry: &Mapping, report_id: ReportId) -> Result<()> {
        let entry_json = serde_json::to_string(entry)?;
        self.conn()?.execute(
            "INSERT INTO measurements (report_id, entry_json, inserted_at) VALUES (?1, ?2, ?3)",
            params![report_id.to_string(), entry_json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
