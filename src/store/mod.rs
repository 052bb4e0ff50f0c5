//! Record store boundary used by the import phase.
//!
//! Headers and entries are append-only: the store hands out an identifier for every
//! header and entries carry that identifier as a back-reference. Nothing is updated or
//! deleted, and nothing is deduplicated.

pub mod in_memory;
pub mod sqlite;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::fmt;
use uuid::Uuid;

pub use in_memory::InMemoryReportStore;
pub use sqlite::SqliteReportStore;

/// Store-generated identifier of a report header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub Uuid);

impl ReportId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a report header and return its generated identifier.
    async fn insert_header(&self, header: &Mapping) -> Result<ReportId>;

    /// Persist one measurement entry belonging to `report_id`.
    async fn insert_entry(&self, entry: &Mapping, report_id: ReportId) -> Result<()>;
}
