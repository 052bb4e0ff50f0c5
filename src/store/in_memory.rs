use super::{ReportId, ReportStore};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use serde_yaml::Mapping;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// In-memory store for development and testing
#[derive(Clone, Default)]
pub struct InMemoryReportStore {
    headers: Arc<Mutex<HashMap<ReportId, Mapping>>>,
    entries: Arc<Mutex<Vec<(ReportId, Mapping)>>>,
    unavailable: Arc<AtomicBool>,
    // successful inserts left before the store goes unavailable
    remaining_inserts: Arc<Mutex<Option<usize>>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert fail with `StoreUnavailable`. Clearing the flag
    /// also lifts any `fail_after` limit.
    pub fn set_unavailable(&self, unavailable: bool) {
        if !unavailable {
            *lock(&self.remaining_inserts) = None;
        }
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Accept `inserts` more header or entry inserts, then behave as unavailable.
    pub fn fail_after(&self, inserts: usize) {
        *lock(&self.remaining_inserts) = Some(inserts);
    }

    pub fn headers(&self) -> HashMap<ReportId, Mapping> {
        lock(&self.headers).clone()
    }

    pub fn entries(&self) -> Vec<(ReportId, Mapping)> {
        lock(&self.entries).clone()
    }

    pub fn entries_for(&self, report_id: ReportId) -> Vec<Mapping> {
        lock(&self.entries)
            .iter()
            .filter(|(id, _)| *id == report_id)
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PipelineError::StoreUnavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        match lock(&self.remaining_inserts).as_mut() {
            Some(0) => {
                self.unavailable.store(true, Ordering::SeqCst);
                Err(PipelineError::StoreUnavailable(
                    "in-memory store ran out of inserts".to_string(),
                ))
            }
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

// Inserts are single statements, so a poisoned map is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn insert_header(&self, header: &Mapping) -> Result<ReportId> {
        self.check_available()?;
        let id = ReportId::generate();
        lock(&self.headers).insert(id, header.clone());
        debug!("Created report header with id {}", id);
        Ok(id)
    }

    async fn insert_entry(&self, entry: &Mapping, report_id: ReportId) -> Result<()> {
        self.check_available()?;
        lock(&self.entries).push((report_id, entry.clone()));
        debug!("Created measurement for report {}", report_id);
        Ok(())
    }
}
