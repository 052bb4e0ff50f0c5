//! Reading measurement reports.
//!
//! A report file is a stream of YAML documents: the first one is the session header,
//! every following non-blank document is one test entry. Entries are parsed on demand
//! and can be consumed only once; re-reading requires a new [`Report::open`].

pub mod writer;

use crate::error::{PipelineError, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use writer::DocumentWriter;

pub struct Report {
    path: PathBuf,
    pub header: Mapping,
    documents: Option<serde_yaml::Deserializer<'static>>,
}

impl Report {
    /// Open `path` and eagerly parse its header document.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let mut documents = serde_yaml::Deserializer::from_reader(file);

        let first = documents
            .next()
            .ok_or_else(|| PipelineError::malformed(&path, "report contains no documents"))?;
        let header = match Value::deserialize(first) {
            Ok(Value::Mapping(header)) => header,
            Ok(other) => {
                return Err(PipelineError::malformed(
                    &path,
                    format!("header is {}, expected a mapping", describe(&other)),
                ))
            }
            Err(e) => return Err(PipelineError::malformed(&path, e)),
        };

        Ok(Self {
            path,
            header,
            documents: Some(documents),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the underlying file. Safe to call more than once.
    pub fn close(&mut self) {
        if self.documents.take().is_some() {
            debug!("Closed report {}", self.path.display());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.documents.is_none()
    }
}

impl Iterator for Report {
    type Item = Result<Mapping>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let documents = self.documents.as_mut()?;
            let Some(document) = documents.next() else {
                self.close();
                return None;
            };

            match Value::deserialize(document) {
                Ok(value) if is_blank(&value) => {
                    debug!("Skipping blank document in {}", self.path.display());
                }
                Ok(Value::Mapping(entry)) => return Some(Ok(entry)),
                Ok(other) => {
                    self.close();
                    return Some(Err(PipelineError::malformed(
                        &self.path,
                        format!("entry is {}, expected a mapping", describe(&other)),
                    )));
                }
                Err(e) => {
                    self.close();
                    return Some(Err(PipelineError::malformed(&self.path, e)));
                }
            }
        }
    }
}

/// Documents that carry no data and are dropped from the entry sequence.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Mapping(m) => m.is_empty(),
        Value::Sequence(s) => s.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "empty",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
