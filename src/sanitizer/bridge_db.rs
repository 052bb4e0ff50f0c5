use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Distribution metadata for one known bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeInfo {
    pub distributor: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BridgeInfo {
    pub fn new(distributor: impl Into<String>) -> Self {
        Self {
            distributor: distributor.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Known bridge identifiers, loaded once per run and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct BridgeDb {
    bridges: HashMap<String, BridgeInfo>,
}

impl BridgeDb {
    /// Load the JSON mapping file `{ "<identifier>": { "distributor": "..." } }`.
    pub fn load(path: &Path) -> Result<Self> {
        let missing = |reason: String| PipelineError::MissingMapping {
            path: path.to_path_buf(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| missing(e.to_string()))?;
        let bridges: HashMap<String, BridgeInfo> =
            serde_json::from_str(&content).map_err(|e| missing(e.to_string()))?;

        info!(
            "Loaded {} bridge identifiers from {}",
            bridges.len(),
            path.display()
        );
        Ok(Self { bridges })
    }

    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, BridgeInfo)>,
        K: Into<String>,
    {
        Self {
            bridges: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&BridgeInfo> {
        self.bridges.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }
}
