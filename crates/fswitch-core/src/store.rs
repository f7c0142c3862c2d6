use crate::error::Result;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// FeatureRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureRecord {
    /// Unique key; matches a version-control branch name. Always unescaped
    /// in memory — the `/` ↔ `%2F` escaping applies to the persisted form
    /// only.
    pub name: String,
    /// The branch this feature maps to; empty until the first save.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    /// Filename of the last exported database snapshot, relative to the
    /// feature storage directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Commit id of a temporary stash commit; present only between
    /// commit-and-switch and the revert on re-arrival.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_hash_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl FeatureRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            branch: String::new(),
            database: None,
            temp_hash_id: None,
            saved_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// FeatureStore
// ---------------------------------------------------------------------------

/// On-disk shape of `features.yml`: a single `features` key holding the
/// ordered record list.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    features: Vec<FeatureRecord>,
}

#[derive(Debug)]
pub struct FeatureStore {
    path: PathBuf,
    records: Vec<FeatureRecord>,
}

impl FeatureStore {
    /// Load the full record collection from `.project-x/features/features.yml`.
    /// A missing file or missing `features` key is an empty store.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::features_file(root);
        let mut records = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            let file: StoreFile = serde_yaml::from_str(&data)?;
            file.features
        } else {
            Vec::new()
        };
        for record in &mut records {
            record.name = paths::decode_feature_name(&record.name);
        }
        Ok(Self { path, records })
    }

    pub fn exists(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&FeatureRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Return a mutable handle to the record for `name`, appending an empty
    /// record first when none exists. All mutation goes through this
    /// accessor so it is visible to later lookups before `save()`.
    pub fn get_or_create(&mut self, name: &str) -> &mut FeatureRecord {
        let idx = match self.records.iter().position(|r| r.name == name) {
            Some(idx) => idx,
            None => {
                self.records.push(FeatureRecord::new(name));
                self.records.len() - 1
            }
        };
        &mut self.records[idx]
    }

    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize the entire collection back, fully overwriting the backing
    /// file. Record names are escaped at this boundary.
    pub fn save(&self) -> Result<()> {
        let features = self
            .records
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.name = paths::encode_feature_name(&r.name);
                r
            })
            .collect();
        let data = serde_yaml::to_string(&StoreFile { features })?;
        crate::io::atomic_write(&self.path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
