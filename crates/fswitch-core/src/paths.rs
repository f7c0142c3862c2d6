use crate::error::{FeatureError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PROJECT_DIR: &str = ".project-x";
pub const FEATURES_DIR: &str = ".project-x/features";
pub const FEATURES_FILE: &str = ".project-x/features/features.yml";
pub const CONFIG_FILE: &str = ".project-x/config.yml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn project_dir(root: &Path) -> PathBuf {
    root.join(PROJECT_DIR)
}

pub fn features_dir(root: &Path) -> PathBuf {
    root.join(FEATURES_DIR)
}

pub fn features_file(root: &Path) -> PathBuf {
    root.join(FEATURES_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Absolute path of a database snapshot stored in the feature directory.
pub fn database_path(root: &Path, filename: &str) -> PathBuf {
    features_dir(root).join(filename)
}

// ---------------------------------------------------------------------------
// Feature name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[\w.-]+(/[\w.-]+)*$").unwrap())
}

pub fn validate_feature_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 128 || !name_re().is_match(name) {
        return Err(FeatureError::InvalidFeatureName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Name escaping
// ---------------------------------------------------------------------------

// Branch names may contain '/', which cannot appear in a single path
// segment. The persisted record name and the snapshot filename stem use the
// escaped form; everything handed to version control uses the plain form.

pub fn encode_feature_name(name: &str) -> String {
    name.replace('/', "%2F")
}

pub fn decode_feature_name(name: &str) -> String {
    name.replace("%2F", "/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
