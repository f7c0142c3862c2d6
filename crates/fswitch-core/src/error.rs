use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("feature checkout canceled")]
    CheckoutCanceled,

    #[error("branch does not exist: {0}")]
    BranchNotFound(String),

    #[error("no database file recorded for feature '{0}'")]
    NoDatabaseRecorded(String),

    #[error("database file no longer exists: {}", .0.display())]
    DatabaseFileMissing(PathBuf),

    #[error("invalid feature name '{0}': must be word characters, '-', '.' or '/'-separated segments")]
    InvalidFeatureName(String),

    #[error("git binary not found on PATH")]
    GitUnavailable,

    #[error("git: {0}")]
    Git(String),

    #[error("failed to check out branch '{branch}': {detail}")]
    CheckoutFailed { branch: String, detail: String },

    #[error("{task} failed: {detail}")]
    TaskFailed { task: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, FeatureError>;
