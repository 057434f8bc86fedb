//! Fatal errors of the walkthrough.
//!
//! Only configuration mistakes and failed scene loads end up here. Missing
//! optional collaborators are logged and skipped where they are used.

use std::path::PathBuf;

use thiserror::Error;

use crate::scene::SceneLoadError;

/// Errors that stop the walkthrough
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("{owner} has no target scene")]
    MissingTargetScene { owner: String },

    #[error("scene load failed: {0}")]
    SceneLoad(#[from] SceneLoadError),
}

pub type Result<T> = std::result::Result<T, WalkError>;
