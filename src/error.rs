//! Error types for the dependency resolver.

use std::path::PathBuf;

use crate::builder::BuildOutcome;
use crate::tag::TypeTag;

#[derive(Debug, thiserror::Error)]
pub enum DepError {
    #[error("dependency producer failed: {0}")]
    Producer(String),

    #[error("failed to read cache file {path}: {source}")]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the cache failed, but the tree built this run is still valid
    /// and is handed back so the caller isn't left without one.
    #[error("failed to write cache file {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        outcome: Box<BuildOutcome>,
    },

    #[error("service `{service}' not found")]
    ServiceNotFound { service: String },

    #[error("service `{service}' has no dependency type `{type_tag}'")]
    TypeNotFound { service: String, type_tag: TypeTag },
}

pub type Result<T> = std::result::Result<T, DepError>;
