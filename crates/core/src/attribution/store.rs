//! Attribution store abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::record::AttributionRecord;

/// A file on disk together with its attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributedFile {
    pub path: PathBuf,
    pub attribution: AttributionRecord,
}

/// Errors from an attribution store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("attribution store I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored entry could not be parsed.
    #[error("corrupt attribution entry {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Attribution was requested for a file that does not exist.
    #[error("cannot attribute missing file {path}")]
    MissingFile { path: PathBuf },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Persists the association between a file and its attribution.
#[async_trait]
pub trait AttributionStore: Send + Sync {
    /// Store name for logging.
    fn name(&self) -> &str;

    /// Every attributed file under `dir`, in the order they were registered
    /// (by `position`, ties broken by path).
    ///
    /// A missing directory yields an empty list.
    async fn read_existing(&self, dir: &Path) -> Result<Vec<AttributedFile>, StoreError>;

    /// Register `record` for the file at `path`, replacing any previous
    /// record for that file. `position` is the file's index in its batch.
    async fn attribute(
        &self,
        path: &Path,
        position: usize,
        record: &AttributionRecord,
    ) -> Result<(), StoreError>;

    /// Drop the record for `path`. Forgetting an unknown file is not an error.
    async fn forget(&self, path: &Path) -> Result<(), StoreError>;
}
