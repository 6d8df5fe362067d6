//! Concurrent acquisition of images and photo details.
//!
//! Every discovered photo needs two independent remote calls: the image
//! download and the detail lookup. The coordinator runs all of them under a
//! shared concurrency cap, waits for every started call to finish, and fails
//! the batch on the first error. Calls that have not started when an error
//! is seen are skipped.

mod coordinator;
mod ids;

pub use coordinator::{AcquiredPhoto, AcquisitionCoordinator};
pub use ids::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};

use std::path::PathBuf;
use thiserror::Error;

use crate::provider::ProviderError;

/// Errors from an acquisition batch.
///
/// Image files already written when the batch failed are left on disk and
/// listed in `orphaned`.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("fetch failed for photo {photo_id}")]
    Fetch {
        photo_id: String,
        #[source]
        source: ProviderError,
        orphaned: Vec<PathBuf>,
    },

    #[error("fetch task aborted: {reason}")]
    TaskAborted {
        reason: String,
        orphaned: Vec<PathBuf>,
    },

    #[error("photo {photo_id} finished without both image and detail")]
    Incomplete { photo_id: String },
}

impl AcquisitionError {
    /// Files left behind by the failed batch.
    pub fn orphaned(&self) -> &[PathBuf] {
        match self {
            AcquisitionError::Fetch { orphaned, .. }
            | AcquisitionError::TaskAborted { orphaned, .. } => orphaned,
            AcquisitionError::Incomplete { .. } => &[],
        }
    }

    /// The provider failure behind this error, if any.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            AcquisitionError::Fetch { source, .. } => Some(source),
            _ => None,
        }
    }
}
