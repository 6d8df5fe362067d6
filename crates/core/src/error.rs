//! Run-level error type.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::acquisition::AcquisitionError;
use crate::attribution::{EmbedError, StoreError};
use crate::config::ConfigError;
use crate::license::LicenseError;
use crate::provider::ProviderError;

/// Coarse classification of a run failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A remote call failed (network, HTTP status, or error envelope).
    Transport,
    /// A provider response could not be decoded.
    Decode,
    /// A license tier outside the catalog.
    UnknownLicense,
    /// Directory or file creation/write failed.
    FileIo,
    /// The image's metadata container could not be rewritten.
    MetadataEmbed,
    /// The attribution store failed.
    Store,
    Config,
    InvalidRequest,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Decode => "decode",
            ErrorKind::UnknownLicense => "unknown_license",
            ErrorKind::FileIo => "file_io",
            ErrorKind::MetadataEmbed => "metadata_embed",
            ErrorKind::Store => "store",
            ErrorKind::Config => "config",
            ErrorKind::InvalidRequest => "invalid_request",
        };
        f.write_str(s)
    }
}

/// Errors that abort a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    License(#[from] LicenseError),

    #[error("discovery failed")]
    Discovery(#[source] ProviderError),

    #[error("acquisition failed")]
    Acquisition(#[from] AcquisitionError),

    #[error("failed to embed attribution into {path}")]
    MetadataEmbed {
        path: PathBuf,
        #[source]
        source: EmbedError,
    },

    #[error("failed to create output directory {path}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("attribution store failed")]
    Store(#[from] StoreError),
}

fn provider_kind(e: &ProviderError) -> ErrorKind {
    match e {
        ProviderError::Decode(_) => ErrorKind::Decode,
        ProviderError::Io { .. } => ErrorKind::FileIo,
        _ => ErrorKind::Transport,
    }
}

impl HarvestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarvestError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            HarvestError::Config(_) => ErrorKind::Config,
            HarvestError::License(_) => ErrorKind::UnknownLicense,
            HarvestError::Discovery(e) => provider_kind(e),
            HarvestError::Acquisition(e) => match e.provider_error() {
                Some(source) => provider_kind(source),
                None => ErrorKind::Transport,
            },
            HarvestError::MetadataEmbed { source, .. } => match source {
                EmbedError::License(_) => ErrorKind::UnknownLicense,
                EmbedError::Io { .. } => ErrorKind::FileIo,
                _ => ErrorKind::MetadataEmbed,
            },
            HarvestError::OutputDir { .. } => ErrorKind::FileIo,
            HarvestError::Store(_) => ErrorKind::Store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            HarvestError::Discovery(ProviderError::Timeout).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            HarvestError::Discovery(ProviderError::Decode("x".into())).kind(),
            ErrorKind::Decode
        );
        assert_eq!(
            HarvestError::Acquisition(AcquisitionError::Fetch {
                photo_id: "1".into(),
                source: ProviderError::Api {
                    code: 100,
                    message: "Invalid API Key".into()
                },
                orphaned: vec![],
            })
            .kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            HarvestError::MetadataEmbed {
                path: "/tmp/a.jpeg".into(),
                source: EmbedError::License(LicenseError::Unknown(11)),
            }
            .kind(),
            ErrorKind::UnknownLicense
        );
        assert_eq!(
            HarvestError::MetadataEmbed {
                path: "/tmp/a.jpeg".into(),
                source: EmbedError::InvalidContainer("no SOI".into()),
            }
            .kind(),
            ErrorKind::MetadataEmbed
        );
        assert_eq!(
            HarvestError::InvalidRequest("empty query".into()).kind(),
            ErrorKind::InvalidRequest
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::UnknownLicense.to_string(), "unknown_license");
        assert_eq!(ErrorKind::FileIo.to_string(), "file_io");
    }
}
