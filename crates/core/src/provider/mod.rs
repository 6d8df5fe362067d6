//! Remote photo provider abstraction.
//!
//! This module provides a `PhotoProvider` trait covering the three remote
//! calls the pipeline makes (paged search, photo detail, image download),
//! and a Flickr REST implementation of it.

mod flickr;
mod types;
mod wire;

pub use flickr::FlickrClient;
pub use types::*;
pub use wire::{decode_detail, decode_search};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when talking to the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Could not reach the provider.
    #[error("Provider connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Provider request timed out")]
    Timeout,

    /// Any other transport-level failure.
    #[error("Provider request failed: {0}")]
    Transport(String),

    /// Non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The provider answered with an error envelope.
    #[error("Provider API error {code}: {message}")]
    Api { code: u32, message: String },

    /// The response body could not be decoded.
    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    /// Writing a downloaded image failed.
    #[error("Failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProviderError {
    /// Whether the failure happened on the wire rather than while decoding
    /// or writing.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProviderError::ConnectionFailed(_)
                | ProviderError::Timeout
                | ProviderError::Transport(_)
                | ProviderError::HttpStatus { .. }
                | ProviderError::Api { .. }
        )
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ProviderError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_connect() {
            ProviderError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// Trait for photo provider backends.
#[async_trait]
pub trait PhotoProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Fetch one page of search results for a single license tier.
    async fn search(
        &self,
        request: &SearchRequest,
        api_key: &ApiKey,
    ) -> Result<PageResult, ProviderError>;

    /// Fetch the descriptive detail of one photo.
    async fn photo_detail(
        &self,
        photo_id: &str,
        api_key: &ApiKey,
    ) -> Result<PhotoDetail, ProviderError>;

    /// Stream the full-resolution image into a newly created file at `dest`.
    ///
    /// Returns the number of bytes written.
    async fn download_image(&self, photo: &PhotoStub, dest: &Path) -> Result<u64, ProviderError>;
}
