//! Types for provider requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::license::License;

/// API credential. `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// One paged search call against a single license tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text query.
    pub query: String,
    /// License filter.
    pub license: License,
    /// Requested page size.
    pub per_page: u32,
    /// 1-indexed page number.
    pub page: u32,
}

/// Minimal photo record returned by search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoStub {
    /// Photo id.
    pub id: String,
    /// Owner id; the key that authorship uniqueness is enforced on.
    pub owner: String,
    /// Owner display name (from the `owner_name` extra).
    #[serde(default)]
    pub owner_name: String,
    /// Title as listed in search results.
    #[serde(default)]
    pub title: String,
    /// Secret token needed to build the image URL.
    pub secret: String,
    /// Server token needed to build the image URL.
    pub server: String,
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    pub photos: Vec<PhotoStub>,
    /// Page number as echoed by the provider.
    pub page: u32,
    /// Total pages reported by the provider.
    pub pages: u32,
    /// Total matching photos reported by the provider.
    pub total: u64,
}

impl PageResult {
    /// Number of photos actually returned on this page.
    pub fn total_on_page(&self) -> usize {
        self.photos.len()
    }
}

/// Owner as described by the photo-detail call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoOwner {
    /// Owner id (nsid), used for the profile URL.
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub real_name: String,
}

/// Extended record from the photo-detail call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoDetail {
    /// When the photo was uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// Raw license id; resolved through the license catalog when needed.
    pub license: i32,
    pub owner: PhotoOwner,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Canonical photo page URL.
    #[serde(default)]
    pub page_url: String,
}

/// A search stub merged with its detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub stub: PhotoStub,
    pub detail: PhotoDetail,
}

impl Photo {
    pub fn new(stub: PhotoStub, detail: PhotoDetail) -> Self {
        Self { stub, detail }
    }

    pub fn id(&self) -> &str {
        &self.stub.id
    }

    pub fn owner_id(&self) -> &str {
        &self.stub.owner
    }
}
