//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the provider and store
//! traits, allowing full pipeline runs without network or real metadata
//! storage.
//!
//! # Example
//!
//! ```rust,ignore
//! use photoharvest_core::testing::{fixtures, MockAttributionStore, MockProvider};
//! use photoharvest_core::license::License;
//!
//! let provider = MockProvider::new();
//! provider
//!     .set_photos(License::Attribution, vec![fixtures::stub("1", "alice")])
//!     .await;
//! provider.set_default_image(jpeg_bytes).await;
//!
//! let store = MockAttributionStore::new();
//! // Build a Harvester around both...
//! ```

mod mock_provider;
mod mock_store;

pub use mock_provider::{MockFailure, MockProvider};
pub use mock_store::MockAttributionStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Utc};

    use crate::provider::{Photo, PhotoDetail, PhotoOwner, PhotoStub};

    /// Smallest byte sequence with a valid JPEG marker layout
    /// (SOI, JFIF APP0, SOS, one entropy byte, EOI). Not decodable as
    /// pixels, but enough for container-level metadata rewriting.
    pub const MINIMAL_JPEG: &[u8] = &[
        0xFF, 0xD8, // SOI
        0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01,
        0x00, 0x01, 0x00, 0x00, // APP0
        0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00, // SOS
        0x00, // scan data
        0xFF, 0xD9, // EOI
    ];

    /// Upload time shared by every fixture photo.
    pub fn uploaded_at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_600_000_000, 0).unwrap_or_default()
    }

    /// Create a search stub owned by `owner`.
    pub fn stub(id: &str, owner: &str) -> PhotoStub {
        PhotoStub {
            id: id.to_string(),
            owner: owner.to_string(),
            owner_name: format!("user-{}", owner),
            title: format!("Photo {}", id),
            secret: format!("s{}", id),
            server: "65535".to_string(),
        }
    }

    /// Create the detail record matching a stub.
    pub fn detail_for(stub: &PhotoStub, license: i32) -> PhotoDetail {
        PhotoDetail {
            uploaded_at: uploaded_at(),
            license,
            owner: PhotoOwner {
                id: stub.owner.clone(),
                username: stub.owner_name.clone(),
                real_name: format!("Real {}", stub.owner),
            },
            title: stub.title.clone(),
            description: format!("Description of photo {}", stub.id),
            page_url: format!("https://www.flickr.com/photos/{}/{}/", stub.owner, stub.id),
        }
    }

    /// Create a merged photo.
    pub fn photo(id: &str, owner: &str, license: i32) -> Photo {
        let stub = stub(id, owner);
        let detail = detail_for(&stub, license);
        Photo::new(stub, detail)
    }
}
