//! Attribution records and their persistence.
//!
//! An attribution record is derived from a merged [`Photo`](crate::provider::Photo);
//! the embedder writes a subset of it into the image's EXIF block, and an
//! [`AttributionStore`] keeps the record alongside the file.

mod embed;
mod record;
mod sidecar;
mod store;

pub use embed::{
    exif_timestamp, rewrite_exif, AttributionEmbedder, EmbedError, EmbedOutcome, EmbeddedFields, EmbeddedPhoto,
};
pub use record::{AttributionRecord, AttributionSettings};
pub use sidecar::{SidecarStore, SIDECAR_SUFFIX};
pub use store::{AttributedFile, AttributionStore, StoreError};
