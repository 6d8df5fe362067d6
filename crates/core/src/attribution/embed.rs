//! EXIF attribution embedding.
//!
//! The primary IFD of the JPEG's APP1 block is read, the four attribution
//! fields are replaced, and the block is re-serialized. Every value written
//! derives from upload-time metadata, so embedding the same source photo
//! twice yields byte-identical files.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::license::{License, LicenseError};
use crate::provider::Photo;

use super::record::{AttributionRecord, AttributionSettings};

/// Tags the embedder owns; existing values are replaced.
const MANAGED_TAGS: [Tag; 4] = [Tag::Artist, Tag::Copyright, Tag::ImageDescription, Tag::DateTime];

/// Tags describing file layout rather than content. The writer synthesizes
/// the pointers itself and offsets would be stale after re-serialization.
const STRUCTURAL_TAGS: [Tag; 10] = [
    Tag::ExifIFDPointer,
    Tag::GPSInfoIFDPointer,
    Tag::InteropIFDPointer,
    Tag::StripOffsets,
    Tag::StripByteCounts,
    Tag::TileOffsets,
    Tag::TileByteCounts,
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
    Tag::MakerNote,
];

/// Largest TIFF body that fits one APP1 segment: the 16-bit length covers
/// itself and the `Exif\0\0` prefix.
const MAX_EXIF_BODY: usize = u16::MAX as usize - 2 - 6;

/// Errors that can occur while embedding attribution.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error(transparent)]
    License(#[from] LicenseError),

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a parseable JPEG.
    #[error("invalid image container: {0}")]
    InvalidContainer(String),

    /// The existing EXIF block could not be read.
    #[error("invalid EXIF block: {0}")]
    InvalidMetadata(String),

    /// The metadata does not fit in a single APP1 segment.
    #[error("EXIF block of {bytes} bytes exceeds the {limit} byte segment limit")]
    MetadataTooLarge { bytes: usize, limit: usize },

    /// The rewritten metadata or image could not be serialized.
    #[error("failed to serialize metadata: {0}")]
    Serialize(String),
}

/// The four values written into the primary IFD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFields {
    pub artist: String,
    pub copyright: String,
    pub image_description: String,
    /// EXIF "YYYY:MM:DD HH:MM:SS", UTC.
    pub date_time: String,
}

impl EmbeddedFields {
    fn to_exif_fields(&self) -> Vec<Field> {
        [
            (Tag::Artist, &self.artist),
            (Tag::Copyright, &self.copyright),
            (Tag::ImageDescription, &self.image_description),
            (Tag::DateTime, &self.date_time),
        ]
        .into_iter()
        .map(|(tag, text)| Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![ascii_bytes(text)]),
        })
        .collect()
    }
}

/// EXIF ASCII values are NUL-terminated by the writer; interior NULs would
/// truncate them.
fn ascii_bytes(text: &str) -> Vec<u8> {
    text.bytes().filter(|b| *b != 0).collect()
}

/// Format a timestamp the way EXIF DateTime expects.
pub fn exif_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y:%m:%d %H:%M:%S").to_string()
}

/// Result of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedOutcome {
    pub path: PathBuf,
    /// Size of the rewritten file.
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the rewritten file.
    pub sha256: String,
}

/// An embedded photo: the derived record plus what was written.
#[derive(Debug, Clone)]
pub struct EmbeddedPhoto {
    pub record: AttributionRecord,
    pub outcome: EmbedOutcome,
}

/// Derives attribution from photo detail and writes it into image files.
#[derive(Debug, Clone, Default)]
pub struct AttributionEmbedder {
    settings: AttributionSettings,
}

impl AttributionEmbedder {
    pub fn new(settings: AttributionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AttributionSettings {
        &self.settings
    }

    /// Compute the EXIF values for a photo.
    pub fn fields_for(&self, photo: &Photo) -> Result<EmbeddedFields, LicenseError> {
        let detail = &photo.detail;
        let license = License::try_from(detail.license)?;

        Ok(EmbeddedFields {
            artist: format!(
                "{} (on {} @{})",
                detail.owner.real_name, self.settings.provider_name, detail.owner.username
            ),
            copyright: license.description(),
            image_description: format!(
                "{}\n{}\n{}",
                detail.title, detail.description, detail.page_url
            ),
            date_time: exif_timestamp(detail.uploaded_at),
        })
    }

    /// Derive the attribution record and embed it into the file at `path`.
    ///
    /// The file is read fully into memory, rewritten, and overwritten in
    /// place.
    pub async fn embed(
        &self,
        path: &Path,
        photo: &Photo,
        collected_at: DateTime<Utc>,
    ) -> Result<EmbeddedPhoto, EmbedError> {
        let record = AttributionRecord::for_photo(photo, &self.settings, collected_at)?;
        let fields = self.fields_for(photo)?;

        let original = tokio::fs::read(path).await.map_err(|e| EmbedError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let rewritten = rewrite_exif(original, &fields)?;

        tokio::fs::write(path, &rewritten)
            .await
            .map_err(|e| EmbedError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        let outcome = EmbedOutcome {
            path: path.to_path_buf(),
            bytes: rewritten.len() as u64,
            sha256: format!("{:x}", Sha256::digest(&rewritten)),
        };

        debug!(
            photo_id = %photo.id(),
            path = %path.display(),
            sha256 = %outcome.sha256,
            "Attribution embedded"
        );

        Ok(EmbeddedPhoto { record, outcome })
    }
}

fn carries_over(field: &Field) -> bool {
    field.ifd_num == In::PRIMARY
        && !matches!(field.value, Value::Unknown(..))
        && !MANAGED_TAGS.contains(&field.tag)
        && !STRUCTURAL_TAGS.contains(&field.tag)
}

/// Replace the attribution fields in a JPEG's EXIF block, creating the
/// block when the image has none.
///
/// Other primary-IFD fields (camera make, orientation, ...) are kept; the
/// thumbnail IFD is dropped.
pub fn rewrite_exif(jpeg_bytes: Vec<u8>, fields: &EmbeddedFields) -> Result<Vec<u8>, EmbedError> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(jpeg_bytes))
        .map_err(|e| EmbedError::InvalidContainer(e.to_string()))?;

    let (mut exif_fields, little_endian) = match jpeg.exif() {
        Some(raw) => {
            let existing = exif::Reader::new()
                .read_raw(raw.to_vec())
                .map_err(|e| EmbedError::InvalidMetadata(e.to_string()))?;
            let kept: Vec<Field> = existing
                .fields()
                .filter(|f| carries_over(f))
                .cloned()
                .collect();
            (kept, existing.little_endian())
        }
        None => (Vec::new(), false),
    };

    exif_fields.extend(fields.to_exif_fields());
    exif_fields.sort_by_key(|f| f.tag.number());

    let mut writer = Writer::new();
    for field in &exif_fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer
        .write(&mut tiff, little_endian)
        .map_err(|e| EmbedError::Serialize(e.to_string()))?;

    let tiff = tiff.into_inner();
    if tiff.len() > MAX_EXIF_BODY {
        return Err(EmbedError::MetadataTooLarge {
            bytes: tiff.len(),
            limit: MAX_EXIF_BODY,
        });
    }

    jpeg.set_exif(Some(Bytes::from(tiff)));

    let mut out = Vec::new();
    jpeg.encoder()
        .write_to(&mut out)
        .map_err(|e| EmbedError::Serialize(e.to_string()))?;

    Ok(out)
}
