//! JSON sidecar attribution store.
//!
//! Each attributed `photo.jpeg` gets a `photo.jpeg.attribution.json` next to
//! it. Sidecars are written to a temporary name and renamed into place so a
//! crash never leaves a half-written record behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::record::AttributionRecord;
use super::store::{AttributedFile, AttributionStore, StoreError};

/// Suffix appended to the image file name.
pub const SIDECAR_SUFFIX: &str = ".attribution.json";

#[derive(Debug, Serialize, Deserialize)]
struct SidecarDocument {
    file: String,
    #[serde(default)]
    position: usize,
    attribution: AttributionRecord,
}

/// Stores attribution records as JSON files beside the images.
#[derive(Debug, Clone, Default)]
pub struct SidecarStore;

impl SidecarStore {
    pub fn new() -> Self {
        Self
    }

    /// Sidecar path for an image.
    pub fn sidecar_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(SIDECAR_SUFFIX);
        path.with_file_name(name)
    }

    async fn read_sidecar(path: &Path) -> Result<SidecarDocument, StoreError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl AttributionStore for SidecarStore {
    fn name(&self) -> &str {
        "sidecar"
    }

    async fn read_existing(&self, dir: &Path) -> Result<Vec<AttributedFile>, StoreError> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(dir, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(dir, e))?
        {
            let sidecar = entry.path();
            let is_sidecar = sidecar
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(SIDECAR_SUFFIX))
                .unwrap_or(false);
            if !is_sidecar {
                continue;
            }

            let doc = Self::read_sidecar(&sidecar).await?;
            let image = dir.join(&doc.file);
            if !tokio::fs::try_exists(&image).await.unwrap_or(false) {
                warn!(sidecar = %sidecar.display(), "Sidecar without image, ignoring");
                continue;
            }

            files.push((
                doc.position,
                AttributedFile {
                    path: image,
                    attribution: doc.attribution,
                },
            ));
        }

        files.sort_by(|(a_pos, a), (b_pos, b)| {
            a_pos.cmp(b_pos).then_with(|| a.path.cmp(&b.path))
        });
        let files: Vec<AttributedFile> = files.into_iter().map(|(_, file)| file).collect();
        debug!(dir = %dir.display(), count = files.len(), "Read existing attributions");
        Ok(files)
    }

    async fn attribute(
        &self,
        path: &Path,
        position: usize,
        record: &AttributionRecord,
    ) -> Result<(), StoreError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(StoreError::MissingFile {
                path: path.to_path_buf(),
            });
        }

        let file = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::MissingFile {
                path: path.to_path_buf(),
            })?
            .to_string();

        let doc = SidecarDocument {
            file,
            position,
            attribution: record.clone(),
        };
        let json = serde_json::to_vec_pretty(&doc).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let sidecar = Self::sidecar_path(path);
        let tmp = sidecar.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &sidecar)
            .await
            .map_err(|e| StoreError::io(&sidecar, e))?;

        debug!(path = %path.display(), position = position, "Attribution registered");
        Ok(())
    }

    async fn forget(&self, path: &Path) -> Result<(), StoreError> {
        let sidecar = Self::sidecar_path(path);
        match tokio::fs::remove_file(&sidecar).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&sidecar, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::AttributionSettings;
    use crate::testing::fixtures;
    use chrono::Utc;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    fn record(id: &str) -> AttributionRecord {
        AttributionRecord::for_photo(
            &fixtures::photo(id, "11@N01", 4),
            &AttributionSettings::default(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            SidecarStore::sidecar_path(Path::new("/out/red panda/photo-0001.jpeg")),
            PathBuf::from("/out/red panda/photo-0001.jpeg.attribution.json")
        );
    }

    #[tokio::test]
    async fn test_missing_dir_reads_empty() {
        let dir = TempDir::new().unwrap();
        let files = SidecarStore::new()
            .read_existing(&dir.path().join("nope"))
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_attribute_then_read() {
        let dir = TempDir::new().unwrap();
        let store = SidecarStore::new();

        for (position, name) in ["f3.jpeg", "a9.jpeg", "c1.jpeg"].into_iter().enumerate() {
            let path = dir.path().join(name);
            std::fs::write(&path, b"jpeg").unwrap();
            store.attribute(&path, position, &record(name)).await.unwrap();
        }
        std::fs::write(dir.path().join("unrelated.txt"), b"x").unwrap();

        let files = store.read_existing(dir.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["f3.jpeg", "a9.jpeg", "c1.jpeg"]);
        assert_eq!(files[0].attribution.license, "Attribution License");
    }

    #[tokio::test]
    async fn test_attribute_replaces_existing_record() {
        let dir = TempDir::new().unwrap();
        let store = SidecarStore::new();
        let path = dir.path().join("a.jpeg");
        std::fs::write(&path, b"jpeg").unwrap();

        assert_ok!(store.attribute(&path, 0, &record("1")).await);
        let mut updated = record("1");
        updated.original_title = "Renamed".to_string();
        store.attribute(&path, 0, &updated).await.unwrap();

        let files = store.read_existing(dir.path()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].attribution.original_title, "Renamed");
    }

    #[tokio::test]
    async fn test_attribute_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = assert_err!(
            SidecarStore::new()
                .attribute(&dir.path().join("gone.jpeg"), 0, &record("1"))
                .await
        );
        assert!(matches!(err, StoreError::MissingFile { .. }));
    }

    #[tokio::test]
    async fn test_sidecar_without_image_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = SidecarStore::new();
        let path = dir.path().join("a.jpeg");
        std::fs::write(&path, b"jpeg").unwrap();
        store.attribute(&path, 0, &record("1")).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(store.read_existing(dir.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forget_removes_sidecar_only() {
        let dir = TempDir::new().unwrap();
        let store = SidecarStore::new();
        let path = dir.path().join("a.jpeg");
        std::fs::write(&path, b"jpeg").unwrap();
        store.attribute(&path, 0, &record("1")).await.unwrap();

        assert_ok!(store.forget(&path).await);
        assert!(store.read_existing(dir.path()).await.unwrap().is_empty());
        assert!(path.exists());

        // Forgetting twice is fine
        assert_ok!(store.forget(&path).await);
    }

    #[tokio::test]
    async fn test_sidecar_without_position_sorts_first() {
        let dir = TempDir::new().unwrap();
        let store = SidecarStore::new();
        let later = dir.path().join("a.jpeg");
        std::fs::write(&later, b"jpeg").unwrap();
        store.attribute(&later, 1, &record("1")).await.unwrap();

        let legacy = dir.path().join("b.jpeg");
        std::fs::write(&legacy, b"jpeg").unwrap();
        let doc = serde_json::json!({ "file": "b.jpeg", "attribution": record("2") });
        std::fs::write(
            SidecarStore::sidecar_path(&legacy),
            serde_json::to_vec(&doc).unwrap(),
        )
        .unwrap();

        let files = store.read_existing(dir.path()).await.unwrap();
        assert_eq!(files[0].path, legacy);
        assert_eq!(files[1].path, later);
    }

    #[tokio::test]
    async fn test_corrupt_sidecar() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.jpeg.attribution.json"), b"{not json").unwrap();

        let err = SidecarStore::new()
            .read_existing(dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
