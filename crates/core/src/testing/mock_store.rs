//! Mock attribution store for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::attribution::{AttributedFile, AttributionRecord, AttributionStore, StoreError};

/// In-memory attribution store.
///
/// Entries are keyed by file path; `read_existing` returns the entries whose
/// file sits directly in the requested directory, in position order.
#[derive(Debug, Default, Clone)]
pub struct MockAttributionStore {
    records: Arc<RwLock<BTreeMap<PathBuf, (usize, AttributionRecord)>>>,
    /// `attribute` calls from this 0-based index on fail.
    fail_attribute_from: Arc<RwLock<Option<usize>>>,
    attribute_calls: Arc<RwLock<usize>>,
    forget_calls: Arc<RwLock<usize>>,
}

impl MockAttributionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an entry.
    pub async fn insert(&self, path: PathBuf, position: usize, record: AttributionRecord) {
        self.records.write().await.insert(path, (position, record));
    }

    /// Make every `attribute` call fail.
    pub async fn set_fail_attribute(&self, fail: bool) {
        *self.fail_attribute_from.write().await = fail.then_some(0);
    }

    /// Let the first `succeeded` `attribute` calls through, then fail.
    pub async fn fail_attribute_after(&self, succeeded: usize) {
        *self.fail_attribute_from.write().await = Some(succeeded);
    }

    /// All stored entries, in position order.
    pub async fn records(&self) -> Vec<AttributedFile> {
        let mut entries: Vec<(usize, AttributedFile)> = self
            .records
            .read()
            .await
            .iter()
            .map(|(path, (position, record))| {
                (
                    *position,
                    AttributedFile {
                        path: path.clone(),
                        attribution: record.clone(),
                    },
                )
            })
            .collect();
        entries.sort_by(|(a_pos, a), (b_pos, b)| {
            a_pos.cmp(b_pos).then_with(|| a.path.cmp(&b.path))
        });
        entries.into_iter().map(|(_, file)| file).collect()
    }

    pub async fn attribute_calls(&self) -> usize {
        *self.attribute_calls.read().await
    }

    pub async fn forget_calls(&self) -> usize {
        *self.forget_calls.read().await
    }
}

#[async_trait]
impl AttributionStore for MockAttributionStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn read_existing(&self, dir: &Path) -> Result<Vec<AttributedFile>, StoreError> {
        Ok(self
            .records()
            .await
            .into_iter()
            .filter(|f| f.path.parent() == Some(dir))
            .collect())
    }

    async fn attribute(
        &self,
        path: &Path,
        position: usize,
        record: &AttributionRecord,
    ) -> Result<(), StoreError> {
        let call = {
            let mut calls = self.attribute_calls.write().await;
            *calls += 1;
            *calls - 1
        };

        if let Some(from) = *self.fail_attribute_from.read().await {
            if call >= from {
                return Err(StoreError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "mock store failure"),
                ));
            }
        }

        self.records
            .write()
            .await
            .insert(path.to_path_buf(), (position, record.clone()));
        Ok(())
    }

    async fn forget(&self, path: &Path) -> Result<(), StoreError> {
        *self.forget_calls.write().await += 1;
        self.records.write().await.remove(path);
        Ok(())
    }
}
