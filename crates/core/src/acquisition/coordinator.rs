//! Acquisition coordinator implementation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::provider::{ApiKey, Photo, PhotoDetail, PhotoProvider, PhotoStub, ProviderError};

use super::ids::IdGenerator;
use super::AcquisitionError;

/// A photo whose image is on disk and whose detail has been fetched.
#[derive(Debug, Clone)]
pub struct AcquiredPhoto {
    pub photo: Photo,
    pub path: PathBuf,
    /// Bytes written by the download.
    pub bytes: u64,
}

enum FetchOutput {
    Image { index: usize, bytes: u64 },
    Detail { index: usize, detail: PhotoDetail },
    Skipped,
}

type FetchResult = Result<FetchOutput, (String, ProviderError)>;

/// Runs the image and detail fetches for a batch of photos.
pub struct AcquisitionCoordinator {
    provider: Arc<dyn PhotoProvider>,
    ids: Arc<dyn IdGenerator>,
    max_parallel: usize,
}

impl AcquisitionCoordinator {
    pub fn new(
        provider: Arc<dyn PhotoProvider>,
        ids: Arc<dyn IdGenerator>,
        max_parallel: usize,
    ) -> Self {
        Self {
            provider,
            ids,
            max_parallel: max_parallel.max(1),
        }
    }

    /// Download every image into `dir` and fetch every detail.
    ///
    /// Results are in the order of `stubs`. On failure, the first error
    /// observed is returned once all in-flight calls have finished.
    pub async fn acquire(
        &self,
        stubs: Vec<PhotoStub>,
        dir: &Path,
        api_key: &ApiKey,
    ) -> Result<Vec<AcquiredPhoto>, AcquisitionError> {
        let targets: Vec<(PhotoStub, PathBuf)> = stubs
            .into_iter()
            .map(|stub| {
                let path = dir.join(format!("{}.jpeg", self.ids.next_id()));
                (stub, path)
            })
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut tasks: JoinSet<FetchResult> = JoinSet::new();

        for (index, (stub, path)) in targets.iter().enumerate() {
            {
                let provider = Arc::clone(&self.provider);
                let semaphore = Arc::clone(&semaphore);
                let cancelled = Arc::clone(&cancelled);
                let stub = stub.clone();
                let path = path.clone();
                tasks.spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return Ok(FetchOutput::Skipped);
                    };
                    if cancelled.load(Ordering::SeqCst) {
                        return Ok(FetchOutput::Skipped);
                    }
                    match provider.download_image(&stub, &path).await {
                        Ok(bytes) => Ok(FetchOutput::Image { index, bytes }),
                        Err(e) => {
                            cancelled.store(true, Ordering::SeqCst);
                            Err((stub.id, e))
                        }
                    }
                });
            }

            {
                let provider = Arc::clone(&self.provider);
                let semaphore = Arc::clone(&semaphore);
                let cancelled = Arc::clone(&cancelled);
                let photo_id = stub.id.clone();
                let api_key = api_key.clone();
                tasks.spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return Ok(FetchOutput::Skipped);
                    };
                    if cancelled.load(Ordering::SeqCst) {
                        return Ok(FetchOutput::Skipped);
                    }
                    match provider.photo_detail(&photo_id, &api_key).await {
                        Ok(detail) => Ok(FetchOutput::Detail { index, detail }),
                        Err(e) => {
                            cancelled.store(true, Ordering::SeqCst);
                            Err((photo_id, e))
                        }
                    }
                });
            }
        }

        let mut sizes: Vec<Option<u64>> = vec![None; targets.len()];
        let mut details: Vec<Option<PhotoDetail>> = vec![None; targets.len()];
        let mut failure: Option<Failure> = None;
        let mut skipped = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(FetchOutput::Image { index, bytes })) => sizes[index] = Some(bytes),
                Ok(Ok(FetchOutput::Detail { index, detail })) => details[index] = Some(detail),
                Ok(Ok(FetchOutput::Skipped)) => skipped += 1,
                Ok(Err((photo_id, source))) => {
                    failure.get_or_insert(Failure::Fetch { photo_id, source });
                }
                Err(e) => {
                    cancelled.store(true, Ordering::SeqCst);
                    failure.get_or_insert(Failure::Aborted(e.to_string()));
                }
            }
        }

        if let Some(failure) = failure {
            let orphaned = existing_files(&targets).await;
            debug!(
                skipped = skipped,
                orphaned = orphaned.len(),
                "Acquisition batch failed"
            );
            return Err(failure.into_error(orphaned));
        }

        let mut acquired = Vec::with_capacity(targets.len());
        for (((stub, path), bytes), detail) in targets.into_iter().zip(sizes).zip(details) {
            match (bytes, detail) {
                (Some(bytes), Some(detail)) => acquired.push(AcquiredPhoto {
                    photo: Photo::new(stub, detail),
                    path,
                    bytes,
                }),
                _ => return Err(AcquisitionError::Incomplete { photo_id: stub.id }),
            }
        }

        debug!(count = acquired.len(), "Acquisition batch complete");
        Ok(acquired)
    }
}

enum Failure {
    Fetch {
        photo_id: String,
        source: ProviderError,
    },
    Aborted(String),
}

impl Failure {
    fn into_error(self, orphaned: Vec<PathBuf>) -> AcquisitionError {
        match self {
            Failure::Fetch { photo_id, source } => AcquisitionError::Fetch {
                photo_id,
                source,
                orphaned,
            },
            Failure::Aborted(reason) => AcquisitionError::TaskAborted { reason, orphaned },
        }
    }
}

async fn existing_files(targets: &[(PhotoStub, PathBuf)]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for (_, path) in targets {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            found.push(path.clone());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::SequentialIdGenerator;
    use crate::license::License;
    use crate::testing::{fixtures, MockFailure, MockProvider};
    use std::time::Duration;
    use tempfile::TempDir;

    async fn provider_with(ids: &[(&str, &str)]) -> Arc<MockProvider> {
        let provider = Arc::new(MockProvider::new());
        provider
            .set_photos(
                License::Attribution,
                ids.iter().map(|(id, owner)| fixtures::stub(id, owner)).collect(),
            )
            .await;
        provider
    }

    fn coordinator(provider: &Arc<MockProvider>, max_parallel: usize) -> AcquisitionCoordinator {
        AcquisitionCoordinator::new(
            provider.clone() as Arc<dyn PhotoProvider>,
            Arc::new(SequentialIdGenerator::new()),
            max_parallel,
        )
    }

    fn stubs(ids: &[(&str, &str)]) -> Vec<PhotoStub> {
        ids.iter().map(|(id, owner)| fixtures::stub(id, owner)).collect()
    }

    const PHOTOS: [(&str, &str); 3] = [("p1", "alice"), ("p2", "bob"), ("p3", "carol")];

    #[tokio::test]
    async fn test_acquire_all() {
        let dir = TempDir::new().unwrap();
        let provider = provider_with(&PHOTOS).await;

        let acquired = coordinator(&provider, 8)
            .acquire(stubs(&PHOTOS), dir.path(), &ApiKey::new("k"))
            .await
            .unwrap();

        assert_eq!(acquired.len(), 3);
        let ids: Vec<&str> = acquired.iter().map(|a| a.photo.id()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
        assert_eq!(acquired[0].path, dir.path().join("photo-0001.jpeg"));
        assert_eq!(acquired[2].path, dir.path().join("photo-0003.jpeg"));
        for item in &acquired {
            assert!(item.path.exists());
            assert_eq!(item.bytes, fixtures::MINIMAL_JPEG.len() as u64);
            assert_eq!(item.photo.detail.owner.id, item.photo.stub.owner);
        }
        assert_eq!(provider.image_calls(), 3);
        assert_eq!(provider.detail_calls(), 3);
    }

    #[tokio::test]
    async fn test_each_photo_gets_its_own_image() {
        let dir = TempDir::new().unwrap();
        let provider = provider_with(&PHOTOS[..2]).await;
        provider.set_image("p2", b"second image body".to_vec()).await;

        let acquired = coordinator(&provider, 2)
            .acquire(stubs(&PHOTOS[..2]), dir.path(), &ApiKey::new("k"))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&acquired[0].path).unwrap(), fixtures::MINIMAL_JPEG);
        assert_eq!(
            std::fs::read(&acquired[1].path).unwrap(),
            b"second image body"
        );
        assert_eq!(acquired[1].bytes, 17);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::new());
        let acquired = coordinator(&provider, 4)
            .acquire(Vec::new(), dir.path(), &ApiKey::new("k"))
            .await
            .unwrap();
        assert!(acquired.is_empty());
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let dir = TempDir::new().unwrap();
        let many: Vec<(String, String)> = (1..=6)
            .map(|i| (format!("p{}", i), format!("owner-{}", i)))
            .collect();
        let pairs: Vec<(&str, &str)> = many.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        let provider = provider_with(&pairs).await;
        provider.set_delay(Duration::from_millis(10)).await;

        coordinator(&provider, 2)
            .acquire(stubs(&pairs), dir.path(), &ApiKey::new("k"))
            .await
            .unwrap();

        assert!(provider.max_in_flight() <= 2);
        assert_eq!(provider.image_calls() + provider.detail_calls(), 12);
    }

    #[tokio::test]
    async fn test_detail_failure_fails_batch_and_reports_orphans() {
        let dir = TempDir::new().unwrap();
        let provider = provider_with(&PHOTOS).await;
        provider.fail_detail("p2", MockFailure::Timeout).await;

        let err = coordinator(&provider, 8)
            .acquire(stubs(&PHOTOS), dir.path(), &ApiKey::new("k"))
            .await
            .unwrap_err();

        match &err {
            AcquisitionError::Fetch {
                photo_id, source, ..
            } => {
                assert_eq!(photo_id, "p2");
                assert!(matches!(source, ProviderError::Timeout));
            }
            other => panic!("expected Fetch error, got {:?}", other),
        }
        for path in err.orphaned() {
            assert!(path.exists());
        }
    }

    #[tokio::test]
    async fn test_failure_skips_calls_not_yet_started() {
        let dir = TempDir::new().unwrap();
        let provider = provider_with(&PHOTOS).await;
        provider.fail_detail("p1", MockFailure::Connection).await;
        provider.fail_image("p1", MockFailure::Connection).await;

        let err = coordinator(&provider, 1)
            .acquire(stubs(&PHOTOS), dir.path(), &ApiKey::new("k"))
            .await
            .unwrap_err();

        assert!(matches!(err, AcquisitionError::Fetch { ref photo_id, .. } if photo_id == "p1"));
        // With one permit only the first unit runs; everything queued
        // behind it sees the cancellation.
        assert_eq!(provider.image_calls() + provider.detail_calls(), 1);
        assert!(err.orphaned().is_empty());
    }

    #[tokio::test]
    async fn test_image_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let provider = provider_with(&PHOTOS).await;
        provider
            .fail_image(
                "p3",
                MockFailure::Api {
                    code: 500,
                    message: "boom".to_string(),
                },
            )
            .await;

        let err = coordinator(&provider, 8)
            .acquire(stubs(&PHOTOS), dir.path(), &ApiKey::new("k"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.provider_error(),
            Some(ProviderError::Api { code: 500, .. })
        ));
    }
}
