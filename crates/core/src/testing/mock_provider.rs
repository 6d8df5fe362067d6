//! Mock photo provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::license::License;
use crate::provider::{
    ApiKey, PageResult, PhotoDetail, PhotoProvider, PhotoStub, ProviderError, SearchRequest,
};

use super::fixtures;

/// A failure the mock can be told to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    Connection,
    Timeout,
    Decode,
    Api { code: u32, message: String },
}

impl MockFailure {
    fn to_error(&self) -> ProviderError {
        match self {
            MockFailure::Connection => ProviderError::ConnectionFailed("mock refused".to_string()),
            MockFailure::Timeout => ProviderError::Timeout,
            MockFailure::Decode => ProviderError::Decode("mock garbage".to_string()),
            MockFailure::Api { code, message } => ProviderError::Api {
                code: *code,
                message: message.clone(),
            },
        }
    }
}

/// Mock implementation of the PhotoProvider trait.
///
/// Provides controllable behavior for testing:
/// - Per-license photo lists, paginated the way the real API pages
/// - Details derived from the listed stubs unless overridden
/// - Failure injection per call type and per photo
/// - Call recording and in-flight tracking for concurrency assertions
///
/// # Example
///
/// ```rust,ignore
/// let provider = MockProvider::new();
/// provider
///     .set_photos(License::Attribution, vec![fixtures::stub("1", "alice")])
///     .await;
/// provider.fail_detail("1", MockFailure::Timeout).await;
/// ```
#[derive(Default)]
pub struct MockProvider {
    photos: Arc<RwLock<HashMap<License, Vec<PhotoStub>>>>,
    details: Arc<RwLock<HashMap<String, PhotoDetail>>>,
    images: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    default_image: Arc<RwLock<Option<Vec<u8>>>>,
    search_failure: Arc<RwLock<Option<MockFailure>>>,
    detail_failures: Arc<RwLock<HashMap<String, MockFailure>>>,
    image_failures: Arc<RwLock<HashMap<String, MockFailure>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    searches: Arc<RwLock<Vec<SearchRequest>>>,
    detail_calls: AtomicUsize,
    image_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("detail_calls", &self.detail_calls.load(Ordering::SeqCst))
            .field("image_calls", &self.image_calls.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl MockProvider {
    /// Create a mock provider with no photos.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the photos listed under a license tier, in result order.
    pub async fn set_photos(&self, license: License, photos: Vec<PhotoStub>) {
        self.photos.write().await.insert(license, photos);
    }

    /// Override the detail returned for a photo.
    pub async fn set_detail(&self, photo_id: &str, detail: PhotoDetail) {
        self.details
            .write()
            .await
            .insert(photo_id.to_string(), detail);
    }

    /// Set the image bytes served for one photo.
    pub async fn set_image(&self, photo_id: &str, bytes: Vec<u8>) {
        self.images.write().await.insert(photo_id.to_string(), bytes);
    }

    /// Set the image bytes served for photos without their own image.
    pub async fn set_default_image(&self, bytes: Vec<u8>) {
        *self.default_image.write().await = Some(bytes);
    }

    /// Make every search fail.
    pub async fn fail_searches(&self, failure: MockFailure) {
        *self.search_failure.write().await = Some(failure);
    }

    /// Make the detail call for one photo fail.
    pub async fn fail_detail(&self, photo_id: &str, failure: MockFailure) {
        self.detail_failures
            .write()
            .await
            .insert(photo_id.to_string(), failure);
    }

    /// Make the image download for one photo fail.
    pub async fn fail_image(&self, photo_id: &str, failure: MockFailure) {
        self.image_failures
            .write()
            .await
            .insert(photo_id.to_string(), failure);
    }

    /// Delay every detail and image call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get recorded search requests.
    pub async fn recorded_searches(&self) -> Vec<SearchRequest> {
        self.searches.read().await.clone()
    }

    /// Number of detail calls made.
    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    /// Number of image downloads attempted.
    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    /// Total remote calls of any kind.
    pub async fn total_calls(&self) -> usize {
        self.searches.read().await.len() + self.detail_calls() + self.image_calls()
    }

    /// Highest number of detail/image calls observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    async fn find_listed(&self, photo_id: &str) -> Option<(License, PhotoStub)> {
        let photos = self.photos.read().await;
        photos.iter().find_map(|(license, stubs)| {
            stubs
                .iter()
                .find(|s| s.id == photo_id)
                .map(|s| (*license, s.clone()))
        })
    }

    async fn resolve_detail(&self, photo_id: &str) -> Result<PhotoDetail, ProviderError> {
        if let Some(failure) = self.detail_failures.read().await.get(photo_id) {
            return Err(failure.to_error());
        }
        if let Some(detail) = self.details.read().await.get(photo_id) {
            return Ok(detail.clone());
        }
        match self.find_listed(photo_id).await {
            Some((license, stub)) => Ok(fixtures::detail_for(&stub, license.id())),
            None => Err(ProviderError::Api {
                code: 1,
                message: "Photo not found".to_string(),
            }),
        }
    }

    async fn resolve_image(&self, photo_id: &str) -> Result<Vec<u8>, ProviderError> {
        if let Some(failure) = self.image_failures.read().await.get(photo_id) {
            return Err(failure.to_error());
        }
        if let Some(bytes) = self.images.read().await.get(photo_id) {
            return Ok(bytes.clone());
        }
        Ok(self
            .default_image
            .read()
            .await
            .clone()
            .unwrap_or_else(|| fixtures::MINIMAL_JPEG.to_vec()))
    }
}

#[async_trait]
impl PhotoProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        request: &SearchRequest,
        _api_key: &ApiKey,
    ) -> Result<PageResult, ProviderError> {
        self.searches.write().await.push(request.clone());

        if let Some(failure) = self.search_failure.read().await.as_ref() {
            return Err(failure.to_error());
        }

        let photos = self.photos.read().await;
        let listed = photos
            .get(&request.license)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let per_page = request.per_page.max(1) as usize;
        let start = (request.page.max(1) as usize - 1) * per_page;
        let page_photos: Vec<PhotoStub> = listed.iter().skip(start).take(per_page).cloned().collect();

        Ok(PageResult {
            photos: page_photos,
            page: request.page,
            pages: listed.len().div_ceil(per_page) as u32,
            total: listed.len() as u64,
        })
    }

    async fn photo_detail(
        &self,
        photo_id: &str,
        _api_key: &ApiKey,
    ) -> Result<PhotoDetail, ProviderError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        let result = self.resolve_detail(photo_id).await;
        self.exit();
        result
    }

    async fn download_image(&self, photo: &PhotoStub, dest: &Path) -> Result<u64, ProviderError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        let result = match self.resolve_image(&photo.id).await {
            Ok(bytes) => tokio::fs::write(dest, &bytes)
                .await
                .map(|_| bytes.len() as u64)
                .map_err(|e| ProviderError::io(dest, e)),
            Err(e) => Err(e),
        };
        self.exit();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(license: License, per_page: u32, page: u32) -> SearchRequest {
        SearchRequest {
            query: "q".to_string(),
            license,
            per_page,
            page,
        }
    }

    #[tokio::test]
    async fn test_search_paginates() {
        let provider = MockProvider::new();
        provider
            .set_photos(
                License::Attribution,
                (1..=5).map(|i| fixtures::stub(&i.to_string(), "o")).collect(),
            )
            .await;
        let key = ApiKey::new("k");

        let page = provider
            .search(&request(License::Attribution, 2, 3), &key)
            .await
            .unwrap();
        assert_eq!(page.total_on_page(), 1);
        assert_eq!(page.photos[0].id, "5");
        assert_eq!(page.pages, 3);
        assert_eq!(page.total, 5);

        let empty = provider
            .search(&request(License::PublicDomainMark, 2, 1), &key)
            .await
            .unwrap();
        assert!(empty.photos.is_empty());
        assert_eq!(empty.pages, 0);
    }

    #[tokio::test]
    async fn test_detail_derived_from_listing() {
        let provider = MockProvider::new();
        provider
            .set_photos(License::AttributionShareAlike, vec![fixtures::stub("9", "bob")])
            .await;

        let detail = provider.photo_detail("9", &ApiKey::new("k")).await.unwrap();
        assert_eq!(detail.license, 5);
        assert_eq!(detail.owner.id, "bob");

        let missing = provider.photo_detail("404", &ApiKey::new("k")).await;
        assert!(matches!(missing, Err(ProviderError::Api { code: 1, .. })));
        assert_eq!(provider.detail_calls(), 2);
    }
}
