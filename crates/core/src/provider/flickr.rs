//! Flickr REST API client.
//!
//! Search and photo-info calls go to the REST endpoint with `format=rest`
//! and return XML; images come from the static host.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::config::ProviderConfig;

use super::types::{ApiKey, PageResult, PhotoDetail, PhotoStub, SearchRequest};
use super::wire::{decode_detail, decode_search};
use super::{PhotoProvider, ProviderError};

const SEARCH_METHOD: &str = "flickr.photos.search";
const INFO_METHOD: &str = "flickr.photos.getInfo";

/// Flickr API client.
pub struct FlickrClient {
    client: Client,
    config: ProviderConfig,
}

impl FlickrClient {
    /// Create a new Flickr client.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Static URL of the large rendition of a photo:
    /// `{static_base}/{server}/{id}_{secret}_{suffix}.jpg`.
    pub fn image_url(&self, photo: &PhotoStub) -> String {
        format!(
            "{}/{}/{}_{}_{}.jpg",
            self.config.static_base_url.trim_end_matches('/'),
            urlencoding::encode(&photo.server),
            urlencoding::encode(&photo.id),
            urlencoding::encode(&photo.secret),
            self.config.image_size_suffix
        )
    }

    async fn get_rest(&self, params: &[(&str, String)]) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(&self.config.rest_endpoint)
            .query(params)
            .send()
            .await?;

        let response = check_status(response)?;
        Ok(response.text().await?)
    }
}

fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            url: response.url().to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

#[async_trait]
impl PhotoProvider for FlickrClient {
    fn name(&self) -> &str {
        "flickr"
    }

    async fn search(
        &self,
        request: &SearchRequest,
        api_key: &ApiKey,
    ) -> Result<PageResult, ProviderError> {
        debug!(
            query = %request.query,
            license = request.license.id(),
            page = request.page,
            per_page = request.per_page,
            "Flickr search"
        );

        let body = self
            .get_rest(&[
                ("method", SEARCH_METHOD.to_string()),
                ("api_key", api_key.as_str().to_string()),
                ("license", request.license.id().to_string()),
                ("per_page", request.per_page.to_string()),
                ("page", request.page.to_string()),
                ("text", request.query.clone()),
                ("media", "photos".to_string()),
                ("sort", "relevance".to_string()),
                ("format", "rest".to_string()),
                ("extras", "owner_name".to_string()),
            ])
            .await?;

        decode_search(&body)
    }

    async fn photo_detail(
        &self,
        photo_id: &str,
        api_key: &ApiKey,
    ) -> Result<PhotoDetail, ProviderError> {
        debug!(photo_id = photo_id, "Flickr get info");

        let body = self
            .get_rest(&[
                ("method", INFO_METHOD.to_string()),
                ("api_key", api_key.as_str().to_string()),
                ("photo_id", photo_id.to_string()),
                ("format", "rest".to_string()),
            ])
            .await?;

        decode_detail(&body)
    }

    async fn download_image(&self, photo: &PhotoStub, dest: &Path) -> Result<u64, ProviderError> {
        let url = self.image_url(photo);
        debug!(photo_id = %photo.id, url = %url, "Downloading image");

        let response = self.client.get(&url).send().await?;
        let mut response = check_status(response)?;

        let file = File::create(dest)
            .await
            .map_err(|e| ProviderError::io(dest, e))?;
        let mut writer = BufWriter::new(file);

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| ProviderError::io(dest, e))?;
            written += chunk.len() as u64;
        }
        writer
            .flush()
            .await
            .map_err(|e| ProviderError::io(dest, e))?;

        debug!(photo_id = %photo.id, bytes = written, "Image downloaded");
        Ok(written)
    }
}
