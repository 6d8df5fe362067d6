//! Attribution record derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::license::{License, LicenseError};
use crate::provider::Photo;

/// Provenance document attached to a downloaded photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionRecord {
    /// Canonical page the photo was collected from.
    pub origin_url: String,
    /// When this record was produced.
    pub collected_at: DateTime<Utc>,
    pub original_title: String,
    /// "{real name} ({provider} User {username})".
    pub author: String,
    pub author_url: String,
    /// License name from the catalog.
    pub license: String,
    pub license_url: String,
    /// Upload time of the photo.
    pub created_at: DateTime<Utc>,
    /// Free-text context; the photo description.
    #[serde(default)]
    pub context: Vec<String>,
    #[serde(default)]
    pub scraping_methodology: String,
}

/// Provider-specific strings used when rendering attribution text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionSettings {
    /// Lowercase name used in the artist field ("on flickr @user").
    pub provider_name: String,
    /// Display label used in the author string ("Flickr User user").
    pub provider_label: String,
    /// Base URL owner ids are appended to.
    pub profile_base_url: String,
    pub scraping_methodology: String,
}

impl AttributionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider_name: config.attribution.provider_name.clone(),
            provider_label: config.attribution.provider_label.clone(),
            profile_base_url: config.provider.profile_base_url.clone(),
            scraping_methodology: config.attribution.scraping_methodology.clone(),
        }
    }

    pub fn author_url(&self, owner_id: &str) -> String {
        format!(
            "{}/{}",
            self.profile_base_url.trim_end_matches('/'),
            owner_id
        )
    }
}

impl Default for AttributionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl AttributionRecord {
    /// Derive the record for a photo whose detail has been fetched.
    pub fn for_photo(
        photo: &Photo,
        settings: &AttributionSettings,
        collected_at: DateTime<Utc>,
    ) -> Result<Self, LicenseError> {
        let detail = &photo.detail;
        let license = License::try_from(detail.license)?;

        Ok(Self {
            origin_url: detail.page_url.clone(),
            collected_at,
            original_title: detail.title.clone(),
            author: format!(
                "{} ({} User {})",
                detail.owner.real_name, settings.provider_label, detail.owner.username
            ),
            author_url: settings.author_url(&detail.owner.id),
            license: license.name().to_string(),
            license_url: license.url().to_string(),
            created_at: detail.uploaded_at,
            context: vec![detail.description.clone()],
            scraping_methodology: settings.scraping_methodology.clone(),
        })
    }
}
