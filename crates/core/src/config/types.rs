use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::license::PREFERRED_ORDER;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub attribution: AttributionConfig,
}

/// Remote photo provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Default API key, used when a request does not carry its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// REST endpoint serving search and photo-info calls.
    #[serde(default = "default_rest_endpoint")]
    pub rest_endpoint: String,
    /// Base URL of the static image host.
    #[serde(default = "default_static_base_url")]
    pub static_base_url: String,
    /// Base URL that owner ids are appended to for profile links.
    #[serde(default = "default_profile_base_url")]
    pub profile_base_url: String,
    /// Size suffix appended to image file names ("b" = 1024px on the long edge).
    #[serde(default = "default_image_size_suffix")]
    pub image_size_suffix: String,
    /// Request timeout in seconds (0 = no timeout).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            rest_endpoint: default_rest_endpoint(),
            static_base_url: default_static_base_url(),
            profile_base_url: default_profile_base_url(),
            image_size_suffix: default_image_size_suffix(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_rest_endpoint() -> String {
    "https://www.flickr.com/services/rest/".to_string()
}

fn default_static_base_url() -> String {
    "https://live.staticflickr.com".to_string()
}

fn default_profile_base_url() -> String {
    "https://flickr.com/photos".to_string()
}

fn default_image_size_suffix() -> String {
    "b".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Unique-author discovery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    /// License tiers in the order they are searched.
    /// Tier 0 is only visited when a request opts in.
    #[serde(default = "default_license_order")]
    pub license_order: Vec<i32>,
    /// Page size used when 1 < N <= 5.
    #[serde(default = "default_small_batch")]
    pub small_batch_size: u32,
    /// Page size used when N > 5.
    #[serde(default = "default_large_batch")]
    pub large_batch_size: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            license_order: default_license_order(),
            small_batch_size: default_small_batch(),
            large_batch_size: default_large_batch(),
        }
    }
}

fn default_license_order() -> Vec<i32> {
    PREFERRED_ORDER.iter().map(|l| l.id()).collect()
}

fn default_small_batch() -> u32 {
    100
}

fn default_large_batch() -> u32 {
    500
}

/// Acquisition configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// Maximum fetches (image or detail) in flight at once.
    #[serde(default = "default_max_parallel_fetches")]
    pub max_parallel_fetches: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            max_parallel_fetches: default_max_parallel_fetches(),
        }
    }
}

fn default_max_parallel_fetches() -> usize {
    8
}

/// Output location configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Root under which `<query>` directories are created when a run
    /// does not name its own output directory.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
        }
    }
}

fn default_root_dir() -> PathBuf {
    std::env::temp_dir().join("photoharvest")
}

/// Attribution text configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttributionConfig {
    /// Lowercase provider name used in the embedded artist field.
    #[serde(default = "default_provider_name")]
    pub provider_name: String,
    /// Display label used in the attribution author string.
    #[serde(default = "default_provider_label")]
    pub provider_label: String,
    /// Recorded on every attribution record.
    #[serde(default = "default_scraping_methodology")]
    pub scraping_methodology: String,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            provider_name: default_provider_name(),
            provider_label: default_provider_label(),
            scraping_methodology: default_scraping_methodology(),
        }
    }
}

fn default_provider_name() -> String {
    "flickr".to_string()
}

fn default_provider_label() -> String {
    "Flickr".to_string()
}

fn default_scraping_methodology() -> String {
    format!("photoharvest/{}", env!("CARGO_PKG_VERSION"))
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub provider: SanitizedProviderConfig,
    pub discovery: DiscoveryConfig,
    pub acquisition: AcquisitionConfig,
    pub output: OutputConfig,
    pub attribution: AttributionConfig,
}

/// Sanitized provider config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    pub api_key_configured: bool,
    pub rest_endpoint: String,
    pub static_base_url: String,
    pub profile_base_url: String,
    pub image_size_suffix: String,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let p = &config.provider;
        Self {
            provider: SanitizedProviderConfig {
                api_key_configured: p.api_key.as_deref().is_some_and(|k| !k.is_empty()),
                rest_endpoint: p.rest_endpoint.clone(),
                static_base_url: p.static_base_url.clone(),
                profile_base_url: p.profile_base_url.clone(),
                image_size_suffix: p.image_size_suffix.clone(),
                timeout_secs: p.timeout_secs,
            },
            discovery: config.discovery.clone(),
            acquisition: config.acquisition.clone(),
            output: config.output.clone(),
            attribution: config.attribution.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.provider.api_key.is_none());
        assert_eq!(
            config.provider.rest_endpoint,
            "https://www.flickr.com/services/rest/"
        );
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(
            config.discovery.license_order,
            vec![4, 5, 2, 1, 7, 6, 3, 9, 10, 8, 0]
        );
        assert_eq!(config.discovery.small_batch_size, 100);
        assert_eq!(config.discovery.large_batch_size, 500);
        assert_eq!(config.acquisition.max_parallel_fetches, 8);
        assert_eq!(config.attribution.provider_name, "flickr");
    }

    #[test]
    fn test_deserialize_with_provider_section() {
        let toml = r#"
[provider]
api_key = "abc"
rest_endpoint = "http://localhost:9000/rest"
timeout_secs = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("abc"));
        assert_eq!(config.provider.rest_endpoint, "http://localhost:9000/rest");
        assert_eq!(config.provider.timeout_secs, 0);
        assert_eq!(config.provider.image_size_suffix, "b"); // default
    }

    #[test]
    fn test_deserialize_custom_discovery() {
        let toml = r#"
[discovery]
license_order = [9, 10]
small_batch_size = 10
large_batch_size = 25
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.discovery.license_order, vec![9, 10]);
        assert_eq!(config.discovery.small_batch_size, 10);
        assert_eq!(config.discovery.large_batch_size, 25);
    }

    #[test]
    fn test_deserialize_custom_output_root() {
        let toml = r#"
[output]
root_dir = "/data/photos"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.output.root_dir.to_str().unwrap(), "/data/photos");
    }

    #[test]
    fn test_sanitized_config_hides_key() {
        let mut config = Config::default();
        config.provider.api_key = Some("secret-key".to_string());

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.provider.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-key"));
    }

    #[test]
    fn test_sanitized_config_without_key() {
        let sanitized = SanitizedConfig::from(&Config::default());
        assert!(!sanitized.provider.api_key_configured);
    }
}
