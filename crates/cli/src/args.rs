//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use photoharvest_core::{ApiKey, HarvestRequest};

/// Find photos by distinct authors, download them, and embed attribution.
#[derive(Debug, Parser)]
#[command(name = "photoharvest", version, about)]
pub struct Args {
    /// Search query.
    #[arg(short, long)]
    pub query: String,

    /// Number of photos (one per author). Values below 1 are treated as 1.
    #[arg(short = 'n', long = "number-of-images", default_value_t = 1, allow_negative_numbers = true)]
    pub number_of_images: i64,

    /// Output directory. Defaults to `<output root>/<query>`.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Provider API key.
    #[arg(short, long, env = "PHOTOHARVEST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Ignore files already attributed in the output directory.
    #[arg(long)]
    pub force_reload: bool,

    /// Also search photos whose owners reserve all rights.
    #[arg(long)]
    pub include_all_rights_reserved: bool,

    /// TOML configuration file.
    #[arg(short, long, env = "PHOTOHARVEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging for the pipeline.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    /// Requested count, clamped to at least one.
    pub fn count(&self) -> usize {
        self.number_of_images.max(1) as usize
    }

    pub fn to_request(&self) -> HarvestRequest {
        let mut request = HarvestRequest::new(self.query.clone(), self.count())
            .with_force_reload(self.force_reload)
            .with_all_rights_reserved(self.include_all_rights_reserved);
        if let Some(key) = &self.api_key {
            request = request.with_api_key(ApiKey::new(key.clone()));
        }
        if let Some(dir) = &self.output_dir {
            request = request.with_output_dir(dir.clone());
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_args() {
        let args = Args::try_parse_from(["photoharvest", "-q", "red panda"]).unwrap();
        assert_eq!(args.query, "red panda");
        assert_eq!(args.count(), 1);
        assert!(!args.force_reload);
    }

    #[test]
    fn test_non_positive_count_is_clamped() {
        let args = Args::try_parse_from(["photoharvest", "-q", "x", "-n", "0"]).unwrap();
        assert_eq!(args.count(), 1);
        let args = Args::try_parse_from(["photoharvest", "-q", "x", "-n", "-4"]).unwrap();
        assert_eq!(args.count(), 1);
    }

    #[test]
    fn test_to_request() {
        let args = Args::try_parse_from([
            "photoharvest",
            "-q",
            "otters",
            "-n",
            "7",
            "-o",
            "/tmp/otters",
            "-a",
            "key",
            "--force-reload",
            "--include-all-rights-reserved",
        ])
        .unwrap();

        let request = args.to_request();
        assert_eq!(request.count, 7);
        assert_eq!(request.output_dir, Some(PathBuf::from("/tmp/otters")));
        assert_eq!(request.api_key, Some(ApiKey::new("key")));
        assert!(request.force_reload);
        assert!(request.include_all_rights_reserved);
    }

    #[test]
    fn test_query_is_required() {
        assert!(Args::try_parse_from(["photoharvest"]).is_err());
    }
}
