//! Types for harvest runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::attribution::AttributedFile;
use crate::error::HarvestError;
use crate::provider::ApiKey;

/// One harvest request.
#[derive(Debug, Clone)]
pub struct HarvestRequest {
    /// Free-text search query.
    pub query: String,
    /// Number of photos by distinct authors wanted.
    pub count: usize,
    /// Credential for this run. Falls back to the configured key.
    pub api_key: Option<ApiKey>,
    /// Where to write files. Defaults to `<output root>/<query>`.
    pub output_dir: Option<PathBuf>,
    /// Ignore previously attributed files in the output directory.
    pub force_reload: bool,
    /// Allow the all-rights-reserved tier.
    pub include_all_rights_reserved: bool,
}

impl HarvestRequest {
    pub fn new(query: impl Into<String>, count: usize) -> Self {
        Self {
            query: query.into(),
            count,
            api_key: None,
            output_dir: None,
            force_reload: false,
            include_all_rights_reserved: false,
        }
    }

    pub fn with_api_key(mut self, api_key: ApiKey) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_force_reload(mut self, force: bool) -> Self {
        self.force_reload = force;
        self
    }

    pub fn with_all_rights_reserved(mut self, include: bool) -> Self {
        self.include_all_rights_reserved = include;
        self
    }

    /// Check the request before any work is done.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.query.trim().is_empty() {
            return Err(HarvestError::InvalidRequest("query is empty".to_string()));
        }
        if self.count == 0 {
            return Err(HarvestError::InvalidRequest(
                "count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a harvest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestOutput {
    pub output_dir: PathBuf,
    /// Attributed files, in discovery order for fresh runs and path order
    /// for cached ones.
    pub files: Vec<AttributedFile>,
    /// Whether the files were returned from a previous run.
    pub from_cache: bool,
}

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    CacheCheck,
    Discovering,
    Acquiring,
    Embedding,
    Done,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::CacheCheck => "cache_check",
            RunPhase::Discovering => "discovering",
            RunPhase::Acquiring => "acquiring",
            RunPhase::Embedding => "embedding",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Observer notified on every phase transition.
pub type PhaseCallback = Arc<dyn Fn(RunPhase) + Send + Sync>;
