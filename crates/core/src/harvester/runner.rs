//! Harvest runner.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::acquisition::{AcquisitionCoordinator, IdGenerator, UuidIdGenerator};
use crate::attribution::{
    AttributedFile, AttributionEmbedder, AttributionSettings, AttributionStore,
};
use crate::config::{validate_config, Config};
use crate::discovery::{DiscoveryEngine, SearchCriteria};
use crate::error::HarvestError;
use crate::provider::{ApiKey, PhotoProvider};

use super::types::{HarvestOutput, HarvestRequest, PhaseCallback, RunPhase};

/// Runs harvest requests against a provider and an attribution store.
pub struct Harvester {
    provider: Arc<dyn PhotoProvider>,
    store: Arc<dyn AttributionStore>,
    discovery: DiscoveryEngine,
    embedder: AttributionEmbedder,
    ids: Arc<dyn IdGenerator>,
    max_parallel_fetches: usize,
    output_root: PathBuf,
    default_api_key: Option<ApiKey>,
    on_phase: Option<PhaseCallback>,
}

impl Harvester {
    /// Build a harvester from validated configuration.
    pub fn new(
        config: &Config,
        provider: Arc<dyn PhotoProvider>,
        store: Arc<dyn AttributionStore>,
    ) -> Result<Self, HarvestError> {
        validate_config(config)?;

        let discovery = DiscoveryEngine::new(Arc::clone(&provider), &config.discovery)?;

        Ok(Self {
            provider,
            store,
            discovery,
            embedder: AttributionEmbedder::new(AttributionSettings::from_config(config)),
            ids: Arc::new(UuidIdGenerator),
            max_parallel_fetches: config.acquisition.max_parallel_fetches,
            output_root: config.output.root_dir.clone(),
            default_api_key: config
                .provider
                .api_key
                .as_ref()
                .map(ApiKey::new)
                .filter(|k| !k.is_empty()),
            on_phase: None,
        })
    }

    /// Replace the file id generator.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Observe phase transitions.
    pub fn with_phase_callback(mut self, callback: PhaseCallback) -> Self {
        self.on_phase = Some(callback);
        self
    }

    /// Directory a request writes to.
    pub fn output_dir_for(&self, request: &HarvestRequest) -> PathBuf {
        match &request.output_dir {
            Some(dir) => dir.clone(),
            None => self.output_root.join(directory_name(&request.query)),
        }
    }

    /// Run one request to completion.
    pub async fn run(&self, request: &HarvestRequest) -> Result<HarvestOutput, HarvestError> {
        self.enter(RunPhase::Idle);

        let result = match self.prepare(request) {
            Ok(api_key) => self.run_phases(request, &api_key).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(output) => {
                self.enter(RunPhase::Done);
                info!(
                    query = %request.query,
                    files = output.files.len(),
                    from_cache = output.from_cache,
                    "Harvest complete"
                );
            }
            Err(_) => self.enter(RunPhase::Failed),
        }

        result
    }

    fn prepare(&self, request: &HarvestRequest) -> Result<ApiKey, HarvestError> {
        request.validate()?;

        request
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| self.default_api_key.clone())
            .ok_or_else(|| HarvestError::InvalidRequest("no API key provided".to_string()))
    }

    async fn run_phases(
        &self,
        request: &HarvestRequest,
        api_key: &ApiKey,
    ) -> Result<HarvestOutput, HarvestError> {
        let output_dir = self.output_dir_for(request);
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| HarvestError::OutputDir {
                path: output_dir.clone(),
                source: e,
            })?;

        self.enter(RunPhase::CacheCheck);
        if !request.force_reload {
            let existing = self.store.read_existing(&output_dir).await?;
            if !existing.is_empty() {
                info!(
                    dir = %output_dir.display(),
                    files = existing.len(),
                    "Using previously attributed files"
                );
                return Ok(HarvestOutput {
                    output_dir,
                    files: existing,
                    from_cache: true,
                });
            }
        }

        self.enter(RunPhase::Discovering);
        let criteria = SearchCriteria {
            query: request.query.clone(),
            target: request.count,
            include_all_rights_reserved: request.include_all_rights_reserved,
            api_key: api_key.clone(),
        };
        let stubs = self
            .discovery
            .discover(&criteria)
            .await
            .map_err(HarvestError::Discovery)?;

        self.enter(RunPhase::Acquiring);
        let coordinator = AcquisitionCoordinator::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.ids),
            self.max_parallel_fetches,
        );
        let acquired = coordinator.acquire(stubs, &output_dir, api_key).await?;

        self.enter(RunPhase::Embedding);
        let collected_at = Utc::now();
        let mut files = Vec::with_capacity(acquired.len());
        for item in acquired {
            let embedded = self
                .embedder
                .embed(&item.path, &item.photo, collected_at)
                .await
                .map_err(|source| HarvestError::MetadataEmbed {
                    path: item.path.clone(),
                    source,
                })?;
            files.push(AttributedFile {
                path: item.path,
                attribution: embedded.record,
            });
        }

        // Register only once every file is embedded.
        self.register(&files).await?;

        Ok(HarvestOutput {
            output_dir,
            files,
            from_cache: false,
        })
    }

    /// Register a batch with the store. A failure part way through forgets
    /// the records already written so the cache never sees a short batch.
    async fn register(&self, files: &[AttributedFile]) -> Result<(), HarvestError> {
        for (position, file) in files.iter().enumerate() {
            if let Err(e) = self
                .store
                .attribute(&file.path, position, &file.attribution)
                .await
            {
                for written in &files[..position] {
                    // The registration error is the one reported.
                    let _ = self.store.forget(&written.path).await;
                }
                debug!(
                    store = self.store.name(),
                    rolled_back = position,
                    "Registration aborted"
                );
                return Err(e.into());
            }
        }

        debug!(store = self.store.name(), count = files.len(), "Registered attributions");
        Ok(())
    }

    fn enter(&self, phase: RunPhase) {
        info!(phase = %phase, "Run phase");
        if let Some(callback) = &self.on_phase {
            callback(phase);
        }
    }
}

/// Directory name for a query: path separators and dot-only names cannot
/// escape the output root.
fn directory_name(query: &str) -> String {
    let name: String = query
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    if name.chars().all(|c| c == '.') {
        name.replace('.', "_")
    } else {
        name
    }
}
