pub mod acquisition;
pub mod attribution;
pub mod config;
pub mod discovery;
pub mod error;
pub mod harvester;
pub mod license;
pub mod provider;
pub mod testing;

pub use acquisition::{
    AcquisitionCoordinator, AcquisitionError, IdGenerator, SequentialIdGenerator, UuidIdGenerator,
};
pub use attribution::{
    AttributedFile, AttributionEmbedder, AttributionRecord, AttributionStore, SidecarStore,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
    SanitizedConfig,
};
pub use discovery::{DiscoveryEngine, SearchCriteria};
pub use error::{ErrorKind, HarvestError};
pub use harvester::{HarvestOutput, HarvestRequest, Harvester, RunPhase};
pub use license::{License, LicenseError};
pub use provider::{ApiKey, FlickrClient, PhotoProvider, ProviderError};
