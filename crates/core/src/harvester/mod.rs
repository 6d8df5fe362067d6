//! Pipeline orchestration.
//!
//! A [`Harvester`] runs one request through the full pipeline:
//! cache check, discovery, acquisition, embedding, and registration with the
//! attribution store. A run against a directory that already holds attributed
//! files returns them without touching the provider unless a reload is forced.

mod runner;
mod types;

pub use runner::Harvester;
pub use types::{HarvestOutput, HarvestRequest, PhaseCallback, RunPhase};
