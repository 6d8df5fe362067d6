//! Unique-author discovery.
//!
//! Walks the license tiers in preference order, paging through search
//! results until N photos by N distinct owners have been collected or every
//! eligible tier is exhausted.

mod engine;

pub use engine::{DiscoveryEngine, SearchCriteria};
