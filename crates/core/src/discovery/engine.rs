//! Discovery engine implementation.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::DiscoveryConfig;
use crate::license::{License, LicenseError};
use crate::provider::{ApiKey, PhotoProvider, PhotoStub, ProviderError, SearchRequest};

/// What to discover.
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub query: String,
    /// Number of distinct authors wanted.
    pub target: usize,
    /// Whether the all-rights-reserved tier may be searched.
    pub include_all_rights_reserved: bool,
    pub api_key: ApiKey,
}

/// Collects photos with pairwise-distinct owners.
pub struct DiscoveryEngine {
    provider: Arc<dyn PhotoProvider>,
    license_order: Vec<License>,
    small_batch_size: u32,
    large_batch_size: u32,
}

impl DiscoveryEngine {
    /// Create an engine; fails if the configured tier order names an
    /// unknown license.
    pub fn new(
        provider: Arc<dyn PhotoProvider>,
        config: &DiscoveryConfig,
    ) -> Result<Self, LicenseError> {
        let license_order = config
            .license_order
            .iter()
            .map(|id| License::try_from(*id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            provider,
            license_order,
            small_batch_size: config.small_batch_size,
            large_batch_size: config.large_batch_size,
        })
    }

    /// Page size for a target count: one result when a single author is
    /// wanted, otherwise a batch sized to the target.
    pub fn page_size_for(&self, target: usize) -> u32 {
        match target {
            0 | 1 => 1,
            2..=5 => self.small_batch_size,
            _ => self.large_batch_size,
        }
    }

    /// Tiers searched for a request, in order.
    pub fn eligible_tiers(&self, include_all_rights_reserved: bool) -> Vec<License> {
        self.license_order
            .iter()
            .copied()
            .filter(|l| include_all_rights_reserved || !l.is_restrictive())
            .collect()
    }

    /// Discover up to `criteria.target` photos by distinct owners.
    ///
    /// Photos are returned in discovery order. Fewer than the target are
    /// returned when every eligible tier runs dry. A tier is exhausted once
    /// a page comes back shorter than the requested page size; a provider
    /// that returns a short page before its last page ends the tier early.
    pub async fn discover(&self, criteria: &SearchCriteria) -> Result<Vec<PhotoStub>, ProviderError> {
        let mut found: Vec<PhotoStub> = Vec::with_capacity(criteria.target);
        if criteria.target == 0 {
            return Ok(found);
        }

        let per_page = self.page_size_for(criteria.target);
        let mut owners: HashSet<String> = HashSet::new();

        for license in self.eligible_tiers(criteria.include_all_rights_reserved) {
            let mut page = 1u32;

            loop {
                let request = SearchRequest {
                    query: criteria.query.clone(),
                    license,
                    per_page,
                    page,
                };
                let result = self.provider.search(&request, &criteria.api_key).await?;
                let returned = result.total_on_page();

                let mut added = 0usize;
                for photo in result.photos {
                    if owners.insert(photo.owner.clone()) {
                        found.push(photo);
                        added += 1;
                        if found.len() >= criteria.target {
                            info!(
                                query = %criteria.query,
                                found = found.len(),
                                "Discovery reached target"
                            );
                            return Ok(found);
                        }
                    }
                }

                debug!(
                    provider = self.provider.name(),
                    license = license.id(),
                    page = page,
                    returned = returned,
                    added = added,
                    total_found = found.len(),
                    "Searched page"
                );

                if returned < per_page as usize {
                    break;
                }
                page += 1;
            }
        }

        info!(
            query = %criteria.query,
            found = found.len(),
            target = criteria.target,
            "Discovery exhausted all tiers"
        );
        Ok(found)
    }
}
