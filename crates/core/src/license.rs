//! License catalog.
//!
//! Maps the provider's numeric license ids to a human-readable name and a
//! canonical reference URL. Ids outside the known set are a typed error.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A usage-rights category attached to every photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum License {
    AllRightsReserved,
    AttributionNonCommercialShareAlike,
    AttributionNonCommercial,
    AttributionNonCommercialNoDerivs,
    Attribution,
    AttributionShareAlike,
    AttributionNoDerivs,
    NoKnownCopyrightRestrictions,
    UnitedStatesGovernmentWork,
    PublicDomainDedication,
    PublicDomainMark,
}

/// License tiers from least to most restrictive; all-rights-reserved last.
pub const PREFERRED_ORDER: [License; 11] = [
    License::Attribution,
    License::AttributionShareAlike,
    License::AttributionNonCommercial,
    License::AttributionNonCommercialShareAlike,
    License::NoKnownCopyrightRestrictions,
    License::AttributionNoDerivs,
    License::AttributionNonCommercialNoDerivs,
    License::PublicDomainDedication,
    License::PublicDomainMark,
    License::UnitedStatesGovernmentWork,
    License::AllRightsReserved,
];

/// Errors from license lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenseError {
    #[error("unknown license number: {0}")]
    Unknown(i32),
}

impl License {
    /// Numeric id used on the wire.
    pub fn id(self) -> i32 {
        match self {
            License::AllRightsReserved => 0,
            License::AttributionNonCommercialShareAlike => 1,
            License::AttributionNonCommercial => 2,
            License::AttributionNonCommercialNoDerivs => 3,
            License::Attribution => 4,
            License::AttributionShareAlike => 5,
            License::AttributionNoDerivs => 6,
            License::NoKnownCopyrightRestrictions => 7,
            License::UnitedStatesGovernmentWork => 8,
            License::PublicDomainDedication => 9,
            License::PublicDomainMark => 10,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            License::AllRightsReserved => "All Rights Reserved",
            License::AttributionNonCommercialShareAlike => {
                "Attribution-NonCommercial-ShareAlike License"
            }
            License::AttributionNonCommercial => "Attribution-NonCommercial License",
            License::AttributionNonCommercialNoDerivs => {
                "Attribution-NonCommercial-NoDerivs License"
            }
            License::Attribution => "Attribution License",
            License::AttributionShareAlike => "Attribution-ShareAlike License",
            License::AttributionNoDerivs => "Attribution-NoDerivs License",
            License::NoKnownCopyrightRestrictions => "No known copyright restrictions",
            License::UnitedStatesGovernmentWork => "United States Government Work",
            License::PublicDomainDedication => "Public Domain Dedication (CC0)",
            License::PublicDomainMark => "Public Domain Mark",
        }
    }

    /// Canonical reference URL. All-rights-reserved has none and yields "".
    pub fn url(self) -> &'static str {
        match self {
            License::AllRightsReserved => "",
            License::AttributionNonCommercialShareAlike => {
                "https://creativecommons.org/licenses/by-nc-sa/2.0/"
            }
            License::AttributionNonCommercial => "https://creativecommons.org/licenses/by-nc/2.0/",
            License::AttributionNonCommercialNoDerivs => {
                "https://creativecommons.org/licenses/by-nc-nd/2.0/"
            }
            License::Attribution => "https://creativecommons.org/licenses/by/2.0/",
            License::AttributionShareAlike => "https://creativecommons.org/licenses/by-sa/2.0/",
            License::AttributionNoDerivs => "https://creativecommons.org/licenses/by-nd/2.0/",
            License::NoKnownCopyrightRestrictions => "https://www.flickr.com/commons/usage/",
            License::UnitedStatesGovernmentWork => "http://www.usa.gov/copyright.shtml",
            License::PublicDomainDedication => {
                "https://creativecommons.org/publicdomain/zero/1.0/"
            }
            License::PublicDomainMark => "https://creativecommons.org/publicdomain/mark/1.0/",
        }
    }

    /// "{name} ({url})", the form written into the copyright field.
    pub fn description(self) -> String {
        format!("{} ({})", self.name(), self.url())
    }

    /// Whether this tier may only be used on explicit opt-in.
    pub fn is_restrictive(self) -> bool {
        self == License::AllRightsReserved
    }
}

/// Name for a raw license id.
pub fn name_of(id: i32) -> Result<&'static str, LicenseError> {
    License::try_from(id).map(License::name)
}

/// Reference URL for a raw license id.
pub fn url_of(id: i32) -> Result<&'static str, LicenseError> {
    License::try_from(id).map(License::url)
}

impl TryFrom<i32> for License {
    type Error = LicenseError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        PREFERRED_ORDER
            .iter()
            .copied()
            .find(|l| l.id() == id)
            .ok_or(LicenseError::Unknown(id))
    }
}

impl From<License> for i32 {
    fn from(license: License) -> Self {
        license.id()
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}
