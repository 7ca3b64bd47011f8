//! The singleton organization profile record.

use ekklesia_core::NonEmptyString;
use serde::{Deserialize, Serialize};

use crate::branch::{Address, Branch};

/// Presentation colors used by rendering layers. Profile-only; never copied
/// onto branch records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandColors {
    /// Primary brand color as a hex string.
    pub primary: String,
    /// Secondary brand color as a hex string.
    pub secondary: String,
}

impl Default for BrandColors {
    fn default() -> Self {
        Self {
            primary: "#1f3a5f".to_owned(),
            secondary: "#c8a24b".to_owned(),
        }
    }
}

/// The public-facing identity of the organization.
///
/// Distinct from, but expected to mirror, the headquarters branch record.
/// The synchronization service keeps the two aligned in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgProfile {
    /// Full organization name.
    pub name: NonEmptyString,
    /// Abbreviated name used in tight layouts.
    pub short_name: String,
    /// Registered postal address.
    pub address: Address,
    /// Name of the organization's leader.
    pub leader_name: String,
    /// Fiscal registration number.
    pub tax_id: Option<String>,
    /// Presentation colors.
    pub brand: BrandColors,
}

impl OrgProfile {
    /// Merges the branch's org-identity fields into this profile.
    ///
    /// Profile-only presentation fields (short name, brand colors) are left
    /// untouched.
    pub fn absorb_branch(&mut self, branch: &Branch) {
        self.name = branch.name.clone();
        self.address = branch.address.clone();
        self.leader_name = branch.leader_name.clone();
        self.tax_id = branch.tax_id.clone();
    }

    /// Builds a profile from a headquarters branch with default presentation
    /// fields. Used when pulling into an organization that has no profile yet.
    #[must_use]
    pub fn from_branch(branch: &Branch) -> Self {
        Self {
            name: branch.name.clone(),
            short_name: String::new(),
            address: branch.address.clone(),
            leader_name: branch.leader_name.clone(),
            tax_id: branch.tax_id.clone(),
            brand: BrandColors::default(),
        }
    }
}
