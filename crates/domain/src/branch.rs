//! Branch records and the organization hierarchy invariant.
//!
//! At most one branch carries the headquarters flag. The stores do not
//! enforce this; writers are expected to go through the conditional
//! headquarters insert exposed by the branch repository port.

use chrono::{DateTime, Utc};
use ekklesia_core::{BranchId, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::profile::OrgProfile;

/// Postal address shared by branches and the organization profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street and number.
    pub street: String,
    /// City or locality.
    pub city: String,
    /// State, province, or region.
    pub region: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: String,
}

/// Activity state of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
    /// Branch is operating.
    Active,
    /// Branch is retained for history but no longer operating.
    Inactive,
}

/// A subdivision of the organization ("congregation").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Stable branch identifier.
    pub id: BranchId,
    /// Branch name.
    pub name: NonEmptyString,
    /// Postal address.
    pub address: Address,
    /// Name of the branch leader.
    pub leader_name: String,
    /// Fiscal registration number, if the branch has its own.
    pub tax_id: Option<String>,
    /// Count of registered members.
    pub member_count: u32,
    /// Activity state.
    pub status: BranchStatus,
    /// Whether this branch is the organization's headquarters.
    pub is_headquarters: bool,
    /// Date the branch was founded.
    pub founded_at: DateTime<Utc>,
}

impl Branch {
    /// Builds a headquarters branch from the organization profile.
    ///
    /// Used when a profile exists but no headquarters branch does yet.
    #[must_use]
    pub fn headquarters_from_profile(profile: &OrgProfile, now: DateTime<Utc>) -> Self {
        Self {
            id: BranchId::new(),
            name: profile.name.clone(),
            address: profile.address.clone(),
            leader_name: profile.leader_name.clone(),
            tax_id: profile.tax_id.clone(),
            member_count: 0,
            status: BranchStatus::Active,
            is_headquarters: true,
            founded_at: now,
        }
    }

    /// Merges the profile's org-identity fields into this branch.
    ///
    /// Branch-only fields (member count, status, headquarters flag, founding
    /// date) are left untouched.
    pub fn absorb_profile(&mut self, profile: &OrgProfile) {
        self.name = profile.name.clone();
        self.address = profile.address.clone();
        self.leader_name = profile.leader_name.clone();
        self.tax_id = profile.tax_id.clone();
    }
}
