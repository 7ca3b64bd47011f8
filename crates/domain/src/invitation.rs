//! Invitation records and their lifecycle state machine.
//!
//! `pending` transitions to exactly one of the terminal states `accepted`
//! or `expired`. Expiry is evaluated lazily against the clock at validation
//! time; a stored `pending` status past its deadline is already dead.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use ekklesia_core::{AppError, BranchId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::security::Role;
use crate::user::{EmailAddress, UserId};

/// Number of days an invitation stays redeemable after issuance.
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Unique identifier for an invitation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvitationId(Uuid);

impl InvitationId {
    /// Creates a new random invitation identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an invitation identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for InvitationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InvitationId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle state of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Issued and awaiting redemption.
    Pending,
    /// Redeemed; a directory account was created from it. Terminal.
    Accepted,
    /// Deadline passed or administratively cancelled. Terminal.
    Expired,
}

impl InvitationStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Expired => "expired",
        }
    }
}

impl FromStr for InvitationStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "expired" => Ok(Self::Expired),
            _ => Err(AppError::Validation(format!(
                "unknown invitation status '{value}'"
            ))),
        }
    }
}

/// A time-boxed, single-use credential that provisions a new identity with
/// a preset role and branch.
///
/// The raw token is returned to the issuer exactly once; only its SHA-256
/// hash is persisted on the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Stable record identifier.
    pub id: InvitationId,
    /// Address the invitation was sent to.
    pub email: EmailAddress,
    /// Display name for the future account.
    pub display_name: String,
    /// Role the redeemed account will receive.
    pub role: Role,
    /// Branch the redeemed account will belong to.
    pub branch_id: BranchId,
    /// SHA-256 hash of the opaque token credential.
    pub token_hash: String,
    /// Lifecycle state.
    pub status: InvitationStatus,
    /// Issuance instant.
    pub created_at: DateTime<Utc>,
    /// Redemption deadline.
    pub expires_at: DateTime<Utc>,
    /// Identity that issued the invitation.
    pub created_by: UserId,
}

impl Invitation {
    /// Returns whether the deadline has passed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Returns whether the invitation can still be redeemed at `now`.
    #[must_use]
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired_at(now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use ekklesia_core::BranchId;

    use super::{INVITATION_TTL_DAYS, Invitation, InvitationId, InvitationStatus};
    use crate::security::Role;
    use crate::user::{EmailAddress, UserId};

    fn sample_invitation(status: InvitationStatus) -> Invitation {
        let now = Utc::now();
        Invitation {
            id: InvitationId::new(),
            email: EmailAddress::new("invitee@example.com").unwrap_or_else(|_| panic!("test")),
            display_name: "Invitee".to_owned(),
            role: Role::Secretary,
            branch_id: BranchId::new(),
            token_hash: "ab".repeat(32),
            status,
            created_at: now,
            expires_at: now + Duration::days(INVITATION_TTL_DAYS),
            created_by: UserId::new(),
        }
    }

    #[test]
    fn pending_invitation_is_redeemable_before_deadline() {
        let invitation = sample_invitation(InvitationStatus::Pending);
        assert!(invitation.is_redeemable_at(Utc::now()));
    }

    #[test]
    fn pending_invitation_past_deadline_is_not_redeemable() {
        let invitation = sample_invitation(InvitationStatus::Pending);
        let after = invitation.expires_at + Duration::seconds(1);
        assert!(invitation.is_expired_at(after));
        assert!(!invitation.is_redeemable_at(after));
    }

    #[test]
    fn accepted_invitation_is_never_redeemable() {
        let invitation = sample_invitation(InvitationStatus::Accepted);
        assert!(!invitation.is_redeemable_at(Utc::now()));
    }

    #[test]
    fn deadline_instant_itself_counts_as_expired() {
        let invitation = sample_invitation(InvitationStatus::Pending);
        assert!(invitation.is_expired_at(invitation.expires_at));
    }
}
