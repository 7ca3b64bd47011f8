//! Ports onto the directory collaborators.
//!
//! The core owns no storage. Users, branches, the organization profile, and
//! invitations live behind these traits; infrastructure supplies adapters.
//! Every operation is request/response, no streaming, and no port retries
//! internally.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ekklesia_core::{AppResult, BranchId};
use ekklesia_domain::{Branch, Identity, Invitation, InvitationId, OrgProfile};

/// Source of "now" for expiry comparisons. Injectable for testing.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Repository port for user directory records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds the directory record for a session subject claim.
    async fn find_by_subject(&self, subject: &str) -> AppResult<Option<Identity>>;

    /// Creates or replaces a directory record.
    async fn put_user(&self, identity: Identity) -> AppResult<()>;

    /// Lists all directory records.
    async fn list_users(&self) -> AppResult<Vec<Identity>>;

    /// Stamps the last-seen instant on a record. Last-write-wins; callers
    /// treat failures as non-fatal.
    async fn touch_last_seen(&self, subject: &str, at: DateTime<Utc>) -> AppResult<()>;
}

/// Repository port for the organization hierarchy.
///
/// The store does not itself enforce the single-headquarters invariant;
/// writers go through [`insert_headquarters_if_absent`] so the check-then-act
/// is a single conditional write.
///
/// [`insert_headquarters_if_absent`]: BranchRepository::insert_headquarters_if_absent
#[async_trait]
pub trait BranchRepository: Send + Sync {
    /// Lists all branches.
    async fn list_branches(&self) -> AppResult<Vec<Branch>>;

    /// Finds the branch by identifier.
    async fn find_branch(&self, branch_id: BranchId) -> AppResult<Option<Branch>>;

    /// Finds the branch flagged as headquarters, if one exists.
    async fn find_headquarters(&self) -> AppResult<Option<Branch>>;

    /// Creates or replaces a branch record.
    async fn upsert_branch(&self, branch: Branch) -> AppResult<()>;

    /// Inserts `candidate` as headquarters only if no headquarters exists
    /// yet. Returns the branch that holds the flag afterwards: `candidate`
    /// when the insert won, the pre-existing headquarters otherwise.
    async fn insert_headquarters_if_absent(&self, candidate: Branch) -> AppResult<Branch>;
}

/// Repository port for the singleton organization profile.
#[async_trait]
pub trait OrgProfileRepository: Send + Sync {
    /// Loads the profile, if one has been configured.
    async fn load(&self) -> AppResult<Option<OrgProfile>>;

    /// Stores the profile, replacing any previous value.
    async fn save(&self, profile: OrgProfile) -> AppResult<()>;
}

/// Repository port for invitation records.
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Stores a new invitation.
    async fn create(&self, invitation: Invitation) -> AppResult<()>;

    /// Finds an invitation by identifier.
    async fn find_by_id(&self, id: InvitationId) -> AppResult<Option<Invitation>>;

    /// Finds an invitation by its stored token hash.
    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Invitation>>;

    /// Lists every invitation stored as pending for an email. May include
    /// records already past their deadline that no sweep has retired yet;
    /// callers own the lazy-expiry judgement.
    async fn list_pending_by_email(&self, email: &str) -> AppResult<Vec<Invitation>>;

    /// Atomically transitions `pending` to `accepted`. Returns `false` when
    /// the invitation was not pending, without modifying it.
    async fn accept_pending(&self, id: InvitationId) -> AppResult<bool>;

    /// Atomically transitions `pending` to `expired`. Returns `false` when
    /// the invitation was not pending, without modifying it.
    async fn expire_pending(&self, id: InvitationId) -> AppResult<bool>;

    /// Lists all invitations.
    async fn list_invitations(&self) -> AppResult<Vec<Invitation>>;
}
