//! Invitation lifecycle management.
//!
//! Tokens are cryptographically random, stored as SHA-256 hashes, single-use,
//! and time-limited. Expiry is evaluated lazily against the injected clock at
//! validation time; the optional sweep exists for reporting only and is never
//! required for correctness.

use std::sync::Arc;

use chrono::Duration;
use ekklesia_core::{AppError, AppResult, BranchId};
use ekklesia_domain::{
    EmailAddress, INVITATION_TTL_DAYS, Identity, Invitation, InvitationId, InvitationStatus,
    Permission, Role, RoleRegistry,
};

use crate::authorization::{Requirement, require};
use crate::{Clock, InvitationRepository, UserDirectory};

/// Account material supplied by the redeeming session.
#[derive(Debug, Clone)]
pub struct NewAccountMaterial {
    /// Subject claim the new directory record will be keyed by.
    pub subject: String,
    /// Display name override; the invitation's name is used when absent.
    pub display_name: Option<String>,
}

/// A freshly issued invitation together with its raw token.
///
/// The raw token is visible here and nowhere else; only its hash persists.
#[derive(Debug, Clone)]
pub struct IssuedInvitation {
    /// The stored invitation record.
    pub invitation: Invitation,
    /// The opaque credential to hand to the invitee.
    pub raw_token: String,
}

/// Application service for issuing, validating, redeeming, and cancelling
/// invitations.
#[derive(Clone)]
pub struct InvitationService {
    invitations: Arc<dyn InvitationRepository>,
    directory: Arc<dyn UserDirectory>,
    registry: Arc<RoleRegistry>,
    clock: Arc<dyn Clock>,
}

impl InvitationService {
    /// Creates a new invitation service.
    #[must_use]
    pub fn new(
        invitations: Arc<dyn InvitationRepository>,
        directory: Arc<dyn UserDirectory>,
        registry: Arc<RoleRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            invitations,
            directory,
            registry,
            clock,
        }
    }

    /// Issues an invitation granting `role` and `branch_id` to `email`.
    ///
    /// The issuer must hold `users.manage` and belong to the target branch
    /// (or hold an org-wide role). Org-wide roles may only be granted by a
    /// super admin or administrator. At most one pending, unexpired
    /// invitation may exist per email.
    pub async fn issue(
        &self,
        email: &str,
        display_name: &str,
        role: Role,
        branch_id: BranchId,
        issuer: &Identity,
    ) -> AppResult<IssuedInvitation> {
        let requirement = Requirement::none()
            .with_all_permissions([Permission::UsersManage])
            .branch_scoped();
        require(&requirement, issuer, Some(branch_id))?;

        if role.is_org_wide()
            && !matches!(issuer.role, Role::SuperAdmin | Role::Administrator)
        {
            return Err(AppError::Forbidden(format!(
                "role '{}' may only be granted by an administrator",
                role.as_str()
            )));
        }

        let canonical_email = EmailAddress::new(email)?;
        let now = self.clock.now();

        let stored_pending = self
            .invitations
            .list_pending_by_email(canonical_email.as_str())
            .await?;

        if stored_pending
            .iter()
            .any(|invitation| !invitation.is_expired_at(now))
        {
            return Err(AppError::Conflict(format!(
                "a pending invitation already exists for '{}'",
                canonical_email.as_str()
            )));
        }

        // Overdue rows still stored as pending are dead under lazy expiry;
        // retire them here so they cannot shadow the invitation being issued.
        for stale in stored_pending {
            self.invitations.expire_pending(stale.id).await?;
        }

        let (raw_token, token_hash) = generate_token()?;

        let invitation = Invitation {
            id: InvitationId::new(),
            email: canonical_email,
            display_name: display_name.to_owned(),
            role,
            branch_id,
            token_hash,
            status: InvitationStatus::Pending,
            created_at: now,
            expires_at: now + Duration::days(INVITATION_TTL_DAYS),
            created_by: issuer.id,
        };

        self.invitations.create(invitation.clone()).await?;

        tracing::info!(
            invitation = %invitation.id,
            email = invitation.email.as_str(),
            role = invitation.role.as_str(),
            "issued invitation"
        );

        Ok(IssuedInvitation {
            invitation,
            raw_token,
        })
    }

    /// Validates a raw token and returns the invitation it names.
    ///
    /// Expiry is computed from `expires_at` against the clock at call time;
    /// a record still stored as `pending` past its deadline is `Expired`.
    pub async fn validate(&self, raw_token: &str) -> AppResult<Invitation> {
        let token_hash = hash_token(raw_token);

        let invitation = self
            .invitations
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or_else(|| AppError::NotFound("invitation".to_owned()))?;

        match invitation.status {
            InvitationStatus::Pending if invitation.is_expired_at(self.clock.now()) => Err(
                AppError::Expired(format!("invitation '{}' is past its deadline", invitation.id)),
            ),
            InvitationStatus::Pending => Ok(invitation),
            InvitationStatus::Accepted | InvitationStatus::Expired => Err(AppError::Conflict(
                format!("invitation '{}' is no longer pending", invitation.id),
            )),
        }
    }

    /// Redeems a raw token, creating the directory record it provisions.
    ///
    /// The `pending` to `accepted` transition is conditional in the
    /// repository, so of two concurrent redeems exactly one creates an
    /// account; the other observes a non-pending record and gets a conflict.
    pub async fn redeem(
        &self,
        raw_token: &str,
        material: NewAccountMaterial,
    ) -> AppResult<Identity> {
        let invitation = self.validate(raw_token).await?;

        // Checked before the status transition so a colliding subject leaves
        // the invitation pending and the existing account untouched.
        if self
            .directory
            .find_by_subject(&material.subject)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "a directory account already exists for subject '{}'",
                material.subject
            )));
        }

        let won = self.invitations.accept_pending(invitation.id).await?;
        if !won {
            return Err(AppError::Conflict(format!(
                "invitation '{}' was already redeemed",
                invitation.id
            )));
        }

        let display_name = material
            .display_name
            .unwrap_or_else(|| invitation.display_name.clone());

        let identity = Identity::provisioned(
            material.subject,
            display_name,
            Some(invitation.email.clone()),
            invitation.role,
            invitation.branch_id,
            &self.registry,
        );

        self.directory.put_user(identity.clone()).await?;

        tracing::info!(
            invitation = %invitation.id,
            user = %identity.id,
            role = identity.role.as_str(),
            "redeemed invitation"
        );

        Ok(identity)
    }

    /// Cancels a pending invitation. Fails on any other state.
    pub async fn cancel(&self, id: InvitationId) -> AppResult<()> {
        self.invitations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("invitation '{id}'")))?;

        let cancelled = self.invitations.expire_pending(id).await?;
        if !cancelled {
            return Err(AppError::Conflict(format!(
                "invitation '{id}' is not pending"
            )));
        }

        Ok(())
    }

    /// Marks overdue pending invitations as expired, for reporting.
    ///
    /// Returns the number of records swept. Lazy expiry in [`validate`] and
    /// [`redeem`] never depends on this having run.
    ///
    /// [`validate`]: InvitationService::validate
    /// [`redeem`]: InvitationService::redeem
    pub async fn sweep_expired(&self) -> AppResult<usize> {
        let now = self.clock.now();
        let mut swept = 0;

        for invitation in self.invitations.list_invitations().await? {
            if invitation.status == InvitationStatus::Pending
                && invitation.is_expired_at(now)
                && self.invitations.expire_pending(invitation.id).await?
            {
                swept += 1;
            }
        }

        Ok(swept)
    }

    /// Lists invitations addressed to a branch.
    pub async fn list_for_branch(&self, branch_id: BranchId) -> AppResult<Vec<Invitation>> {
        Ok(self
            .invitations
            .list_invitations()
            .await?
            .into_iter()
            .filter(|invitation| invitation.branch_id == branch_id)
            .collect())
    }
}

/// Mints a fresh invitation credential.
///
/// The raw 32-byte hex token goes to the invitee; only its SHA-256 hash is
/// ever persisted on the record.
fn generate_token() -> AppResult<(String, String)> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("token entropy source failed: {error}")))?;

    let raw_token = hex_encode(&bytes);
    let hash = hash_token(&raw_token);
    Ok((raw_token, hash))
}

/// Hashes a raw token for storage and lookup.
fn hash_token(raw_token: &str) -> String {
    use sha2::{Digest, Sha256};

    let digest = Sha256::digest(raw_token.as_bytes());
    hex_encode(digest.as_slice())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}
