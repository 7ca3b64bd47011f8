use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ekklesia_application::{
    BranchRepository, InvitationRepository, OrgProfileRepository, UserDirectory,
};
use ekklesia_core::{AppError, AppResult, BranchId};
use ekklesia_domain::{Branch, Identity, Invitation, InvitationId, InvitationStatus, OrgProfile};
use tokio::sync::RwLock;

/// In-memory directory implementing every repository port.
///
/// Conditional writes (headquarters insert, invitation status transitions)
/// run under the relevant write lock, so check-then-act sequences are atomic
/// with respect to concurrent callers.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<String, Identity>>,
    branches: RwLock<HashMap<BranchId, Branch>>,
    profile: RwLock<Option<OrgProfile>>,
    invitations: RwLock<HashMap<InvitationId, Invitation>>,
}

impl InMemoryDirectory {
    /// Creates an empty in-memory directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            branches: RwLock::new(HashMap::new()),
            profile: RwLock::new(None),
            invitations: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_by_subject(&self, subject: &str) -> AppResult<Option<Identity>> {
        Ok(self.users.read().await.get(subject).cloned())
    }

    async fn put_user(&self, identity: Identity) -> AppResult<()> {
        self.users
            .write()
            .await
            .insert(identity.subject.clone(), identity);
        Ok(())
    }

    async fn list_users(&self) -> AppResult<Vec<Identity>> {
        let users = self.users.read().await;

        let mut values: Vec<Identity> = users.values().cloned().collect();
        values.sort_by(|left, right| left.subject.cmp(&right.subject));

        Ok(values)
    }

    async fn touch_last_seen(&self, subject: &str, at: DateTime<Utc>) -> AppResult<()> {
        let mut users = self.users.write().await;

        let identity = users
            .get_mut(subject)
            .ok_or_else(|| AppError::NotFound(format!("user '{subject}'")))?;
        identity.last_seen_at = Some(at);

        Ok(())
    }
}

#[async_trait]
impl BranchRepository for InMemoryDirectory {
    async fn list_branches(&self) -> AppResult<Vec<Branch>> {
        let branches = self.branches.read().await;

        let mut values: Vec<Branch> = branches.values().cloned().collect();
        values.sort_by(|left, right| left.name.as_str().cmp(right.name.as_str()));

        Ok(values)
    }

    async fn find_branch(&self, branch_id: BranchId) -> AppResult<Option<Branch>> {
        Ok(self.branches.read().await.get(&branch_id).cloned())
    }

    async fn find_headquarters(&self) -> AppResult<Option<Branch>> {
        Ok(self
            .branches
            .read()
            .await
            .values()
            .find(|branch| branch.is_headquarters)
            .cloned())
    }

    async fn upsert_branch(&self, branch: Branch) -> AppResult<()> {
        self.branches.write().await.insert(branch.id, branch);
        Ok(())
    }

    async fn insert_headquarters_if_absent(&self, candidate: Branch) -> AppResult<Branch> {
        let mut branches = self.branches.write().await;

        if let Some(existing) = branches.values().find(|branch| branch.is_headquarters) {
            return Ok(existing.clone());
        }

        branches.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }
}

#[async_trait]
impl OrgProfileRepository for InMemoryDirectory {
    async fn load(&self) -> AppResult<Option<OrgProfile>> {
        Ok(self.profile.read().await.clone())
    }

    async fn save(&self, profile: OrgProfile) -> AppResult<()> {
        *self.profile.write().await = Some(profile);
        Ok(())
    }
}

#[async_trait]
impl InvitationRepository for InMemoryDirectory {
    async fn create(&self, invitation: Invitation) -> AppResult<()> {
        let mut invitations = self.invitations.write().await;

        if invitations.contains_key(&invitation.id) {
            return Err(AppError::Conflict(format!(
                "invitation '{}' already exists",
                invitation.id
            )));
        }

        invitations.insert(invitation.id, invitation);
        Ok(())
    }

    async fn find_by_id(&self, id: InvitationId) -> AppResult<Option<Invitation>> {
        Ok(self.invitations.read().await.get(&id).cloned())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Invitation>> {
        Ok(self
            .invitations
            .read()
            .await
            .values()
            .find(|invitation| invitation.token_hash == token_hash)
            .cloned())
    }

    async fn list_pending_by_email(&self, email: &str) -> AppResult<Vec<Invitation>> {
        let invitations = self.invitations.read().await;

        let mut values: Vec<Invitation> = invitations
            .values()
            .filter(|invitation| {
                invitation.status == InvitationStatus::Pending
                    && invitation.email.as_str() == email
            })
            .cloned()
            .collect();
        values.sort_by(|left, right| left.created_at.cmp(&right.created_at));

        Ok(values)
    }

    async fn accept_pending(&self, id: InvitationId) -> AppResult<bool> {
        self.transition_pending(id, InvitationStatus::Accepted).await
    }

    async fn expire_pending(&self, id: InvitationId) -> AppResult<bool> {
        self.transition_pending(id, InvitationStatus::Expired).await
    }

    async fn list_invitations(&self) -> AppResult<Vec<Invitation>> {
        let invitations = self.invitations.read().await;

        let mut values: Vec<Invitation> = invitations.values().cloned().collect();
        values.sort_by(|left, right| left.created_at.cmp(&right.created_at));

        Ok(values)
    }
}

impl InMemoryDirectory {
    async fn transition_pending(
        &self,
        id: InvitationId,
        target: InvitationStatus,
    ) -> AppResult<bool> {
        let mut invitations = self.invitations.write().await;

        let invitation = invitations
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("invitation '{id}'")))?;

        if invitation.status != InvitationStatus::Pending {
            return Ok(false);
        }

        invitation.status = target;
        Ok(true)
    }
}
