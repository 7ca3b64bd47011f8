//! Identity resolution from session principals.

use std::sync::Arc;

use ekklesia_core::{AppError, AppResult, AuthenticatedSubject, BranchId};
use ekklesia_domain::{EmailAddress, Identity, Role, RoleRegistry};

use crate::{BranchRepository, Clock, UserDirectory};

/// Resolves the authenticated session principal into an [`Identity`].
///
/// Runs once per authentication event; the caller owns the resolved identity
/// for the lifetime of the login.
#[derive(Clone)]
pub struct IdentityService {
    directory: Arc<dyn UserDirectory>,
    branches: Arc<dyn BranchRepository>,
    registry: Arc<RoleRegistry>,
    clock: Arc<dyn Clock>,
}

impl IdentityService {
    /// Creates a new identity service.
    #[must_use]
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        branches: Arc<dyn BranchRepository>,
        registry: Arc<RoleRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            branches,
            registry,
            clock,
        }
    }

    /// Resolves the directory record for a session principal.
    ///
    /// A principal that authenticated but has no directory record gets a
    /// default one (`basic_user`, the organization's default branch), after
    /// which the lookup is retried exactly once. The last-seen stamp is
    /// best-effort: a failing stamp is logged and never blocks resolution.
    pub async fn resolve(&self, principal: &AuthenticatedSubject) -> AppResult<Identity> {
        let identity = match self.directory.find_by_subject(principal.subject()).await? {
            Some(identity) => identity,
            None => {
                self.provision_default(principal).await?;
                self.directory
                    .find_by_subject(principal.subject())
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "directory record for subject '{}' vanished after provisioning",
                            principal.subject()
                        ))
                    })?
            }
        };

        if let Err(error) = self
            .directory
            .touch_last_seen(principal.subject(), self.clock.now())
            .await
        {
            tracing::warn!(
                subject = principal.subject(),
                %error,
                "failed to stamp last seen"
            );
        }

        Ok(identity)
    }

    async fn provision_default(&self, principal: &AuthenticatedSubject) -> AppResult<()> {
        let branch_id = self.default_branch_id().await?;

        // Provider emails occasionally fail structural validation; a missing
        // email on the default record is preferable to a failed login.
        let email = principal
            .email()
            .and_then(|value| EmailAddress::new(value).ok());

        let identity = Identity::provisioned(
            principal.subject(),
            principal.display_name(),
            email,
            Role::BasicUser,
            branch_id,
            &self.registry,
        );

        tracing::info!(
            subject = principal.subject(),
            branch = %branch_id,
            "provisioning default directory record"
        );

        self.directory.put_user(identity).await
    }

    /// Headquarters when one exists, otherwise the first listed branch.
    async fn default_branch_id(&self) -> AppResult<BranchId> {
        if let Some(headquarters) = self.branches.find_headquarters().await? {
            return Ok(headquarters.id);
        }

        self.branches
            .list_branches()
            .await?
            .first()
            .map(|branch| branch.id)
            .ok_or_else(|| {
                AppError::NotFound("no branch exists to place a default account in".to_owned())
            })
    }
}
