//! The resolved, authenticated principal.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use ekklesia_core::BranchId;
use serde::{Deserialize, Serialize};

use crate::security::{Permission, Role, RoleRegistry};
use crate::user::{EmailAddress, UserId};

/// Activity state of a directory account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    /// Account may sign in and act.
    Active,
    /// Account is retained but blocked from acting.
    Inactive,
}

/// The resolved current user: role, branch, permission set, status.
///
/// Permissions are persisted on the record rather than derived live from the
/// role, so changing a role's grants does not retroactively rewrite sessions
/// already issued. [`Identity::permissions_diverge`] surfaces the drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable record identifier.
    pub id: UserId,
    /// Opaque subject claim linking the record to the session principal.
    pub subject: String,
    /// Human-readable name.
    pub display_name: String,
    /// Contact email, if known.
    pub email: Option<EmailAddress>,
    /// Assigned job function.
    pub role: Role,
    /// Home branch of the account.
    pub branch_id: BranchId,
    /// Persisted permission grants.
    pub permissions: BTreeSet<Permission>,
    /// Activity state.
    pub status: IdentityStatus,
    /// Last successful resolution instant, if ever stamped.
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Creates an identity whose permissions mirror the registry for `role`.
    #[must_use]
    pub fn provisioned(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        email: Option<EmailAddress>,
        role: Role,
        branch_id: BranchId,
        registry: &RoleRegistry,
    ) -> Self {
        Self {
            id: UserId::new(),
            subject: subject.into(),
            display_name: display_name.into(),
            email,
            role,
            branch_id,
            permissions: registry.permission_set_for(role),
            status: IdentityStatus::Active,
            last_seen_at: None,
        }
    }

    /// Returns whether the account is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == IdentityStatus::Active
    }

    /// Returns whether stored permissions differ from the registry grants
    /// for this identity's role.
    #[must_use]
    pub fn permissions_diverge(&self, registry: &RoleRegistry) -> bool {
        self.permissions != registry.permission_set_for(self.role)
    }
}

#[cfg(test)]
mod tests {
    use ekklesia_core::BranchId;

    use super::{Identity, IdentityStatus};
    use crate::security::{Permission, Role, RoleRegistry};

    #[test]
    fn provisioned_identity_mirrors_registry_grants() {
        let registry = RoleRegistry::standard();
        let identity = Identity::provisioned(
            "subject-1",
            "Ana Figueira",
            None,
            Role::Secretary,
            BranchId::new(),
            &registry,
        );

        assert_eq!(identity.status, IdentityStatus::Active);
        assert!(!identity.permissions_diverge(&registry));
    }

    #[test]
    fn drift_from_registry_is_detected() {
        let registry = RoleRegistry::standard();
        let mut identity = Identity::provisioned(
            "subject-2",
            "Rui Tavares",
            None,
            Role::Treasurer,
            BranchId::new(),
            &registry,
        );

        identity.permissions.insert(Permission::UsersManage);
        assert!(identity.permissions_diverge(&registry));
    }
}
