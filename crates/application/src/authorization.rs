//! The authorization decision engine.
//!
//! [`authorize`] is a pure function over hand-buildable values: no I/O, no
//! hidden global state. Screens and actions describe themselves as a
//! [`Requirement`] of up to three independent clauses; an absent clause is
//! vacuously satisfied, so the empty requirement allows everyone.

use std::collections::BTreeSet;

use ekklesia_core::{AppError, AppResult, BranchId};
use ekklesia_domain::{Identity, Permission, Role};

/// How a multi-permission clause combines its entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Every listed permission must be held.
    #[default]
    All,
    /// At least one listed permission must be held.
    Any,
}

/// A declarative gate for one screen or action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    /// Permissions the identity must hold. Empty means no restriction.
    pub permissions: BTreeSet<Permission>,
    /// Combination mode for the permission clause.
    pub permission_mode: PermissionMode,
    /// Roles allowed through. Empty means no restriction.
    pub roles: BTreeSet<Role>,
    /// Whether the identity must belong to the context branch. Org-wide
    /// roles bypass this clause.
    pub branch_scoped: bool,
}

impl Requirement {
    /// A requirement with no clauses; allows any identity.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Adds a permission clause requiring all of `permissions`.
    #[must_use]
    pub fn with_all_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions = permissions.into_iter().collect();
        self.permission_mode = PermissionMode::All;
        self
    }

    /// Adds a permission clause requiring any of `permissions`.
    #[must_use]
    pub fn with_any_permission(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions = permissions.into_iter().collect();
        self.permission_mode = PermissionMode::Any;
        self
    }

    /// Adds a role clause.
    #[must_use]
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    /// Requires the identity to belong to the context branch.
    #[must_use]
    pub fn branch_scoped(mut self) -> Self {
        self.branch_scoped = true;
        self
    }
}

/// Why a requirement turned an identity away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The permission clause was not satisfied.
    MissingPermission,
    /// The identity's role is not in the allowed set.
    RoleNotAllowed,
    /// The identity belongs to a different branch than the context.
    OutsideBranch,
}

impl DenyReason {
    /// Returns a stable value for logs and audit trails.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingPermission => "missing_permission",
            Self::RoleNotAllowed => "role_not_allowed",
            Self::OutsideBranch => "outside_branch",
        }
    }
}

/// Outcome of an authorization check. Denial is a normal value, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Every present clause was satisfied.
    Allow,
    /// The first failing clause, in evaluation order.
    Deny(DenyReason),
}

impl Decision {
    /// Returns whether the decision grants access.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Evaluates a requirement against an identity.
///
/// Clauses are checked in order: permissions, roles, branch scope; the first
/// failing clause's reason is returned. `context_branch` names the branch the
/// caller is operating on; when omitted, the identity's own branch is used,
/// so the scope clause is trivially satisfied.
#[must_use]
pub fn authorize(
    requirement: &Requirement,
    identity: &Identity,
    context_branch: Option<BranchId>,
) -> Decision {
    if !requirement.permissions.is_empty() {
        let satisfied = match requirement.permission_mode {
            PermissionMode::All => requirement
                .permissions
                .iter()
                .all(|permission| identity.permissions.contains(permission)),
            PermissionMode::Any => requirement
                .permissions
                .iter()
                .any(|permission| identity.permissions.contains(permission)),
        };
        if !satisfied {
            return Decision::Deny(DenyReason::MissingPermission);
        }
    }

    if !requirement.roles.is_empty() && !requirement.roles.contains(&identity.role) {
        return Decision::Deny(DenyReason::RoleNotAllowed);
    }

    if requirement.branch_scoped && !identity.role.is_org_wide() {
        let context = context_branch.unwrap_or(identity.branch_id);
        if identity.branch_id != context {
            return Decision::Deny(DenyReason::OutsideBranch);
        }
    }

    Decision::Allow
}

/// Evaluates a requirement and converts denial into [`AppError::Forbidden`].
///
/// Inactive identities are turned away before any clause is evaluated.
pub fn require(
    requirement: &Requirement,
    identity: &Identity,
    context_branch: Option<BranchId>,
) -> AppResult<()> {
    if !identity.is_active() {
        return Err(AppError::Forbidden(format!(
            "identity '{}' is inactive",
            identity.id
        )));
    }

    match authorize(requirement, identity, context_branch) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(AppError::Forbidden(format!(
            "identity '{}' denied: {}",
            identity.id,
            reason.as_str()
        ))),
    }
}
