//! Roles, permissions, and the role-to-permission registry.
//!
//! Both enums are closed: an unknown role or permission is a parse error at
//! the storage boundary, never a runtime lookup miss.

use std::collections::BTreeSet;
use std::str::FromStr;

use ekklesia_core::AppError;
use serde::{Deserialize, Serialize};

/// Permissions enforced by application policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows reading member records.
    MembersView,
    /// Allows creating and editing member records.
    MembersManage,
    /// Allows reading financial entries and statements.
    FinanceView,
    /// Allows recording and editing financial entries.
    FinanceManage,
    /// Allows reading published announcements and bulletins.
    PublishingView,
    /// Allows authoring and scheduling publications.
    PublishingManage,
    /// Allows reading branch records.
    BranchesView,
    /// Allows creating and editing branch records.
    BranchesManage,
    /// Allows editing the organization profile and brand settings.
    SettingsManage,
    /// Allows inviting and administering user accounts.
    UsersManage,
    /// Allows reading cross-branch reports.
    ReportsView,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MembersView => "members.view",
            Self::MembersManage => "members.manage",
            Self::FinanceView => "finance.view",
            Self::FinanceManage => "finance.manage",
            Self::PublishingView => "publishing.view",
            Self::PublishingManage => "publishing.manage",
            Self::BranchesView => "branches.view",
            Self::BranchesManage => "branches.manage",
            Self::SettingsManage => "settings.manage",
            Self::UsersManage => "users.manage",
            Self::ReportsView => "reports.view",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::MembersView,
            Permission::MembersManage,
            Permission::FinanceView,
            Permission::FinanceManage,
            Permission::PublishingView,
            Permission::PublishingManage,
            Permission::BranchesView,
            Permission::BranchesManage,
            Permission::SettingsManage,
            Permission::UsersManage,
            Permission::ReportsView,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "members.view" => Ok(Self::MembersView),
            "members.manage" => Ok(Self::MembersManage),
            "finance.view" => Ok(Self::FinanceView),
            "finance.manage" => Ok(Self::FinanceManage),
            "publishing.view" => Ok(Self::PublishingView),
            "publishing.manage" => Ok(Self::PublishingManage),
            "branches.view" => Ok(Self::BranchesView),
            "branches.manage" => Ok(Self::BranchesManage),
            "settings.manage" => Ok(Self::SettingsManage),
            "users.manage" => Ok(Self::UsersManage),
            "reports.view" => Ok(Self::ReportsView),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

/// Job functions recognized by the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Unrestricted platform operator.
    SuperAdmin,
    /// Organization-wide administrator.
    Administrator,
    /// Congregation pastor.
    Pastor,
    /// Organization-wide secretary.
    GeneralSecretary,
    /// Branch secretary.
    Secretary,
    /// Organization-wide treasurer.
    GeneralTreasurer,
    /// Branch treasurer.
    Treasurer,
    /// Ministry leader within a branch.
    MinistryLeader,
    /// Default role for newly provisioned accounts.
    BasicUser,
}

/// Roles whose reach spans every branch, bypassing branch scoping.
pub const ORG_WIDE_ROLES: &[Role] = &[
    Role::SuperAdmin,
    Role::Administrator,
    Role::GeneralSecretary,
    Role::GeneralTreasurer,
];

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Administrator => "administrator",
            Self::Pastor => "pastor",
            Self::GeneralSecretary => "general_secretary",
            Self::Secretary => "secretary",
            Self::GeneralTreasurer => "general_treasurer",
            Self::Treasurer => "treasurer",
            Self::MinistryLeader => "ministry_leader",
            Self::BasicUser => "basic_user",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::SuperAdmin,
            Role::Administrator,
            Role::Pastor,
            Role::GeneralSecretary,
            Role::Secretary,
            Role::GeneralTreasurer,
            Role::Treasurer,
            Role::MinistryLeader,
            Role::BasicUser,
        ];

        ALL
    }

    /// Returns whether this role bypasses branch scoping.
    #[must_use]
    pub fn is_org_wide(&self) -> bool {
        ORG_WIDE_ROLES.contains(self)
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "super_admin" => Ok(Self::SuperAdmin),
            "administrator" => Ok(Self::Administrator),
            "pastor" => Ok(Self::Pastor),
            "general_secretary" => Ok(Self::GeneralSecretary),
            "secretary" => Ok(Self::Secretary),
            "general_treasurer" => Ok(Self::GeneralTreasurer),
            "treasurer" => Ok(Self::Treasurer),
            "ministry_leader" => Ok(Self::MinistryLeader),
            "basic_user" => Ok(Self::BasicUser),
            _ => Err(AppError::Validation(format!("unknown role value '{value}'"))),
        }
    }
}

/// Immutable role-to-permission table, built once at process start.
///
/// Stored permissions on an [`crate::Identity`] normally mirror this table
/// for the identity's role; the table is the source of truth when accounts
/// are provisioned and when divergence is reconciled.
#[derive(Debug, Clone)]
pub struct RoleRegistry;

impl RoleRegistry {
    /// Creates the standard registry.
    #[must_use]
    pub fn standard() -> Self {
        Self
    }

    /// Returns the permission grants for a role. Total and never empty.
    #[must_use]
    pub fn permissions_for(&self, role: Role) -> &'static [Permission] {
        match role {
            Role::SuperAdmin | Role::Administrator => Permission::all(),
            Role::Pastor => &[
                Permission::MembersView,
                Permission::MembersManage,
                Permission::FinanceView,
                Permission::PublishingView,
                Permission::PublishingManage,
                Permission::BranchesView,
                Permission::ReportsView,
            ],
            Role::GeneralSecretary => &[
                Permission::MembersView,
                Permission::MembersManage,
                Permission::PublishingView,
                Permission::PublishingManage,
                Permission::BranchesView,
                Permission::ReportsView,
            ],
            Role::Secretary => &[
                Permission::MembersView,
                Permission::MembersManage,
                Permission::PublishingView,
                Permission::BranchesView,
            ],
            Role::GeneralTreasurer => &[
                Permission::FinanceView,
                Permission::FinanceManage,
                Permission::BranchesView,
                Permission::ReportsView,
            ],
            Role::Treasurer => &[
                Permission::FinanceView,
                Permission::FinanceManage,
                Permission::BranchesView,
            ],
            Role::MinistryLeader => &[
                Permission::MembersView,
                Permission::PublishingView,
                Permission::PublishingManage,
            ],
            Role::BasicUser => &[Permission::PublishingView],
        }
    }

    /// Returns the grants for a role as an owned set.
    #[must_use]
    pub fn permission_set_for(&self, role: Role) -> BTreeSet<Permission> {
        self.permissions_for(role).iter().copied().collect()
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
