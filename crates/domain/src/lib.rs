//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod branch;
mod identity;
mod invitation;
mod profile;
mod security;
mod user;

pub use branch::{Address, Branch, BranchStatus};
pub use identity::{Identity, IdentityStatus};
pub use invitation::{
    INVITATION_TTL_DAYS, Invitation, InvitationId, InvitationStatus,
};
pub use profile::{BrandColors, OrgProfile};
pub use security::{ORG_WIDE_ROLES, Permission, Role, RoleRegistry};
pub use user::{EmailAddress, UserId};
