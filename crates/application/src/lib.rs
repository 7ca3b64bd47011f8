//! Application services and ports for the access-control core.

#![forbid(unsafe_code)]

pub mod authorization;

mod directory_ports;
mod headquarters_sync_service;
mod identity_service;
mod invitation_service;

pub use authorization::{Decision, DenyReason, PermissionMode, Requirement, authorize, require};
pub use directory_ports::{
    BranchRepository, Clock, InvitationRepository, OrgProfileRepository, UserDirectory,
};
pub use headquarters_sync_service::HeadquartersSyncService;
pub use identity_service::IdentityService;
pub use invitation_service::{InvitationService, IssuedInvitation, NewAccountMaterial};
