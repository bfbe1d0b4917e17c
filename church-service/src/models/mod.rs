pub mod church;
pub mod church_access;
pub mod member;
pub mod resolved_church;
pub mod user;

pub use church::{
    Church, ChurchWithOrganization, NewChurch, NewOrganization, Organization, OrganizationSummary,
};
pub use church_access::{
    ChurchAccessGrant, GrantAction, GrantEvent, GrantHistory, GrantState, GrantWithChurch,
};
pub use member::{Member, MemberStats, MemberStatus, MemberUpdate, NewMember};
pub use resolved_church::{ChurchAvailability, ChurchSelection, ResolvedChurchView};
pub use user::{NewUser, SanitizedUser, User, UserRole, UserUpdate};
