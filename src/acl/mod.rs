//! Object-level access control: permission masks, security identities and the
//! queries that restrict results to objects a principal was granted

pub mod permission;
pub mod queries;
pub mod security;

pub use permission::Permission;
pub use queries::AclQueries;
pub use security::{Authentication, ObjectIdentity, SecurityContext, Sid};
