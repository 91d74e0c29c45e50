pub mod acl;
pub mod news;
pub mod permission;
pub mod tag;

pub use acl::*;
pub use news::*;
pub use permission::*;
pub use tag::*;
