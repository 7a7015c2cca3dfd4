pub mod auth;
pub mod role;

pub use auth::{auth_middleware, RequestIdentity};
pub use role::{authorize, require_admin};
