pub mod admin;
pub mod auth;

pub use admin::AdminOnly;
pub use auth::{JwtAuth, extract_claims};
