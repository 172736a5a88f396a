/// 中间件 / Middleware
pub mod auth;

pub use auth::{AuthUser, JwtAuth};
