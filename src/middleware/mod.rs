pub mod admin;
pub mod auth;
pub mod quota;
pub mod rate_limit;

pub use admin::admin_middleware;
pub use auth::{auth_middleware, Auth};
pub use quota::quota_middleware;
pub use rate_limit::{rate_limit_middleware, RateLimiter};
