//! # Actix Middleware Library
//!
//! Unified middleware components for clinic Actix services
//!
//! ## Modules
//! - `jwt_auth`: bearer credential validation and typed identity propagation
//! - `logging`: request/response logging with resolved identity
//! - `metrics`: Prometheus metrics middleware

pub mod jwt_auth;
pub mod logging;
pub mod metrics;

pub use jwt_auth::{AuthenticatedUser, IdentityError, JwtAuthMiddleware};
pub use logging::Logging;
pub use metrics::MetricsMiddleware;
