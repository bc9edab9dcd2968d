//! # Crypto Core
//!
//! Shared credential and password primitives for clinic services.
//!
//! ## Modules
//! - `jwt`: signed, time-bounded credentials carrying user id and role
//! - `password`: Argon2id password hashing and verification

pub mod jwt;
pub mod password;

pub use jwt::{AuthError, Claims, JwtCodec, Role};
pub use password::{hash_password, verify_password, PasswordError};
