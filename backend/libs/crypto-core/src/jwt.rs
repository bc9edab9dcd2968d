/// Credential issuing and validation for clinic services
///
/// Credentials are HS256 JWTs carrying the caller's user id and role. A single
/// `JwtCodec` is built from the configured secret at startup and shared
/// read-only by every worker; nothing in this module mutates it afterwards.
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt::{JwtCodec, Role};
///
/// let codec = JwtCodec::from_secret("0123456789abcdef0123456789abcdef").unwrap();
/// let token = codec.issue(7, Role::Owner).unwrap();
/// let claims = codec.validate(&token).unwrap();
/// assert_eq!(claims.user_id, 7);
/// assert_eq!(claims.role, Role::Owner);
/// ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Constants
// ============================================================================

/// Default credential lifetime
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// HS256 secrets shorter than this are rejected (256 bits)
pub const MIN_SECRET_LENGTH: usize = 32;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// Caller role embedded in every credential.
///
/// `Staff` and `Admin` are equally privileged; `Owner` is restricted to the
/// records it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Staff,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Owner, Role::Staff, Role::Admin];

    pub fn is_elevated(self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Verified credential payload
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identity of the caller (users.id)
    pub user_id: i64,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Unparseable token, wrong algorithm, or signature mismatch
    #[error("malformed or tampered token")]
    Malformed,

    #[error("token expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("signing secret must be at least 32 bytes")]
    WeakSecret,
}

// ============================================================================
// Codec
// ============================================================================

/// Issues and validates credentials with one symmetric secret.
#[derive(Clone)]
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCodec")
            .field("algorithm", &JWT_ALGORITHM)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, AuthError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AuthError::WeakSecret);
        }

        // Expiry is checked against the caller-supplied clock in `validate_at`,
        // so the library's own wall-clock check (and its leeway) stays off.
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    /// Codec with the default 24h lifetime
    pub fn from_secret(secret: &str) -> Result<Self, AuthError> {
        Self::new(secret.as_bytes(), Duration::hours(DEFAULT_TTL_HOURS))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: i64, role: Role) -> Result<String, AuthError> {
        self.issue_at(user_id, role, Utc::now())
    }

    /// Sign a credential as if issued at `now`.
    pub fn issue_at(
        &self,
        user_id: i64,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            user_id,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    /// Verify signature and structure, then expiry against `now`.
    ///
    /// A token is expired at its `exp` second, not after it.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::Malformed)?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

// ============================================================================
// Tests
// ============================================================================
