use serde::{Deserialize, Deserializer};

/// Upper bound on credential lifetime (one year)
pub const MAX_JWT_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_env")]
    pub env: String,

    #[serde(default = "default_app_host")]
    pub host: String,

    #[serde(default = "default_app_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
}

#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing secret, at least 32 bytes
    pub secret: String,

    /// Credential lifetime, 1..=MAX_JWT_TTL_HOURS
    #[serde(
        default = "default_jwt_ttl_hours",
        deserialize_with = "deserialize_ttl_hours"
    )]
    pub ttl_hours: i64,
}

// Keep the secret out of logs
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: String,

    #[serde(default = "default_upload_max_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_bytes: default_upload_max_bytes(),
        }
    }
}

fn deserialize_ttl_hours<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let hours = i64::deserialize(deserializer)?;
    if !(1..=MAX_JWT_TTL_HOURS).contains(&hours) {
        return Err(serde::de::Error::custom(format!(
            "ttl_hours must be between 1 and {}, got {}",
            MAX_JWT_TTL_HOURS, hours
        )));
    }
    Ok(hours)
}

// Default value functions
fn default_app_env() -> String {
    "development".to_string()
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_jwt_ttl_hours() -> i64 {
    crypto_core::jwt::DEFAULT_TTL_HOURS
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_upload_max_bytes() -> usize {
    10 * 1024 * 1024
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    ///
    /// Each group reads its own prefix: `APP_`, `DATABASE_`, `JWT_`, `UPLOAD_`.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();

        Ok(Self {
            app: envy::prefixed("APP_").from_env()?,
            database: envy::prefixed("DATABASE_").from_env()?,
            jwt: envy::prefixed("JWT_").from_env()?,
            upload: envy::prefixed("UPLOAD_").from_env()?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.app.host.clone(), self.app.port)
    }
}
