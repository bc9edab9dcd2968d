pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod policy;
pub mod routes;

pub use config::Config;
pub use error::{AppError, Result};

use std::sync::Arc;

use crypto_core::JwtCodec;

use crate::config::UploadConfig;
use crate::db::ClinicRepository;
use crate::policy::PolicyTable;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn ClinicRepository>,
    pub codec: Arc<JwtCodec>,
    pub policy: PolicyTable,
    pub uploads: UploadConfig,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn ClinicRepository>,
        codec: Arc<JwtCodec>,
        policy: PolicyTable,
        uploads: UploadConfig,
    ) -> Self {
        Self {
            repo,
            codec,
            policy,
            uploads,
        }
    }
}
