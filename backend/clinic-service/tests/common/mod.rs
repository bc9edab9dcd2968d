//! Shared fixture: an in-memory clinic with two owners, one staff member and one admin.
#![allow(dead_code)]

use std::sync::Arc;

use actix_web::web;
use chrono::NaiveDate;
use clinic_service::{
    config::UploadConfig,
    db::{ClinicRepository, MemoryClinicRepository},
    models::{NewAppointment, NewPet, Owner},
    policy::PolicyTable,
    AppState,
};
use crypto_core::{hash_password, JwtCodec, Role};
use tempfile::TempDir;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const PASSWORD: &str = "secret";

pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;
pub const STAFF: i64 = 3;
pub const ADMIN: i64 = 4;

/// Pets: 1 Rex (Alice), 2 Tom (Bob), 3 Fido (Alice)
pub const ALICE_PET: i64 = 1;
pub const BOB_PET: i64 = 2;

/// Appointments: 1 for Rex (Alice), 2 for Tom (Bob)
pub const ALICE_APPOINTMENT: i64 = 1;
pub const BOB_APPOINTMENT: i64 = 2;

pub struct Fixture {
    pub repo: Arc<MemoryClinicRepository>,
    pub codec: Arc<JwtCodec>,
    pub state: web::Data<AppState>,
    pub uploads: TempDir,
}

fn pet(name: &str) -> NewPet {
    NewPet {
        name: name.to_string(),
        species: "dog".to_string(),
        breed: "mixed".to_string(),
        owner_id: None,
        history: String::new(),
    }
}

fn appointment(pet_id: i64) -> NewAppointment {
    NewAppointment {
        date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        time: "10:00".to_string(),
        pet_id,
        reason: "checkup".to_string(),
        owner_id: None,
    }
}

impl Fixture {
    pub async fn new() -> Self {
        Self::build(PolicyTable::default(), None).await
    }

    pub async fn with_policy(policy: PolicyTable) -> Self {
        Self::build(policy, None).await
    }

    pub async fn with_upload_limit(max_bytes: usize) -> Self {
        Self::build(PolicyTable::default(), Some(max_bytes)).await
    }

    async fn build(policy: PolicyTable, max_bytes: Option<usize>) -> Self {
        let repo = Arc::new(MemoryClinicRepository::new());
        let hash = hash_password(PASSWORD).unwrap();

        for (email, role) in [
            ("a@x.com", Role::Owner),
            ("b@x.com", Role::Owner),
            ("staff@x.com", Role::Staff),
            ("admin@x.com", Role::Admin),
        ] {
            repo.create_user(email, &hash, role).await.unwrap();
        }

        for (id, name, email) in [(ALICE, "Alice", "a@x.com"), (BOB, "Bob", "b@x.com")] {
            repo.insert_owner(Owner {
                id,
                name: name.to_string(),
                contact: "555-0100".to_string(),
                email: email.to_string(),
            })
            .await;
        }

        repo.create_pet(pet("Rex"), ALICE).await.unwrap();
        repo.create_pet(pet("Tom"), BOB).await.unwrap();
        repo.create_pet(pet("Fido"), ALICE).await.unwrap();

        repo.create_appointment(appointment(ALICE_PET), ALICE)
            .await
            .unwrap();
        repo.create_appointment(appointment(BOB_PET), BOB).await.unwrap();

        let uploads = TempDir::new().unwrap();
        let mut upload_config = UploadConfig {
            dir: uploads.path().join("uploads").display().to_string(),
            ..UploadConfig::default()
        };
        if let Some(max_bytes) = max_bytes {
            upload_config.max_bytes = max_bytes;
        }

        let codec = Arc::new(JwtCodec::from_secret(SECRET).unwrap());
        let state = web::Data::new(AppState::new(
            repo.clone() as Arc<dyn ClinicRepository>,
            codec.clone(),
            policy,
            upload_config,
        ));

        Self {
            repo,
            codec,
            state,
            uploads,
        }
    }

    /// Authorization header value for the given identity
    pub fn bearer(&self, user_id: i64, role: Role) -> String {
        format!("Bearer {}", self.codec.issue(user_id, role).unwrap())
    }

    pub fn alice(&self) -> String {
        self.bearer(ALICE, Role::Owner)
    }

    pub fn bob(&self) -> String {
        self.bearer(BOB, Role::Owner)
    }

    pub fn staff(&self) -> String {
        self.bearer(STAFF, Role::Staff)
    }

    pub fn admin(&self) -> String {
        self.bearer(ADMIN, Role::Admin)
    }
}

/// Build the full application around a fixture
macro_rules! app {
    ($fx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($fx.state.clone())
                .configure(clinic_service::routes::configure($fx.codec.clone())),
        )
        .await
    };
}
