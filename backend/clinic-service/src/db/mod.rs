pub mod memory;
pub mod postgres;

pub use memory::MemoryClinicRepository;
pub use postgres::PgClinicRepository;

use crypto_core::Role;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::error::Result;
use crate::models::{Appointment, NewAppointment, NewOwner, NewPet, Owner, Pet, User};

pub async fn create_pool(database_url: &str, max_connections: u32) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Storage operations used by the handlers.
///
/// `update_*` returns `None` when the row no longer exists and `delete_*`
/// reports whether a row was removed, so a record deleted between lookup and
/// write surfaces as 404 rather than an error.
#[async_trait::async_trait]
pub trait ClinicRepository: Send + Sync {
    // Users
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn create_user(&self, email: &str, password_hash: &str, role: Role) -> Result<User>;

    // Owners
    async fn list_owners(&self) -> Result<Vec<Owner>>;

    async fn get_owner(&self, id: i64) -> Result<Option<Owner>>;

    async fn create_owner(&self, owner: NewOwner) -> Result<Owner>;

    async fn update_owner(&self, id: i64, owner: NewOwner) -> Result<Option<Owner>>;

    async fn delete_owner(&self, id: i64) -> Result<bool>;

    // Pets
    async fn list_pets(&self) -> Result<Vec<Pet>>;

    async fn list_pets_by_owner(&self, owner_id: i64) -> Result<Vec<Pet>>;

    async fn get_pet(&self, id: i64) -> Result<Option<Pet>>;

    async fn create_pet(&self, pet: NewPet, owner_id: i64) -> Result<Pet>;

    async fn update_pet(&self, id: i64, pet: NewPet, owner_id: i64) -> Result<Option<Pet>>;

    async fn delete_pet(&self, id: i64) -> Result<bool>;

    // Appointments
    async fn list_appointments(&self) -> Result<Vec<Appointment>>;

    async fn list_appointments_by_owner(&self, owner_id: i64) -> Result<Vec<Appointment>>;

    async fn get_appointment(&self, id: i64) -> Result<Option<Appointment>>;

    async fn create_appointment(
        &self,
        appointment: NewAppointment,
        owner_id: i64,
    ) -> Result<Appointment>;

    async fn update_appointment(
        &self,
        id: i64,
        appointment: NewAppointment,
        owner_id: i64,
    ) -> Result<Option<Appointment>>;

    async fn delete_appointment(&self, id: i64) -> Result<bool>;

    /// Round-trip to the backing store for health checks
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
