/// PostgreSQL repository - all SQL for users, owners, pets and appointments
use crypto_core::Role;
use sqlx::PgPool;

use crate::db::ClinicRepository;
use crate::error::{AppError, Result};
use crate::models::{Appointment, NewAppointment, NewOwner, NewPet, Owner, Pet, User};

#[derive(Clone)]
pub struct PgClinicRepository {
    pool: PgPool,
}

impl PgClinicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Raw users row; the role column is TEXT
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| AppError::Storage(format!("user {}: {}", row.id, e)))?;

        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            role,
        })
    }
}

#[async_trait::async_trait]
impl ClinicRepository for PgClinicRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, role
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create_user(&self, email: &str, password_hash: &str, role: Role) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, role
            "#,
        )
        .bind(email.to_lowercase())
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        User::try_from(row)
    }

    async fn list_owners(&self) -> Result<Vec<Owner>> {
        let owners = sqlx::query_as::<_, Owner>(
            "SELECT id, name, contact, email FROM owners ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(owners)
    }

    async fn get_owner(&self, id: i64) -> Result<Option<Owner>> {
        let owner = sqlx::query_as::<_, Owner>(
            "SELECT id, name, contact, email FROM owners WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    async fn create_owner(&self, owner: NewOwner) -> Result<Owner> {
        let owner = sqlx::query_as::<_, Owner>(
            r#"
            INSERT INTO owners (name, contact, email)
            VALUES ($1, $2, $3)
            RETURNING id, name, contact, email
            "#,
        )
        .bind(&owner.name)
        .bind(&owner.contact)
        .bind(&owner.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(owner)
    }

    async fn update_owner(&self, id: i64, owner: NewOwner) -> Result<Option<Owner>> {
        let owner = sqlx::query_as::<_, Owner>(
            r#"
            UPDATE owners
            SET name = $2, contact = $3, email = $4
            WHERE id = $1
            RETURNING id, name, contact, email
            "#,
        )
        .bind(id)
        .bind(&owner.name)
        .bind(&owner.contact)
        .bind(&owner.email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    async fn delete_owner(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM owners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_pets(&self) -> Result<Vec<Pet>> {
        let pets = sqlx::query_as::<_, Pet>(
            "SELECT id, name, species, breed, owner_id, history FROM pets ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pets)
    }

    async fn list_pets_by_owner(&self, owner_id: i64) -> Result<Vec<Pet>> {
        let pets = sqlx::query_as::<_, Pet>(
            r#"
            SELECT id, name, species, breed, owner_id, history
            FROM pets
            WHERE owner_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pets)
    }

    async fn get_pet(&self, id: i64) -> Result<Option<Pet>> {
        let pet = sqlx::query_as::<_, Pet>(
            "SELECT id, name, species, breed, owner_id, history FROM pets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pet)
    }

    async fn create_pet(&self, pet: NewPet, owner_id: i64) -> Result<Pet> {
        let pet = sqlx::query_as::<_, Pet>(
            r#"
            INSERT INTO pets (name, species, breed, owner_id, history)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, species, breed, owner_id, history
            "#,
        )
        .bind(&pet.name)
        .bind(&pet.species)
        .bind(&pet.breed)
        .bind(owner_id)
        .bind(&pet.history)
        .fetch_one(&self.pool)
        .await?;

        Ok(pet)
    }

    async fn update_pet(&self, id: i64, pet: NewPet, owner_id: i64) -> Result<Option<Pet>> {
        let pet = sqlx::query_as::<_, Pet>(
            r#"
            UPDATE pets
            SET name = $2, species = $3, breed = $4, owner_id = $5, history = $6
            WHERE id = $1
            RETURNING id, name, species, breed, owner_id, history
            "#,
        )
        .bind(id)
        .bind(&pet.name)
        .bind(&pet.species)
        .bind(&pet.breed)
        .bind(owner_id)
        .bind(&pet.history)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pet)
    }

    async fn delete_pet(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, date, time, pet_id, reason, owner_id
            FROM appointments
            ORDER BY date, time, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments)
    }

    async fn list_appointments_by_owner(&self, owner_id: i64) -> Result<Vec<Appointment>> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, date, time, pet_id, reason, owner_id
            FROM appointments
            WHERE owner_id = $1
            ORDER BY date, time, id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments)
    }

    async fn get_appointment(&self, id: i64) -> Result<Option<Appointment>> {
        let appointment = sqlx::query_as::<_, Appointment>(
            "SELECT id, date, time, pet_id, reason, owner_id FROM appointments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn create_appointment(
        &self,
        appointment: NewAppointment,
        owner_id: i64,
    ) -> Result<Appointment> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (date, time, pet_id, reason, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, date, time, pet_id, reason, owner_id
            "#,
        )
        .bind(appointment.date)
        .bind(&appointment.time)
        .bind(appointment.pet_id)
        .bind(&appointment.reason)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn update_appointment(
        &self,
        id: i64,
        appointment: NewAppointment,
        owner_id: i64,
    ) -> Result<Option<Appointment>> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET date = $2, time = $3, pet_id = $4, reason = $5, owner_id = $6
            WHERE id = $1
            RETURNING id, date, time, pet_id, reason, owner_id
            "#,
        )
        .bind(id)
        .bind(appointment.date)
        .bind(&appointment.time)
        .bind(appointment.pet_id)
        .bind(&appointment.reason)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn delete_appointment(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
