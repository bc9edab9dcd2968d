/// In-process repository backed by ordered maps, for tests and local runs
use std::collections::BTreeMap;

use crypto_core::Role;
use tokio::sync::RwLock;

use crate::db::ClinicRepository;
use crate::error::{AppError, Result};
use crate::models::{Appointment, NewAppointment, NewOwner, NewPet, Owner, Pet, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    owners: BTreeMap<i64, Owner>,
    pets: BTreeMap<i64, Pet>,
    appointments: BTreeMap<i64, Appointment>,
    // Last id handed out per table; never reused, like a BIGSERIAL sequence
    user_seq: i64,
    owner_seq: i64,
    pet_seq: i64,
    appointment_seq: i64,
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Default)]
pub struct MemoryClinicRepository {
    tables: RwLock<Tables>,
}

impl MemoryClinicRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an owner record under a fixed id, replacing any existing one
    pub async fn insert_owner(&self, owner: Owner) -> Owner {
        let mut tables = self.tables.write().await;
        tables.owner_seq = tables.owner_seq.max(owner.id);
        tables.owners.insert(owner.id, owner.clone());
        owner
    }
}

#[async_trait::async_trait]
impl ClinicRepository for MemoryClinicRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, email: &str, password_hash: &str, role: Role) -> Result<User> {
        let email = email.to_lowercase();
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == email) {
            return Err(AppError::Storage(format!("duplicate email {}", email)));
        }

        let user = User {
            id: next_id(&mut tables.user_seq),
            email,
            password_hash: password_hash.to_string(),
            role,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_owners(&self) -> Result<Vec<Owner>> {
        let tables = self.tables.read().await;
        Ok(tables.owners.values().cloned().collect())
    }

    async fn get_owner(&self, id: i64) -> Result<Option<Owner>> {
        let tables = self.tables.read().await;
        Ok(tables.owners.get(&id).cloned())
    }

    async fn create_owner(&self, owner: NewOwner) -> Result<Owner> {
        let mut tables = self.tables.write().await;
        let owner = owner.into_owner(next_id(&mut tables.owner_seq));
        tables.owners.insert(owner.id, owner.clone());
        Ok(owner)
    }

    async fn update_owner(&self, id: i64, owner: NewOwner) -> Result<Option<Owner>> {
        let mut tables = self.tables.write().await;
        Ok(tables.owners.get_mut(&id).map(|slot| {
            *slot = owner.into_owner(id);
            slot.clone()
        }))
    }

    async fn delete_owner(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.owners.remove(&id).is_none() {
            return Ok(false);
        }

        // Mirrors ON DELETE CASCADE
        tables.pets.retain(|_, pet| pet.owner_id != id);
        tables.appointments.retain(|_, appt| appt.owner_id != id);
        Ok(true)
    }

    async fn list_pets(&self) -> Result<Vec<Pet>> {
        let tables = self.tables.read().await;
        Ok(tables.pets.values().cloned().collect())
    }

    async fn list_pets_by_owner(&self, owner_id: i64) -> Result<Vec<Pet>> {
        let tables = self.tables.read().await;
        Ok(tables
            .pets
            .values()
            .filter(|pet| pet.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_pet(&self, id: i64) -> Result<Option<Pet>> {
        let tables = self.tables.read().await;
        Ok(tables.pets.get(&id).cloned())
    }

    async fn create_pet(&self, pet: NewPet, owner_id: i64) -> Result<Pet> {
        let mut tables = self.tables.write().await;
        let pet = pet.into_pet(next_id(&mut tables.pet_seq), owner_id);
        tables.pets.insert(pet.id, pet.clone());
        Ok(pet)
    }

    async fn update_pet(&self, id: i64, pet: NewPet, owner_id: i64) -> Result<Option<Pet>> {
        let mut tables = self.tables.write().await;
        Ok(tables.pets.get_mut(&id).map(|slot| {
            *slot = pet.into_pet(id, owner_id);
            slot.clone()
        }))
    }

    async fn delete_pet(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.pets.remove(&id).is_none() {
            return Ok(false);
        }

        tables.appointments.retain(|_, appt| appt.pet_id != id);
        Ok(true)
    }

    async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        let tables = self.tables.read().await;
        Ok(tables.appointments.values().cloned().collect())
    }

    async fn list_appointments_by_owner(&self, owner_id: i64) -> Result<Vec<Appointment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .appointments
            .values()
            .filter(|appt| appt.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_appointment(&self, id: i64) -> Result<Option<Appointment>> {
        let tables = self.tables.read().await;
        Ok(tables.appointments.get(&id).cloned())
    }

    async fn create_appointment(
        &self,
        appointment: NewAppointment,
        owner_id: i64,
    ) -> Result<Appointment> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.appointment_seq);
        let appointment = appointment.into_appointment(id, owner_id);
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment(
        &self,
        id: i64,
        appointment: NewAppointment,
        owner_id: i64,
    ) -> Result<Option<Appointment>> {
        let mut tables = self.tables.write().await;
        Ok(tables.appointments.get_mut(&id).map(|slot| {
            *slot = appointment.into_appointment(id, owner_id);
            slot.clone()
        }))
    }

    async fn delete_appointment(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.appointments.remove(&id).is_some())
    }
}
