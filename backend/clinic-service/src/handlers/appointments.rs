/// /appointments handlers
///
/// Appointments carry their own owner_id. Only staff and admin book them;
/// owner-role callers may view, reschedule or cancel their own.
use actix_middleware::AuthenticatedUser;
use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::handlers::{Access, IdQuery};
use crate::models::NewAppointment;
use crate::policy::{Resource, Verb};
use crate::AppState;

/// GET /appointments lists, GET /appointments?id= reads one
pub async fn get_appointments(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<IdQuery>,
) -> Result<HttpResponse> {
    match query.id {
        Some(id) => read_appointment(&state, &user, id).await,
        None => list_appointments(&state, &user).await,
    }
}

async fn list_appointments(state: &AppState, user: &AuthenticatedUser) -> Result<HttpResponse> {
    let access = Access::new(&state.policy, user, Resource::Appointment, Verb::List);

    let appointments = match access.admit()? {
        Some(owner_id) => state
            .repo
            .list_appointments_by_owner(owner_id)
            .await
            .map_err(access.storage("list_appointments_by_owner"))?,
        None => state
            .repo
            .list_appointments()
            .await
            .map_err(access.storage("list_appointments"))?,
    };

    Ok(HttpResponse::Ok().json(appointments))
}

async fn read_appointment(
    state: &AppState,
    user: &AuthenticatedUser,
    id: i64,
) -> Result<HttpResponse> {
    let access = Access::new(&state.policy, user, Resource::Appointment, Verb::Read);
    access.admit()?;

    let appointment = state
        .repo
        .get_appointment(id)
        .await
        .map_err(access.storage("get_appointment"))?
        .ok_or_else(|| access.not_found(id))?;
    access.authorize(appointment.owner_id)?;

    Ok(HttpResponse::Ok().json(appointment))
}

/// The booked pet must exist and belong to the appointment's owner
async fn check_pet(state: &AppState, access: &Access<'_>, pet_id: i64, owner_id: i64) -> Result<()> {
    let pet = state
        .repo
        .get_pet(pet_id)
        .await
        .map_err(access.storage("get_pet"))?
        .ok_or_else(|| AppError::BadRequest(format!("pet {} does not exist", pet_id)))?;

    if pet.owner_id != owner_id {
        return Err(AppError::BadRequest(format!(
            "pet {} does not belong to owner {}",
            pet_id, owner_id
        )));
    }

    Ok(())
}

fn required_owner(owner_id: Option<i64>) -> Result<i64> {
    owner_id.ok_or_else(|| AppError::BadRequest("owner_id is required".to_string()))
}

/// POST /appointments (staff and admin)
pub async fn create_appointment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<NewAppointment>,
) -> Result<HttpResponse> {
    let access = Access::new(&state.policy, &user, Resource::Appointment, Verb::Create);
    access.admit()?;

    let payload = body.into_inner();
    payload.validate()?;

    let owner_id = required_owner(payload.owner_id)?;
    check_pet(&state, &access, payload.pet_id, owner_id).await?;

    let appointment = state
        .repo
        .create_appointment(payload, owner_id)
        .await
        .map_err(access.storage("create_appointment"))?;

    tracing::info!(
        appointment_id = appointment.id,
        owner_id,
        user_id = user.user_id(),
        "Appointment created"
    );
    Ok(HttpResponse::Created().json(appointment))
}

/// PUT /appointments?id=
pub async fn update_appointment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<IdQuery>,
    body: web::Json<NewAppointment>,
) -> Result<HttpResponse> {
    let id = query.required()?;
    let access = Access::new(&state.policy, &user, Resource::Appointment, Verb::Update);
    access.admit()?;

    let payload = body.into_inner();
    payload.validate()?;

    let existing = state
        .repo
        .get_appointment(id)
        .await
        .map_err(access.storage("get_appointment"))?
        .ok_or_else(|| access.not_found(id))?;
    access.authorize(existing.owner_id)?;

    let owner_id = if access.is_elevated() {
        required_owner(payload.owner_id)?
    } else {
        existing.owner_id
    };
    check_pet(&state, &access, payload.pet_id, owner_id).await?;

    let appointment = state
        .repo
        .update_appointment(id, payload, owner_id)
        .await
        .map_err(access.storage("update_appointment"))?
        .ok_or_else(|| access.not_found(id))?;

    Ok(HttpResponse::Ok().json(appointment))
}

/// DELETE /appointments?id=
pub async fn delete_appointment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<IdQuery>,
) -> Result<HttpResponse> {
    let id = query.required()?;

    let access = Access::new(&state.policy, &user, Resource::Appointment, Verb::Delete);
    access.admit()?;

    let existing = state
        .repo
        .get_appointment(id)
        .await
        .map_err(access.storage("get_appointment"))?
        .ok_or_else(|| access.not_found(id))?;
    access.authorize(existing.owner_id)?;

    let deleted = state
        .repo
        .delete_appointment(id)
        .await
        .map_err(access.storage("delete_appointment"))?;
    if !deleted {
        return Err(access.not_found(id));
    }

    tracing::info!(appointment_id = id, user_id = user.user_id(), "Appointment cancelled");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id, "deleted": true })))
}
