/// /pets handlers
///
/// Owner-role callers see and change only their own pets; a pet they create
/// is always bound to them. Staff and admin act on any pet.
use actix_middleware::AuthenticatedUser;
use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::handlers::{Access, IdQuery};
use crate::models::NewPet;
use crate::policy::{Resource, Verb};
use crate::AppState;

/// GET /pets lists, GET /pets?id= reads one
pub async fn get_pets(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<IdQuery>,
) -> Result<HttpResponse> {
    match query.id {
        Some(id) => read_pet(&state, &user, id).await,
        None => list_pets(&state, &user).await,
    }
}

async fn list_pets(state: &AppState, user: &AuthenticatedUser) -> Result<HttpResponse> {
    let access = Access::new(&state.policy, user, Resource::Pet, Verb::List);

    let pets = match access.admit()? {
        Some(owner_id) => state
            .repo
            .list_pets_by_owner(owner_id)
            .await
            .map_err(access.storage("list_pets_by_owner"))?,
        None => state
            .repo
            .list_pets()
            .await
            .map_err(access.storage("list_pets"))?,
    };

    Ok(HttpResponse::Ok().json(pets))
}

async fn read_pet(state: &AppState, user: &AuthenticatedUser, id: i64) -> Result<HttpResponse> {
    let access = Access::new(&state.policy, user, Resource::Pet, Verb::Read);
    access.admit()?;

    let pet = state
        .repo
        .get_pet(id)
        .await
        .map_err(access.storage("get_pet"))?
        .ok_or_else(|| access.not_found(id))?;
    access.authorize(pet.owner_id)?;

    Ok(HttpResponse::Ok().json(pet))
}

/// Owner of the record after a create or update, checked to exist
async fn resolve_owner(
    state: &AppState,
    access: &Access<'_>,
    requested: Option<i64>,
) -> Result<i64> {
    let owner_id = requested
        .ok_or_else(|| AppError::BadRequest("owner_id is required".to_string()))?;

    let exists = state
        .repo
        .get_owner(owner_id)
        .await
        .map_err(access.storage("get_owner"))?
        .is_some();
    if !exists {
        return Err(AppError::BadRequest(format!(
            "owner {} does not exist",
            owner_id
        )));
    }

    Ok(owner_id)
}

/// POST /pets
pub async fn create_pet(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<NewPet>,
) -> Result<HttpResponse> {
    let access = Access::new(&state.policy, &user, Resource::Pet, Verb::Create);
    access.admit()?;

    let payload = body.into_inner();
    payload.validate()?;

    let requested = if access.is_elevated() {
        payload.owner_id
    } else {
        Some(access.user_id())
    };
    let owner_id = resolve_owner(&state, &access, requested).await?;

    let pet = state
        .repo
        .create_pet(payload, owner_id)
        .await
        .map_err(access.storage("create_pet"))?;

    tracing::info!(pet_id = pet.id, owner_id, user_id = user.user_id(), "Pet created");
    Ok(HttpResponse::Created().json(pet))
}

/// PUT /pets?id=
pub async fn update_pet(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<IdQuery>,
    body: web::Json<NewPet>,
) -> Result<HttpResponse> {
    let id = query.required()?;
    let access = Access::new(&state.policy, &user, Resource::Pet, Verb::Update);
    access.admit()?;

    let payload = body.into_inner();
    payload.validate()?;

    let existing = state
        .repo
        .get_pet(id)
        .await
        .map_err(access.storage("get_pet"))?
        .ok_or_else(|| access.not_found(id))?;
    access.authorize(existing.owner_id)?;

    // Owner-role callers cannot hand a pet to someone else
    let owner_id = if access.is_elevated() {
        resolve_owner(&state, &access, payload.owner_id).await?
    } else {
        existing.owner_id
    };

    let pet = state
        .repo
        .update_pet(id, payload, owner_id)
        .await
        .map_err(access.storage("update_pet"))?
        .ok_or_else(|| access.not_found(id))?;

    Ok(HttpResponse::Ok().json(pet))
}

/// DELETE /pets?id=
pub async fn delete_pet(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<IdQuery>,
) -> Result<HttpResponse> {
    let id = query.required()?;

    let access = Access::new(&state.policy, &user, Resource::Pet, Verb::Delete);
    access.admit()?;

    let existing = state
        .repo
        .get_pet(id)
        .await
        .map_err(access.storage("get_pet"))?
        .ok_or_else(|| access.not_found(id))?;
    access.authorize(existing.owner_id)?;

    let deleted = state
        .repo
        .delete_pet(id)
        .await
        .map_err(access.storage("delete_pet"))?;
    if !deleted {
        return Err(access.not_found(id));
    }

    tracing::info!(pet_id = id, user_id = user.user_id(), "Pet deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id, "deleted": true })))
}
