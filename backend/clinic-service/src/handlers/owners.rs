/// /owners handlers
///
/// An owner record is keyed by its own id, so an owner-role caller may read
/// and update exactly one record: the one whose id equals their user id.
use actix_middleware::AuthenticatedUser;
use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::Result;
use crate::handlers::{Access, IdQuery};
use crate::models::{NewOwner, Owner};
use crate::policy::{Resource, Verb};
use crate::AppState;

/// GET /owners lists, GET /owners?id= reads one
pub async fn get_owners(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<IdQuery>,
) -> Result<HttpResponse> {
    match query.id {
        Some(id) => read_owner(&state, &user, id).await,
        None => list_owners(&state, &user).await,
    }
}

async fn list_owners(state: &AppState, user: &AuthenticatedUser) -> Result<HttpResponse> {
    let access = Access::new(&state.policy, user, Resource::Owner, Verb::List);

    let owners: Vec<Owner> = match access.admit()? {
        Some(owner_id) => state
            .repo
            .get_owner(owner_id)
            .await
            .map_err(access.storage("get_owner"))?
            .into_iter()
            .collect(),
        None => state
            .repo
            .list_owners()
            .await
            .map_err(access.storage("list_owners"))?,
    };

    Ok(HttpResponse::Ok().json(owners))
}

async fn read_owner(state: &AppState, user: &AuthenticatedUser, id: i64) -> Result<HttpResponse> {
    let access = Access::new(&state.policy, user, Resource::Owner, Verb::Read);
    access.admit()?;

    let owner = state
        .repo
        .get_owner(id)
        .await
        .map_err(access.storage("get_owner"))?
        .ok_or_else(|| access.not_found(id))?;
    access.authorize(owner.owner_key())?;

    Ok(HttpResponse::Ok().json(owner))
}

/// POST /owners (staff and admin)
pub async fn create_owner(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<NewOwner>,
) -> Result<HttpResponse> {
    let access = Access::new(&state.policy, &user, Resource::Owner, Verb::Create);
    access.admit()?;

    let payload = body.into_inner();
    payload.validate()?;

    let owner = state
        .repo
        .create_owner(payload)
        .await
        .map_err(access.storage("create_owner"))?;

    tracing::info!(owner_id = owner.id, user_id = user.user_id(), "Owner created");
    Ok(HttpResponse::Created().json(owner))
}

/// PUT /owners?id=
pub async fn update_owner(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<IdQuery>,
    body: web::Json<NewOwner>,
) -> Result<HttpResponse> {
    let id = query.required()?;
    let access = Access::new(&state.policy, &user, Resource::Owner, Verb::Update);
    access.admit()?;

    let payload = body.into_inner();
    payload.validate()?;

    let existing = state
        .repo
        .get_owner(id)
        .await
        .map_err(access.storage("get_owner"))?
        .ok_or_else(|| access.not_found(id))?;
    access.authorize(existing.owner_key())?;

    let owner = state
        .repo
        .update_owner(id, payload)
        .await
        .map_err(access.storage("update_owner"))?
        .ok_or_else(|| access.not_found(id))?;

    Ok(HttpResponse::Ok().json(owner))
}

/// DELETE /owners?id= (staff and admin); removes the owner's pets and appointments too
pub async fn delete_owner(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<IdQuery>,
) -> Result<HttpResponse> {
    let id = query.required()?;

    let access = Access::new(&state.policy, &user, Resource::Owner, Verb::Delete);
    access.admit()?;

    let existing = state
        .repo
        .get_owner(id)
        .await
        .map_err(access.storage("get_owner"))?
        .ok_or_else(|| access.not_found(id))?;
    access.authorize(existing.owner_key())?;

    let deleted = state
        .repo
        .delete_owner(id)
        .await
        .map_err(access.storage("delete_owner"))?;
    if !deleted {
        return Err(access.not_found(id));
    }

    tracing::info!(owner_id = id, user_id = user.user_id(), "Owner deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id, "deleted": true })))
}
