use actix_web::{web, HttpResponse};
use crypto_core::password::{verify_against_decoy, verify_password, PasswordError};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account identifier; not required to be an email address
    #[validate(length(min = 1))]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("invalid email or password".to_string())
}

/// POST /login
///
/// Unknown email and wrong password produce the same 401.
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let user = state
        .repo
        .find_user_by_email(&req.email)
        .await
        .map_err(|e| {
            tracing::error!(route = "/login", error = %e, "User lookup failed");
            e
        })?;

    let Some(user) = user else {
        verify_against_decoy(&req.password);
        tracing::info!("Login rejected: unknown email");
        return Err(invalid_credentials());
    };

    match verify_password(&req.password, &user.password_hash) {
        Ok(()) => {}
        Err(PasswordError::Mismatch) => {
            tracing::info!(user_id = user.id, "Login rejected: password mismatch");
            return Err(invalid_credentials());
        }
        Err(PasswordError::Hash(e)) => {
            tracing::error!(user_id = user.id, error = %e, "Stored password hash is unreadable");
            return Err(AppError::Internal(e));
        }
    }

    let token = state
        .codec
        .issue(user.id, user.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = user.id, role = %user.role, "Login succeeded");
    Ok(HttpResponse::Ok().json(LoginResponse { token }))
}
