pub mod appointments;
pub mod auth;
pub mod files;
pub mod health;
pub mod owners;
pub mod pets;

use actix_middleware::AuthenticatedUser;
use actix_web::HttpResponse;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::metrics;
use crate::policy::{Action, Decision, PolicyTable, Resource, Verb};

/// `?id=` selector shared by the resource routes
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<i64>,
}

impl IdQuery {
    pub fn required(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| AppError::BadRequest("missing id query parameter".to_string()))
    }
}

/// Default service for resource paths
pub async fn method_not_allowed() -> Result<HttpResponse> {
    Err(AppError::MethodNotAllowed)
}

/// One policy-checked operation on behalf of the caller.
///
/// Denials and storage failures are logged and counted here, with the route,
/// verb and caller attached.
pub(crate) struct Access<'a> {
    policy: &'a PolicyTable,
    user: &'a AuthenticatedUser,
    resource: Resource,
    verb: Verb,
}

impl<'a> Access<'a> {
    pub fn new(
        policy: &'a PolicyTable,
        user: &'a AuthenticatedUser,
        resource: Resource,
        verb: Verb,
    ) -> Self {
        Self {
            policy,
            user,
            resource,
            verb,
        }
    }

    /// Route and verb checks, before any record is loaded
    pub fn admit(&self) -> Result<Option<i64>> {
        let decision = self
            .policy
            .admits(self.user.claims(), self.resource, self.verb);
        self.settle(decision, None)
    }

    /// Full check against the owner key of a loaded record
    pub fn authorize(&self, target_owner_id: i64) -> Result<Option<i64>> {
        let action = Action::on_record(self.resource, self.verb, target_owner_id);
        let decision = self.policy.authorize(self.user.claims(), &action);
        self.settle(decision, Some(target_owner_id))
    }

    fn settle(&self, decision: Decision, target: Option<i64>) -> Result<Option<i64>> {
        if let Decision::Deny(denial) = decision {
            tracing::warn!(
                route = self.resource.route(),
                verb = self.verb.as_str(),
                user_id = self.user.user_id(),
                role = %self.user.role(),
                target_owner_id = ?target,
                reason = denial.as_str(),
                "Authorization denied"
            );
            metrics::record_denial(self.resource.as_str(), self.verb.as_str(), denial.as_str());
        }
        decision.into_result()
    }

    pub fn is_elevated(&self) -> bool {
        self.user.role().is_elevated()
    }

    pub fn user_id(&self) -> i64 {
        self.user.user_id()
    }

    /// Attach request context to a failed repository call
    pub fn storage(&self, operation: &'static str) -> impl FnOnce(AppError) -> AppError + '_ {
        move |err| {
            if err.is_internal() {
                tracing::error!(
                    route = self.resource.route(),
                    verb = self.verb.as_str(),
                    user_id = self.user.user_id(),
                    operation,
                    error = %err,
                    "Storage operation failed"
                );
                metrics::record_storage_error(operation);
            }
            err
        }
    }

    pub fn not_found(&self, id: i64) -> AppError {
        AppError::NotFound(format!("{} {}", self.resource.as_str(), id))
    }
}
