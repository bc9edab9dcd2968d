//! Request logging middleware
//!
//! Emits one event per completed request with the caller identity resolved
//! by `JwtAuthMiddleware`, if any. Server errors log at error level and
//! client errors other than 404 at warn.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::time::Instant;

use crate::jwt_auth::AuthenticatedUser;

/// Middleware that logs HTTP requests and responses
#[derive(Clone, Default)]
pub struct Logging;

impl<S, B> Transform<S, ServiceRequest> for Logging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggingService { service }))
    }
}

pub struct LoggingService<S> {
    service: S,
}

/// Identity recorded on the request by the auth middleware
fn caller<B>(res: &ServiceResponse<B>) -> (Option<i64>, Option<&'static str>) {
    match res.request().extensions().get::<AuthenticatedUser>() {
        Some(user) => (Some(user.user_id()), Some(user.role().as_str())),
        None => (None, None),
    }
}

impl<S, B> Service<ServiceRequest> for LoggingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_string();
        let query = req.query_string().to_string();

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status();
            let duration_ms = start.elapsed().as_millis() as u64;
            let (user_id, role) = caller(&res);

            macro_rules! log_completed {
                ($level:ident) => {
                    tracing::$level!(
                        method = %method,
                        path = %path,
                        query = %query,
                        status = status.as_u16(),
                        user_id = ?user_id,
                        role = ?role,
                        duration_ms,
                        "HTTP request completed"
                    )
                };
            }

            if status.is_server_error() {
                log_completed!(error);
            } else if status.is_client_error() && status != StatusCode::NOT_FOUND {
                log_completed!(warn);
            } else {
                log_completed!(info);
            }

            Ok(res)
        })
    }
}
