/// Bearer credential middleware
///
/// Validates the `Authorization: Bearer <token>` header once per request and
/// stores the verified claims as a typed `AuthenticatedUser` in the request
/// extensions. Handlers receive identity through the `AuthenticatedUser`
/// extractor and never look at the header themselves.
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, StatusCode},
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use crypto_core::jwt::{AuthError, Claims, JwtCodec, Role};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// Verified identity of the caller for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Claims);

impl AuthenticatedUser {
    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    pub fn claims(&self) -> &Claims {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("Authorization header must use the Bearer scheme")]
    InvalidScheme,

    #[error("invalid credential: {0}")]
    Invalid(#[from] AuthError),

    #[error("request was not authenticated")]
    NotAuthenticated,
}

impl ResponseError for IdentityError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    // Every variant gets the same body; callers cannot tell which check failed.
    fn error_response(&self) -> HttpResponse {
        HttpResponse::Unauthorized()
            .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
            .json(serde_json::json!({
                "error": "UNAUTHORIZED",
                "message": "Missing or invalid credential",
            }))
    }
}

/// Pull the raw token out of the Authorization header
fn bearer_token(req: &ServiceRequest) -> Result<&str, IdentityError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(IdentityError::MissingHeader)?
        .to_str()
        .map_err(|_| IdentityError::InvalidScheme)?;

    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(IdentityError::InvalidScheme)
}

fn authenticate(codec: &JwtCodec, req: &ServiceRequest) -> Result<Claims, IdentityError> {
    let token = bearer_token(req)?;
    Ok(codec.validate(token)?)
}

/// JWT authentication middleware factory
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    codec: Arc<JwtCodec>,
}

impl JwtAuthMiddleware {
    pub fn new(codec: Arc<JwtCodec>) -> Self {
        Self { codec }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service,
            codec: self.codec.clone(),
        }))
    }
}

/// JWT authentication middleware service
pub struct JwtAuthMiddlewareService<S> {
    service: S,
    codec: Arc<JwtCodec>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&self.codec, &req) {
            Ok(claims) => {
                req.extensions_mut().insert(AuthenticatedUser(claims));

                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(e) => {
                tracing::warn!(
                    method = %req.method(),
                    path = %req.path(),
                    reason = %e,
                    "Credential rejected"
                );

                let response = e.error_response();
                let res = req.into_response(response).map_into_right_body();
                Box::pin(async move { Ok(res) })
            }
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = IdentityError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or(IdentityError::NotAuthenticated),
        )
    }
}
