//! Bearer authentication for the router.
//!
//! `auth_middleware` resolves an `Authorization: Bearer ..` header through the
//! [`SessionValidator`] port and stores the resulting [`AuthenticatedUser`] in
//! the request extensions. A request without the header passes through
//! untouched; each handler picks an extractor that states how much identity
//! it needs.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{header, request::Parts, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::adapters::http::error::{ApiError, ErrorResponse};
use crate::domain::foundation::{AuthError, AuthenticatedUser, ErrorCode, UserId};
use crate::ports::SessionValidator;

pub type AuthState = Arc<dyn SessionValidator>;

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

pub async fn auth_middleware(
    State(validator): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return next.run(request).await;
    };

    match validator.validate(token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(AuthError::ServiceUnavailable(reason)) => {
            tracing::error!(%reason, "session validation unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new(
                    ErrorCode::Unauthorized,
                    "session validation is temporarily unavailable",
                )),
            )
                .into_response()
        }
        Err(rejected) => {
            tracing::debug!(error = %rejected, "bearer token rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(ErrorCode::Unauthorized, rejected.to_string())),
            )
                .into_response()
        }
    }
}

fn caller_of(parts: &Parts) -> Option<AuthenticatedUser> {
    parts.extensions.get::<AuthenticatedUser>().cloned()
}

/// Any authenticated caller; 401 otherwise.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

/// The caller if a valid token was sent. Never rejects.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

/// A support agent; 401 without a caller, 403 for anyone else.
#[derive(Debug, Clone)]
pub struct RequireAgent(pub AuthenticatedUser);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_of(parts)
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(caller_of(parts)))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequireAgent {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match caller_of(parts) {
            Some(user) if user.is_agent() => Ok(RequireAgent(user)),
            Some(_) => Err(AuthRejection::NotAnAgent),
            None => Err(AuthRejection::Unauthenticated),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    Unauthenticated,
    NotAnAgent,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "a bearer token is required",
            ),
            Self::NotAnAgent => (
                StatusCode::FORBIDDEN,
                ErrorCode::Forbidden,
                "only support agents may do this",
            ),
        };
        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

/// Acting user for endpoints whose body names a `user_id`.
///
/// A bearer identity, when present, must agree with the body.
pub fn resolve_caller(
    caller: Option<&AuthenticatedUser>,
    body_user_id: &str,
) -> Result<UserId, ApiError> {
    let claimed = UserId::new(body_user_id)
        .map_err(|_| ApiError::bad_request("user_id", "user_id is required"))?;

    if let Some(user) = caller {
        if user.id != claimed {
            return Err(ApiError::bad_request(
                "user_id",
                "user_id does not match the authenticated user",
            ));
        }
    }
    Ok(claimed)
}
