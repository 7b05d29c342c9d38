use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::AppState;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

pub fn require_id(id: Option<Uuid>) -> Result<Uuid, ServiceError> {
    id.ok_or_else(|| ServiceError::ValidationError("id is required".to_string()))
}

/// JSON body that has passed its `validator` rules.
///
/// Malformed JSON, unknown `type` tags and rule violations all reject with
/// a 400 `ErrorResponse`.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string that rejects with a JSON 400 instead of axum's plain text.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Organization of the authenticated caller.
///
/// Rejects with 401 when the auth middleware did not run or found no user,
/// and with 404 when the user has no resolvable organization.
#[derive(Debug, Clone, Copy)]
pub struct CurrentOrganization(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for CurrentOrganization {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthUser>()
            .ok_or_else(|| ServiceError::Unauthorized("no authenticated user".to_string()))?;

        state
            .tenants
            .organization_for_user(user.user_id)
            .await?
            .map(CurrentOrganization)
            .ok_or_else(ServiceError::organization_not_found)
    }
}
