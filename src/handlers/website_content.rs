use axum::{extract::State, response::Response, routing::get, Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{
    created_response, no_content_response, require_id, ApiQuery, CurrentOrganization,
    ValidatedJson,
};
use crate::common::IdQuery;
use crate::errors::ServiceError;
use crate::models::content::{ContentBlock, ContentKind};
use crate::services::content::{ContentPatch, NewContent};
use crate::AppState;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContentQuery {
    /// banner | page | faq | announcement; all kinds when omitted
    #[serde(rename = "type")]
    #[param(inline)]
    pub kind: Option<ContentKind>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentRequest {
    pub id: Uuid,
    #[serde(flatten)]
    #[validate]
    pub patch: ContentPatch,
}

pub fn website_content_routes() -> Router<AppState> {
    Router::new().route(
        "/website-content",
        get(list_content)
            .post(create_content)
            .put(update_content)
            .delete(delete_content),
    )
}

/// List storefront content, optionally of one kind
#[utoipa::path(
    get,
    path = "/api/website-content",
    tag = "Website Content",
    params(ContentQuery),
    responses(
        (status = 200, description = "Content ordered by position then title", body = Vec<ContentBlock>),
        (status = 400, description = "Unknown content type", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_content(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ApiQuery(query): ApiQuery<ContentQuery>,
) -> Result<Json<Vec<ContentBlock>>, ServiceError> {
    let blocks = state
        .services
        .content
        .list(organization_id, query.kind)
        .await?;
    Ok(Json(blocks))
}

/// Create a banner, page, FAQ entry or announcement
#[utoipa::path(
    post,
    path = "/api/website-content",
    tag = "Website Content",
    request_body = NewContent,
    responses(
        (status = 201, description = "Content created", body = ContentBlock),
        (status = 400, description = "Invalid payload or slug in use", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_content(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ValidatedJson(content): ValidatedJson<NewContent>,
) -> Result<Response, ServiceError> {
    let block = state
        .services
        .content
        .create(organization_id, content)
        .await?;
    Ok(created_response(block))
}

/// Update content
#[utoipa::path(
    put,
    path = "/api/website-content",
    tag = "Website Content",
    request_body = UpdateContentRequest,
    responses(
        (status = 200, description = "Content updated", body = ContentBlock),
        (status = 400, description = "Invalid payload or slug in use", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization or content not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_content(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ValidatedJson(request): ValidatedJson<UpdateContentRequest>,
) -> Result<Json<ContentBlock>, ServiceError> {
    let block = state
        .services
        .content
        .update(organization_id, request.id, request.patch)
        .await?;
    Ok(Json(block))
}

/// Delete content
#[utoipa::path(
    delete,
    path = "/api/website-content",
    tag = "Website Content",
    params(IdQuery),
    responses(
        (status = 204, description = "Content deleted"),
        (status = 400, description = "Missing id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization or content not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_content(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Response, ServiceError> {
    let id = require_id(query.id)?;
    state.services.content.delete(organization_id, id).await?;
    Ok(no_content_response())
}
