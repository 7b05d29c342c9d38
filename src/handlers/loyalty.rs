use axum::{extract::State, response::Response, routing::get, Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::common::{
    created_response, no_content_response, require_id, success_response, ApiQuery,
    CurrentOrganization, ValidatedJson,
};
use crate::errors::ServiceError;
use crate::models::loyalty::{LoyaltyMember, LoyaltySummary, Redemption, Reward};
use crate::services::loyalty::RewardPatch;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoyaltyView {
    Members,
    Rewards,
    Tiers,
    Summary,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoyaltyQuery {
    /// members | rewards | tiers | summary (default)
    #[serde(rename = "type")]
    #[param(inline)]
    pub view: Option<LoyaltyView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoyaltyRecord {
    Member,
    Reward,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoyaltyDeleteQuery {
    #[serde(rename = "type")]
    #[param(inline)]
    pub record: LoyaltyRecord,
    pub id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub customer_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PointsRequest {
    pub member_id: Uuid,
    /// Positive to award, negative to deduct; never zero
    #[validate(range(min = -1_000_000, max = 1_000_000))]
    pub points: i32,
    #[validate(length(min = 1, max = 200))]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewRewardRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1_000_000))]
    pub points_cost: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub member_id: Uuid,
    pub reward_id: Uuid,
}

/// Body of `POST /api/loyalty`, discriminated by `type`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LoyaltyAction {
    Enroll(EnrollRequest),
    Points(PointsRequest),
    Reward(NewRewardRequest),
    Redeem(RedeemRequest),
}

impl Validate for LoyaltyAction {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Enroll(request) => request.validate(),
            Self::Points(request) => request.validate(),
            Self::Reward(request) => request.validate(),
            Self::Redeem(request) => request.validate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRewardRequest {
    pub id: Uuid,
    #[serde(flatten)]
    #[validate]
    pub patch: RewardPatch,
}

/// Body of `PUT /api/loyalty`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LoyaltyUpdate {
    Reward(UpdateRewardRequest),
}

impl Validate for LoyaltyUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Reward(request) => request.validate(),
        }
    }
}

pub fn loyalty_routes() -> Router<AppState> {
    Router::new().route(
        "/loyalty",
        get(get_loyalty)
            .post(post_loyalty)
            .put(put_loyalty)
            .delete(delete_loyalty),
    )
}

/// Read loyalty members, rewards, tiers or the program summary
#[utoipa::path(
    get,
    path = "/api/loyalty",
    tag = "Loyalty",
    params(LoyaltyQuery),
    responses(
        (status = 200, description = "Requested loyalty view", body = LoyaltySummary),
        (status = 400, description = "Unknown view", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_loyalty(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ApiQuery(query): ApiQuery<LoyaltyQuery>,
) -> Result<Response, ServiceError> {
    let loyalty = &state.services.loyalty;
    let response = match query.view.unwrap_or(LoyaltyView::Summary) {
        LoyaltyView::Members => success_response(loyalty.members(organization_id).await?),
        LoyaltyView::Rewards => success_response(loyalty.rewards(organization_id).await?),
        LoyaltyView::Tiers => success_response(loyalty.tiers(organization_id).await?),
        LoyaltyView::Summary => success_response(loyalty.summary(organization_id).await?),
    };
    Ok(response)
}

/// Enroll a customer, adjust points, create a reward or redeem one
#[utoipa::path(
    post,
    path = "/api/loyalty",
    tag = "Loyalty",
    request_body = LoyaltyAction,
    responses(
        (status = 201, description = "Member enrolled or reward created", body = LoyaltyMember),
        (status = 200, description = "Points adjusted or reward redeemed", body = Redemption),
        (status = 400, description = "Invalid payload, insufficient points or inactive reward", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization, member or reward not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn post_loyalty(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ValidatedJson(action): ValidatedJson<LoyaltyAction>,
) -> Result<Response, ServiceError> {
    let loyalty = &state.services.loyalty;
    let response = match action {
        LoyaltyAction::Enroll(request) => {
            created_response(loyalty.enroll(organization_id, request.customer_id).await?)
        }
        LoyaltyAction::Points(request) => success_response(
            loyalty
                .adjust_points(
                    organization_id,
                    request.member_id,
                    i64::from(request.points),
                    &request.reason,
                )
                .await?,
        ),
        LoyaltyAction::Reward(request) => created_response(
            loyalty
                .create_reward(
                    organization_id,
                    request.name,
                    request.description,
                    i64::from(request.points_cost),
                )
                .await?,
        ),
        LoyaltyAction::Redeem(request) => success_response(
            loyalty
                .redeem(organization_id, request.member_id, request.reward_id)
                .await?,
        ),
    };
    Ok(response)
}

/// Update a reward
#[utoipa::path(
    put,
    path = "/api/loyalty",
    tag = "Loyalty",
    request_body = LoyaltyUpdate,
    responses(
        (status = 200, description = "Reward updated", body = Reward),
        (status = 400, description = "Invalid request payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization or reward not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn put_loyalty(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ValidatedJson(update): ValidatedJson<LoyaltyUpdate>,
) -> Result<Json<Reward>, ServiceError> {
    match update {
        LoyaltyUpdate::Reward(request) => {
            let reward = state
                .services
                .loyalty
                .update_reward(organization_id, request.id, request.patch)
                .await?;
            Ok(Json(reward))
        }
    }
}

/// Remove a member or a reward
#[utoipa::path(
    delete,
    path = "/api/loyalty",
    tag = "Loyalty",
    params(LoyaltyDeleteQuery),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 400, description = "Missing or invalid selector", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization or record not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_loyalty(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ApiQuery(query): ApiQuery<LoyaltyDeleteQuery>,
) -> Result<Response, ServiceError> {
    let id = require_id(query.id)?;
    let loyalty = &state.services.loyalty;
    match query.record {
        LoyaltyRecord::Member => loyalty.remove_member(organization_id, id).await?,
        LoyaltyRecord::Reward => loyalty.remove_reward(organization_id, id).await?,
    }
    Ok(no_content_response())
}
