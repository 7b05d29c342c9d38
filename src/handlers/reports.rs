use axum::{extract::State, response::Response, routing::get, Json, Router};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::common::{
    created_response, no_content_response, require_id, success_response, ApiQuery,
    CurrentOrganization, ValidatedJson,
};
use crate::common::IdQuery;
use crate::errors::ServiceError;
use crate::models::saved_report::{SavedReport, ScheduleFrequency};
use crate::reports::{Report, ReportQuery, ReportType};
use crate::services::saved_reports::SavedReportPatch;
use crate::AppState;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveReportRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub report_type: ReportType,
    #[validate(range(min = 1, max = 365))]
    pub period_days: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReportRequest {
    pub id: Uuid,
    pub frequency: ScheduleFrequency,
    #[validate(length(min = 1, max = 50), custom = "validate_recipients")]
    pub recipients: Vec<String>,
}

fn validate_recipients(recipients: &Vec<String>) -> Result<(), ValidationError> {
    if recipients.iter().all(|r| validator::validate_email(r.as_str())) {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}

/// Body of `POST /api/reports`, discriminated by `type`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SavedReportAction {
    Save(SaveReportRequest),
    Schedule(ScheduleReportRequest),
}

impl Validate for SavedReportAction {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Save(request) => request.validate(),
            Self::Schedule(request) => request.validate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSavedReportRequest {
    pub id: Uuid,
    #[serde(flatten)]
    #[validate]
    pub patch: SavedReportPatch,
}

pub fn reports_routes() -> Router<AppState> {
    Router::new()
        .route("/reports/advanced", get(advanced_report))
        .route(
            "/reports",
            get(list_or_run_saved_report)
                .post(create_saved_report)
                .put(update_saved_report)
                .delete(delete_saved_report),
        )
}

/// Generate an analytics report for the caller's organization
#[utoipa::path(
    get,
    path = "/api/reports/advanced",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Report of the requested type; unknown types yield the overview", body = Report),
        (status = 400, description = "Malformed date or period", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn advanced_report(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<Json<Report>, ServiceError> {
    let reports = &state.services.reports;
    let report_type = ReportType::from_param(query.report_type.as_deref());
    let range = reports.resolve_range(&query)?;

    let report = reports.generate(report_type, organization_id, range).await?;
    Ok(Json(report))
}

/// List saved report definitions, or run one with `?id=`
#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    params(IdQuery),
    responses(
        (status = 200, description = "Saved definitions, or the generated report when `id` is given", body = Vec<SavedReport>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization or report not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_or_run_saved_report(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Response, ServiceError> {
    let saved = &state.services.saved_reports;
    match query.id {
        Some(id) => Ok(success_response(saved.run(organization_id, id).await?)),
        None => Ok(success_response(saved.list(organization_id).await?)),
    }
}

/// Save a report definition or attach a delivery schedule to one
#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "Reports",
    request_body = SavedReportAction,
    responses(
        (status = 201, description = "Definition saved", body = SavedReport),
        (status = 200, description = "Schedule attached", body = SavedReport),
        (status = 400, description = "Invalid request payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization or report not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_saved_report(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ValidatedJson(action): ValidatedJson<SavedReportAction>,
) -> Result<Response, ServiceError> {
    let saved = &state.services.saved_reports;
    match action {
        SavedReportAction::Save(request) => {
            let report = saved
                .create(
                    organization_id,
                    request.name,
                    request.report_type,
                    request.period_days,
                )
                .await?;
            Ok(created_response(report))
        }
        SavedReportAction::Schedule(request) => {
            let report = saved
                .schedule(
                    organization_id,
                    request.id,
                    request.frequency,
                    request.recipients,
                )
                .await?;
            info!(report_id = %report.id, "report schedule saved");
            Ok(success_response(report))
        }
    }
}

/// Update a saved report definition
#[utoipa::path(
    put,
    path = "/api/reports",
    tag = "Reports",
    request_body = UpdateSavedReportRequest,
    responses(
        (status = 200, description = "Definition updated", body = SavedReport),
        (status = 400, description = "Invalid request payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization or report not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_saved_report(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ValidatedJson(request): ValidatedJson<UpdateSavedReportRequest>,
) -> Result<Json<SavedReport>, ServiceError> {
    let report = state
        .services
        .saved_reports
        .update(organization_id, request.id, request.patch)
        .await?;
    Ok(Json(report))
}

/// Delete a saved report definition
#[utoipa::path(
    delete,
    path = "/api/reports",
    tag = "Reports",
    params(IdQuery),
    responses(
        (status = 204, description = "Definition deleted"),
        (status = 400, description = "Missing id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Organization or report not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_saved_report(
    State(state): State<AppState>,
    CurrentOrganization(organization_id): CurrentOrganization,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Response, ServiceError> {
    let id = require_id(query.id)?;
    state
        .services
        .saved_reports
        .delete(organization_id, id)
        .await?;
    Ok(no_content_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn actions_are_discriminated_by_type() {
        let action: SavedReportAction = serde_json::from_value(json!({
            "type": "save",
            "name": "Monthly",
            "reportType": "revenue",
            "periodDays": 31
        }))
        .unwrap();
        assert_matches!(&action, SavedReportAction::Save(r) if r.report_type == ReportType::Revenue);
        assert!(action.validate().is_ok());

        let unknown = serde_json::from_value::<SavedReportAction>(json!({"type": "export"}));
        assert!(unknown.is_err());
    }

    #[test]
    fn schedule_recipients_must_be_emails() {
        let action: SavedReportAction = serde_json::from_value(json!({
            "type": "schedule",
            "id": Uuid::new_v4(),
            "frequency": "weekly",
            "recipients": ["ops@example.com", "not-an-email"]
        }))
        .unwrap();
        assert!(action.validate().is_err());
    }

    #[test]
    fn update_patch_is_flattened_and_validated() {
        let request: UpdateSavedReportRequest = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "periodDays": 400
        }))
        .unwrap();
        assert_eq!(request.patch.period_days, Some(400));
        assert!(request.validate().is_err());
    }
}
