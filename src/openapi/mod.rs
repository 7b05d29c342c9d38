use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Insights API",
        version = "1.0.0",
        description = r#"
# Storefront Insights

Organization-scoped analytics for a multi-tenant storefront: overview, revenue,
product, customer, inventory, cohort and conversion reports, plus saved report
definitions, the loyalty program and storefront content.

## Authentication

Every `/api` endpoint requires a bearer JWT:

```
Authorization: Bearer <your-jwt-token>
```

The caller's organization is resolved from their user record. Callers without
an organization receive `404 {"error": "Organization not found"}`.

## Errors

```json
{ "error": "Organization not found", "request_id": "..." }
```
        "#
    ),
    tags(
        (name = "Reports", description = "Analytics reports and saved report definitions"),
        (name = "Loyalty", description = "Loyalty members, points and rewards"),
        (name = "Website Content", description = "Banners, pages, FAQ entries and announcements"),
    ),
    paths(
        crate::handlers::reports::advanced_report,
        crate::handlers::reports::list_or_run_saved_report,
        crate::handlers::reports::create_saved_report,
        crate::handlers::reports::update_saved_report,
        crate::handlers::reports::delete_saved_report,

        crate::handlers::loyalty::get_loyalty,
        crate::handlers::loyalty::post_loyalty,
        crate::handlers::loyalty::put_loyalty,
        crate::handlers::loyalty::delete_loyalty,

        crate::handlers::website_content::list_content,
        crate::handlers::website_content::create_content,
        crate::handlers::website_content::update_content,
        crate::handlers::website_content::delete_content,
    ),
    components(
        schemas(
            crate::reports::Report,
            crate::reports::ReportType,
            crate::reports::types::OverviewReport,
            crate::reports::types::RevenueReport,
            crate::reports::types::ProductsReport,
            crate::reports::types::CustomersReport,
            crate::reports::types::InventoryReport,
            crate::reports::types::CohortReport,
            crate::reports::types::ConversionReport,

            crate::models::SavedReport,
            crate::models::ReportSchedule,
            crate::models::ScheduleFrequency,
            crate::handlers::reports::SavedReportAction,
            crate::handlers::reports::UpdateSavedReportRequest,

            crate::models::LoyaltyMember,
            crate::models::Reward,
            crate::models::Redemption,
            crate::models::LoyaltySummary,
            crate::models::TierInfo,
            crate::handlers::loyalty::LoyaltyAction,
            crate::handlers::loyalty::LoyaltyUpdate,

            crate::models::ContentBlock,
            crate::models::ContentKind,
            crate::services::content::NewContent,
            crate::handlers::website_content::UpdateContentRequest,

            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_documents_every_endpoint() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Storefront Insights API"));
        assert!(json.contains("/api/reports/advanced"));
        assert!(json.contains("/api/loyalty"));
        assert!(json.contains("/api/website-content"));
        assert!(json.contains("bearer_auth"));
    }
}
