use axum::Router;

use crate::services::{ContentService, LoyaltyService, ReportService, SavedReportService};
use crate::AppState;

pub mod common;
pub mod loyalty;
pub mod reports;
pub mod website_content;

/// Services the API handlers dispatch to
#[derive(Clone)]
pub struct AppServices {
    pub reports: ReportService,
    pub saved_reports: SavedReportService,
    pub loyalty: LoyaltyService,
    pub content: ContentService,
}

/// Every `/api` route; authentication is layered on by the caller.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(reports::reports_routes())
        .merge(loyalty::loyalty_routes())
        .merge(website_content::website_content_routes())
}
