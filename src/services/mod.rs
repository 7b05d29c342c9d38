pub mod content;
pub mod loyalty;
pub mod reports;
pub mod saved_reports;

pub use content::ContentService;
pub use loyalty::LoyaltyService;
pub use reports::ReportService;
pub use saved_reports::SavedReportService;
