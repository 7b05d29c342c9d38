//! Records owned by the write-side endpoints (loyalty, site content and
//! saved report definitions).

pub mod content;
pub mod loyalty;
pub mod saved_report;

pub use content::{ContentBlock, ContentKind};
pub use loyalty::{LoyaltyMember, LoyaltySummary, Redemption, Reward, TierCount, TierInfo};
pub use saved_report::{ReportSchedule, SavedReport, ScheduleFrequency};
