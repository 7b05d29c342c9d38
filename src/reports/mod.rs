//! Report catalog: the metric folds, the named thresholds they apply, and the
//! JSON contracts of each report type.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod metrics;
pub mod placeholders;
pub mod range;
pub mod rows;
pub mod thresholds;
pub mod types;

pub use range::{DateRange, ReportQuery};
pub use types::Report;

/// Report selected by the `type` query parameter.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportType {
    #[default]
    Overview,
    Revenue,
    Products,
    Customers,
    Inventory,
    Cohort,
    Conversion,
}

impl ReportType {
    /// Exact, case-sensitive match; anything else selects the overview.
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }
}
