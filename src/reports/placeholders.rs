//! Fixed figures for metrics that have no data source yet.
//!
//! The storefront records no visits, carts or referral sources, so these
//! values are literals. Responses carry them unchanged; nothing here is
//! computed from organization data.

use serde::Serialize;
use utoipa::ToSchema;

pub const CONVERSION_RATE: f64 = 3.2;
pub const CART_ABANDONMENT_RATE: f64 = 68.5;

const FUNNEL: [(&str, u64); 5] = [
    ("Visitors", 10_000),
    ("Product Views", 6_500),
    ("Add to Cart", 2_100),
    ("Checkout", 890),
    ("Purchase", 320),
];

const ACQUISITION_CHANNELS: [(&str, f64); 5] = [
    ("Organic Search", 35.0),
    ("Direct", 25.0),
    ("Social Media", 20.0),
    ("Email", 12.0),
    ("Paid Ads", 8.0),
];

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStage {
    pub stage: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionChannel {
    pub channel: String,
    pub percentage: f64,
}

pub fn conversion_funnel() -> Vec<FunnelStage> {
    FUNNEL
        .iter()
        .map(|(stage, count)| FunnelStage {
            stage: stage.to_string(),
            count: *count,
        })
        .collect()
}

pub fn acquisition_channels() -> Vec<AcquisitionChannel> {
    ACQUISITION_CHANNELS
        .iter()
        .map(|(channel, percentage)| AcquisitionChannel {
            channel: channel.to_string(),
            percentage: *percentage,
        })
        .collect()
}
