use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::reports::thresholds::LoyaltyTier;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyMember {
    pub id: Uuid,
    #[serde(skip)]
    pub organization_id: Uuid,
    pub customer_id: Uuid,
    /// Spendable points
    pub points_balance: i64,
    /// Points ever earned; drives the tier and never decreases on redemption
    pub lifetime_points: i64,
    pub tier: LoyaltyTier,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoyaltyMember {
    pub fn enroll(organization_id: Uuid, customer_id: Uuid, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            customer_id,
            points_balance: 0,
            lifetime_points: 0,
            tier: LoyaltyTier::Bronze,
            enrolled_at: at,
            updated_at: at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: Uuid,
    #[serde(skip)]
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub points_cost: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub id: Uuid,
    pub member_id: Uuid,
    pub reward_id: Uuid,
    pub points_spent: i64,
    pub remaining_balance: i64,
    pub redeemed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TierInfo {
    pub tier: LoyaltyTier,
    pub min_points: i64,
    pub members: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TierCount {
    pub tier: LoyaltyTier,
    pub members: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltySummary {
    pub members: u64,
    pub points_outstanding: i64,
    pub tier_distribution: Vec<TierCount>,
}
