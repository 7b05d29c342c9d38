//! Business cutoffs shared by every report. Lower bounds are inclusive.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Entries kept in every ranked list.
pub const TOP_N: usize = 10;

pub const VIP_ORDER_VALUE: Decimal = dec!(2000);
pub const PREMIUM_ORDER_VALUE: Decimal = dec!(1000);
pub const GOLD_ORDER_VALUE: Decimal = dec!(500);
pub const SILVER_ORDER_VALUE: Decimal = dec!(100);

pub const VIP_CUSTOMER_SPEND: Decimal = dec!(2000);
pub const PREMIUM_CUSTOMER_SPEND: Decimal = dec!(1000);
pub const REGULAR_CUSTOMER_ORDERS: u64 = 2;

/// Products at or below this many units are low on stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

pub const PLATINUM_TIER_POINTS: i64 = 5000;
pub const GOLD_TIER_POINTS: i64 = 2000;
pub const SILVER_TIER_POINTS: i64 = 500;

/// Price buckets as `(label, lower bound inclusive, upper bound exclusive)`.
pub const PRICE_RANGES: [(&str, Decimal, Option<Decimal>); 5] = [
    ("0-25", dec!(0), Some(dec!(25))),
    ("25-50", dec!(25), Some(dec!(50))),
    ("50-100", dec!(50), Some(dec!(100))),
    ("100-200", dec!(100), Some(dec!(200))),
    ("200+", dec!(200), None),
];

/// Segment of a single order by its total. Declaration order is ladder order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum OrderValueSegment {
    #[serde(rename = "VIP")]
    Vip,
    Premium,
    Gold,
    Silver,
    Bronze,
}

impl OrderValueSegment {
    pub fn classify(total: Decimal) -> Self {
        if total >= VIP_ORDER_VALUE {
            Self::Vip
        } else if total >= PREMIUM_ORDER_VALUE {
            Self::Premium
        } else if total >= GOLD_ORDER_VALUE {
            Self::Gold
        } else if total >= SILVER_ORDER_VALUE {
            Self::Silver
        } else {
            Self::Bronze
        }
    }
}

/// Segment of a customer by spend and order count over the report range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum CustomerSegment {
    #[serde(rename = "VIP")]
    Vip,
    Premium,
    Regular,
    New,
}

impl CustomerSegment {
    pub fn classify(spend: Decimal, orders: u64) -> Self {
        if spend >= VIP_CUSTOMER_SPEND {
            Self::Vip
        } else if spend >= PREMIUM_CUSTOMER_SPEND {
            Self::Premium
        } else if orders >= REGULAR_CUSTOMER_ORDERS {
            Self::Regular
        } else {
            Self::New
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum LoyaltyTier {
    Platinum,
    Gold,
    Silver,
    Bronze,
}

impl LoyaltyTier {
    pub const ALL: [LoyaltyTier; 4] = [Self::Platinum, Self::Gold, Self::Silver, Self::Bronze];

    pub fn classify(lifetime_points: i64) -> Self {
        if lifetime_points >= PLATINUM_TIER_POINTS {
            Self::Platinum
        } else if lifetime_points >= GOLD_TIER_POINTS {
            Self::Gold
        } else if lifetime_points >= SILVER_TIER_POINTS {
            Self::Silver
        } else {
            Self::Bronze
        }
    }

    pub fn min_points(self) -> i64 {
        match self {
            Self::Platinum => PLATINUM_TIER_POINTS,
            Self::Gold => GOLD_TIER_POINTS,
            Self::Silver => SILVER_TIER_POINTS,
            Self::Bronze => 0,
        }
    }
}

pub fn is_low_stock(stock: i32) -> bool {
    stock <= LOW_STOCK_THRESHOLD
}

pub fn is_out_of_stock(stock: i32) -> bool {
    stock <= 0
}

pub fn price_range_label(price: Decimal) -> &'static str {
    PRICE_RANGES
        .iter()
        .find(|(_, lower, upper)| price >= *lower && upper.map_or(true, |u| price < u))
        .map(|(label, _, _)| *label)
        // Negative prices fall below every bucket.
        .unwrap_or(PRICE_RANGES[0].0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(dec!(2500), OrderValueSegment::Vip)]
    #[case(dec!(2000), OrderValueSegment::Vip)]
    #[case(dec!(1999.99), OrderValueSegment::Premium)]
    #[case(dec!(1000), OrderValueSegment::Premium)]
    #[case(dec!(999.99), OrderValueSegment::Gold)]
    #[case(dec!(500), OrderValueSegment::Gold)]
    #[case(dec!(100), OrderValueSegment::Silver)]
    #[case(dec!(99.99), OrderValueSegment::Bronze)]
    #[case(dec!(0), OrderValueSegment::Bronze)]
    fn order_value_segment_boundaries(#[case] total: Decimal, #[case] expected: OrderValueSegment) {
        assert_eq!(OrderValueSegment::classify(total), expected);
    }

    #[rstest]
    #[case(dec!(2000), 1, CustomerSegment::Vip)]
    #[case(dec!(1000), 1, CustomerSegment::Premium)]
    #[case(dec!(999.99), 5, CustomerSegment::Regular)]
    #[case(dec!(40), 2, CustomerSegment::Regular)]
    #[case(dec!(40), 1, CustomerSegment::New)]
    #[case(dec!(0), 0, CustomerSegment::New)]
    fn customer_segment_boundaries(
        #[case] spend: Decimal,
        #[case] orders: u64,
        #[case] expected: CustomerSegment,
    ) {
        assert_eq!(CustomerSegment::classify(spend, orders), expected);
    }

    #[rstest]
    #[case(0, LoyaltyTier::Bronze)]
    #[case(499, LoyaltyTier::Bronze)]
    #[case(500, LoyaltyTier::Silver)]
    #[case(2000, LoyaltyTier::Gold)]
    #[case(5000, LoyaltyTier::Platinum)]
    fn loyalty_tier_boundaries(#[case] points: i64, #[case] expected: LoyaltyTier) {
        assert_eq!(LoyaltyTier::classify(points), expected);
        assert!(points >= expected.min_points());
    }

    #[rstest]
    #[case(dec!(0), "0-25")]
    #[case(dec!(24.99), "0-25")]
    #[case(dec!(25), "25-50")]
    #[case(dec!(99.99), "50-100")]
    #[case(dec!(100), "100-200")]
    #[case(dec!(200), "200+")]
    #[case(dec!(15000), "200+")]
    fn price_buckets(#[case] price: Decimal, #[case] expected: &str) {
        assert_eq!(price_range_label(price), expected);
    }

    #[test]
    fn segments_serialize_with_display_names() {
        assert_eq!(
            serde_json::to_string(&OrderValueSegment::Vip).unwrap(),
            "\"VIP\""
        );
        assert_eq!(
            serde_json::to_string(&CustomerSegment::Regular).unwrap(),
            "\"Regular\""
        );
        assert_eq!(serde_json::to_string(&LoyaltyTier::Gold).unwrap(), "\"gold\"");
    }

    #[test]
    fn stock_predicates() {
        assert!(is_low_stock(10));
        assert!(!is_low_stock(11));
        assert!(is_out_of_stock(0));
        assert!(is_out_of_stock(-3));
        assert!(!is_out_of_stock(1));
    }
}
