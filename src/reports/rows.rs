//! Row projections handed from a [`ReportStore`](crate::repositories::ReportStore)
//! to the metric folds. Every row is already scoped to one organization.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::FromQueryResult;
use uuid::Uuid;

use crate::entities::order::OrderStatus;

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// One order line joined with its order, product and category.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct OrderLineRow {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub category_name: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub order_status: OrderStatus,
    pub ordered_at: DateTime<Utc>,
}

impl OrderLineRow {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    pub fn category(&self) -> &str {
        self.category_name.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub category_name: Option<String>,
    pub price: Decimal,
    pub stock: i32,
}

impl ProductRow {
    pub fn category(&self) -> &str {
        self.category_name.as_deref().unwrap_or(UNCATEGORIZED)
    }

    /// Value of units on hand; negative stock contributes nothing.
    pub fn stock_value(&self) -> Decimal {
        self.price * Decimal::from(self.stock.max(0))
    }
}

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct CustomerRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl CustomerRow {
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Result of `GROUP BY status` over the organization's orders in range.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}
