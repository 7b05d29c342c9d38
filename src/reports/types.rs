//! JSON contracts of the advanced report endpoint, one struct per report type.
//!
//! Money is rounded to cents and serialized as a JSON number. Percentages are
//! plain floats with two decimals.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::placeholders::{AcquisitionChannel, FunnelStage};
use super::thresholds::{CustomerSegment, OrderValueSegment};
use crate::entities::order::OrderStatus;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    #[schema(value_type = String)]
    pub status: OrderStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: Uuid,
    pub name: String,
    pub quantity_sold: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRevenue {
    pub category: String,
    pub units_sold: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPerformance {
    pub category: String,
    pub products: u64,
    pub units_sold: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    /// `YYYY-MM-DD` (UTC)
    pub date: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub revenue: Decimal,
    pub orders: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyGrowth {
    /// `YYYY-MM` (UTC)
    pub month: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub revenue: Decimal,
    pub orders: u64,
    /// Percent change against the previous listed month
    pub growth_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderValueSegmentSummary {
    pub segment: OrderValueSegment,
    pub orders: u64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSegmentSummary {
    pub segment: CustomerSegment,
    pub customers: u64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopCustomer {
    pub customer_id: Uuid,
    pub name: String,
    pub email: String,
    pub orders: u64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_spent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCustomers {
    pub month: String,
    pub customers: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeCount {
    pub range: String,
    pub products: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub stock: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub total_products: u64,
    pub in_stock: u64,
    pub low_stock: u64,
    pub out_of_stock: u64,
    pub total_units: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStock {
    pub category: String,
    pub products: u64,
    pub units: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cohort {
    /// Month of the customers' first order, `YYYY-MM`
    pub cohort: String,
    pub customers: u64,
    /// `retention[k]`: percent of the cohort ordering `k` months later
    pub retention: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderCompletion {
    pub total_orders: u64,
    pub completed_orders: u64,
    pub cancelled_orders: u64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewReport {
    /// Excludes cancelled and refunded orders
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_revenue: Decimal,
    /// Counts orders of every status
    pub total_orders: u64,
    pub total_customers: u64,
    pub total_products: u64,
    /// `totalRevenue / totalOrders`
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub average_order_value: Decimal,
    /// Placeholder; no visitor tracking exists
    pub conversion_rate: f64,
    pub orders_by_status: Vec<StatusBreakdown>,
    pub top_products: Vec<ProductSales>,
    pub revenue_by_category: Vec<CategoryRevenue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub daily_revenue: Vec<DailyRevenue>,
    pub product_revenue: Vec<ProductSales>,
    pub customer_segments: Vec<OrderValueSegmentSummary>,
    pub monthly_growth: Vec<MonthlyGrowth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductsReport {
    pub top_products: Vec<ProductSales>,
    pub category_performance: Vec<CategoryPerformance>,
    pub price_ranges: Vec<PriceRangeCount>,
    pub low_stock_products: Vec<StockLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomersReport {
    pub customer_segments: Vec<CustomerSegmentSummary>,
    pub top_customers: Vec<TopCustomer>,
    pub new_customers: Vec<MonthlyCustomers>,
    /// Placeholder; no attribution data exists
    pub acquisition_channels: Vec<AcquisitionChannel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub stock_summary: StockSummary,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub inventory_value: Decimal,
    pub low_stock_products: Vec<StockLevel>,
    pub out_of_stock_products: Vec<StockLevel>,
    pub stock_by_category: Vec<CategoryStock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CohortReport {
    pub cohorts: Vec<Cohort>,
    pub average_retention: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    /// Placeholder funnel
    pub funnel: Vec<FunnelStage>,
    /// Placeholder
    pub conversion_rate: f64,
    /// Placeholder
    pub cart_abandonment_rate: f64,
    pub order_completion: OrderCompletion,
}

/// Any report; serializes as the bare report object.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum Report {
    Overview(OverviewReport),
    Revenue(RevenueReport),
    Products(ProductsReport),
    Customers(CustomersReport),
    Inventory(InventoryReport),
    Cohort(CohortReport),
    Conversion(ConversionReport),
}
