//! Aggregate folds over organization-scoped row projections.
//!
//! Revenue figures only include orders whose status counts toward revenue;
//! order counts include every status. Groupings go through ordered maps and
//! every ranking has a total tie-break, so equal inputs give equal output.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use uuid::Uuid;

use super::range::DateRange;
use super::rows::{CustomerRow, OrderLineRow, OrderRow, ProductRow, StatusCount};
use super::thresholds::{
    is_low_stock, is_out_of_stock, price_range_label, CustomerSegment, OrderValueSegment,
    PRICE_RANGES,
};
use super::types::*;
use crate::entities::order::OrderStatus;

/// Rounds a money amount to cents.
pub fn money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole` as a percentage with two decimals; zero when `whole` is zero.
pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

pub fn revenue_total(orders: &[OrderRow]) -> Decimal {
    money(
        orders
            .iter()
            .filter(|o| o.status.counts_toward_revenue())
            .map(|o| o.total)
            .sum(),
    )
}

pub fn order_count(orders: &[OrderRow]) -> u64 {
    orders.len() as u64
}

/// Revenue divided by the status-agnostic order count.
pub fn average_order_value(revenue: Decimal, orders: u64) -> Decimal {
    if orders == 0 {
        return Decimal::ZERO;
    }
    money(revenue / Decimal::from(orders))
}

pub fn status_breakdown(counts: &[StatusCount]) -> Vec<StatusBreakdown> {
    let mut by_status: BTreeMap<OrderStatus, u64> = BTreeMap::new();
    for row in counts.iter().filter(|row| row.count > 0) {
        *by_status.entry(row.status).or_default() += row.count as u64;
    }
    by_status
        .into_iter()
        .map(|(status, count)| StatusBreakdown { status, count })
        .collect()
}

fn group_by_period(orders: &[OrderRow], format: &str) -> BTreeMap<String, (Decimal, u64)> {
    let mut groups: BTreeMap<String, (Decimal, u64)> = BTreeMap::new();
    for order in orders {
        let entry = groups
            .entry(order.created_at.format(format).to_string())
            .or_insert((Decimal::ZERO, 0));
        entry.1 += 1;
        if order.status.counts_toward_revenue() {
            entry.0 += order.total;
        }
    }
    groups
}

/// Days with at least one order, oldest first.
pub fn daily_revenue(orders: &[OrderRow]) -> Vec<DailyRevenue> {
    group_by_period(orders, "%Y-%m-%d")
        .into_iter()
        .map(|(date, (revenue, orders))| DailyRevenue {
            date,
            revenue: money(revenue),
            orders,
        })
        .collect()
}

fn growth_rate(previous: Decimal, current: Decimal) -> Option<f64> {
    if previous.is_zero() {
        return None;
    }
    ((current - previous) / previous * Decimal::ONE_HUNDRED)
        .round_dp(2)
        .to_f64()
}

/// Months with at least one order, oldest first, each compared with the
/// month listed before it.
pub fn monthly_growth(orders: &[OrderRow]) -> Vec<MonthlyGrowth> {
    let mut previous: Option<Decimal> = None;
    group_by_period(orders, "%Y-%m")
        .into_iter()
        .map(|(month, (revenue, orders))| {
            let growth_rate = previous.and_then(|prev| growth_rate(prev, revenue));
            previous = Some(revenue);
            MonthlyGrowth {
                month,
                revenue: money(revenue),
                orders,
                growth_rate,
            }
        })
        .collect()
}

fn product_sales(lines: &[OrderLineRow]) -> Vec<ProductSales> {
    let mut by_product: BTreeMap<Uuid, ProductSales> = BTreeMap::new();
    for line in lines.iter().filter(|l| l.order_status.counts_toward_revenue()) {
        let entry = by_product
            .entry(line.product_id)
            .or_insert_with(|| ProductSales {
                product_id: line.product_id,
                name: line.product_name.clone(),
                quantity_sold: 0,
                revenue: Decimal::ZERO,
            });
        entry.quantity_sold += i64::from(line.quantity);
        entry.revenue += line.line_total();
    }
    by_product
        .into_values()
        .map(|mut sales| {
            sales.revenue = money(sales.revenue);
            sales
        })
        .collect()
}

/// Best sellers by units, then revenue.
pub fn top_products_by_quantity(lines: &[OrderLineRow], limit: usize) -> Vec<ProductSales> {
    let mut products = product_sales(lines);
    products.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then_with(|| b.revenue.cmp(&a.revenue))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    products.truncate(limit);
    products
}

/// Best sellers by revenue, then units.
pub fn top_products_by_revenue(lines: &[OrderLineRow], limit: usize) -> Vec<ProductSales> {
    let mut products = product_sales(lines);
    products.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| b.quantity_sold.cmp(&a.quantity_sold))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    products.truncate(limit);
    products
}

pub fn category_revenue(lines: &[OrderLineRow]) -> Vec<CategoryRevenue> {
    let mut by_category: BTreeMap<&str, (i64, Decimal)> = BTreeMap::new();
    for line in lines.iter().filter(|l| l.order_status.counts_toward_revenue()) {
        let entry = by_category
            .entry(line.category())
            .or_insert((0, Decimal::ZERO));
        entry.0 += i64::from(line.quantity);
        entry.1 += line.line_total();
    }
    let mut categories: Vec<CategoryRevenue> = by_category
        .into_iter()
        .map(|(category, (units_sold, revenue))| CategoryRevenue {
            category: category.to_string(),
            units_sold,
            revenue: money(revenue),
        })
        .collect();
    // Stable sort keeps the alphabetical order among equal revenues.
    categories.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    categories
}

/// Catalog size per category alongside what the category sold in range.
pub fn category_performance(
    products: &[ProductRow],
    lines: &[OrderLineRow],
) -> Vec<CategoryPerformance> {
    fn slot(category: &str) -> CategoryPerformance {
        CategoryPerformance {
            category: category.to_string(),
            products: 0,
            units_sold: 0,
            revenue: Decimal::ZERO,
        }
    }

    let mut by_category: BTreeMap<String, CategoryPerformance> = BTreeMap::new();
    for product in products {
        by_category
            .entry(product.category().to_string())
            .or_insert_with(|| slot(product.category()))
            .products += 1;
    }
    for line in lines.iter().filter(|l| l.order_status.counts_toward_revenue()) {
        let entry = by_category
            .entry(line.category().to_string())
            .or_insert_with(|| slot(line.category()));
        entry.units_sold += i64::from(line.quantity);
        entry.revenue += line.line_total();
    }
    let mut categories: Vec<CategoryPerformance> = by_category
        .into_values()
        .map(|mut c| {
            c.revenue = money(c.revenue);
            c
        })
        .collect();
    categories.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    categories
}

/// Revenue-bearing orders bucketed by their own total, VIP first.
pub fn order_value_segments(orders: &[OrderRow]) -> Vec<OrderValueSegmentSummary> {
    let mut segments: BTreeMap<OrderValueSegment, (u64, Decimal)> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.status.counts_toward_revenue()) {
        let entry = segments
            .entry(OrderValueSegment::classify(order.total))
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += order.total;
    }
    segments
        .into_iter()
        .map(|(segment, (orders, revenue))| OrderValueSegmentSummary {
            segment,
            orders,
            revenue: money(revenue),
        })
        .collect()
}

/// Per customer: (orders of any status, revenue-bearing spend). Guest orders
/// are skipped.
fn customer_totals(orders: &[OrderRow]) -> BTreeMap<Uuid, (u64, Decimal)> {
    let mut totals: BTreeMap<Uuid, (u64, Decimal)> = BTreeMap::new();
    for order in orders {
        let Some(customer_id) = order.customer_id else {
            continue;
        };
        let entry = totals.entry(customer_id).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        if order.status.counts_toward_revenue() {
            entry.1 += order.total;
        }
    }
    totals
}

/// Customers who ordered in range, grouped by spend and order count.
pub fn customer_segments(orders: &[OrderRow]) -> Vec<CustomerSegmentSummary> {
    let mut segments: BTreeMap<CustomerSegment, (u64, Decimal)> = BTreeMap::new();
    for (orders, spend) in customer_totals(orders).into_values() {
        let entry = segments
            .entry(CustomerSegment::classify(spend, orders))
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += spend;
    }
    segments
        .into_iter()
        .map(|(segment, (customers, revenue))| CustomerSegmentSummary {
            segment,
            customers,
            revenue: money(revenue),
        })
        .collect()
}

pub fn top_customers(customers: &[CustomerRow], orders: &[OrderRow], limit: usize) -> Vec<TopCustomer> {
    let directory: HashMap<Uuid, &CustomerRow> = customers.iter().map(|c| (c.id, c)).collect();
    let mut ranked: Vec<TopCustomer> = customer_totals(orders)
        .into_iter()
        .filter_map(|(id, (orders, spend))| {
            directory.get(&id).map(|customer| TopCustomer {
                customer_id: id,
                name: customer.name(),
                email: customer.email.clone(),
                orders,
                total_spent: money(spend),
            })
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.total_spent
            .cmp(&a.total_spent)
            .then_with(|| b.orders.cmp(&a.orders))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Customers created inside the range, per month.
pub fn new_customers_by_month(customers: &[CustomerRow], range: &DateRange) -> Vec<MonthlyCustomers> {
    let mut months: BTreeMap<String, u64> = BTreeMap::new();
    for customer in customers.iter().filter(|c| range.contains(c.created_at)) {
        *months
            .entry(customer.created_at.format("%Y-%m").to_string())
            .or_default() += 1;
    }
    months
        .into_iter()
        .map(|(month, customers)| MonthlyCustomers { month, customers })
        .collect()
}

/// Every price bucket, including empty ones, cheapest first.
pub fn price_ranges(products: &[ProductRow]) -> Vec<PriceRangeCount> {
    let mut counts: HashMap<&'static str, u64> = HashMap::new();
    for product in products {
        *counts.entry(price_range_label(product.price)).or_default() += 1;
    }
    PRICE_RANGES
        .iter()
        .map(|(label, _, _)| PriceRangeCount {
            range: label.to_string(),
            products: counts.get(label).copied().unwrap_or_default(),
        })
        .collect()
}

/// Products whose stock satisfies `predicate`, scarcest first.
pub fn stock_levels(products: &[ProductRow], predicate: impl Fn(i32) -> bool) -> Vec<StockLevel> {
    let mut levels: Vec<StockLevel> = products
        .iter()
        .filter(|p| predicate(p.stock))
        .map(|p| StockLevel {
            product_id: p.id,
            name: p.name.clone(),
            category: p.category().to_string(),
            stock: p.stock,
        })
        .collect();
    levels.sort_by(|a, b| {
        a.stock
            .cmp(&b.stock)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    levels
}

/// At or below the reorder threshold, out-of-stock included.
pub fn low_stock_products(products: &[ProductRow]) -> Vec<StockLevel> {
    stock_levels(products, is_low_stock)
}

pub fn stock_summary(products: &[ProductRow]) -> StockSummary {
    let mut summary = StockSummary {
        total_products: products.len() as u64,
        in_stock: 0,
        low_stock: 0,
        out_of_stock: 0,
        total_units: 0,
    };
    for product in products {
        if is_out_of_stock(product.stock) {
            summary.out_of_stock += 1;
        } else if is_low_stock(product.stock) {
            summary.low_stock += 1;
        } else {
            summary.in_stock += 1;
        }
        summary.total_units += i64::from(product.stock.max(0));
    }
    summary
}

pub fn inventory_value(products: &[ProductRow]) -> Decimal {
    money(products.iter().map(ProductRow::stock_value).sum())
}

pub fn stock_by_category(products: &[ProductRow]) -> Vec<CategoryStock> {
    let mut by_category: BTreeMap<&str, (u64, i64, Decimal)> = BTreeMap::new();
    for product in products {
        let entry = by_category
            .entry(product.category())
            .or_insert((0, 0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += i64::from(product.stock.max(0));
        entry.2 += product.stock_value();
    }
    by_category
        .into_iter()
        .map(|(category, (products, units, value))| CategoryStock {
            category: category.to_string(),
            products,
            units,
            value: money(value),
        })
        .collect()
}

fn month_index(at: DateTime<Utc>) -> i32 {
    at.year() * 12 + at.month0() as i32
}

fn month_label(index: i32) -> String {
    format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
}

/// Groups customers by the month of their first order in range and tracks
/// which share of each group ordered again in each following month.
pub fn cohorts(orders: &[OrderRow], range: &DateRange) -> CohortReport {
    let mut activity: BTreeMap<Uuid, BTreeSet<i32>> = BTreeMap::new();
    for order in orders {
        if let Some(customer_id) = order.customer_id {
            activity
                .entry(customer_id)
                .or_default()
                .insert(month_index(order.created_at));
        }
    }

    let mut groups: BTreeMap<i32, Vec<&BTreeSet<i32>>> = BTreeMap::new();
    for months in activity.values() {
        if let Some(first) = months.first() {
            groups.entry(*first).or_default().push(months);
        }
    }

    let last_month = month_index(range.end);
    let cohorts: Vec<Cohort> = groups
        .into_iter()
        .map(|(start, members)| {
            let size = members.len() as u64;
            let span = (last_month - start).max(0);
            let retention = (0..=span)
                .map(|offset| {
                    let active = members
                        .iter()
                        .filter(|months| months.contains(&(start + offset)))
                        .count() as u64;
                    percent(active, size)
                })
                .collect();
            Cohort {
                cohort: month_label(start),
                customers: size,
                retention,
            }
        })
        .collect();

    let longest = cohorts.iter().map(|c| c.retention.len()).max().unwrap_or(0);
    let average_retention = (0..longest)
        .map(|offset| {
            let values: Vec<f64> = cohorts
                .iter()
                .filter_map(|c| c.retention.get(offset).copied())
                .collect();
            round2(values.iter().sum::<f64>() / values.len() as f64)
        })
        .collect();

    CohortReport {
        cohorts,
        average_retention,
    }
}

pub fn order_completion(counts: &[StatusCount]) -> OrderCompletion {
    let mut completion = OrderCompletion {
        total_orders: 0,
        completed_orders: 0,
        cancelled_orders: 0,
        completion_rate: 0.0,
    };
    for row in counts.iter().filter(|row| row.count > 0) {
        let count = row.count as u64;
        completion.total_orders += count;
        match row.status {
            OrderStatus::Delivered => completion.completed_orders += count,
            OrderStatus::Cancelled | OrderStatus::Refunded => completion.cancelled_orders += count,
            _ => {}
        }
    }
    completion.completion_rate = percent(completion.completed_orders, completion.total_orders);
    completion
}
