use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::{ReportStore, TenantDirectory};
use crate::errors::ServiceError;
use crate::reports::range::DateRange;
use crate::reports::rows::{CustomerRow, OrderLineRow, OrderRow, ProductRow, StatusCount};

/// Report store held in memory, keyed by organization.
///
/// Records every range it is queried with so callers can assert on the
/// window a report resolved to.
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    organizations: DashSet<Uuid>,
    users: DashMap<Uuid, Option<Uuid>>,
    orders: DashMap<Uuid, Vec<OrderRow>>,
    lines: DashMap<Uuid, Vec<OrderLineRow>>,
    products: DashMap<Uuid, Vec<ProductRow>>,
    customers: DashMap<Uuid, Vec<CustomerRow>>,
    queried_ranges: Mutex<Vec<DateRange>>,
    unavailable: AtomicBool,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_organization(&self, organization_id: Uuid) {
        self.organizations.insert(organization_id);
    }

    pub fn add_user(&self, user_id: Uuid, organization_id: Option<Uuid>) {
        self.users.insert(user_id, organization_id);
    }

    pub fn add_order(&self, organization_id: Uuid, row: OrderRow) {
        self.orders.entry(organization_id).or_default().push(row);
    }

    pub fn add_order_line(&self, organization_id: Uuid, row: OrderLineRow) {
        self.lines.entry(organization_id).or_default().push(row);
    }

    pub fn add_product(&self, organization_id: Uuid, row: ProductRow) {
        self.products.entry(organization_id).or_default().push(row);
    }

    pub fn add_customer(&self, organization_id: Uuid, row: CustomerRow) {
        self.customers.entry(organization_id).or_default().push(row);
    }

    /// Makes every subsequent query fail with a database error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn queried_ranges(&self) -> Vec<DateRange> {
        self.queried_ranges
            .lock()
            .map(|ranges| ranges.clone())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), ServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::db_error("report store unavailable"));
        }
        Ok(())
    }

    fn record(&self, range: &DateRange) {
        if let Ok(mut ranges) = self.queried_ranges.lock() {
            ranges.push(*range);
        }
    }

    fn orders_in(&self, organization_id: Uuid, range: &DateRange) -> Vec<OrderRow> {
        let mut rows: Vec<OrderRow> = self
            .orders
            .get(&organization_id)
            .map(|rows| {
                rows.iter()
                    .filter(|row| range.contains(row.created_at))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by_key(|row| row.created_at);
        rows
    }

    fn all<T: Clone>(map: &DashMap<Uuid, Vec<T>>, organization_id: Uuid) -> Vec<T> {
        map.get(&organization_id)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn orders(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<Vec<OrderRow>, ServiceError> {
        self.check_available()?;
        self.record(range);
        Ok(self.orders_in(organization_id, range))
    }

    async fn order_lines(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<Vec<OrderLineRow>, ServiceError> {
        self.check_available()?;
        self.record(range);
        let mut rows: Vec<OrderLineRow> = Self::all(&self.lines, organization_id)
            .into_iter()
            .filter(|row| range.contains(row.ordered_at))
            .collect();
        rows.sort_by_key(|row| row.ordered_at);
        Ok(rows)
    }

    async fn status_counts(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<Vec<StatusCount>, ServiceError> {
        self.check_available()?;
        self.record(range);
        let mut counts = BTreeMap::new();
        for row in self.orders_in(organization_id, range) {
            *counts.entry(row.status).or_insert(0i64) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }

    async fn products(&self, organization_id: Uuid) -> Result<Vec<ProductRow>, ServiceError> {
        self.check_available()?;
        let mut rows = Self::all(&self.products, organization_id);
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn customers(&self, organization_id: Uuid) -> Result<Vec<CustomerRow>, ServiceError> {
        self.check_available()?;
        let mut rows = Self::all(&self.customers, organization_id);
        rows.sort_by_key(|row| row.created_at);
        Ok(rows)
    }

    async fn count_customers(&self, organization_id: Uuid) -> Result<u64, ServiceError> {
        self.check_available()?;
        Ok(self
            .customers
            .get(&organization_id)
            .map_or(0, |rows| rows.len() as u64))
    }

    async fn count_products(&self, organization_id: Uuid) -> Result<u64, ServiceError> {
        self.check_available()?;
        Ok(self
            .products
            .get(&organization_id)
            .map_or(0, |rows| rows.len() as u64))
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        self.check_available()
    }
}

#[async_trait]
impl TenantDirectory for InMemoryReportStore {
    async fn organization_for_user(&self, user_id: Uuid) -> Result<Option<Uuid>, ServiceError> {
        self.check_available()?;
        let organization_id = self.users.get(&user_id).and_then(|entry| *entry.value());
        Ok(organization_id.filter(|id| self.organizations.contains(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::order::OrderStatus;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn order(status: OrderStatus, days_ago: i64) -> OrderRow {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        OrderRow {
            id: Uuid::new_v4(),
            customer_id: None,
            total: dec!(10),
            status,
            created_at: now - Duration::days(days_ago),
        }
    }

    #[tokio::test]
    async fn queries_are_scoped_to_organization_and_range() {
        let store = InMemoryReportStore::new();
        let org = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.add_order(org, order(OrderStatus::Delivered, 1));
        store.add_order(org, order(OrderStatus::Delivered, 40));
        store.add_order(other, order(OrderStatus::Delivered, 1));

        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let range = DateRange::trailing(now, 30);
        let orders = store.orders(org, &range).await.unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(store.queried_ranges(), vec![range]);
    }

    #[tokio::test]
    async fn status_counts_group_orders() {
        let store = InMemoryReportStore::new();
        let org = Uuid::new_v4();
        store.add_order(org, order(OrderStatus::Delivered, 1));
        store.add_order(org, order(OrderStatus::Delivered, 2));
        store.add_order(org, order(OrderStatus::Pending, 3));

        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let counts = store
            .status_counts(org, &DateRange::trailing(now, 30))
            .await
            .unwrap();

        assert_eq!(
            counts,
            vec![
                StatusCount { status: OrderStatus::Pending, count: 1 },
                StatusCount { status: OrderStatus::Delivered, count: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn tenant_lookup_requires_existing_organization() {
        let store = InMemoryReportStore::new();
        let org = Uuid::new_v4();
        let member = Uuid::new_v4();
        let orphan = Uuid::new_v4();
        let dangling = Uuid::new_v4();
        store.add_organization(org);
        store.add_user(member, Some(org));
        store.add_user(orphan, None);
        store.add_user(dangling, Some(Uuid::new_v4()));

        assert_eq!(store.organization_for_user(member).await.unwrap(), Some(org));
        assert_eq!(store.organization_for_user(orphan).await.unwrap(), None);
        assert_eq!(store.organization_for_user(dangling).await.unwrap(), None);
        assert_eq!(store.organization_for_user(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_query() {
        let store = InMemoryReportStore::new();
        store.set_unavailable(true);
        assert!(store.ping().await.is_err());
        assert!(store.products(Uuid::new_v4()).await.is_err());
    }
}
