//! Storage seams. Services depend on the traits here; the sea-orm
//! repositories back them in production and the in-memory stores back them
//! in tests and for the write-side sibling endpoints.

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::reports::range::DateRange;
use crate::reports::rows::{CustomerRow, OrderLineRow, OrderRow, ProductRow, StatusCount};

pub mod content_repository;
pub mod loyalty_repository;
pub mod memory;
pub mod report_repository;
pub mod saved_report_repository;

pub use content_repository::{ContentStore, InMemoryContentStore};
pub use loyalty_repository::{InMemoryLoyaltyStore, LoyaltyStore};
pub use memory::InMemoryReportStore;
pub use report_repository::ReportRepository;
pub use saved_report_repository::{InMemorySavedReportStore, SavedReportStore};

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Read-only, organization-scoped access to the data behind reports.
///
/// Range-taking methods return only rows whose timestamp lies within the
/// inclusive range.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn orders(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<Vec<OrderRow>, ServiceError>;

    async fn order_lines(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<Vec<OrderLineRow>, ServiceError>;

    async fn status_counts(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<Vec<StatusCount>, ServiceError>;

    /// Active catalog products.
    async fn products(&self, organization_id: Uuid) -> Result<Vec<ProductRow>, ServiceError>;

    async fn customers(&self, organization_id: Uuid) -> Result<Vec<CustomerRow>, ServiceError>;

    async fn count_customers(&self, organization_id: Uuid) -> Result<u64, ServiceError>;

    async fn count_products(&self, organization_id: Uuid) -> Result<u64, ServiceError>;

    async fn ping(&self) -> Result<(), ServiceError>;
}

/// Maps an authenticated user to their organization.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// `None` when the user is unknown, has no organization, or the
    /// organization row no longer exists.
    async fn organization_for_user(&self, user_id: Uuid) -> Result<Option<Uuid>, ServiceError>;
}
