use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{BaseRepository, ReportStore, Repository, TenantDirectory};
use crate::entities::{category, customer, order, order_item, organization, product, user};
use crate::errors::ServiceError;
use crate::reports::range::DateRange;
use crate::reports::rows::{CustomerRow, OrderLineRow, OrderRow, ProductRow, StatusCount};

/// sea-orm backed report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    base: BaseRepository,
}

impl ReportRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}

#[async_trait]
impl ReportStore for ReportRepository {
    #[instrument(skip(self))]
    async fn orders(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<Vec<OrderRow>, ServiceError> {
        order::Entity::find()
            .select_only()
            .column(order::Column::Id)
            .column(order::Column::CustomerId)
            .column(order::Column::Total)
            .column(order::Column::Status)
            .column(order::Column::CreatedAt)
            .filter(order::Column::OrganizationId.eq(organization_id))
            .filter(order::Column::CreatedAt.between(range.start, range.end))
            .order_by_asc(order::Column::CreatedAt)
            .into_model::<OrderRow>()
            .all(self.db())
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    async fn order_lines(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<Vec<OrderLineRow>, ServiceError> {
        order_item::Entity::find()
            .select_only()
            .column(order_item::Column::OrderId)
            .column(order_item::Column::ProductId)
            .column(order_item::Column::Quantity)
            .column(order_item::Column::Price)
            .column_as(product::Column::Name, "product_name")
            .column_as(category::Column::Name, "category_name")
            .column_as(order::Column::Status, "order_status")
            .column_as(order::Column::CreatedAt, "ordered_at")
            .join(JoinType::InnerJoin, order_item::Relation::Order.def())
            .join(JoinType::InnerJoin, order_item::Relation::Product.def())
            .join(JoinType::LeftJoin, product::Relation::Category.def())
            .filter(order::Column::OrganizationId.eq(organization_id))
            .filter(order::Column::CreatedAt.between(range.start, range.end))
            .order_by_asc(order::Column::CreatedAt)
            .into_model::<OrderLineRow>()
            .all(self.db())
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    async fn status_counts(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<Vec<StatusCount>, ServiceError> {
        order::Entity::find()
            .select_only()
            .column(order::Column::Status)
            .column_as(Expr::col((order::Entity, order::Column::Id)).count(), "count")
            .filter(order::Column::OrganizationId.eq(organization_id))
            .filter(order::Column::CreatedAt.between(range.start, range.end))
            .group_by(order::Column::Status)
            .into_model::<StatusCount>()
            .all(self.db())
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    async fn products(&self, organization_id: Uuid) -> Result<Vec<ProductRow>, ServiceError> {
        product::Entity::find()
            .select_only()
            .column(product::Column::Id)
            .column(product::Column::Name)
            .column_as(category::Column::Name, "category_name")
            .column(product::Column::Price)
            .column(product::Column::Stock)
            .join(JoinType::LeftJoin, product::Relation::Category.def())
            .filter(product::Column::OrganizationId.eq(organization_id))
            .filter(product::Column::IsActive.eq(true))
            .order_by_asc(product::Column::Name)
            .into_model::<ProductRow>()
            .all(self.db())
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    async fn customers(&self, organization_id: Uuid) -> Result<Vec<CustomerRow>, ServiceError> {
        customer::Entity::find()
            .select_only()
            .column(customer::Column::Id)
            .column(customer::Column::FirstName)
            .column(customer::Column::LastName)
            .column(customer::Column::Email)
            .column(customer::Column::CreatedAt)
            .filter(customer::Column::OrganizationId.eq(organization_id))
            .order_by_asc(customer::Column::CreatedAt)
            .into_model::<CustomerRow>()
            .all(self.db())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn count_customers(&self, organization_id: Uuid) -> Result<u64, ServiceError> {
        customer::Entity::find()
            .filter(customer::Column::OrganizationId.eq(organization_id))
            .count(self.db())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn count_products(&self, organization_id: Uuid) -> Result<u64, ServiceError> {
        product::Entity::find()
            .filter(product::Column::OrganizationId.eq(organization_id))
            .filter(product::Column::IsActive.eq(true))
            .count(self.db())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        crate::db::check_connection(self.db()).await
    }
}

#[async_trait]
impl TenantDirectory for ReportRepository {
    #[instrument(skip(self))]
    async fn organization_for_user(&self, user_id: Uuid) -> Result<Option<Uuid>, ServiceError> {
        let found = user::Entity::find_by_id(user_id)
            .find_also_related(organization::Entity)
            .one(self.db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(found.and_then(|(_, organization)| organization).map(|org| org.id))
    }
}
