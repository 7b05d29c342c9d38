use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::common::SharedClock;
use crate::errors::ServiceError;
use crate::reports::metrics as folds;
use crate::reports::placeholders;
use crate::reports::range::{DateRange, ReportQuery};
use crate::reports::thresholds::{is_out_of_stock, TOP_N};
use crate::reports::types::{
    CohortReport, ConversionReport, CustomersReport, InventoryReport, OverviewReport,
    ProductsReport, Report, RevenueReport,
};
use crate::reports::ReportType;
use crate::repositories::ReportStore;

/// Resolves report requests and assembles each report type from concurrent
/// store queries. A failing query fails the whole report.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn ReportStore>,
    clock: SharedClock,
    default_period_days: u32,
}

impl ReportService {
    pub fn new(store: Arc<dyn ReportStore>, clock: SharedClock, default_period_days: u32) -> Self {
        Self {
            store,
            clock,
            default_period_days,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn resolve_range(&self, query: &ReportQuery) -> Result<DateRange, ServiceError> {
        query.resolve_range(self.default_period_days, self.now())
    }

    /// The `period_days` ending now.
    pub fn trailing_range(&self, period_days: u32) -> DateRange {
        DateRange::trailing(self.now(), i64::from(period_days))
    }

    pub fn default_period_days(&self) -> u32 {
        self.default_period_days
    }

    #[instrument(skip(self, report_type), fields(report_type = %report_type))]
    pub async fn generate(
        &self,
        report_type: ReportType,
        organization_id: Uuid,
        range: DateRange,
    ) -> Result<Report, ServiceError> {
        let started = Instant::now();
        let result = match report_type {
            ReportType::Overview => self.overview(organization_id, &range).await.map(Report::Overview),
            ReportType::Revenue => self.revenue(organization_id, &range).await.map(Report::Revenue),
            ReportType::Products => self.products(organization_id, &range).await.map(Report::Products),
            ReportType::Customers => self
                .customers(organization_id, &range)
                .await
                .map(Report::Customers),
            ReportType::Inventory => self.inventory(organization_id).await.map(Report::Inventory),
            ReportType::Cohort => self.cohort(organization_id, &range).await.map(Report::Cohort),
            ReportType::Conversion => self
                .conversion(organization_id, &range)
                .await
                .map(Report::Conversion),
        };

        let label = report_type.to_string();
        match &result {
            Ok(_) => {
                counter!("storefront_reports.generated", 1, "type" => label.clone());
                histogram!(
                    "storefront_reports.duration",
                    started.elapsed().as_secs_f64(),
                    "type" => label
                );
                info!(%organization_id, "report generated");
            }
            Err(err) => {
                counter!("storefront_reports.failed", 1, "type" => label);
                warn!(%organization_id, error = %err, "report generation failed");
            }
        }
        result
    }

    async fn overview(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<OverviewReport, ServiceError> {
        let (orders, lines, status_counts, total_customers, total_products) = tokio::try_join!(
            self.store.orders(organization_id, range),
            self.store.order_lines(organization_id, range),
            self.store.status_counts(organization_id, range),
            self.store.count_customers(organization_id),
            self.store.count_products(organization_id),
        )?;

        let total_revenue = folds::revenue_total(&orders);
        let total_orders = folds::order_count(&orders);
        Ok(OverviewReport {
            total_revenue,
            total_orders,
            total_customers,
            total_products,
            average_order_value: folds::average_order_value(total_revenue, total_orders),
            // placeholder: no visitor tracking to divide by
            conversion_rate: placeholders::CONVERSION_RATE,
            orders_by_status: folds::status_breakdown(&status_counts),
            top_products: folds::top_products_by_quantity(&lines, TOP_N),
            revenue_by_category: folds::category_revenue(&lines),
        })
    }

    async fn revenue(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<RevenueReport, ServiceError> {
        let (orders, lines) = tokio::try_join!(
            self.store.orders(organization_id, range),
            self.store.order_lines(organization_id, range),
        )?;

        Ok(RevenueReport {
            daily_revenue: folds::daily_revenue(&orders),
            product_revenue: folds::top_products_by_revenue(&lines, TOP_N),
            customer_segments: folds::order_value_segments(&orders),
            monthly_growth: folds::monthly_growth(&orders),
        })
    }

    async fn products(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<ProductsReport, ServiceError> {
        let (products, lines) = tokio::try_join!(
            self.store.products(organization_id),
            self.store.order_lines(organization_id, range),
        )?;

        Ok(ProductsReport {
            top_products: folds::top_products_by_quantity(&lines, TOP_N),
            category_performance: folds::category_performance(&products, &lines),
            price_ranges: folds::price_ranges(&products),
            low_stock_products: folds::low_stock_products(&products),
        })
    }

    async fn customers(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<CustomersReport, ServiceError> {
        let (customers, orders) = tokio::try_join!(
            self.store.customers(organization_id),
            self.store.orders(organization_id, range),
        )?;

        Ok(CustomersReport {
            customer_segments: folds::customer_segments(&orders),
            top_customers: folds::top_customers(&customers, &orders, TOP_N),
            new_customers: folds::new_customers_by_month(&customers, range),
            // placeholder: no attribution data is recorded
            acquisition_channels: placeholders::acquisition_channels(),
        })
    }

    async fn inventory(&self, organization_id: Uuid) -> Result<InventoryReport, ServiceError> {
        let products = self.store.products(organization_id).await?;

        Ok(InventoryReport {
            stock_summary: folds::stock_summary(&products),
            inventory_value: folds::inventory_value(&products),
            low_stock_products: folds::low_stock_products(&products),
            out_of_stock_products: folds::stock_levels(&products, is_out_of_stock),
            stock_by_category: folds::stock_by_category(&products),
        })
    }

    async fn cohort(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<CohortReport, ServiceError> {
        let orders = self.store.orders(organization_id, range).await?;
        Ok(folds::cohorts(&orders, range))
    }

    async fn conversion(
        &self,
        organization_id: Uuid,
        range: &DateRange,
    ) -> Result<ConversionReport, ServiceError> {
        let status_counts = self.store.status_counts(organization_id, range).await?;

        // placeholder: funnel, conversion and abandonment have no data source
        Ok(ConversionReport {
            funnel: placeholders::conversion_funnel(),
            conversion_rate: placeholders::CONVERSION_RATE,
            cart_abandonment_rate: placeholders::CART_ABANDONMENT_RATE,
            order_completion: folds::order_completion(&status_counts),
        })
    }
}
