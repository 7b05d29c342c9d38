use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::saved_report::{ReportSchedule, SavedReport, ScheduleFrequency};
use crate::reports::{Report, ReportType};
use crate::repositories::SavedReportStore;
use crate::services::reports::ReportService;

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedReportPatch {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub report_type: Option<ReportType>,
    #[validate(range(min = 1, max = 365))]
    pub period_days: Option<u32>,
}

/// Named report definitions that can be re-run or scheduled.
#[derive(Clone)]
pub struct SavedReportService {
    store: Arc<dyn SavedReportStore>,
    reports: ReportService,
}

impl SavedReportService {
    pub fn new(store: Arc<dyn SavedReportStore>, reports: ReportService) -> Self {
        Self { store, reports }
    }

    pub async fn list(&self, organization_id: Uuid) -> Result<Vec<SavedReport>, ServiceError> {
        self.store.list(organization_id).await
    }

    /// Generates the stored report type over its period ending now.
    #[instrument(skip(self))]
    pub async fn run(&self, organization_id: Uuid, id: Uuid) -> Result<Report, ServiceError> {
        let saved = self.get(organization_id, id).await?;
        let range = self.reports.trailing_range(saved.period_days);
        self.reports
            .generate(saved.report_type, organization_id, range)
            .await
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        organization_id: Uuid,
        name: String,
        report_type: ReportType,
        period_days: Option<u32>,
    ) -> Result<SavedReport, ServiceError> {
        let now = self.reports.now();
        let saved = SavedReport {
            id: Uuid::new_v4(),
            organization_id,
            name,
            report_type,
            period_days: period_days.unwrap_or_else(|| self.reports.default_period_days()),
            schedule: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(saved.clone()).await?;
        info!(report_id = %saved.id, "saved report created");
        Ok(saved)
    }

    /// Attaches delivery settings. Nothing is delivered.
    #[instrument(skip(self, recipients))]
    pub async fn schedule(
        &self,
        organization_id: Uuid,
        id: Uuid,
        frequency: ScheduleFrequency,
        recipients: Vec<String>,
    ) -> Result<SavedReport, ServiceError> {
        let now = self.reports.now();
        self.store
            .update(
                organization_id,
                id,
                Box::new(move |saved| {
                    saved.schedule = Some(ReportSchedule {
                        frequency,
                        recipients,
                        scheduled_at: now,
                    });
                    saved.updated_at = now;
                }),
            )
            .await
    }

    pub async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        patch: SavedReportPatch,
    ) -> Result<SavedReport, ServiceError> {
        let now = self.reports.now();
        self.store
            .update(
                organization_id,
                id,
                Box::new(move |saved| {
                    if let Some(name) = patch.name {
                        saved.name = name;
                    }
                    if let Some(report_type) = patch.report_type {
                        saved.report_type = report_type;
                    }
                    if let Some(period_days) = patch.period_days {
                        saved.period_days = period_days;
                    }
                    saved.updated_at = now;
                }),
            )
            .await
    }

    pub async fn delete(&self, organization_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        if !self.store.delete(organization_id, id).await? {
            return Err(not_found());
        }
        Ok(())
    }

    async fn get(&self, organization_id: Uuid, id: Uuid) -> Result<SavedReport, ServiceError> {
        self.store
            .get(organization_id, id)
            .await?
            .ok_or_else(not_found)
    }
}

fn not_found() -> ServiceError {
    ServiceError::NotFound("Report not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FixedClock;
    use crate::repositories::{InMemoryReportStore, InMemorySavedReportStore};
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    fn service() -> (SavedReportService, Arc<InMemoryReportStore>) {
        let data = Arc::new(InMemoryReportStore::new());
        let now = Utc::now();
        let reports = ReportService::new(data.clone(), Arc::new(FixedClock(now)), 30);
        (
            SavedReportService::new(Arc::new(InMemorySavedReportStore::new()), reports),
            data,
        )
    }

    #[tokio::test]
    async fn running_uses_stored_type_and_period() {
        let (service, data) = service();
        let org = Uuid::new_v4();
        let saved = service
            .create(org, "Weekly revenue".into(), ReportType::Revenue, Some(7))
            .await
            .unwrap();

        let report = service.run(org, saved.id).await.unwrap();
        assert_matches!(report, Report::Revenue(_));

        let range = data.queried_ranges()[0];
        assert_eq!(range.end - range.start, Duration::days(7));
    }

    #[tokio::test]
    async fn period_defaults_and_listing_is_by_name() {
        let (service, _) = service();
        let org = Uuid::new_v4();
        service
            .create(org, "Zeta".into(), ReportType::Inventory, None)
            .await
            .unwrap();
        service
            .create(org, "Alpha".into(), ReportType::Cohort, None)
            .await
            .unwrap();

        let listed = service.list(org).await.unwrap();
        assert_eq!(listed[0].name, "Alpha");
        assert!(listed.iter().all(|r| r.period_days == 30));
    }

    #[tokio::test]
    async fn other_organizations_cannot_see_definitions() {
        let (service, _) = service();
        let saved = service
            .create(Uuid::new_v4(), "Mine".into(), ReportType::Overview, None)
            .await
            .unwrap();

        let stranger = Uuid::new_v4();
        assert_matches!(service.run(stranger, saved.id).await, Err(ServiceError::NotFound(_)));
        assert_matches!(
            service.delete(stranger, saved.id).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn edits_racing_a_delete_never_restore_the_definition() {
        let (service, _) = service();
        let org = Uuid::new_v4();

        for _ in 0..20 {
            let id = service
                .create(org, "Daily".into(), ReportType::Revenue, Some(1))
                .await
                .unwrap()
                .id;

            let mut tasks = Vec::new();
            for n in 0..6 {
                let service = service.clone();
                tasks.push(tokio::spawn(async move {
                    let patch = SavedReportPatch {
                        name: Some(format!("Daily {}", n)),
                        ..Default::default()
                    };
                    service.update(org, id, patch).await.map(|_| ())
                }));
            }
            let deleter = service.clone();
            tasks.push(tokio::spawn(async move { deleter.delete(org, id).await }));

            for task in futures::future::join_all(tasks).await {
                if let Err(err) = task.unwrap() {
                    assert_matches!(err, ServiceError::NotFound(_));
                }
            }
        }

        assert!(service.list(org).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scheduling_a_deleted_definition_is_not_found() {
        let (service, _) = service();
        let org = Uuid::new_v4();
        let saved = service
            .create(org, "Monthly".into(), ReportType::Overview, None)
            .await
            .unwrap();
        service.delete(org, saved.id).await.unwrap();

        assert_matches!(
            service
                .schedule(org, saved.id, ScheduleFrequency::Weekly, vec!["ops@example.com".into()])
                .await,
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(
            service.update(org, saved.id, SavedReportPatch::default()).await,
            Err(ServiceError::NotFound(_))
        );
        assert!(service.list(org).await.unwrap().is_empty());
    }
}
