use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::saved_report::SavedReport;

/// Mutation applied to a definition while the store holds it exclusively.
pub type SavedReportUpdate = Box<dyn FnOnce(&mut SavedReport) + Send>;

#[async_trait]
pub trait SavedReportStore: Send + Sync {
    /// Definitions of the organization ordered by name.
    async fn list(&self, organization_id: Uuid) -> Result<Vec<SavedReport>, ServiceError>;

    async fn get(&self, organization_id: Uuid, id: Uuid)
        -> Result<Option<SavedReport>, ServiceError>;

    async fn insert(&self, report: SavedReport) -> Result<(), ServiceError>;

    /// Applies `apply` to a stored definition; a deleted one stays deleted.
    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        apply: SavedReportUpdate,
    ) -> Result<SavedReport, ServiceError>;

    async fn delete(&self, organization_id: Uuid, id: Uuid) -> Result<bool, ServiceError>;
}

#[derive(Debug, Default)]
pub struct InMemorySavedReportStore {
    reports: DashMap<Uuid, SavedReport>,
}

impl InMemorySavedReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SavedReportStore for InMemorySavedReportStore {
    async fn list(&self, organization_id: Uuid) -> Result<Vec<SavedReport>, ServiceError> {
        let mut reports: Vec<SavedReport> = self
            .reports
            .iter()
            .filter(|entry| entry.organization_id == organization_id)
            .map(|entry| entry.value().clone())
            .collect();
        reports.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(reports)
    }

    async fn get(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<SavedReport>, ServiceError> {
        Ok(self
            .reports
            .get(&id)
            .filter(|entry| entry.organization_id == organization_id)
            .map(|entry| entry.value().clone()))
    }

    async fn insert(&self, report: SavedReport) -> Result<(), ServiceError> {
        self.reports.insert(report.id, report);
        Ok(())
    }

    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        apply: SavedReportUpdate,
    ) -> Result<SavedReport, ServiceError> {
        let mut entry = self
            .reports
            .get_mut(&id)
            .filter(|entry| entry.organization_id == organization_id)
            .ok_or_else(|| ServiceError::NotFound("Report not found".to_string()))?;

        apply(entry.value_mut());
        Ok(entry.value().clone())
    }

    async fn delete(&self, organization_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self
            .reports
            .remove_if(&id, |_, report| report.organization_id == organization_id)
            .is_some())
    }
}
