use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::SharedClock;
use crate::errors::ServiceError;
use crate::models::content::{slugify, ContentBlock, ContentKind};
use crate::repositories::ContentStore;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewContent {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 20000))]
    pub body: String,
    #[validate(length(max = 200))]
    pub slug: Option<String>,
    pub published: Option<bool>,
    #[validate(range(min = 0, max = 10000))]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatch {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 20000))]
    pub body: Option<String>,
    #[validate(length(max = 200))]
    pub slug: Option<String>,
    pub published: Option<bool>,
    #[validate(range(min = 0, max = 10000))]
    pub position: Option<i32>,
}

/// Banners, pages, FAQ entries and announcements shown on the storefront.
#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn ContentStore>,
    clock: SharedClock,
}

impl ContentService {
    pub fn new(store: Arc<dyn ContentStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    pub async fn list(
        &self,
        organization_id: Uuid,
        kind: Option<ContentKind>,
    ) -> Result<Vec<ContentBlock>, ServiceError> {
        self.store.list(organization_id, kind).await
    }

    /// Pages without an explicit slug get one derived from their title.
    #[instrument(skip(self, content), fields(kind = %content.kind))]
    pub async fn create(
        &self,
        organization_id: Uuid,
        content: NewContent,
    ) -> Result<ContentBlock, ServiceError> {
        let slug = match normalize_slug(content.slug) {
            Some(slug) => Some(slug),
            None if content.kind == ContentKind::Page => {
                Some(slugify(&content.title)).filter(|s| !s.is_empty())
            }
            None => None,
        };
        let now = self.clock.now();
        let block = ContentBlock {
            id: Uuid::new_v4(),
            organization_id,
            kind: content.kind,
            title: content.title,
            body: content.body,
            slug,
            published: content.published.unwrap_or(false),
            position: content.position.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };
        self.store.insert(block.clone()).await?;
        info!(content_id = %block.id, "content created");
        Ok(block)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        patch: ContentPatch,
    ) -> Result<ContentBlock, ServiceError> {
        let now = self.clock.now();
        self.store
            .update(
                organization_id,
                id,
                Box::new(move |block| {
                    if let Some(raw) = patch.slug {
                        block.slug = normalize_slug(Some(raw));
                    }
                    if let Some(title) = patch.title {
                        block.title = title;
                    }
                    if let Some(body) = patch.body {
                        block.body = body;
                    }
                    if let Some(published) = patch.published {
                        block.published = published;
                    }
                    if let Some(position) = patch.position {
                        block.position = position;
                    }
                    block.updated_at = now;
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
}

fn not_found() -> ServiceError {
    ServiceError::NotFound("Content not found".to_string())
}

/// Blank slugs clear the slug; others are normalized like titles.
fn normalize_slug(raw: Option<String>) -> Option<String> {
    raw.map(|s| slugify(&s)).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FixedClock;
    use crate::repositories::InMemoryContentStore;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn service() -> ContentService {
        ContentService::new(
            Arc::new(InMemoryContentStore::new()),
            Arc::new(FixedClock(Utc::now())),
        )
    }

    fn draft(kind: ContentKind, title: &str, slug: Option<&str>) -> NewContent {
        NewContent {
            kind,
            title: title.to_string(),
            body: "Body".to_string(),
            slug: slug.map(String::from),
            published: None,
            position: None,
        }
    }

    #[tokio::test]
    async fn pages_derive_slug_and_reject_duplicates() {
        let service = service();
        let org = Uuid::new_v4();

        let page = service
            .create(org, draft(ContentKind::Page, "About Us", None))
            .await
            .unwrap();
        assert_eq!(page.slug.as_deref(), Some("about-us"));
        assert!(!page.published);

        assert_matches!(
            service
                .create(org, draft(ContentKind::Page, "Other", Some("About-Us")))
                .await,
            Err(ServiceError::ValidationError(_))
        );

        let banner = service
            .create(org, draft(ContentKind::Banner, "Sale", None))
            .await
            .unwrap();
        assert_eq!(banner.slug, None);
    }

    #[tokio::test]
    async fn updating_own_slug_is_allowed() {
        let service = service();
        let org = Uuid::new_v4();
        let page = service
            .create(org, draft(ContentKind::Page, "Terms", None))
            .await
            .unwrap();

        let updated = service
            .update(
                org,
                page.id,
                ContentPatch {
                    slug: Some("terms".into()),
                    published: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.published);
        assert_eq!(updated.slug.as_deref(), Some("terms"));
    }

    #[tokio::test]
    async fn listing_orders_by_position_then_title() {
        let service = service();
        let org = Uuid::new_v4();
        for (title, position) in [("B", 1), ("A", 1), ("Z", 0)] {
            let mut content = draft(ContentKind::Faq, title, None);
            content.position = Some(position);
            service.create(org, content).await.unwrap();
        }
        service
            .create(org, draft(ContentKind::Banner, "Hero", None))
            .await
            .unwrap();

        let titles: Vec<String> = service
            .list(org, Some(ContentKind::Faq))
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Z", "A", "B"]);
        assert_eq!(service.list(org, None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn deleting_unknown_content_is_not_found() {
        assert_matches!(
            service().delete(Uuid::new_v4(), Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_pages_cannot_share_a_slug() {
        let service = service();
        let org = Uuid::new_v4();

        for round in 0..20 {
            let title = format!("Shipping {}", round);
            let attempts: Vec<_> = (0..8)
                .map(|_| {
                    let service = service.clone();
                    let content = draft(ContentKind::Page, &title, None);
                    tokio::spawn(async move { service.create(org, content).await })
                })
                .collect();

            let created = futures::future::join_all(attempts)
                .await
                .into_iter()
                .filter(|attempt| matches!(attempt, Ok(Ok(_))))
                .count();
            assert_eq!(created, 1);
        }

        assert_eq!(service.list(org, None).await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn updating_deleted_content_is_not_found() {
        let service = service();
        let org = Uuid::new_v4();
        let page = service
            .create(org, draft(ContentKind::Page, "Returns", None))
            .await
            .unwrap();
        service.delete(org, page.id).await.unwrap();

        let patch = ContentPatch {
            title: Some("Returns policy".into()),
            ..Default::default()
        };
        assert_matches!(
            service.update(org, page.id, patch).await,
            Err(ServiceError::NotFound(_))
        );
        assert!(service.list(org, None).await.unwrap().is_empty());
    }
}
