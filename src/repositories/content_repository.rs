use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::content::{ContentBlock, ContentKind};

/// Mutation applied to a block while the store holds it exclusively.
pub type ContentUpdate = Box<dyn FnOnce(&mut ContentBlock) + Send>;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Blocks of the organization, optionally of one kind, ordered by
    /// position then title.
    async fn list(
        &self,
        organization_id: Uuid,
        kind: Option<ContentKind>,
    ) -> Result<Vec<ContentBlock>, ServiceError>;

    async fn get(&self, organization_id: Uuid, id: Uuid)
        -> Result<Option<ContentBlock>, ServiceError>;

    /// Stores a new block, failing if its slug is already used in the
    /// organization.
    async fn insert(&self, block: ContentBlock) -> Result<(), ServiceError>;

    /// Applies `apply` to a stored block. A slug conflict rejects the whole
    /// update and a deleted block stays deleted.
    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        apply: ContentUpdate,
    ) -> Result<ContentBlock, ServiceError>;

    async fn delete(&self, organization_id: Uuid, id: Uuid) -> Result<bool, ServiceError>;
}

// Lock order: `blocks` before `slugs`, never the reverse.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    blocks: DashMap<Uuid, ContentBlock>,
    slugs: DashMap<(Uuid, String), Uuid>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_slug(&self, organization_id: Uuid, slug: &str, id: Uuid) -> Result<(), ServiceError> {
        match self.slugs.entry((organization_id, slug.to_string())) {
            Entry::Occupied(owner) if *owner.get() != id => Err(ServiceError::ValidationError(
                format!("slug '{}' is already in use", slug),
            )),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }

    fn release_slug(&self, organization_id: Uuid, slug: Option<String>, id: Uuid) {
        if let Some(slug) = slug {
            self.slugs.remove_if(&(organization_id, slug), |_, owner| *owner == id);
        }
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn list(
        &self,
        organization_id: Uuid,
        kind: Option<ContentKind>,
    ) -> Result<Vec<ContentBlock>, ServiceError> {
        let mut blocks: Vec<ContentBlock> = self
            .blocks
            .iter()
            .filter(|entry| entry.organization_id == organization_id)
            .filter(|entry| kind.map_or(true, |kind| entry.kind == kind))
            .map(|entry| entry.value().clone())
            .collect();
        blocks.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.title.cmp(&b.title))
                .then(a.id.cmp(&b.id))
        });
        Ok(blocks)
    }

    async fn get(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ContentBlock>, ServiceError> {
        Ok(self
            .blocks
            .get(&id)
            .filter(|entry| entry.organization_id == organization_id)
            .map(|entry| entry.value().clone()))
    }

    async fn insert(&self, block: ContentBlock) -> Result<(), ServiceError> {
        if let Some(slug) = &block.slug {
            self.claim_slug(block.organization_id, slug, block.id)?;
        }
        self.blocks.insert(block.id, block);
        Ok(())
    }

    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        apply: ContentUpdate,
    ) -> Result<ContentBlock, ServiceError> {
        let mut entry = self
            .blocks
            .get_mut(&id)
            .filter(|entry| entry.organization_id == organization_id)
            .ok_or_else(|| ServiceError::NotFound("Content not found".to_string()))?;

        let mut updated = entry.value().clone();
        apply(&mut updated);
        if updated.slug != entry.slug {
            if let Some(slug) = &updated.slug {
                self.claim_slug(organization_id, slug, id)?;
            }
            self.release_slug(organization_id, entry.slug.clone(), id);
        }
        *entry.value_mut() = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, organization_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        let Some((_, block)) = self
            .blocks
            .remove_if(&id, |_, block| block.organization_id == organization_id)
        else {
            return Ok(false);
        };
        self.release_slug(organization_id, block.slug, id);
        Ok(true)
    }
}
