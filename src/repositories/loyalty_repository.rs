use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::loyalty::{LoyaltyMember, Redemption, Reward};

/// Mutation applied to a member while the store holds it exclusively.
pub type MemberUpdate = Box<dyn FnOnce(&mut LoyaltyMember) -> Result<(), ServiceError> + Send>;

/// Mutation applied to a reward while the store holds it exclusively.
pub type RewardUpdate = Box<dyn FnOnce(&mut Reward) + Send>;

/// Organization-scoped loyalty program records.
#[async_trait]
pub trait LoyaltyStore: Send + Sync {
    async fn members(&self, organization_id: Uuid) -> Result<Vec<LoyaltyMember>, ServiceError>;

    /// Inserts `member` unless its customer is already enrolled in the
    /// organization. Returns `false` and stores nothing in that case.
    async fn insert_member_unique(&self, member: LoyaltyMember) -> Result<bool, ServiceError>;

    /// Applies `apply` atomically; an `Err` from it leaves the member unchanged.
    async fn update_member(
        &self,
        organization_id: Uuid,
        member_id: Uuid,
        apply: MemberUpdate,
    ) -> Result<LoyaltyMember, ServiceError>;

    /// Removes the member and its redemption history.
    async fn delete_member(&self, organization_id: Uuid, member_id: Uuid)
        -> Result<bool, ServiceError>;

    async fn rewards(&self, organization_id: Uuid) -> Result<Vec<Reward>, ServiceError>;

    async fn reward(
        &self,
        organization_id: Uuid,
        reward_id: Uuid,
    ) -> Result<Option<Reward>, ServiceError>;

    async fn insert_reward(&self, reward: Reward) -> Result<(), ServiceError>;

    /// Applies `apply` to a stored reward; a deleted reward stays deleted.
    async fn update_reward(
        &self,
        organization_id: Uuid,
        reward_id: Uuid,
        apply: RewardUpdate,
    ) -> Result<Reward, ServiceError>;

    async fn delete_reward(&self, organization_id: Uuid, reward_id: Uuid)
        -> Result<bool, ServiceError>;

    async fn record_redemption(
        &self,
        organization_id: Uuid,
        redemption: Redemption,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
pub struct InMemoryLoyaltyStore {
    members: DashMap<Uuid, LoyaltyMember>,
    /// `(organization, customer)` to member id; claimed before a member is stored.
    enrollments: DashMap<(Uuid, Uuid), Uuid>,
    rewards: DashMap<Uuid, Reward>,
    redemptions: DashMap<Uuid, Vec<Redemption>>,
}

impl InMemoryLoyaltyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redemptions(&self, organization_id: Uuid) -> Vec<Redemption> {
        self.redemptions
            .get(&organization_id)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

fn member_not_found() -> ServiceError {
    ServiceError::NotFound("Loyalty member not found".to_string())
}

#[async_trait]
impl LoyaltyStore for InMemoryLoyaltyStore {
    async fn members(&self, organization_id: Uuid) -> Result<Vec<LoyaltyMember>, ServiceError> {
        let mut members: Vec<LoyaltyMember> = self
            .members
            .iter()
            .filter(|entry| entry.organization_id == organization_id)
            .map(|entry| entry.value().clone())
            .collect();
        members.sort_by(|a, b| a.enrolled_at.cmp(&b.enrolled_at).then(a.id.cmp(&b.id)));
        Ok(members)
    }

    async fn insert_member_unique(&self, member: LoyaltyMember) -> Result<bool, ServiceError> {
        match self
            .enrollments
            .entry((member.organization_id, member.customer_id))
        {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(member.id);
                self.members.insert(member.id, member);
                Ok(true)
            }
        }
    }

    async fn update_member(
        &self,
        organization_id: Uuid,
        member_id: Uuid,
        apply: MemberUpdate,
    ) -> Result<LoyaltyMember, ServiceError> {
        let mut entry = self
            .members
            .get_mut(&member_id)
            .filter(|entry| entry.organization_id == organization_id)
            .ok_or_else(member_not_found)?;

        let mut updated = entry.value().clone();
        apply(&mut updated)?;
        *entry.value_mut() = updated.clone();
        Ok(updated)
    }

    async fn delete_member(
        &self,
        organization_id: Uuid,
        member_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let Some((_, member)) = self
            .members
            .remove_if(&member_id, |_, member| member.organization_id == organization_id)
        else {
            return Ok(false);
        };

        self.enrollments
            .remove_if(&(organization_id, member.customer_id), |_, id| *id == member_id);
        if let Some(mut history) = self.redemptions.get_mut(&organization_id) {
            history.retain(|redemption| redemption.member_id != member_id);
        }
        Ok(true)
    }

    async fn rewards(&self, organization_id: Uuid) -> Result<Vec<Reward>, ServiceError> {
        let mut rewards: Vec<Reward> = self
            .rewards
            .iter()
            .filter(|entry| entry.organization_id == organization_id)
            .map(|entry| entry.value().clone())
            .collect();
        rewards.sort_by(|a, b| a.points_cost.cmp(&b.points_cost).then(a.name.cmp(&b.name)));
        Ok(rewards)
    }

    async fn reward(
        &self,
        organization_id: Uuid,
        reward_id: Uuid,
    ) -> Result<Option<Reward>, ServiceError> {
        Ok(self
            .rewards
            .get(&reward_id)
            .filter(|entry| entry.organization_id == organization_id)
            .map(|entry| entry.value().clone()))
    }

    async fn insert_reward(&self, reward: Reward) -> Result<(), ServiceError> {
        self.rewards.insert(reward.id, reward);
        Ok(())
    }

    async fn update_reward(
        &self,
        organization_id: Uuid,
        reward_id: Uuid,
        apply: RewardUpdate,
    ) -> Result<Reward, ServiceError> {
        let mut entry = self
            .rewards
            .get_mut(&reward_id)
            .filter(|entry| entry.organization_id == organization_id)
            .ok_or_else(|| ServiceError::NotFound("Reward not found".to_string()))?;

        apply(entry.value_mut());
        Ok(entry.value().clone())
    }

    async fn delete_reward(
        &self,
        organization_id: Uuid,
        reward_id: Uuid,
    ) -> Result<bool, ServiceError> {
        Ok(self
            .rewards
            .remove_if(&reward_id, |_, reward| reward.organization_id == organization_id)
            .is_some())
    }

    async fn record_redemption(
        &self,
        organization_id: Uuid,
        redemption: Redemption,
    ) -> Result<(), ServiceError> {
        self.redemptions
            .entry(organization_id)
            .or_default()
            .push(redemption);
        Ok(())
    }
}
