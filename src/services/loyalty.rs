use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::SharedClock;
use crate::errors::ServiceError;
use crate::models::loyalty::{
    LoyaltyMember, LoyaltySummary, Redemption, Reward, TierCount, TierInfo,
};
use crate::reports::thresholds::LoyaltyTier;
use crate::repositories::LoyaltyStore;

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewardPatch {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1_000_000))]
    pub points_cost: Option<i32>,
    pub active: Option<bool>,
}

/// Points ledger and reward catalog of an organization's loyalty program.
#[derive(Clone)]
pub struct LoyaltyService {
    store: Arc<dyn LoyaltyStore>,
    clock: SharedClock,
}

impl LoyaltyService {
    pub fn new(store: Arc<dyn LoyaltyStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    pub async fn members(&self, organization_id: Uuid) -> Result<Vec<LoyaltyMember>, ServiceError> {
        self.store.members(organization_id).await
    }

    pub async fn rewards(&self, organization_id: Uuid) -> Result<Vec<Reward>, ServiceError> {
        self.store.rewards(organization_id).await
    }

    /// Every tier, highest first, with its threshold and current membership.
    pub async fn tiers(&self, organization_id: Uuid) -> Result<Vec<TierInfo>, ServiceError> {
        let distribution = self.tier_distribution(organization_id).await?;
        Ok(distribution
            .into_iter()
            .map(|TierCount { tier, members }| TierInfo {
                tier,
                min_points: tier.min_points(),
                members,
            })
            .collect())
    }

    pub async fn summary(&self, organization_id: Uuid) -> Result<LoyaltySummary, ServiceError> {
        let members = self.store.members(organization_id).await?;
        Ok(LoyaltySummary {
            members: members.len() as u64,
            points_outstanding: members.iter().map(|m| m.points_balance).sum(),
            tier_distribution: distribution(&members),
        })
    }

    async fn tier_distribution(&self, organization_id: Uuid) -> Result<Vec<TierCount>, ServiceError> {
        let members = self.store.members(organization_id).await?;
        Ok(distribution(&members))
    }

    #[instrument(skip(self))]
    pub async fn enroll(
        &self,
        organization_id: Uuid,
        customer_id: Uuid,
    ) -> Result<LoyaltyMember, ServiceError> {
        let member = LoyaltyMember::enroll(organization_id, customer_id, self.clock.now());
        if !self.store.insert_member_unique(member.clone()).await? {
            return Err(ServiceError::ValidationError(
                "Customer is already enrolled".to_string(),
            ));
        }
        info!(member_id = %member.id, "loyalty member enrolled");
        Ok(member)
    }

    /// Adds (or with a negative amount, deducts) points. Earned points raise
    /// lifetime points and may promote the member; deductions never demote.
    #[instrument(skip(self))]
    pub async fn adjust_points(
        &self,
        organization_id: Uuid,
        member_id: Uuid,
        points: i64,
        reason: &str,
    ) -> Result<LoyaltyMember, ServiceError> {
        if points == 0 {
            return Err(ServiceError::ValidationError(
                "points must not be zero".to_string(),
            ));
        }

        let now = self.clock.now();
        let member = self
            .store
            .update_member(
                organization_id,
                member_id,
                Box::new(move |member| {
                    let balance = member.points_balance + points;
                    if balance < 0 {
                        return Err(ServiceError::ValidationError(
                            "Insufficient points balance".to_string(),
                        ));
                    }
                    member.points_balance = balance;
                    if points > 0 {
                        member.lifetime_points += points;
                        member.tier = LoyaltyTier::classify(member.lifetime_points);
                    }
                    member.updated_at = now;
                    Ok(())
                }),
            )
            .await?;

        info!(%member_id, points, reason, tier = ?member.tier, "loyalty points adjusted");
        Ok(member)
    }

    #[instrument(skip(self, description))]
    pub async fn create_reward(
        &self,
        organization_id: Uuid,
        name: String,
        description: Option<String>,
        points_cost: i64,
    ) -> Result<Reward, ServiceError> {
        let now = self.clock.now();
        let reward = Reward {
            id: Uuid::new_v4(),
            organization_id,
            name,
            description,
            points_cost,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_reward(reward.clone()).await?;
        Ok(reward)
    }

    pub async fn update_reward(
        &self,
        organization_id: Uuid,
        reward_id: Uuid,
        patch: RewardPatch,
    ) -> Result<Reward, ServiceError> {
        let now = self.clock.now();
        self.store
            .update_reward(
                organization_id,
                reward_id,
                Box::new(move |reward| {
                    if let Some(name) = patch.name {
                        reward.name = name;
                    }
                    if let Some(description) = patch.description {
                        reward.description = Some(description);
                    }
                    if let Some(points_cost) = patch.points_cost {
                        reward.points_cost = i64::from(points_cost);
                    }
                    if let Some(active) = patch.active {
                        reward.active = active;
                    }
                    reward.updated_at = now;
                }),
            )
            .await
    }

    /// Spends the reward's cost from the member's balance.
    #[instrument(skip(self))]
    pub async fn redeem(
        &self,
        organization_id: Uuid,
        member_id: Uuid,
        reward_id: Uuid,
    ) -> Result<Redemption, ServiceError> {
        let reward = self.reward(organization_id, reward_id).await?;
        if !reward.active {
            return Err(ServiceError::ValidationError(
                "Reward is not active".to_string(),
            ));
        }

        let now = self.clock.now();
        let cost = reward.points_cost;
        let member = self
            .store
            .update_member(
                organization_id,
                member_id,
                Box::new(move |member| {
                    if member.points_balance < cost {
                        return Err(ServiceError::ValidationError(
                            "Insufficient points balance".to_string(),
                        ));
                    }
                    member.points_balance -= cost;
                    member.updated_at = now;
                    Ok(())
                }),
            )
            .await?;

        let redemption = Redemption {
            id: Uuid::new_v4(),
            member_id,
            reward_id,
            points_spent: cost,
            remaining_balance: member.points_balance,
            redeemed_at: now,
        };
        self.store
            .record_redemption(organization_id, redemption.clone())
            .await?;
        info!(%member_id, %reward_id, cost, "reward redeemed");
        Ok(redemption)
    }

    pub async fn remove_member(&self, organization_id: Uuid, member_id: Uuid) -> Result<(), ServiceError> {
        if !self.store.delete_member(organization_id, member_id).await? {
            return Err(ServiceError::NotFound("Loyalty member not found".to_string()));
        }
        Ok(())
    }

    pub async fn remove_reward(&self, organization_id: Uuid, reward_id: Uuid) -> Result<(), ServiceError> {
        if !self.store.delete_reward(organization_id, reward_id).await? {
            return Err(ServiceError::NotFound("Reward not found".to_string()));
        }
        Ok(())
    }

    async fn reward(&self, organization_id: Uuid, reward_id: Uuid) -> Result<Reward, ServiceError> {
        self.store
            .reward(organization_id, reward_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Reward not found".to_string()))
    }
}

fn distribution(members: &[LoyaltyMember]) -> Vec<TierCount> {
    LoyaltyTier::ALL
        .iter()
        .map(|tier| TierCount {
            tier: *tier,
            members: members.iter().filter(|m| m.tier == *tier).count() as u64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FixedClock;
    use crate::repositories::InMemoryLoyaltyStore;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn service() -> LoyaltyService {
        LoyaltyService::new(
            Arc::new(InMemoryLoyaltyStore::new()),
            Arc::new(FixedClock(Utc::now())),
        )
    }

    #[tokio::test]
    async fn earning_points_promotes_through_tiers() {
        let service = service();
        let org = Uuid::new_v4();
        let member = service.enroll(org, Uuid::new_v4()).await.unwrap();
        assert_eq!(member.tier, LoyaltyTier::Bronze);

        let member = service.adjust_points(org, member.id, 499, "order").await.unwrap();
        assert_eq!(member.tier, LoyaltyTier::Bronze);
        let member = service.adjust_points(org, member.id, 1, "order").await.unwrap();
        assert_eq!(member.tier, LoyaltyTier::Silver);
        let member = service.adjust_points(org, member.id, 4500, "order").await.unwrap();
        assert_eq!(member.tier, LoyaltyTier::Platinum);

        let member = service.adjust_points(org, member.id, -4000, "correction").await.unwrap();
        assert_eq!(member.points_balance, 1000);
        assert_eq!(member.lifetime_points, 5000);
        assert_eq!(member.tier, LoyaltyTier::Platinum);
    }

    #[tokio::test]
    async fn balance_never_goes_negative() {
        let service = service();
        let org = Uuid::new_v4();
        let member = service.enroll(org, Uuid::new_v4()).await.unwrap();
        service.adjust_points(org, member.id, 100, "order").await.unwrap();

        assert_matches!(
            service.adjust_points(org, member.id, -101, "correction").await,
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            service.adjust_points(org, member.id, 0, "noop").await,
            Err(ServiceError::ValidationError(_))
        );
        assert_eq!(service.summary(org).await.unwrap().points_outstanding, 100);
    }

    #[tokio::test]
    async fn redemption_checks_balance_and_reward_state() {
        let service = service();
        let org = Uuid::new_v4();
        let member = service.enroll(org, Uuid::new_v4()).await.unwrap();
        service.adjust_points(org, member.id, 300, "order").await.unwrap();
        let reward = service
            .create_reward(org, "Free shipping".into(), None, 250)
            .await
            .unwrap();

        let redemption = service.redeem(org, member.id, reward.id).await.unwrap();
        assert_eq!(redemption.remaining_balance, 50);

        assert_matches!(
            service.redeem(org, member.id, reward.id).await,
            Err(ServiceError::ValidationError(msg)) if msg.contains("Insufficient")
        );

        service
            .update_reward(
                org,
                reward.id,
                RewardPatch {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        service.adjust_points(org, member.id, 1000, "order").await.unwrap();
        assert_matches!(
            service.redeem(org, member.id, reward.id).await,
            Err(ServiceError::ValidationError(msg)) if msg.contains("not active")
        );
    }

    #[tokio::test]
    async fn duplicate_enrollment_is_rejected() {
        let service = service();
        let org = Uuid::new_v4();
        let customer = Uuid::new_v4();
        service.enroll(org, customer).await.unwrap();
        assert_matches!(
            service.enroll(org, customer).await,
            Err(ServiceError::ValidationError(_))
        );
        service.enroll(Uuid::new_v4(), customer).await.unwrap();
    }

    #[tokio::test]
    async fn tiers_list_every_level() {
        let service = service();
        let org = Uuid::new_v4();
        service.enroll(org, Uuid::new_v4()).await.unwrap();

        let tiers = service.tiers(org).await.unwrap();
        assert_eq!(tiers.len(), 4);
        assert_eq!(tiers[0].tier, LoyaltyTier::Platinum);
        assert_eq!(tiers[3].members, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_enrollments_create_one_member() {
        let service = service();
        let org = Uuid::new_v4();

        for _ in 0..20 {
            let customer = Uuid::new_v4();
            let attempts: Vec<_> = (0..8)
                .map(|_| {
                    let service = service.clone();
                    tokio::spawn(async move { service.enroll(org, customer).await })
                })
                .collect();

            let mut enrolled = 0;
            for attempt in futures::future::join_all(attempts).await {
                match attempt.unwrap() {
                    Ok(_) => enrolled += 1,
                    Err(err) => assert_matches!(err, ServiceError::ValidationError(_)),
                }
            }
            assert_eq!(enrolled, 1);
        }

        assert_eq!(service.members(org).await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn updating_a_removed_reward_is_not_found() {
        let service = service();
        let org = Uuid::new_v4();
        let reward = service
            .create_reward(org, "Mug".into(), None, 100)
            .await
            .unwrap();
        service.remove_reward(org, reward.id).await.unwrap();

        let patch = RewardPatch {
            name: Some("Big mug".into()),
            ..Default::default()
        };
        assert_matches!(
            service.update_reward(org, reward.id, patch).await,
            Err(ServiceError::NotFound(_))
        );
        assert!(service.rewards(org).await.unwrap().is_empty());
    }
}
