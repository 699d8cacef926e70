//! services/coach/src/rewards.rs
//!
//! Turns completed purchases and watched rewarded ads into coin credits.

use std::sync::Arc;
use tracing::{info, warn};

use practice_coach_core::domain::{AdOutcome, Product, PurchaseOutcome};
use practice_coach_core::ports::{AdProvider, PortError, PurchaseProvider};

use crate::user_profile::{UserProfileError, UserProfileService};

#[derive(Debug, thiserror::Error)]
pub enum RewardError {
    #[error("Unknown product: {0}")]
    UnknownProduct(String),
    #[error("No rewarded ad is ready")]
    AdNotReady,
    #[error("Store or ad provider error: {0}")]
    Provider(#[from] PortError),
    #[error(transparent)]
    Profile(#[from] UserProfileError),
}

/// What a purchase or ad view ended up doing to the balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardOutcome {
    Credited { coins: u64, balance: u64 },
    NotCredited,
}

pub struct RewardService {
    profiles: Arc<UserProfileService>,
    purchases: Arc<dyn PurchaseProvider>,
    ads: Arc<dyn AdProvider>,
    ad_reward_coins: u64,
    catalog: Vec<Product>,
    ad_ready: bool,
}

impl RewardService {
    pub fn new(
        profiles: Arc<UserProfileService>,
        purchases: Arc<dyn PurchaseProvider>,
        ads: Arc<dyn AdProvider>,
        ad_reward_coins: u64,
    ) -> Self {
        Self {
            profiles,
            purchases,
            ads,
            ad_reward_coins,
            catalog: Vec::new(),
            ad_ready: false,
        }
    }

    pub fn catalog(&self) -> &[Product] {
        &self.catalog
    }

    pub async fn fetch_catalog(&mut self) -> Result<&[Product], RewardError> {
        self.catalog = self.purchases.fetch_products().await?;
        info!("Loaded {} store products", self.catalog.len());
        Ok(&self.catalog)
    }

    /// Buys `product_id` and credits its coins once the store confirms it.
    pub async fn purchase(&mut self, product_id: &str) -> Result<RewardOutcome, RewardError> {
        let coins = self
            .catalog
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.coins)
            .ok_or_else(|| RewardError::UnknownProduct(product_id.to_string()))?;
        self.ensure_recipient()?;

        match self.purchases.purchase(product_id).await? {
            PurchaseOutcome::Purchased { transaction_id } => {
                info!("Purchase {} of {} completed", transaction_id, product_id);
                let balance = self.profiles.credit_coins(coins).await?;
                Ok(RewardOutcome::Credited { coins, balance })
            }
            PurchaseOutcome::Cancelled => {
                info!("Purchase of {} cancelled", product_id);
                Ok(RewardOutcome::NotCredited)
            }
            PurchaseOutcome::Pending => {
                info!("Purchase of {} is pending approval", product_id);
                Ok(RewardOutcome::NotCredited)
            }
        }
    }

    /// Loads a rewarded ad; returns whether one is ready to show.
    pub async fn prepare_ad(&mut self) -> Result<bool, RewardError> {
        self.ad_ready = self.ads.load_ad().await?;
        Ok(self.ad_ready)
    }

    /// Shows the loaded ad and credits the reward if it was watched through.
    pub async fn show_rewarded_ad(&mut self) -> Result<RewardOutcome, RewardError> {
        if !self.ad_ready {
            return Err(RewardError::AdNotReady);
        }
        self.ensure_recipient()?;
        // A shown ad is spent whether or not it pays out.
        self.ad_ready = false;

        match self.ads.show_ad().await? {
            AdOutcome::Rewarded => {
                let coins = self.ad_reward_coins;
                let balance = self.profiles.credit_coins(coins).await?;
                Ok(RewardOutcome::Credited { coins, balance })
            }
            AdOutcome::Dismissed => {
                warn!("Rewarded ad dismissed before completion");
                Ok(RewardOutcome::NotCredited)
            }
        }
    }

    /// Coins need a signed-in user to land on, so nothing is bought or
    /// shown without one.
    fn ensure_recipient(&self) -> Result<(), RewardError> {
        if !self.profiles.is_signed_in() {
            warn!("Refusing reward flow with no signed-in user");
            return Err(UserProfileError::NotSignedIn.into());
        }
        Ok(())
    }
}
