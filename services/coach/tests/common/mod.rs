//! In-memory doubles for every external collaborator.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use coach_lib::auth::nonce::hash_nonce;
use coach_lib::{AppContext, Collaborators, Config};
use practice_coach_core::domain::{
    AdOutcome, BackendSession, CoinBalance, ExchangeRequest, FederatedCredential,
    NativeCredential, Product, ProviderKind, PurchaseOutcome, UserProfile,
};
use practice_coach_core::ports::{
    AdProvider, FederatedIdentityProvider, IdentityExchangeService, NativeIdentityProvider,
    PortError, PortResult, ProviderError, PurchaseProvider, SecretStore, UserProfileBackend,
};

//=========================================================================================
// Secret Store
//=========================================================================================

#[derive(Default)]
pub struct MemorySecrets(Mutex<HashMap<String, Vec<u8>>>);

impl SecretStore for MemorySecrets {
    fn save(&self, key: &str, bytes: &[u8]) -> bool {
        self.0.lock().unwrap().insert(key.to_string(), bytes.to_vec());
        true
    }

    fn load(&self, key: &str) -> Option<Vec<u8>> {
        self.0.lock().unwrap().get(key).cloned()
    }

    fn delete(&self, key: &str) -> bool {
        self.0.lock().unwrap().remove(key).is_some()
    }
}

//=========================================================================================
// Identity Providers
//=========================================================================================

pub fn token_for(hashed_nonce: &str) -> String {
    format!("identity-token-for-{hashed_nonce}")
}

pub enum NativeBehaviour {
    Approve,
    Cancel,
    Fail(&'static str),
    OmitToken,
}

pub struct FakeNativeProvider {
    pub behaviour: NativeBehaviour,
    pub seen_hashes: Mutex<Vec<String>>,
}

impl FakeNativeProvider {
    pub fn new(behaviour: NativeBehaviour) -> Self {
        Self {
            behaviour,
            seen_hashes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NativeIdentityProvider for FakeNativeProvider {
    async fn request_credential(&self, hashed_nonce: &str) -> Result<NativeCredential, ProviderError> {
        self.seen_hashes.lock().unwrap().push(hashed_nonce.to_string());
        let credential = NativeCredential {
            user_identifier: "000123.native".to_string(),
            identity_token: Some(token_for(hashed_nonce)),
            nonce_hash: Some(hashed_nonce.to_string()),
            email: Some("relay@privaterelay.example".to_string()),
            display_name: Some("Sam Rivera".to_string()),
        };
        match self.behaviour {
            NativeBehaviour::Approve => Ok(credential),
            NativeBehaviour::Cancel => Err(ProviderError::Cancelled),
            NativeBehaviour::Fail(message) => Err(ProviderError::Failed(message.to_string())),
            NativeBehaviour::OmitToken => Ok(NativeCredential {
                identity_token: None,
                ..credential
            }),
        }
    }
}

/// A provider whose sign-in sheet never resolves.
pub struct SilentNativeProvider;

#[async_trait]
impl NativeIdentityProvider for SilentNativeProvider {
    async fn request_credential(&self, _hashed_nonce: &str) -> Result<NativeCredential, ProviderError> {
        std::future::pending().await
    }
}

pub struct FakeFederatedProvider {
    pub result: Result<FederatedCredential, ProviderError>,
}

impl FakeFederatedProvider {
    pub fn approving() -> Self {
        Self {
            result: Ok(FederatedCredential {
                id_token: Some("federated-id-token".to_string()),
                access_token: Some("federated-access-token".to_string()),
                email: Some("sam@example.com".to_string()),
                display_name: Some("Sam".to_string()),
            }),
        }
    }
}

#[async_trait]
impl FederatedIdentityProvider for FakeFederatedProvider {
    async fn sign_in(&self) -> Result<FederatedCredential, ProviderError> {
        self.result.clone()
    }
}

//=========================================================================================
// Backend
//=========================================================================================

/// Checks native tokens against the raw nonce the same way the real
/// backend does, and records every request.
#[derive(Default)]
pub struct FakeExchange {
    pub requests: Mutex<Vec<ExchangeRequest>>,
}

#[async_trait]
impl IdentityExchangeService for FakeExchange {
    async fn exchange(&self, request: ExchangeRequest) -> PortResult<BackendSession> {
        self.requests.lock().unwrap().push(request.clone());
        let uid = match request.provider {
            ProviderKind::Native => {
                let raw = request.raw_nonce.as_deref().ok_or(PortError::Unauthorized)?;
                if request.token != token_for(&hash_nonce(raw)) {
                    return Err(PortError::Unauthorized);
                }
                "native-uid"
            }
            ProviderKind::Federated => "federated-uid",
        };
        Ok(BackendSession {
            uid: uid.to_string(),
            session_token: format!("session-{uid}"),
            is_first_login: false,
        })
    }
}

/// Profile backend holding profiles in memory. Coin adjustments may be
/// gated per delta so a test can decide the order responses arrive in.
#[derive(Default)]
pub struct FakeProfileBackend {
    pub profiles: Mutex<HashMap<String, UserProfile>>,
    pub gates: Mutex<HashMap<i64, (oneshot::Receiver<()>, CoinBalance)>>,
}

impl FakeProfileBackend {
    pub fn gate(&self, delta: i64, balance: CoinBalance) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(delta, (rx, balance));
        tx
    }
}

#[async_trait]
impl UserProfileBackend for FakeProfileBackend {
    async fn read_profile(&self, uid: &str) -> PortResult<UserProfile> {
        self.profiles
            .lock()
            .unwrap()
            .get(uid)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("profile {uid}")))
    }

    async fn create_profile(&self, profile: &UserProfile) -> PortResult<UserProfile> {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.uid.clone(), profile.clone());
        Ok(profile.clone())
    }

    async fn record_login(&self, uid: &str, at: DateTime<Utc>) -> PortResult<UserProfile> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(uid)
            .ok_or_else(|| PortError::NotFound(format!("profile {uid}")))?;
        profile.last_login_at = at;
        Ok(profile.clone())
    }

    async fn adjust_coins(&self, uid: &str, delta: i64) -> PortResult<CoinBalance> {
        let gated = self.gates.lock().unwrap().remove(&delta);
        if let Some((release, balance)) = gated {
            release
                .await
                .map_err(|_| PortError::Unexpected("gate dropped".to_string()))?;
            return Ok(balance);
        }

        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(uid)
            .ok_or_else(|| PortError::NotFound(format!("profile {uid}")))?;
        profile.coins = profile
            .coins
            .checked_add_signed(delta)
            .ok_or_else(|| PortError::Unexpected("balance out of range".to_string()))?;
        profile.updated_at = Utc::now();
        Ok(CoinBalance {
            coins: profile.coins,
            updated_at: profile.updated_at,
        })
    }
}

//=========================================================================================
// Store and Ads
//=========================================================================================

pub struct FakeStore {
    pub outcome: PurchaseOutcome,
    pub purchased: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn new(outcome: PurchaseOutcome) -> Self {
        Self {
            outcome,
            purchased: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PurchaseProvider for FakeStore {
    async fn fetch_products(&self) -> PortResult<Vec<Product>> {
        Ok(vec![
            Product {
                id: "coins_100".to_string(),
                display_name: "100 Coins".to_string(),
                display_price: "$0.99".to_string(),
                coins: 100,
            },
            Product {
                id: "coins_550".to_string(),
                display_name: "550 Coins".to_string(),
                display_price: "$4.99".to_string(),
                coins: 550,
            },
        ])
    }

    async fn purchase(&self, product_id: &str) -> PortResult<PurchaseOutcome> {
        self.purchased.lock().unwrap().push(product_id.to_string());
        Ok(self.outcome.clone())
    }
}

pub struct FakeAds {
    pub ready: bool,
    pub outcome: AdOutcome,
    pub shown: Mutex<u32>,
}

impl FakeAds {
    pub fn new(ready: bool, outcome: AdOutcome) -> Self {
        Self {
            ready,
            outcome,
            shown: Mutex::new(0),
        }
    }
}

#[async_trait]
impl AdProvider for FakeAds {
    async fn load_ad(&self) -> PortResult<bool> {
        Ok(self.ready)
    }

    async fn show_ad(&self) -> PortResult<AdOutcome> {
        *self.shown.lock().unwrap() += 1;
        Ok(self.outcome)
    }
}

//=========================================================================================
// Harness
//=========================================================================================

pub struct Harness {
    pub secrets: Arc<MemorySecrets>,
    pub exchange: Arc<FakeExchange>,
    pub backend: Arc<FakeProfileBackend>,
    pub store: Arc<FakeStore>,
    pub ads: Arc<FakeAds>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store_and_ads(
            FakeStore::new(PurchaseOutcome::Purchased {
                transaction_id: "txn-1".to_string(),
            }),
            FakeAds::new(true, AdOutcome::Rewarded),
        )
    }

    pub fn with_store_and_ads(store: FakeStore, ads: FakeAds) -> Self {
        Self {
            secrets: Arc::new(MemorySecrets::default()),
            exchange: Arc::new(FakeExchange::default()),
            backend: Arc::new(FakeProfileBackend::default()),
            store: Arc::new(store),
            ads: Arc::new(ads),
        }
    }

    pub fn context(&self, data_dir: &Path) -> AppContext {
        let config = Config::from_lookup(|name| match name {
            "COACH_DATA_DIR" => Some(data_dir.display().to_string()),
            "AD_REWARD_COINS" => Some("15".to_string()),
            _ => None,
        })
        .expect("test configuration is valid");

        AppContext::new(
            Arc::new(config),
            Collaborators {
                secrets: self.secrets.clone(),
                identity_exchange: self.exchange.clone(),
                profile_backend: self.backend.clone(),
                purchases: self.store.clone(),
                ads: self.ads.clone(),
            },
        )
    }
}
