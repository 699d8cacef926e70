//! services/coach/src/user_profile.rs
//!
//! The signed-in user's backend-owned profile, cached locally and exposed as
//! an observable value.
//!
//! Coin changes are never applied optimistically. Each adjustment asks the
//! backend, and the cache adopts the balance the backend answers with unless
//! that answer is older than what the cache already holds.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use practice_coach_core::domain::{BackendSession, CoinBalance, UserProfile};
use practice_coach_core::ports::{PortError, UserProfileBackend};

#[derive(Debug, thiserror::Error)]
pub enum UserProfileError {
    #[error("No user is signed in")]
    NotSignedIn,
    #[error("Coin amount must be positive and fit the backend's range, got {0}")]
    InvalidAmount(u64),
    #[error("Not enough coins: need {needed}, have {available}")]
    InsufficientCoins { needed: u64, available: u64 },
    #[error("Profile backend error: {0}")]
    Port(#[from] PortError),
}

/// Identity details a provider may hand over on sign-in, used to fill a
/// profile created on first login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityHints {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

pub struct UserProfileService {
    backend: Arc<dyn UserProfileBackend>,
    current: watch::Sender<Option<UserProfile>>,
}

impl UserProfileService {
    pub fn new(backend: Arc<dyn UserProfileBackend>) -> Self {
        let (current, _) = watch::channel(None);
        Self { backend, current }
    }

    /// Observes the cached profile; `None` until the first successful sign-in.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.current.subscribe()
    }

    pub fn current(&self) -> Option<UserProfile> {
        self.current.borrow().clone()
    }

    pub fn coins(&self) -> Option<u64> {
        self.current.borrow().as_ref().map(|p| p.coins)
    }

    /// Loads the profile for a freshly exchanged backend session, creating a
    /// zero-coin profile on the identity's first login and otherwise only
    /// recording the login time.
    pub async fn fetch_or_create(
        &self,
        session: &BackendSession,
        hints: IdentityHints,
    ) -> Result<UserProfile, UserProfileError> {
        let now = Utc::now();
        let profile = match self.backend.read_profile(&session.uid).await {
            Ok(_) => self.backend.record_login(&session.uid, now).await?,
            Err(PortError::NotFound(_)) => {
                info!("Creating profile for first login of {}", session.uid);
                let fresh = UserProfile::first_login(
                    session.uid.clone(),
                    hints.email,
                    hints.display_name,
                    now,
                );
                self.backend.create_profile(&fresh).await?
            }
            Err(e) => return Err(e.into()),
        };

        self.current.send_replace(Some(profile.clone()));
        Ok(profile)
    }

    /// Reloads an existing profile, e.g. when a stored session is resumed.
    /// Unlike `fetch_or_create` this never creates one.
    pub async fn load_existing(&self, uid: &str) -> Result<UserProfile, UserProfileError> {
        let profile = self.backend.read_profile(uid).await?;
        self.current.send_replace(Some(profile.clone()));
        Ok(profile)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Asks the backend to add `amount` coins and returns the cached balance
    /// afterwards.
    pub async fn credit_coins(&self, amount: u64) -> Result<u64, UserProfileError> {
        let delta = Self::delta(amount)?;
        let uid = self.signed_in_uid()?;
        let balance = self.backend.adjust_coins(&uid, delta).await?;
        Ok(self.reconcile(&uid, balance))
    }

    /// Asks the backend to remove `amount` coins and returns the cached
    /// balance afterwards.
    pub async fn debit_coins(&self, amount: u64) -> Result<u64, UserProfileError> {
        let delta = Self::delta(amount)?;
        let (uid, available) = {
            let current = self.current.borrow();
            let profile = current.as_ref().ok_or(UserProfileError::NotSignedIn)?;
            (profile.uid.clone(), profile.coins)
        };
        if available < amount {
            return Err(UserProfileError::InsufficientCoins {
                needed: amount,
                available,
            });
        }
        let balance = self.backend.adjust_coins(&uid, -delta).await?;
        Ok(self.reconcile(&uid, balance))
    }

    /// Adopts a profile pushed by a backend listener, under the same
    /// staleness rule as coin adjustments.
    pub fn apply_remote_snapshot(&self, snapshot: UserProfile) -> bool {
        self.current.send_if_modified(|slot| match slot {
            Some(cached) if cached.uid == snapshot.uid => {
                if snapshot.updated_at < cached.updated_at {
                    debug!("Ignoring stale profile snapshot for {}", snapshot.uid);
                    return false;
                }
                let changed = *cached != snapshot;
                *cached = snapshot;
                changed
            }
            _ => false,
        })
    }

    /// Forgets the cached profile, e.g. on sign-out.
    pub fn clear(&self) {
        self.current.send_replace(None);
    }

    fn delta(amount: u64) -> Result<i64, UserProfileError> {
        match i64::try_from(amount) {
            Ok(delta) if delta > 0 => Ok(delta),
            _ => Err(UserProfileError::InvalidAmount(amount)),
        }
    }

    fn signed_in_uid(&self) -> Result<String, UserProfileError> {
        self.current
            .borrow()
            .as_ref()
            .map(|p| p.uid.clone())
            .ok_or(UserProfileError::NotSignedIn)
    }

    fn reconcile(&self, uid: &str, balance: CoinBalance) -> u64 {
        self.current.send_if_modified(|slot| match slot {
            Some(cached) if cached.uid == uid => {
                if balance.updated_at < cached.updated_at {
                    debug!(
                        "Ignoring stale coin balance {} for {} (cached {})",
                        balance.coins, uid, cached.coins
                    );
                    return false;
                }
                cached.coins = balance.coins;
                cached.updated_at = balance.updated_at;
                true
            }
            _ => false,
        });
        self.coins().unwrap_or(balance.coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone};
    use practice_coach_core::ports::PortResult;
    use std::sync::Mutex;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    /// Backend double that answers coin adjustments from a scripted queue.
    struct ScriptedBackend {
        existing: Mutex<Option<UserProfile>>,
        balances: Mutex<Vec<CoinBalance>>,
        deltas: Mutex<Vec<i64>>,
    }

    impl ScriptedBackend {
        fn new(existing: Option<UserProfile>, balances: Vec<CoinBalance>) -> Self {
            Self {
                existing: Mutex::new(existing),
                balances: Mutex::new(balances),
                deltas: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl UserProfileBackend for ScriptedBackend {
        async fn read_profile(&self, uid: &str) -> PortResult<UserProfile> {
            self.existing
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| PortError::NotFound(uid.to_string()))
        }

        async fn create_profile(&self, profile: &UserProfile) -> PortResult<UserProfile> {
            *self.existing.lock().unwrap() = Some(profile.clone());
            Ok(profile.clone())
        }

        async fn record_login(&self, _uid: &str, at: DateTime<Utc>) -> PortResult<UserProfile> {
            let mut existing = self.existing.lock().unwrap();
            let profile = existing.as_mut().unwrap();
            profile.last_login_at = at;
            Ok(profile.clone())
        }

        async fn adjust_coins(&self, _uid: &str, delta: i64) -> PortResult<CoinBalance> {
            self.deltas.lock().unwrap().push(delta);
            Ok(self.balances.lock().unwrap().remove(0))
        }
    }

    fn session(uid: &str) -> BackendSession {
        BackendSession {
            uid: uid.to_string(),
            session_token: "session".to_string(),
            is_first_login: false,
        }
    }

    fn existing(uid: &str, coins: u64) -> UserProfile {
        UserProfile {
            uid: uid.to_string(),
            email: None,
            display_name: None,
            coins,
            created_at: at(0),
            updated_at: at(0),
            last_login_at: at(0),
        }
    }

    #[tokio::test]
    async fn first_login_creates_zero_coin_profile() {
        let service = UserProfileService::new(Arc::new(ScriptedBackend::new(None, Vec::new())));
        let hints = IdentityHints {
            email: Some("sam@example.com".to_string()),
            display_name: Some("Sam".to_string()),
        };

        let profile = service.fetch_or_create(&session("u1"), hints).await.unwrap();
        assert_eq!(profile.coins, 0);
        assert_eq!(profile.email.as_deref(), Some("sam@example.com"));
        assert_eq!(profile.created_at, profile.updated_at);
        assert_eq!(profile.created_at, profile.last_login_at);
        assert_eq!(service.current(), Some(profile));
    }

    #[tokio::test]
    async fn returning_login_only_updates_last_login() {
        let backend = Arc::new(ScriptedBackend::new(Some(existing("u1", 40)), Vec::new()));
        let service = UserProfileService::new(backend);

        let profile = service
            .fetch_or_create(&session("u1"), IdentityHints::default())
            .await
            .unwrap();
        assert_eq!(profile.coins, 40);
        assert_eq!(profile.created_at, at(0));
        assert!(profile.last_login_at > at(0));
    }

    #[tokio::test]
    async fn credit_adopts_backend_balance() {
        let backend = Arc::new(ScriptedBackend::new(
            Some(existing("u1", 10)),
            vec![CoinBalance { coins: 115, updated_at: at(5) }],
        ));
        let service = UserProfileService::new(backend.clone());
        service
            .fetch_or_create(&session("u1"), IdentityHints::default())
            .await
            .unwrap();

        // Backend also applied a concurrent credit, so its answer is not 10 + 5.
        assert_eq!(service.credit_coins(5).await.unwrap(), 115);
        assert_eq!(service.coins(), Some(115));
        assert_eq!(*backend.deltas.lock().unwrap(), vec![5]);
    }

    #[tokio::test]
    async fn stale_balance_is_ignored() {
        let backend = Arc::new(ScriptedBackend::new(
            Some(existing("u1", 0)),
            vec![
                CoinBalance { coins: 30, updated_at: at(20) },
                CoinBalance { coins: 10, updated_at: at(10) },
            ],
        ));
        let service = UserProfileService::new(backend);
        service
            .fetch_or_create(&session("u1"), IdentityHints::default())
            .await
            .unwrap();

        assert_eq!(service.credit_coins(20).await.unwrap(), 30);
        assert_eq!(service.credit_coins(10).await.unwrap(), 30);
    }

    #[tokio::test]
    async fn debit_checks_cached_balance_first() {
        let backend = Arc::new(ScriptedBackend::new(
            Some(existing("u1", 3)),
            vec![CoinBalance { coins: 1, updated_at: at(1) }],
        ));
        let service = UserProfileService::new(backend.clone());
        service
            .fetch_or_create(&session("u1"), IdentityHints::default())
            .await
            .unwrap();

        let err = service.debit_coins(5).await.unwrap_err();
        assert!(matches!(err, UserProfileError::InsufficientCoins { needed: 5, available: 3 }));
        assert!(backend.deltas.lock().unwrap().is_empty());

        assert_eq!(service.debit_coins(2).await.unwrap(), 1);
        assert_eq!(*backend.deltas.lock().unwrap(), vec![-2]);
    }

    #[tokio::test]
    async fn coin_changes_require_sign_in_and_positive_amount() {
        let service = UserProfileService::new(Arc::new(ScriptedBackend::new(None, Vec::new())));
        assert!(matches!(
            service.credit_coins(5).await,
            Err(UserProfileError::NotSignedIn)
        ));
        assert!(matches!(
            service.credit_coins(0).await,
            Err(UserProfileError::InvalidAmount(0))
        ));
        assert!(matches!(
            service.debit_coins(u64::MAX).await,
            Err(UserProfileError::InvalidAmount(_))
        ));
    }

    #[tokio::test]
    async fn snapshots_follow_staleness_rule_and_notify() {
        let backend = Arc::new(ScriptedBackend::new(Some(existing("u1", 0)), Vec::new()));
        let service = UserProfileService::new(backend);
        let mut rx = service.subscribe();
        service
            .fetch_or_create(&session("u1"), IdentityHints::default())
            .await
            .unwrap();
        let _ = rx.borrow_and_update();

        let mut newer = existing("u1", 50);
        newer.updated_at = at(0) + Duration::seconds(30);
        assert!(service.apply_remote_snapshot(newer));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|p| p.coins), Some(50));

        assert!(!service.apply_remote_snapshot(existing("u1", 7)));
        assert!(!service.apply_remote_snapshot(existing("someone-else", 7)));
        assert_eq!(service.coins(), Some(50));

        service.clear();
        assert_eq!(service.current(), None);
    }
}
