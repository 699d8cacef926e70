//! crates/practice_coach_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of keychains, identity SDKs, the backend and the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AdOutcome, BackendSession, CoinBalance, ExchangeRequest, FederatedCredential,
    NativeCredential, Product, PurchaseOutcome, UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., filesystem, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Malformed data: {0}")]
    Malformed(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// How an identity provider round trip can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("The user cancelled the sign-in")]
    Cancelled,
    #[error("Identity provider failed: {0}")]
    Failed(String),
}

//=========================================================================================
// Device Capabilities
//=========================================================================================

/// Keyed storage for small secrets, readable only while the device is unlocked.
pub trait SecretStore: Send + Sync {
    fn save(&self, key: &str, bytes: &[u8]) -> bool;

    fn load(&self, key: &str) -> Option<Vec<u8>>;

    fn delete(&self, key: &str) -> bool;
}

//=========================================================================================
// Identity Providers
//=========================================================================================

#[async_trait]
pub trait NativeIdentityProvider: Send + Sync {
    /// Presents the platform sign-in sheet bound to `hashed_nonce`.
    async fn request_credential(&self, hashed_nonce: &str) -> Result<NativeCredential, ProviderError>;
}

#[async_trait]
pub trait FederatedIdentityProvider: Send + Sync {
    /// Runs the SDK's own sign-in flow end to end.
    async fn sign_in(&self) -> Result<FederatedCredential, ProviderError>;
}

//=========================================================================================
// Backend Services
//=========================================================================================

#[async_trait]
pub trait IdentityExchangeService: Send + Sync {
    /// Trades a provider credential for a backend session.
    async fn exchange(&self, request: ExchangeRequest) -> PortResult<BackendSession>;
}

#[async_trait]
pub trait UserProfileBackend: Send + Sync {
    /// Reads the profile for `uid`; `PortError::NotFound` if none exists yet.
    async fn read_profile(&self, uid: &str) -> PortResult<UserProfile>;

    async fn create_profile(&self, profile: &UserProfile) -> PortResult<UserProfile>;

    async fn record_login(&self, uid: &str, at: DateTime<Utc>) -> PortResult<UserProfile>;

    /// Applies `delta` and returns the balance the backend now holds.
    async fn adjust_coins(&self, uid: &str, delta: i64) -> PortResult<CoinBalance>;
}

//=========================================================================================
// Store and Ads
//=========================================================================================

#[async_trait]
pub trait PurchaseProvider: Send + Sync {
    async fn fetch_products(&self) -> PortResult<Vec<Product>>;

    async fn purchase(&self, product_id: &str) -> PortResult<PurchaseOutcome>;
}

#[async_trait]
pub trait AdProvider: Send + Sync {
    /// Loads an ad; `true` when one is ready to show.
    async fn load_ad(&self) -> PortResult<bool>;

    /// Shows the loaded ad and resolves exactly once when it is dismissed.
    async fn show_ad(&self) -> PortResult<AdOutcome>;
}
