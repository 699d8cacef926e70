//! services/coach/src/auth/orchestrator.rs
//!
//! Reconciles the native and federated identity providers into one backend
//! session.
//!
//! At most one attempt runs at a time. Each attempt ends in exactly one of
//! `Authenticated` or `Failed`, with `is_loading` cleared and at most one
//! error in the slot.

use std::sync::Arc;
use tracing::{error, info, warn};

use practice_coach_core::domain::{
    BackendSession, ExchangeRequest, FederatedCredential, NativeCredential, ProviderKind,
    UserProfile,
};
use practice_coach_core::ports::{
    FederatedIdentityProvider, IdentityExchangeService, NativeIdentityProvider, ProviderError,
    SecretStore,
};

use crate::auth::nonce::{generate_nonce, hash_nonce};
use crate::user_profile::{IdentityHints, UserProfileService};

/// Secret-store key holding the current backend session token.
pub const SESSION_TOKEN_KEY: &str = "backend.session_token";
/// Secret-store key holding the uid the stored session token belongs to.
pub const SESSION_UID_KEY: &str = "backend.session_uid";

//=========================================================================================
// Errors and State
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Sign-in was cancelled")]
    UserCancelled,
    #[error("The identity provider returned no usable credential")]
    MissingCredential,
    #[error("Identity provider failed: {0}")]
    Provider(String),
    #[error("Unexpected internal error: {0}")]
    UnexpectedInternal(String),
    #[error("Backend sign-in failed: {0}")]
    BackendExchange(String),
    /// Never stored in the error slot; the in-flight attempt keeps going.
    #[error("A sign-in attempt is already in progress")]
    Busy,
}

impl AuthError {
    /// Whether the UI should raise an alert for this error.
    pub fn is_alert(&self) -> bool {
        !matches!(self, AuthError::UserCancelled | AuthError::Busy)
    }
}

impl From<ProviderError> for AuthError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Cancelled => AuthError::UserCancelled,
            ProviderError::Failed(message) => AuthError::Provider(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Idle,
    Authenticating,
    Authenticated,
    Failed,
}

/// What the UI renders for the auth flow. Last write wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSessionState {
    pub phase: AuthPhase,
    pub is_loading: bool,
    pub error_message: Option<AuthError>,
}

impl Default for AuthSessionState {
    fn default() -> Self {
        Self {
            phase: AuthPhase::Idle,
            is_loading: false,
            error_message: None,
        }
    }
}

/// Handed to the native provider to start its sign-in sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSignInRequest {
    pub hashed_nonce: String,
}

//=========================================================================================
// The Orchestrator
//=========================================================================================

pub struct AuthOrchestrator {
    exchange: Arc<dyn IdentityExchangeService>,
    profiles: Arc<UserProfileService>,
    secrets: Arc<dyn SecretStore>,
    state: AuthSessionState,
    /// Raw nonce of the native attempt in flight, if any.
    pending_nonce: Option<String>,
    session: Option<BackendSession>,
}

impl AuthOrchestrator {
    pub fn new(
        exchange: Arc<dyn IdentityExchangeService>,
        profiles: Arc<UserProfileService>,
        secrets: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            exchange,
            profiles,
            secrets,
            state: AuthSessionState::default(),
            pending_nonce: None,
            session: None,
        }
    }

    pub fn state(&self) -> &AuthSessionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn error_message(&self) -> Option<&AuthError> {
        self.state.error_message.as_ref()
    }

    pub fn session(&self) -> Option<&BackendSession> {
        self.session.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.state.error_message = None;
    }

    /// Token persisted by an earlier successful sign-in, if any.
    pub fn restored_session_token(&self) -> Option<String> {
        let bytes = self.secrets.load(SESSION_TOKEN_KEY)?;
        String::from_utf8(bytes).ok()
    }

    // --- Native Provider ---

    /// Starts a native sign-in attempt and returns the hashed nonce the
    /// provider request must carry.
    pub fn begin_native_sign_in(&mut self) -> Result<NativeSignInRequest, AuthError> {
        self.start_attempt()?;
        let raw = generate_nonce();
        let hashed_nonce = hash_nonce(&raw);
        self.pending_nonce = Some(raw);
        Ok(NativeSignInRequest { hashed_nonce })
    }

    /// Finishes the native attempt with whatever the provider produced.
    pub async fn complete_native_sign_in(
        &mut self,
        outcome: Result<NativeCredential, ProviderError>,
    ) -> Result<UserProfile, AuthError> {
        // The nonce belongs to this attempt only, whatever happens next.
        let raw_nonce = self.pending_nonce.take();

        // A stray or duplicate callback must not disturb the settled state.
        if !self.state.is_loading {
            let err = AuthError::UnexpectedInternal(
                "native sign-in completed with no attempt in flight".to_string(),
            );
            error!("Ignoring provider callback: {}", err);
            return Err(err);
        }

        let credential = match outcome {
            Ok(credential) => credential,
            Err(e) => return self.fail(e.into()),
        };

        let Some(raw_nonce) = raw_nonce else {
            return self.fail(AuthError::UnexpectedInternal(
                "no nonce retained for this sign-in attempt".to_string(),
            ));
        };

        let Some(token) = credential.identity_token.filter(|t| !t.is_empty()) else {
            return self.fail(AuthError::MissingCredential);
        };

        if let Some(embedded) = credential.nonce_hash.as_deref() {
            if embedded != hash_nonce(&raw_nonce) {
                return self.fail(AuthError::UnexpectedInternal(
                    "credential was issued for a different sign-in attempt".to_string(),
                ));
            }
        }

        let request = ExchangeRequest {
            provider: ProviderKind::Native,
            token,
            access_token: None,
            raw_nonce: Some(raw_nonce),
        };
        let hints = IdentityHints {
            email: credential.email,
            display_name: credential.display_name,
        };
        self.exchange_and_load_profile(request, hints).await
    }

    /// Runs a whole native attempt against `provider`.
    pub async fn sign_in_with_native(
        &mut self,
        provider: &dyn NativeIdentityProvider,
    ) -> Result<UserProfile, AuthError> {
        let request = self.begin_native_sign_in()?;
        let mut attempt = AttemptGuard { auth: self };
        let outcome = provider.request_credential(&request.hashed_nonce).await;
        // Bound first so the guard outlives the future borrowing through it.
        let result = attempt.auth.complete_native_sign_in(outcome).await;
        result
    }

    // --- Federated Provider ---

    /// Runs a whole federated attempt. The SDK guards its own flow, so no
    /// local nonce is involved.
    pub async fn sign_in_with_federated(
        &mut self,
        provider: &dyn FederatedIdentityProvider,
    ) -> Result<UserProfile, AuthError> {
        self.start_attempt()?;
        let mut attempt = AttemptGuard { auth: self };
        // Bound first so the guard outlives the future borrowing through it.
        let result = attempt.auth.finish_federated_sign_in(provider).await;
        result
    }

    async fn finish_federated_sign_in(
        &mut self,
        provider: &dyn FederatedIdentityProvider,
    ) -> Result<UserProfile, AuthError> {
        let FederatedCredential {
            id_token,
            access_token,
            email,
            display_name,
        } = match provider.sign_in().await {
            Ok(credential) => credential,
            Err(e) => return self.fail(e.into()),
        };

        let (Some(token), Some(access_token)) = (
            id_token.filter(|t| !t.is_empty()),
            access_token.filter(|t| !t.is_empty()),
        ) else {
            return self.fail(AuthError::MissingCredential);
        };

        let request = ExchangeRequest {
            provider: ProviderKind::Federated,
            token,
            access_token: Some(access_token),
            raw_nonce: None,
        };
        self.exchange_and_load_profile(request, IdentityHints { email, display_name })
            .await
    }

    // --- Interruption and Restore ---

    /// Ends the attempt in flight as cancelled, for callers that stop waiting
    /// on the provider or the backend. Returns whether an attempt was running.
    pub fn cancel_attempt(&mut self) -> bool {
        if !self.state.is_loading {
            return false;
        }
        info!("Sign-in attempt abandoned before completion");
        let _ = self.fail::<()>(AuthError::UserCancelled);
        true
    }

    /// The session persisted by an earlier successful sign-in, if both its
    /// token and uid are stored.
    pub fn restored_session(&self) -> Option<BackendSession> {
        let session_token = self.restored_session_token()?;
        let uid = String::from_utf8(self.secrets.load(SESSION_UID_KEY)?).ok()?;
        Some(BackendSession {
            uid,
            session_token,
            is_first_login: false,
        })
    }

    /// Resumes the stored session and reloads its user profile. `Ok(None)`
    /// when nothing is stored. A stored session the backend no longer knows
    /// is forgotten.
    pub async fn restore_session(&mut self) -> Result<Option<UserProfile>, AuthError> {
        if self.state.is_loading {
            return Err(AuthError::Busy);
        }
        let Some(session) = self.restored_session() else {
            return Ok(None);
        };

        match self.profiles.load_existing(&session.uid).await {
            Ok(profile) => {
                info!("Restored session for {}", session.uid);
                self.session = Some(session);
                self.state = AuthSessionState {
                    phase: AuthPhase::Authenticated,
                    is_loading: false,
                    error_message: None,
                };
                Ok(Some(profile))
            }
            Err(e) => {
                warn!("Discarding stored session for {}: {}", session.uid, e);
                self.forget_stored_session();
                Err(AuthError::BackendExchange(e.to_string()))
            }
        }
    }

    /// Drops the backend session and everything cached for it.
    pub fn sign_out(&mut self) -> Result<(), AuthError> {
        if self.state.is_loading {
            return Err(AuthError::Busy);
        }
        self.forget_stored_session();
        self.profiles.clear();
        self.session = None;
        self.state = AuthSessionState::default();
        info!("Signed out");
        Ok(())
    }

    // --- Internals ---

    fn forget_stored_session(&self) {
        self.secrets.delete(SESSION_TOKEN_KEY);
        self.secrets.delete(SESSION_UID_KEY);
    }

    fn start_attempt(&mut self) -> Result<(), AuthError> {
        if self.state.is_loading {
            warn!("Rejected sign-in attempt while another is in flight");
            return Err(AuthError::Busy);
        }
        self.state = AuthSessionState {
            phase: AuthPhase::Authenticating,
            is_loading: true,
            error_message: None,
        };
        Ok(())
    }

    async fn exchange_and_load_profile(
        &mut self,
        request: ExchangeRequest,
        hints: IdentityHints,
    ) -> Result<UserProfile, AuthError> {
        let provider = request.provider;
        let session = match self.exchange.exchange(request).await {
            Ok(session) => session,
            Err(e) => return self.fail(AuthError::BackendExchange(e.to_string())),
        };

        let profile = match self.profiles.fetch_or_create(&session, hints).await {
            Ok(profile) => profile,
            Err(e) => return self.fail(AuthError::BackendExchange(e.to_string())),
        };

        let persisted = self
            .secrets
            .save(SESSION_TOKEN_KEY, session.session_token.as_bytes())
            && self.secrets.save(SESSION_UID_KEY, session.uid.as_bytes());
        if !persisted {
            warn!("Backend session for {} will not survive a restart", session.uid);
        }

        info!(
            "Signed in {} via {:?} (first login: {})",
            session.uid, provider, session.is_first_login
        );
        self.session = Some(session);
        self.state = AuthSessionState {
            phase: AuthPhase::Authenticated,
            is_loading: false,
            error_message: None,
        };
        Ok(profile)
    }

    fn fail<T>(&mut self, err: AuthError) -> Result<T, AuthError> {
        match &err {
            AuthError::UserCancelled => info!("Sign-in cancelled by user"),
            AuthError::UnexpectedInternal(detail) => error!("Sign-in aborted on internal error: {}", detail),
            other => warn!("Sign-in failed: {}", other),
        }
        self.pending_nonce = None;
        self.state = AuthSessionState {
            phase: AuthPhase::Failed,
            is_loading: false,
            error_message: Some(err.clone()),
        };
        Err(err)
    }
}

/// Ends an attempt as cancelled if its future is dropped before reaching a
/// terminal outcome, e.g. under a timeout.
struct AttemptGuard<'a> {
    auth: &'a mut AuthOrchestrator,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.auth.cancel_attempt();
    }
}
