//! services/coach/src/app.rs
//!
//! Defines the application context: the process-lifetime services every
//! screen depends on, created once at startup and owned by the UI context.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use practice_coach_core::domain::{Profile, ProfileKind, UserProfile};
use practice_coach_core::navigation::{NavigationController, Page};
use practice_coach_core::ports::{
    AdProvider, FederatedIdentityProvider, IdentityExchangeService, NativeIdentityProvider,
    PurchaseProvider, SecretStore, UserProfileBackend,
};

use crate::adapters::FileDocumentStore;
use crate::auth::{AuthError, AuthOrchestrator};
use crate::config::Config;
use crate::repository::{ProfileRepository, RepositoryError};
use crate::rewards::RewardService;
use crate::user_profile::UserProfileService;

/// Navigation state key remembering the last selected profile tab.
pub const SELECTED_TAB_KEY: &str = "selected_tab";

//=========================================================================================
// External Collaborators
//=========================================================================================

/// The external services the application talks to, injected at startup.
#[derive(Clone)]
pub struct Collaborators {
    pub secrets: Arc<dyn SecretStore>,
    pub identity_exchange: Arc<dyn IdentityExchangeService>,
    pub profile_backend: Arc<dyn UserProfileBackend>,
    pub purchases: Arc<dyn PurchaseProvider>,
    pub ads: Arc<dyn AdProvider>,
}

//=========================================================================================
// Loading Screen
//=========================================================================================

/// Keeps `Page::Loading` on screen for one sign-in attempt. Dropping it
/// without `dismiss` (the attempt was abandoned) cancels the attempt and
/// removes the page.
struct LoadingScreen<'a> {
    ctx: &'a mut AppContext,
    dismissed: bool,
}

impl<'a> LoadingScreen<'a> {
    fn show(ctx: &'a mut AppContext) -> Self {
        ctx.navigation.push(Page::Loading);
        Self {
            ctx,
            dismissed: false,
        }
    }

    fn dismiss(mut self, succeeded: bool) {
        self.dismissed = true;
        self.ctx.finish_sign_in(succeeded);
    }
}

impl Drop for LoadingScreen<'_> {
    fn drop(&mut self) {
        if !self.dismissed {
            self.ctx.auth.cancel_attempt();
            self.ctx.finish_sign_in(false);
        }
    }
}

//=========================================================================================
// AppContext
//=========================================================================================

pub struct AppContext {
    pub config: Arc<Config>,
    pub navigation: NavigationController,
    pub auth: AuthOrchestrator,
    pub repository: Arc<ProfileRepository>,
    pub user_profile: Arc<UserProfileService>,
    pub rewards: RewardService,
}

impl AppContext {
    pub fn new(config: Arc<Config>, collaborators: Collaborators) -> Self {
        let repository = Arc::new(ProfileRepository::new(FileDocumentStore::new(
            config.documents_dir(),
        )));
        let user_profile = Arc::new(UserProfileService::new(collaborators.profile_backend));
        let auth = AuthOrchestrator::new(
            collaborators.identity_exchange,
            user_profile.clone(),
            collaborators.secrets,
        );
        let rewards = RewardService::new(
            user_profile.clone(),
            collaborators.purchases,
            collaborators.ads,
            config.ad_reward_coins,
        );

        // A stored session token means the user signed in on an earlier run.
        let root = if auth.restored_session_token().is_some() {
            Page::Home
        } else {
            Page::SignIn
        };
        info!("Application context ready, root page {:?}", root);

        Self {
            config,
            navigation: NavigationController::new(root),
            auth,
            repository,
            user_profile,
            rewards,
        }
    }

    // --- Sign-in Flows ---

    pub async fn sign_in_with_native(
        &mut self,
        provider: &dyn NativeIdentityProvider,
    ) -> Result<UserProfile, AuthError> {
        if self.auth.is_loading() {
            return Err(AuthError::Busy);
        }
        let mut screen = LoadingScreen::show(self);
        let result = screen.ctx.auth.sign_in_with_native(provider).await;
        screen.dismiss(result.is_ok());
        result
    }

    pub async fn sign_in_with_federated(
        &mut self,
        provider: &dyn FederatedIdentityProvider,
    ) -> Result<UserProfile, AuthError> {
        if self.auth.is_loading() {
            return Err(AuthError::Busy);
        }
        let mut screen = LoadingScreen::show(self);
        let result = screen.ctx.auth.sign_in_with_federated(provider).await;
        screen.dismiss(result.is_ok());
        result
    }

    /// Resumes a session stored by an earlier run so coin and reward calls
    /// work without signing in again. If the stored session is no longer
    /// valid the user is sent back to sign-in.
    pub async fn restore_session(&mut self) -> Result<Option<UserProfile>, AuthError> {
        match self.auth.restore_session().await {
            Ok(restored) => Ok(restored),
            Err(AuthError::Busy) => Err(AuthError::Busy),
            Err(e) => {
                self.navigation.pop_to_root();
                self.navigation.replace_top(Page::SignIn);
                Err(e)
            }
        }
    }

    fn finish_sign_in(&mut self, succeeded: bool) {
        if self.navigation.top().page() == &Page::Loading {
            self.navigation.pop();
        }
        if succeeded && self.navigation.top().page() == &Page::SignIn {
            self.navigation.replace_top(Page::Home);
        }
    }

    pub fn sign_out(&mut self) -> Result<(), AuthError> {
        self.auth.sign_out()?;
        self.navigation.pop_to_root();
        self.navigation.replace_top(Page::SignIn);
        Ok(())
    }

    // --- Practice Sessions ---

    /// Creates and saves a profile from `template_key`, then opens it.
    pub async fn start_from_template(&mut self, template_key: &str) -> Result<Profile, RepositoryError> {
        let profile = self.repository.new_from_template(template_key)?;
        self.repository.save(&profile).await?;
        self.navigation.push(Page::ProfileDetail {
            kind: profile.kind(),
            id: profile.id(),
        });
        Ok(profile)
    }

    /// Deletes a profile and leaves any screen showing it.
    pub async fn delete_profile(&mut self, id: Uuid) -> Result<(), RepositoryError> {
        self.repository.delete(id).await?;
        while matches!(
            self.navigation.top().page(),
            Page::ProfileDetail { id: shown, .. }
                | Page::PracticeSession { id: shown, .. }
                | Page::Results { id: shown, .. } if *shown == id
        ) {
            if self.navigation.pop().is_none() {
                break;
            }
        }
        Ok(())
    }

    pub fn select_tab(&mut self, kind: ProfileKind) {
        self.navigation.set_state(SELECTED_TAB_KEY, kind);
    }

    pub fn selected_tab(&self) -> ProfileKind {
        self.navigation
            .get_state::<ProfileKind>(SELECTED_TAB_KEY)
            .unwrap_or(ProfileKind::Interview)
    }
}
