//! services/coach/src/error.rs
//!
//! Defines the primary error type for the coach service.

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::repository::RepositoryError;
use crate::rewards::RewardError;
use crate::user_profile::UserProfileError;
use practice_coach_core::domain::ProfileError;
use practice_coach_core::ports::PortError;

/// The primary error type for the `coach` service.
#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    #[error("Profile storage error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Profile workflow error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("User profile error: {0}")]
    UserProfile(#[from] UserProfileError),

    #[error("Reward error: {0}")]
    Reward(#[from] RewardError),

    /// Represents a standard Input/Output error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
