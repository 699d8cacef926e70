pub mod adapters;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod repository;
pub mod rewards;
pub mod user_profile;

pub use app::{AppContext, Collaborators};
pub use config::Config;
pub use error::CoachError;
