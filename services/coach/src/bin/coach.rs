//! services/coach/src/bin/coach.rs
//!
//! Command-line access to the locally stored practice sessions.

use clap::{Parser, Subcommand};
use coach_lib::{
    adapters::{FileDocumentStore, FileSecretStore},
    auth::{SESSION_TOKEN_KEY, SESSION_UID_KEY},
    config::Config,
    error::CoachError,
    repository::ProfileRepository,
};
use practice_coach_core::{domain::ProfileKind, ports::SecretStore, templates::TEMPLATES, Profile};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "coach", about = "Inspect and seed practice-session profiles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in templates.
    Templates,
    /// List stored profiles of one kind (interview, speech, diary).
    List { kind: String },
    /// Create and save a profile from a template.
    New { template: String },
    /// Print one stored profile as JSON.
    Show { kind: String, id: Uuid },
    /// Delete a stored profile.
    Delete { id: Uuid },
    /// Report whether a backend session is stored on this device.
    Session,
    /// Forget the stored backend session.
    SignOut,
}

fn parse_kind(raw: &str) -> Result<ProfileKind, CoachError> {
    ProfileKind::parse(raw).ok_or_else(|| {
        CoachError::Internal(format!(
            "Unknown profile kind '{}', expected interview, speech or diary",
            raw
        ))
    })
}

fn summary(profile: &Profile) -> String {
    let header = profile.header();
    format!(
        "{}  {:<10} {:<20} {:?}  {}",
        header.id,
        profile.kind().as_str(),
        header.date.format("%Y-%m-%d %H:%M"),
        header.status,
        header.title
    )
}

#[tokio::main]
async fn main() -> Result<(), CoachError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Using data directory {}", config.data_dir.display());

    // --- 2. Open Local Storage ---
    let repository = ProfileRepository::new(FileDocumentStore::new(config.documents_dir()));
    let secrets = FileSecretStore::new(config.secrets_dir.clone());

    // --- 3. Run the Command ---
    match Cli::parse().command {
        Command::Templates => {
            for template in TEMPLATES {
                println!("{:<24} {:<10} {}", template.key, template.kind().as_str(), template.title);
            }
        }
        Command::List { kind } => {
            for profile in repository.load_all(parse_kind(&kind)?).await {
                println!("{}", summary(&profile));
            }
        }
        Command::New { template } => {
            let profile = repository.new_from_template(&template)?;
            repository.save(&profile).await?;
            println!("{}", summary(&profile));
        }
        Command::Show { kind, id } => {
            let profile = repository.load_one(parse_kind(&kind)?, id).await?;
            let json = match &profile {
                Profile::Interview(p) => serde_json::to_string_pretty(p),
                Profile::Speech(p) => serde_json::to_string_pretty(p),
                Profile::Diary(p) => serde_json::to_string_pretty(p),
            }
            .map_err(|e| CoachError::Internal(e.to_string()))?;
            println!("{json}");
        }
        Command::Delete { id } => {
            repository.delete(id).await?;
            println!("Deleted {id}");
        }
        Command::Session => match secrets.load(SESSION_TOKEN_KEY) {
            Some(_) => println!("A backend session is stored"),
            None => println!("No stored session"),
        },
        Command::SignOut => {
            let had_uid = secrets.delete(SESSION_UID_KEY);
            if secrets.delete(SESSION_TOKEN_KEY) || had_uid {
                println!("Stored session removed");
            } else {
                println!("No stored session");
            }
        }
    }

    Ok(())
}
