//! services/coach/src/repository.rs
//!
//! Typed facade over the document store for the three profile kinds.
//!
//! Local storage failures degrade here: listing returns whatever could be
//! read.

use tracing::{error, info};
use uuid::Uuid;

use practice_coach_core::domain::{
    DiaryProfile, InterviewProfile, Profile, ProfileHeader, ProfileKind, SpeechProfile,
};
use practice_coach_core::ports::{PortError, PortResult};
use practice_coach_core::templates;

use crate::adapters::{
    DiaryDocument, FileDocumentStore, InterviewDocument, SpeechDocument, StoredDocument,
};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

#[derive(Clone, Debug)]
pub struct ProfileRepository {
    store: FileDocumentStore,
}

impl ProfileRepository {
    pub fn new(store: FileDocumentStore) -> Self {
        Self { store }
    }

    /// Every readable profile of `kind`. Storage failures are logged and
    /// yield an empty list.
    pub async fn load_all(&self, kind: ProfileKind) -> Vec<Profile> {
        let result = match kind {
            ProfileKind::Interview => self.list_as_profiles::<InterviewDocument>().await,
            ProfileKind::Speech => self.list_as_profiles::<SpeechDocument>().await,
            ProfileKind::Diary => self.list_as_profiles::<DiaryDocument>().await,
        };
        result.unwrap_or_else(|e| {
            error!("Failed to list {} profiles: {}", kind.as_str(), e);
            Vec::new()
        })
    }

    async fn list_as_profiles<D>(&self) -> PortResult<Vec<Profile>>
    where
        D: StoredDocument + Into<Profile>,
    {
        let documents = self.store.list::<D>().await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    pub async fn load_one(&self, kind: ProfileKind, id: Uuid) -> PortResult<Profile> {
        Ok(match kind {
            ProfileKind::Interview => self.store.load::<InterviewDocument>(id).await?.into(),
            ProfileKind::Speech => self.store.load::<SpeechDocument>(id).await?.into(),
            ProfileKind::Diary => self.store.load::<DiaryDocument>(id).await?.into(),
        })
    }

    /// Persists the profile, including the paths of any recordings it
    /// references. Recording bytes are not touched.
    pub async fn save(&self, profile: &Profile) -> PortResult<()> {
        match profile {
            Profile::Interview(p) => self.store.save(&InterviewDocument(p.clone())).await,
            Profile::Speech(p) => self.store.save(&SpeechDocument(p.clone())).await,
            Profile::Diary(p) => self.store.save(&DiaryDocument(p.clone())).await,
        }
    }

    /// Removes the profile with `id` whatever its kind. Missing ids are fine.
    pub async fn delete(&self, id: Uuid) -> PortResult<()> {
        self.store.delete::<InterviewDocument>(id).await?;
        self.store.delete::<SpeechDocument>(id).await?;
        self.store.delete::<DiaryDocument>(id).await?;
        info!("Deleted profile {}", id);
        Ok(())
    }

    /// A new, unsaved profile seeded from the built-in template `key`.
    pub fn new_from_template(&self, key: &str) -> Result<Profile, RepositoryError> {
        let template =
            templates::find(key).ok_or_else(|| RepositoryError::UnknownTemplate(key.to_string()))?;
        Ok(template.instantiate())
    }

    /// A new, unsaved profile with no template behind it.
    pub fn new_blank(&self, kind: ProfileKind) -> Profile {
        let header = ProfileHeader::new("", "");
        match kind {
            ProfileKind::Interview => Profile::Interview(InterviewProfile {
                header,
                template_key: None,
                question_numbers: 5,
                pre_questions: Vec::new(),
                questions: Vec::new(),
                feedback: Vec::new(),
                overall_score: None,
            }),
            ProfileKind::Speech => Profile::Speech(SpeechProfile {
                header,
                template_key: None,
                target_duration_secs: 180,
                transcript: String::new(),
                audio_path: None,
                feedback: Vec::new(),
                overall_score: None,
            }),
            ProfileKind::Diary => Profile::Diary(DiaryProfile {
                header,
                responses: Vec::new(),
            }),
        }
    }
}
