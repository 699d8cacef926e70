//! crates/practice_coach_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Profiles carry serde derives for their nested entities only; the lenient
//! on-disk decoding of whole profiles lives in the document adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Profile Kinds and Workflow Status
//=========================================================================================

/// The three kinds of practice session a user can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Interview,
    Speech,
    Diary,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 3] = [ProfileKind::Interview, ProfileKind::Speech, ProfileKind::Diary];

    pub fn as_str(self) -> &'static str {
        match self {
            ProfileKind::Interview => "interview",
            ProfileKind::Speech => "speech",
            ProfileKind::Diary => "diary",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "interview" => Some(ProfileKind::Interview),
            "speech" => Some(ProfileKind::Speech),
            "diary" => Some(ProfileKind::Diary),
            _ => None,
        }
    }
}

/// Linear workflow of a practice session.
///
/// Variants are declared in workflow order, so the derived `Ord` is the
/// workflow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    NotStarted,
    Prepared,
    GeneratingContent,
    InProgress,
    GeneratingResults,
    Completed,
}

impl ProfileStatus {
    /// Forward moves (and staying put) are allowed; nothing goes backwards.
    pub fn can_advance_to(self, next: ProfileStatus) -> bool {
        next >= self
    }
}

/// Errors raised by in-memory workflow moves on a profile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("Cannot move profile from {from:?} back to {to:?}")]
    BackwardTransition { from: ProfileStatus, to: ProfileStatus },
}

//=========================================================================================
// Shared Header
//=========================================================================================

/// The required core fields every stored profile carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileHeader {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub status: ProfileStatus,
    pub title: String,
    /// Directory reference for the session's recordings; may be empty.
    pub path: String,
    /// The prompt or topic text the session is built around.
    pub content: String,
}

impl ProfileHeader {
    /// Creates a header with a freshly generated id, stamped now.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            status: ProfileStatus::NotStarted,
            title: title.into(),
            path: String::new(),
            content: content.into(),
        }
    }
}

//=========================================================================================
// Nested Entities
//=========================================================================================

/// A question the user answers before an interview starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreQuestion {
    pub id: Uuid,
    pub prompt: String,
    pub required: bool,
    #[serde(default)]
    pub answer: String,
}

impl PreQuestion {
    pub fn new(prompt: impl Into<String>, required: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            required,
            answer: String::new(),
        }
    }
}

/// A question asked during the session, with the user's recorded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionQuestion {
    pub id: Uuid,
    pub text: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub audio_path: Option<String>,
    #[serde(default)]
    pub duration_secs: f64,
}

impl SessionQuestion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            answer: String::new(),
            audio_path: None,
            duration_secs: 0.0,
        }
    }
}

/// One piece of generated feedback on a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: Uuid,
    pub category: String,
    pub comment: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// A diary prompt together with the user's written or spoken response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryResponse {
    pub id: Uuid,
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub audio_path: Option<String>,
}

impl DiaryResponse {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            answer: String::new(),
            audio_path: None,
        }
    }
}

//=========================================================================================
// Profiles
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewProfile {
    #[serde(flatten)]
    pub header: ProfileHeader,
    pub template_key: Option<String>,
    pub question_numbers: u32,
    pub pre_questions: Vec<PreQuestion>,
    pub questions: Vec<SessionQuestion>,
    pub feedback: Vec<FeedbackItem>,
    pub overall_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechProfile {
    #[serde(flatten)]
    pub header: ProfileHeader,
    pub template_key: Option<String>,
    pub target_duration_secs: u32,
    pub transcript: String,
    pub audio_path: Option<String>,
    pub feedback: Vec<FeedbackItem>,
    pub overall_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiaryProfile {
    #[serde(flatten)]
    pub header: ProfileHeader,
    pub responses: Vec<DiaryResponse>,
}

/// A persisted practice session of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    Interview(InterviewProfile),
    Speech(SpeechProfile),
    Diary(DiaryProfile),
}

impl Profile {
    pub fn kind(&self) -> ProfileKind {
        match self {
            Profile::Interview(_) => ProfileKind::Interview,
            Profile::Speech(_) => ProfileKind::Speech,
            Profile::Diary(_) => ProfileKind::Diary,
        }
    }

    pub fn header(&self) -> &ProfileHeader {
        match self {
            Profile::Interview(p) => &p.header,
            Profile::Speech(p) => &p.header,
            Profile::Diary(p) => &p.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut ProfileHeader {
        match self {
            Profile::Interview(p) => &mut p.header,
            Profile::Speech(p) => &mut p.header,
            Profile::Diary(p) => &mut p.header,
        }
    }

    pub fn id(&self) -> Uuid {
        self.header().id
    }

    pub fn status(&self) -> ProfileStatus {
        self.header().status
    }

    /// Moves the workflow forward. Backward moves are rejected and leave the
    /// profile untouched.
    pub fn advance(&mut self, next: ProfileStatus) -> Result<(), ProfileError> {
        let current = self.status();
        if !current.can_advance_to(next) {
            return Err(ProfileError::BackwardTransition { from: current, to: next });
        }
        self.header_mut().status = next;
        Ok(())
    }

    /// Every recording path this profile references. The bytes behind them
    /// are owned by whoever recorded them.
    pub fn attachment_paths(&self) -> Vec<String> {
        match self {
            Profile::Interview(p) => p
                .questions
                .iter()
                .filter_map(|q| q.audio_path.clone())
                .collect(),
            Profile::Speech(p) => p.audio_path.iter().cloned().collect(),
            Profile::Diary(p) => p
                .responses
                .iter()
                .filter_map(|r| r.audio_path.clone())
                .collect(),
        }
    }
}

//=========================================================================================
// Remote User Profile
//=========================================================================================

/// The signed-in user's backend-owned profile. The local copy is a cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub coins: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl UserProfile {
    /// A first-login profile: zero coins, every timestamp set to `now`.
    pub fn first_login(
        uid: impl Into<String>,
        email: Option<String>,
        display_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            uid: uid.into(),
            email,
            display_name,
            coins: 0,
            created_at: now,
            updated_at: now,
            last_login_at: now,
        }
    }
}

/// The backend's authoritative answer to a coin adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinBalance {
    pub coins: u64,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Identity
//=========================================================================================

/// Which identity provider produced a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// The platform's own identity provider (nonce-bound).
    Native,
    /// The OAuth-style SDK provider.
    Federated,
}

/// Credential returned by the native identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeCredential {
    pub user_identifier: String,
    pub identity_token: Option<String>,
    /// The hashed nonce the provider embedded in the identity token, if it
    /// exposes one.
    pub nonce_hash: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Credential returned by the federated provider's SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedCredential {
    pub id_token: Option<String>,
    pub access_token: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Everything the backend identity exchange needs from one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub provider: ProviderKind,
    pub token: String,
    pub access_token: Option<String>,
    pub raw_nonce: Option<String>,
}

/// The backend session produced by a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSession {
    pub uid: String,
    pub session_token: String,
    pub is_first_login: bool,
}

//=========================================================================================
// Store and Ads
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub display_name: String,
    pub display_price: String,
    pub coins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased { transaction_id: String },
    Cancelled,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdOutcome {
    Rewarded,
    Dismissed,
}
