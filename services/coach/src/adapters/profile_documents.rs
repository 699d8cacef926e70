//! services/coach/src/adapters/profile_documents.rs
//!
//! On-disk representations of the three profile kinds.
//!
//! Decoding runs in two passes. The required header (id, date, status,
//! title, path, content) is decoded strictly and any failure rejects the whole
//! document. Every other field is then read one at a time and falls back to
//! its default when absent or `null`, so documents written before a field
//! existed still load.

use serde::de::{DeserializeOwned, Deserializer, Error as DeError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use practice_coach_core::domain::{
    DiaryProfile, InterviewProfile, Profile, ProfileHeader, SpeechProfile,
};

use crate::adapters::document_store::StoredDocument;

/// Question count used when an interview document predates the field.
const DEFAULT_QUESTION_NUMBERS: u32 = 5;
/// Speech length used when a speech document predates the field.
const DEFAULT_TARGET_DURATION_SECS: u32 = 180;

//=========================================================================================
// Two-Pass Decoding Helpers
//=========================================================================================

struct RawDocument {
    header: ProfileHeader,
    fields: Map<String, Value>,
}

impl RawDocument {
    /// Pass one: the document must be an object with a valid header.
    fn parse<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let header = ProfileHeader::deserialize(&value)
            .map_err(|e| D::Error::custom(format!("invalid profile header: {e}")))?;
        let Value::Object(fields) = value else {
            return Err(D::Error::custom("profile document must be a JSON object"));
        };
        Ok(Self { header, fields })
    }

    /// Pass two: an additive field, defaulted when missing or `null`.
    fn optional<T, E>(&self, key: &str) -> Result<T, E>
    where
        T: DeserializeOwned + Default,
        E: DeError,
    {
        self.optional_or(key, T::default())
    }

    fn optional_or<T, E>(&self, key: &str, fallback: T) -> Result<T, E>
    where
        T: DeserializeOwned,
        E: DeError,
    {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(fallback),
            Some(value) => T::deserialize(value)
                .map_err(|e| E::custom(format!("invalid field `{key}`: {e}"))),
        }
    }
}

//=========================================================================================
// Interview Documents
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InterviewDocument(pub InterviewProfile);

impl<'de> Deserialize<'de> for InterviewDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawDocument::parse(deserializer)?;
        Ok(Self(InterviewProfile {
            template_key: raw.optional::<_, D::Error>("template_key")?,
            question_numbers: raw.optional_or::<_, D::Error>("question_numbers", DEFAULT_QUESTION_NUMBERS)?,
            pre_questions: raw.optional::<_, D::Error>("pre_questions")?,
            questions: raw.optional::<_, D::Error>("questions")?,
            feedback: raw.optional::<_, D::Error>("feedback")?,
            overall_score: raw.optional::<_, D::Error>("overall_score")?,
            header: raw.header,
        }))
    }
}

impl StoredDocument for InterviewDocument {
    const COLLECTION: &'static str = "interviews";

    fn document_id(&self) -> Uuid {
        self.0.header.id
    }
}

//=========================================================================================
// Speech Documents
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SpeechDocument(pub SpeechProfile);

impl<'de> Deserialize<'de> for SpeechDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawDocument::parse(deserializer)?;
        Ok(Self(SpeechProfile {
            template_key: raw.optional::<_, D::Error>("template_key")?,
            target_duration_secs: raw
                .optional_or::<_, D::Error>("target_duration_secs", DEFAULT_TARGET_DURATION_SECS)?,
            transcript: raw.optional::<_, D::Error>("transcript")?,
            audio_path: raw.optional::<_, D::Error>("audio_path")?,
            feedback: raw.optional::<_, D::Error>("feedback")?,
            overall_score: raw.optional::<_, D::Error>("overall_score")?,
            header: raw.header,
        }))
    }
}

impl StoredDocument for SpeechDocument {
    const COLLECTION: &'static str = "speeches";

    fn document_id(&self) -> Uuid {
        self.0.header.id
    }
}

//=========================================================================================
// Diary Documents
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DiaryDocument(pub DiaryProfile);

impl<'de> Deserialize<'de> for DiaryDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawDocument::parse(deserializer)?;
        Ok(Self(DiaryProfile {
            responses: raw.optional::<_, D::Error>("responses")?,
            header: raw.header,
        }))
    }
}

impl StoredDocument for DiaryDocument {
    const COLLECTION: &'static str = "diaries";

    fn document_id(&self) -> Uuid {
        self.0.header.id
    }
}

//=========================================================================================
// Domain Conversions
//=========================================================================================

impl From<InterviewDocument> for Profile {
    fn from(document: InterviewDocument) -> Self {
        Profile::Interview(document.0)
    }
}

impl From<SpeechDocument> for Profile {
    fn from(document: SpeechDocument) -> Self {
        Profile::Speech(document.0)
    }
}

impl From<DiaryDocument> for Profile {
    fn from(document: DiaryDocument) -> Self {
        Profile::Diary(document.0)
    }
}
