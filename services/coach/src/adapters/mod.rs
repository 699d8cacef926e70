pub mod document_store;
pub mod profile_documents;
pub mod secret_store;

pub use document_store::{FileDocumentStore, StoredDocument};
pub use profile_documents::{DiaryDocument, InterviewDocument, SpeechDocument};
pub use secret_store::FileSecretStore;
