pub mod nonce;
pub mod orchestrator;

pub use orchestrator::{
    AuthError, AuthOrchestrator, AuthPhase, AuthSessionState, NativeSignInRequest,
    SESSION_TOKEN_KEY, SESSION_UID_KEY,
};
