pub mod domain;
pub mod navigation;
pub mod ports;
pub mod templates;

pub use domain::{
    AdOutcome, BackendSession, CoinBalance, DiaryProfile, DiaryResponse, ExchangeRequest,
    FeedbackItem, FederatedCredential, InterviewProfile, NativeCredential, PreQuestion, Product,
    Profile, ProfileError, ProfileHeader, ProfileKind, ProfileStatus, ProviderKind,
    PurchaseOutcome, SessionQuestion, SpeechProfile, UserProfile,
};
pub use navigation::{NavigationController, Page, PageHandle};
pub use ports::{
    AdProvider, FederatedIdentityProvider, IdentityExchangeService, NativeIdentityProvider,
    PortError, PortResult, ProviderError, PurchaseProvider, SecretStore, UserProfileBackend,
};
pub use templates::{Template, TemplateBody, TEMPLATES};
