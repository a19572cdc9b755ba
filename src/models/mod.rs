pub mod chat;

pub use chat::{ApiKey, ProviderKind, Role, SessionConfig, Turn};
