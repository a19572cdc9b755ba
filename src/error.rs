#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Provider request failed: {0}")]
    Provider(String),

    #[error("Provider returned error {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Errors the chat loop absorbs instead of ending the session.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, AppError::Provider(_) | AppError::ProviderStatus { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_failures_are_recoverable() {
        assert!(AppError::Provider("timeout".into()).is_provider_failure());
        assert!(AppError::ProviderStatus {
            status: 401,
            body: "bad key".into()
        }
        .is_provider_failure());
        assert!(!AppError::Validation("x".into()).is_provider_failure());
        assert!(!AppError::Search("x".into()).is_provider_failure());
    }

    #[test]
    fn test_status_message_includes_code_and_body() {
        let err = AppError::ProviderStatus {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "Provider returned error 429: rate limited");
    }
}
