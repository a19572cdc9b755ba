use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::ProviderKind;

pub const DEFAULT_SEARCH_URL: &str = "https://api.stackexchange.com";

/// How earlier turns are replayed to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    /// Each turn keeps its user/assistant role
    #[default]
    RoleFaithful,
    /// Every earlier turn is sent as a `user` message
    Flattened,
}

/// Process-level settings. The provider and key are asked for interactively
/// and are not part of this.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub groq_url: String,
    pub openai_url: String,
    pub search_url: String,
    pub max_turns: Option<usize>,
    pub strip_short_trigger: bool,
    pub history_mode: HistoryMode,
    pub timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            groq_url: ProviderKind::Groq.default_base_url().to_string(),
            openai_url: ProviderKind::OpenAi.default_base_url().to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            max_turns: None,
            strip_short_trigger: false,
            history_mode: HistoryMode::RoleFaithful,
            timeout: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_turns = get("PROMPT_CLI_MAX_TURNS")
            .map(|v| parse_number("PROMPT_CLI_MAX_TURNS", &v))
            .transpose()?
            .filter(|n| *n > 0);

        let timeout = get("PROMPT_CLI_TIMEOUT_SECS")
            .map(|v| parse_number("PROMPT_CLI_TIMEOUT_SECS", &v))
            .transpose()?
            .map(|secs| Duration::from_secs(secs as u64));

        let strip_short_trigger = get("PROMPT_CLI_STRIP_SHORT_TRIGGER")
            .map(|v| parse_flag("PROMPT_CLI_STRIP_SHORT_TRIGGER", &v))
            .transpose()?
            .unwrap_or(defaults.strip_short_trigger);

        let history_mode = match get("PROMPT_CLI_FLAT_HISTORY")
            .map(|v| parse_flag("PROMPT_CLI_FLAT_HISTORY", &v))
            .transpose()?
        {
            Some(true) => HistoryMode::Flattened,
            _ => HistoryMode::RoleFaithful,
        };

        Ok(Self {
            groq_url: get("PROMPT_CLI_GROQ_URL").unwrap_or(defaults.groq_url),
            openai_url: get("PROMPT_CLI_OPENAI_URL").unwrap_or(defaults.openai_url),
            search_url: get("PROMPT_CLI_SEARCH_URL").unwrap_or(defaults.search_url),
            max_turns,
            strip_short_trigger,
            history_mode,
            timeout,
        })
    }

    pub fn base_url_for(&self, provider: ProviderKind) -> &str {
        match provider {
            ProviderKind::Groq => &self.groq_url,
            ProviderKind::OpenAi => &self.openai_url,
        }
    }
}

fn parse_number(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| AppError::Validation(format!("{} must be a non-negative integer", key)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Validation(format!("{} must be true or false", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.groq_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.openai_url, "https://api.openai.com/v1");
        assert_eq!(config.search_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.max_turns, None);
        assert!(!config.strip_short_trigger);
        assert_eq!(config.history_mode, HistoryMode::RoleFaithful);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PROMPT_CLI_GROQ_URL", "http://localhost:9000"),
            ("PROMPT_CLI_MAX_TURNS", "10"),
            ("PROMPT_CLI_STRIP_SHORT_TRIGGER", "yes"),
            ("PROMPT_CLI_FLAT_HISTORY", "true"),
            ("PROMPT_CLI_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.base_url_for(ProviderKind::Groq), "http://localhost:9000");
        assert_eq!(config.max_turns, Some(10));
        assert!(config.strip_short_trigger);
        assert_eq!(config.history_mode, HistoryMode::Flattened);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_max_turns_is_unbounded() {
        let config = AppConfig::from_lookup(lookup(&[("PROMPT_CLI_MAX_TURNS", "0")])).unwrap();
        assert_eq!(config.max_turns, None);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("PROMPT_CLI_MAX_TURNS", "lots")])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err =
            AppConfig::from_lookup(lookup(&[("PROMPT_CLI_FLAT_HISTORY", "maybe")])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
