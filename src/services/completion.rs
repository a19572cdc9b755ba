use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::{AppConfig, HistoryMode};
use crate::error::{AppError, Result};
use crate::models::{ApiKey, ProviderKind, Role, SessionConfig, Turn};

/// Instruction sent alongside requests that ask for a JSON object response.
/// The OpenAI API rejects `json_object` mode unless the messages mention JSON.
pub const JSON_MODE_INSTRUCTION: &str = "Respond with a JSON object.";

/// Anything that can turn a prompt plus earlier turns into a completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn complete(&self, prompt: &str, history: &[Turn]) -> Result<String>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints (Groq and OpenAI)
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: reqwest::Client,
    base_url: String,
    provider: ProviderKind,
    api_key: ApiKey,
    history_mode: HistoryMode,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionClient {
    pub fn new(
        provider: ProviderKind,
        api_key: ApiKey,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let base_url = base_url
            .unwrap_or_else(|| provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            provider,
            api_key,
            history_mode: HistoryMode::default(),
        })
    }

    /// Build the one client a session uses, from the startup answers.
    pub fn for_session(session: &SessionConfig, config: &AppConfig) -> Result<Self> {
        let provider = session.provider();
        Ok(Self::new(
            provider,
            session.api_key().clone(),
            Some(config.base_url_for(provider).to_string()),
            config.timeout,
        )?
        .with_history_mode(config.history_mode))
    }

    pub fn with_history_mode(mut self, mode: HistoryMode) -> Self {
        self.history_mode = mode;
        self
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST to `path` with the key as a bearer token. The key is sent as typed.
    fn authorized_post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(self.api_key.expose())
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionClient {
    fn kind(&self) -> ProviderKind {
        self.provider
    }

    #[instrument(skip_all, fields(history_len = history.len()))]
    async fn complete(&self, prompt: &str, history: &[Turn]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.provider.model(),
            messages: build_messages(self.provider, prompt, history, self.history_mode),
            response_format: self
                .provider
                .json_mode()
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        info!(
            provider = %self.provider,
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .authorized_post("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("{} request failed: {}", self.provider, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: String = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ProviderStatus {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to parse {} response: {}", self.provider, e)))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        debug!(response_length = text.len(), "Completion received");

        Ok(text)
    }
}

/// Message list for one request: earlier turns oldest first, then the prompt.
pub fn build_messages(
    provider: ProviderKind,
    prompt: &str,
    history: &[Turn],
    mode: HistoryMode,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);

    // JSON mode needs the word JSON somewhere in the messages. A fixed system
    // line carries it so the prompt itself stays a plain `user` message.
    if provider.json_mode() {
        messages.push(ChatMessage::new("system", JSON_MODE_INSTRUCTION));
    }

    for turn in history {
        let role = match mode {
            HistoryMode::RoleFaithful => turn.role,
            HistoryMode::Flattened => Role::User,
        };
        messages.push(ChatMessage::new(role.as_str(), &turn.text));
    }

    messages.push(ChatMessage::new(Role::User.as_str(), prompt));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<Turn> {
        vec![Turn::user("explain TCP handshake"), Turn::assistant("SYN, SYN-ACK, ACK")]
    }

    #[test]
    fn test_first_turn_sends_only_the_prompt() {
        let messages = build_messages(
            ProviderKind::Groq,
            "explain TCP handshake",
            &[],
            HistoryMode::RoleFaithful,
        );
        assert_eq!(messages, vec![ChatMessage::new("user", "explain TCP handshake")]);
    }

    #[test]
    fn test_history_keeps_roles() {
        let messages = build_messages(
            ProviderKind::Groq,
            "what about UDP",
            &history(),
            HistoryMode::RoleFaithful,
        );
        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(messages[2].content, "what about UDP");
    }

    #[test]
    fn test_flattened_history_is_all_user() {
        let messages = build_messages(
            ProviderKind::Groq,
            "what about UDP",
            &history(),
            HistoryMode::Flattened,
        );
        assert!(messages.iter().all(|m| m.role == "user"));
        assert_eq!(messages[1].content, "SYN, SYN-ACK, ACK");
    }

    #[test]
    fn test_json_mode_adds_instruction_first() {
        let messages = build_messages(ProviderKind::OpenAi, "hi", &[], HistoryMode::RoleFaithful);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, JSON_MODE_INSTRUCTION);
        assert_eq!(messages[1], ChatMessage::new("user", "hi"));
    }

    #[test]
    fn test_json_mode_prompt_is_user_not_system() {
        let messages = build_messages(
            ProviderKind::OpenAi,
            "explain TCP handshake",
            &history(),
            HistoryMode::RoleFaithful,
        );
        let system: Vec<&ChatMessage> = messages.iter().filter(|m| m.role == "system").collect();
        assert_eq!(system.len(), 1);
        assert_eq!(system[0].content, JSON_MODE_INSTRUCTION);
        assert_eq!(
            messages.last(),
            Some(&ChatMessage::new("user", "explain TCP handshake"))
        );
    }

    #[test]
    fn test_api_key_sent_untrimmed() {
        let client = ChatCompletionClient::new(
            ProviderKind::Groq,
            ApiKey::new(" k1"),
            Some("http://localhost:1234/v1".to_string()),
            None,
        )
        .unwrap();

        let request = client.authorized_post("/chat/completions").build().unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:1234/v1/chat/completions");
        assert_eq!(request.headers()["authorization"], "Bearer  k1");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ChatCompletionClient::new(
            ProviderKind::Groq,
            ApiKey::new("k1"),
            Some("http://localhost:1234/v1/".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234/v1");
        assert_eq!(client.model(), "llama3-8b-8192");
    }
}
