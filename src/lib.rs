pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repo;
pub mod services;
pub mod state;
pub mod terminal;

use config::AppConfig;
use error::Result;
use state::SessionState;
use terminal::Terminal;

/// Setup, then the chat loop, then exit.
pub async fn start<T: Terminal>(app: &AppConfig, terminal: &mut T) -> Result<()> {
    let session = handlers::chat::setup(terminal)?;
    let mut state = SessionState::new(session, app)?;
    handlers::chat::run(&mut state, terminal).await
}

pub mod test_utils {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::error::{AppError, Result};
    use crate::models::{ApiKey, ProviderKind, SessionConfig, Turn};
    use crate::repo::history::ConversationHistory;
    use crate::services::{CompletionProvider, LinkSearch, SearchTrigger};
    use crate::state::SessionState;
    use crate::terminal::Terminal;

    /// Terminal that replays canned answers and records what was shown.
    #[derive(Default)]
    pub struct ScriptedTerminal {
        pub provider: Option<ProviderKind>,
        pub api_keys: VecDeque<String>,
        pub prompts: VecDeque<String>,
        pub confirms: VecDeque<bool>,
        pub output: Vec<String>,
        pub events: Vec<String>,
    }

    impl ScriptedTerminal {
        pub fn new(provider: ProviderKind, api_key: &str) -> Self {
            Self {
                provider: Some(provider),
                api_keys: VecDeque::from([api_key.to_string()]),
                ..Default::default()
            }
        }

        /// Queue another key answer, used after a rejected one
        pub fn then_key(mut self, api_key: &str) -> Self {
            self.api_keys.push_back(api_key.to_string());
            self
        }

        /// Queue a prompt and the continue answer that follows it
        pub fn turn(mut self, prompt: &str, keep_going: bool) -> Self {
            self.prompts.push_back(prompt.to_string());
            self.confirms.push_back(keep_going);
            self
        }

        pub fn printed(&self) -> String {
            self.output.join("\n")
        }
    }

    impl Terminal for ScriptedTerminal {
        fn select_provider(&mut self) -> Result<ProviderKind> {
            self.events.push("select".into());
            self.provider
                .ok_or_else(|| AppError::Validation("no provider scripted".into()))
        }

        fn read_api_key(&mut self) -> Result<String> {
            self.events.push("api_key".into());
            self.api_keys
                .pop_front()
                .ok_or_else(|| AppError::Validation("no api key scripted".into()))
        }

        fn read_prompt(&mut self) -> Result<String> {
            self.events.push("prompt".into());
            self.prompts
                .pop_front()
                .ok_or_else(|| AppError::Validation("no prompt scripted".into()))
        }

        fn confirm_continue(&mut self) -> Result<bool> {
            self.events.push("confirm".into());
            self.confirms
                .pop_front()
                .ok_or_else(|| AppError::Validation("no confirm scripted".into()))
        }

        fn start_spinner(&mut self, message: &str) {
            self.events.push(format!("spinner:{}", message));
        }

        fn stop_spinner(&mut self, message: &str) {
            self.events.push(format!("spinner:{}", message));
        }

        fn print(&mut self, text: &str) {
            self.output.push(text.to_string());
        }
    }

    /// One recorded completion request
    #[derive(Debug, Clone)]
    pub struct CompletionCall {
        pub prompt: String,
        pub history: Vec<Turn>,
    }

    /// Provider returning queued replies. An exhausted queue replies with an error.
    #[derive(Clone)]
    pub struct FakeProvider {
        kind: ProviderKind,
        replies: Arc<Mutex<VecDeque<Result<String>>>>,
        pub calls: Arc<Mutex<Vec<CompletionCall>>>,
    }

    impl FakeProvider {
        pub fn new(kind: ProviderKind) -> Self {
            Self {
                kind,
                replies: Arc::new(Mutex::new(VecDeque::new())),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn reply(self, text: &str) -> Self {
            self.replies.lock().unwrap().push_back(Ok(text.to_string()));
            self
        }

        pub fn fail(self, message: &str) -> Self {
            self.fail_with(AppError::Provider(message.to_string()))
        }

        pub fn fail_with(self, err: AppError) -> Self {
            self.replies.lock().unwrap().push_back(Err(err));
            self
        }

        pub fn calls(&self) -> Vec<CompletionCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for FakeProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn complete(&self, prompt: &str, history: &[Turn]) -> Result<String> {
            self.calls.lock().unwrap().push(CompletionCall {
                prompt: prompt.to_string(),
                history: history.to_vec(),
            });
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::Provider("no reply scripted".into())))
        }
    }

    /// Search returning fixed links, or failing every time.
    #[derive(Clone)]
    pub struct FakeSearch {
        links: Option<Vec<String>>,
        pub queries: Arc<Mutex<Vec<String>>>,
    }

    impl FakeSearch {
        pub fn returning(links: &[&str]) -> Self {
            Self {
                links: Some(links.iter().map(|l| l.to_string()).collect()),
                queries: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn failing() -> Self {
            Self {
                links: None,
                queries: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LinkSearch for FakeSearch {
        async fn search(&self, query: &str) -> Result<Vec<String>> {
            self.queries.lock().unwrap().push(query.to_string());
            self.links
                .clone()
                .ok_or_else(|| AppError::Search("connection refused".into()))
        }
    }

    pub fn create_test_state(provider: FakeProvider, search: FakeSearch) -> SessionState {
        let config = SessionConfig::new(provider.kind(), ApiKey::new("test-key"));
        SessionState::with_services(
            config,
            Box::new(provider),
            Box::new(search),
            SearchTrigger::default(),
            ConversationHistory::new(),
        )
    }
}
