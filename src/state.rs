use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::Result;
use crate::models::{ProviderKind, SessionConfig};
use crate::repo::history::ConversationHistory;
use crate::services::{
    ChatCompletionClient, CompletionProvider, LinkSearch, SearchTrigger, StackOverflowClient,
};

/// Everything one chat session owns. Built once after setup; the provider
/// client inside it cannot be swapped for the rest of the session.
pub struct SessionState {
    pub session_id: Uuid,
    pub history: ConversationHistory,
    pub trigger: SearchTrigger,
    config: SessionConfig,
    provider: Box<dyn CompletionProvider>,
    searcher: Box<dyn LinkSearch>,
}

impl SessionState {
    pub fn new(config: SessionConfig, app: &AppConfig) -> Result<Self> {
        let provider = ChatCompletionClient::for_session(&config, app)?;
        let searcher = StackOverflowClient::new(Some(app.search_url.clone()), app.timeout)?;

        Ok(Self::with_services(
            config,
            Box::new(provider),
            Box::new(searcher),
            SearchTrigger::new(app.strip_short_trigger),
            ConversationHistory::with_max_turns(app.max_turns),
        ))
    }

    pub fn with_services(
        config: SessionConfig,
        provider: Box<dyn CompletionProvider>,
        searcher: Box<dyn LinkSearch>,
        trigger: SearchTrigger,
        history: ConversationHistory,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            history,
            trigger,
            config,
            provider,
            searcher,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    pub fn provider(&self) -> &dyn CompletionProvider {
        self.provider.as_ref()
    }

    pub fn searcher(&self) -> &dyn LinkSearch {
        self.searcher.as_ref()
    }
}
