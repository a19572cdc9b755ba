use tracing::{debug, error, info, instrument};

use crate::error::Result;
use crate::models::{ApiKey, SessionConfig};
use crate::services::{fetch_links, format_links};
use crate::state::SessionState;
use crate::terminal::Terminal;

pub const INTRO_MESSAGE: &str = "Welcome to prompt-cli!!!";
pub const OUTRO_MESSAGE: &str = "You're all set!";
pub const LOADING_MESSAGE: &str = "loading...";
pub const DONE_MESSAGE: &str = "generated.";
pub const EMPTY_KEY_MESSAGE: &str = "The api key cannot be empty.";

/// Result of one prompt/answer exchange
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    pub completion: String,
    pub links: Vec<String>,
    /// Set when the provider call failed; the turn is then not recorded
    pub provider_error: Option<String>,
}

impl TurnOutcome {
    /// Text shown to the user: the answer, then a links block when there are links
    pub fn render(&self) -> String {
        let mut output = String::new();

        if let Some(err) = &self.provider_error {
            output.push_str(err);
            output.push('\n');
        }

        if !self.completion.is_empty() {
            output.push('\n');
            output.push_str(&self.completion);
            output.push('\n');
        }

        if let Some(links) = format_links(&self.links) {
            output.push('\n');
            output.push_str(&links);
        }

        output
    }
}

/// Ask for the provider and key. Runs once per process; a blank key is asked for again.
pub fn setup<T: Terminal>(terminal: &mut T) -> Result<SessionConfig> {
    terminal.print(INTRO_MESSAGE);

    let provider = terminal.select_provider()?;
    let key = loop {
        let key = terminal.read_api_key()?;
        if !key.trim().is_empty() {
            break key;
        }
        terminal.print(EMPTY_KEY_MESSAGE);
    };

    info!(provider = %provider, "Session configured");

    Ok(SessionConfig::new(provider, ApiKey::new(key)))
}

/// Run one exchange against the session's provider, searching for links when
/// the prompt asks for them. Provider failures are logged and leave history
/// untouched; any other error ends the turn with `Err`.
#[instrument(skip(state, prompt), fields(session_id = %state.session_id, provider = %state.provider_kind()))]
pub async fn handle_turn(state: &mut SessionState, prompt: &str) -> Result<TurnOutcome> {
    let query = state.trigger.query_for(prompt);
    debug!(search = query.is_some(), "Turn started");

    let (completion, provider_error) = match state
        .provider()
        .complete(prompt, state.history.snapshot())
        .await
    {
        Ok(text) => (text, None),
        Err(e) if e.is_provider_failure() => {
            error!(error = %e, "Completion failed");
            (String::new(), Some(e.to_string()))
        }
        Err(e) => return Err(e),
    };

    let links = match &query {
        Some(q) => fetch_links(state.searcher(), q).await,
        None => Vec::new(),
    };

    if completion.is_empty() {
        debug!("Empty completion, history unchanged");
    } else {
        state.history.append(prompt, &completion);
    }

    info!(
        completion_length = completion.len(),
        links = links.len(),
        history_len = state.history.len(),
        "Turn completed"
    );

    Ok(TurnOutcome {
        completion,
        links,
        provider_error,
    })
}

/// Prompt, answer, and ask to continue until the user stops.
pub async fn run<T: Terminal>(state: &mut SessionState, terminal: &mut T) -> Result<()> {
    loop {
        let prompt = terminal.read_prompt()?;

        terminal.start_spinner(LOADING_MESSAGE);
        let outcome = handle_turn(state, &prompt).await;
        terminal.stop_spinner(DONE_MESSAGE);
        let outcome = outcome?;

        let rendered = outcome.render();
        if !rendered.is_empty() {
            terminal.print(&rendered);
        }

        if !terminal.confirm_continue()? {
            break;
        }
    }

    terminal.print(OUTRO_MESSAGE);
    Ok(())
}
