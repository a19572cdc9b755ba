use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_SEARCH_URL;
use crate::error::{AppError, Result};

/// Long-form flag that asks for Stack Overflow links
pub const LONG_TRIGGER: &str = "-stackoverflow";
/// Short-form flag; detected anywhere in the prompt
pub const SHORT_TRIGGER: &str = "-s";
/// Stack Exchange site searched
pub const SEARCH_SITE: &str = "stackoverflow";
/// Links printed per turn
pub const MAX_DISPLAYED_LINKS: usize = 5;

/// Decides whether a prompt wants links and what query to send.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchTrigger {
    strip_short: bool,
}

impl SearchTrigger {
    /// `strip_short` also removes a standalone `-s` from the query.
    /// When off, the short flag triggers a search but stays in the query text.
    pub fn new(strip_short: bool) -> Self {
        Self { strip_short }
    }

    pub fn is_triggered(&self, prompt: &str) -> bool {
        prompt.contains(LONG_TRIGGER) || prompt.contains(SHORT_TRIGGER)
    }

    /// Query to search for, or `None` when the prompt has no trigger
    pub fn query_for(&self, prompt: &str) -> Option<String> {
        if !self.is_triggered(prompt) {
            return None;
        }

        let without_long = prompt.replace(LONG_TRIGGER, "");
        let query = if self.strip_short {
            without_long
                .split_whitespace()
                .filter(|word| *word != SHORT_TRIGGER)
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            without_long.trim().to_string()
        };

        Some(query)
    }
}

/// Source of reference links for a query
#[async_trait]
pub trait LinkSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    link: Option<String>,
}

/// Client for the Stack Exchange `search/advanced` API
#[derive(Clone)]
pub struct StackOverflowClient {
    client: Client,
    base_url: String,
}

impl StackOverflowClient {
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut builder = Client::builder().user_agent(concat!("prompt-cli/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Search(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl LinkSearch for StackOverflowClient {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        info!(query = %query, "Searching Stack Overflow");

        let url = format!(
            "{}/2.3/search/advanced?order=desc&sort=relevance&q={}&site={}",
            self.base_url,
            urlencoding::encode(query),
            SEARCH_SITE
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(error = %e, "Failed to fetch search results");
            AppError::Search(format!("Search request failed: {}", e))
        })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Search returned non-success status");
            return Err(AppError::Search(format!(
                "Search failed with status: {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse search response: {}", e)))?;

        let links: Vec<String> = body.items.into_iter().filter_map(|item| item.link).collect();

        info!(count = links.len(), "Search completed");

        Ok(links)
    }
}

/// Best-effort search: any failure becomes an empty list.
pub async fn fetch_links(searcher: &dyn LinkSearch, query: &str) -> Vec<String> {
    match searcher.search(query).await {
        Ok(links) => links,
        Err(e) => {
            debug!(error = %e, "Search unavailable, continuing without links");
            Vec::new()
        }
    }
}

/// Render up to five links for the terminal. `None` when there is nothing to show.
pub fn format_links(links: &[String]) -> Option<String> {
    if links.is_empty() {
        return None;
    }

    let mut output = String::from("Links:\n");
    for (i, link) in links.iter().take(MAX_DISPLAYED_LINKS).enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, link));
    }

    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_trigger_no_query() {
        let trigger = SearchTrigger::default();
        assert_eq!(trigger.query_for("explain TCP handshake"), None);
    }

    #[test]
    fn test_long_trigger_is_removed() {
        let trigger = SearchTrigger::default();
        assert_eq!(
            trigger.query_for("rust lifetimes -stackoverflow"),
            Some("rust lifetimes".to_string())
        );
        assert_eq!(
            trigger.query_for("-stackoverflow borrow checker"),
            Some("borrow checker".to_string())
        );
    }

    #[test]
    fn test_short_trigger_stays_in_query_by_default() {
        let trigger = SearchTrigger::default();
        assert_eq!(
            trigger.query_for("what about UDP -s"),
            Some("what about UDP -s".to_string())
        );
    }

    #[test]
    fn test_short_trigger_stripped_when_enabled() {
        let trigger = SearchTrigger::new(true);
        assert_eq!(
            trigger.query_for("what about UDP -s"),
            Some("what about UDP".to_string())
        );
        assert_eq!(
            trigger.query_for("tokio -s select -stackoverflow"),
            Some("tokio select".to_string())
        );
    }

    #[test]
    fn test_format_links_empty() {
        assert_eq!(format_links(&[]), None);
    }

    #[test]
    fn test_format_links_caps_at_five() {
        let links: Vec<String> = (1..=8)
            .map(|i| format!("https://stackoverflow.com/q/{}", i))
            .collect();

        let formatted = format_links(&links).unwrap();
        assert!(formatted.starts_with("Links:"));
        assert!(formatted.contains("5. https://stackoverflow.com/q/5"));
        assert!(!formatted.contains("https://stackoverflow.com/q/6"));
        assert_eq!(formatted.lines().count(), 1 + MAX_DISPLAYED_LINKS);
    }
}
