pub mod completion;
pub mod search;

pub use completion::{ChatCompletionClient, CompletionProvider};
pub use search::{fetch_links, format_links, LinkSearch, SearchTrigger, StackOverflowClient};
