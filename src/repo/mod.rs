pub mod history;

pub use history::ConversationHistory;
