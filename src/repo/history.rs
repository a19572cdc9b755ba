use crate::models::Turn;

/// In-memory conversation log for one session.
///
/// Turns are stored as complete (user, assistant) pairs in the order they
/// happened. With `max_turns` set, the oldest pairs are dropped once the
/// window is full; otherwise the log grows for the whole process.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
    max_turns: Option<usize>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History retaining at most `max_turns` exchanges. Zero means unbounded.
    pub fn with_max_turns(max_turns: Option<usize>) -> Self {
        Self {
            turns: Vec::new(),
            max_turns: max_turns.filter(|n| *n > 0),
        }
    }

    pub fn append(&mut self, user_text: &str, assistant_text: &str) {
        self.turns.push(Turn::user(user_text));
        self.turns.push(Turn::assistant(assistant_text));

        if let Some(max) = self.max_turns {
            let excess = self.turns.len().saturating_sub(max * 2);
            if excess > 0 {
                self.turns.drain(..excess);
            }
        }
    }

    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of stored entries (two per exchange)
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_turns(&self) -> Option<usize> {
        self.max_turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_append_alternates_roles() {
        let mut history = ConversationHistory::new();
        for i in 0..4 {
            history.append(&format!("q{}", i), &format!("a{}", i));
        }

        let turns = history.snapshot();
        assert_eq!(turns.len(), 8);
        for (i, turn) in turns.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected);
        }
        assert_eq!(turns[0].text, "q0");
        assert_eq!(turns[7].text, "a3");
    }

    #[test]
    fn test_unbounded_by_default() {
        let mut history = ConversationHistory::new();
        for _ in 0..100 {
            history.append("q", "a");
        }
        assert_eq!(history.len(), 200);
        assert_eq!(history.max_turns(), None);
    }

    #[test]
    fn test_window_drops_oldest_pairs() {
        let mut history = ConversationHistory::with_max_turns(Some(2));
        history.append("q1", "a1");
        history.append("q2", "a2");
        history.append("q3", "a3");

        let texts: Vec<&str> = history.snapshot().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["q2", "a2", "q3", "a3"]);
        assert_eq!(history.snapshot()[0].role, Role::User);
    }

    #[test]
    fn test_zero_window_means_unbounded() {
        let history = ConversationHistory::with_max_turns(Some(0));
        assert_eq!(history.max_turns(), None);
        assert!(history.is_empty());
    }
}
