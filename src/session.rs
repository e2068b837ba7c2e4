use crate::config::DEFAULT_HISTORY_WINDOW;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// State of one interactive conversation.
///
/// The transcript is what gets displayed. The history log holds the
/// `"User: ..."` / `"Assistant: ..."` lines fed back into prompts; only its
/// tail is ever read.
#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Vec<ChatTurn>,
    history: Vec<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_turn(&mut self, role: Role, content: impl Into<String>) {
        let content = content.into();
        self.history.push(format!("{}: {}", role.label(), content));
        self.append_display_only(role, content);
    }

    /// Shows a turn without feeding it back into later prompts.
    pub fn append_display_only(&mut self, role: Role, content: impl Into<String>) {
        self.transcript.push(ChatTurn {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    /// The last `n` history lines, oldest first.
    pub fn recent_history(&self, n: usize) -> Vec<&str> {
        let start = self.history.len().saturating_sub(n);
        self.history[start..].iter().map(String::as_str).collect()
    }

    pub fn history_window(&self) -> Vec<&str> {
        self.recent_history(DEFAULT_HISTORY_WINDOW)
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
        self.history.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty() && self.history.is_empty()
    }
}
