//! Chat transcript messages handed to the external chat store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of a chat transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// The question and its answer, in the order they are stored
    pub fn exchange(question: impl Into<String>, answer: impl Into<String>) -> [ChatMessage; 2] {
        let question = Self::user(question);
        let mut answer = Self::assistant(answer);
        // Clock skew must not reorder the pair when sorted by timestamp.
        if answer.timestamp < question.timestamp {
            answer.timestamp = question.timestamp;
        }
        [question, answer]
    }
}
