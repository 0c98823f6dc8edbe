use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TriageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    Shelter,
    Medical,
    Report,
    FloodSafety,
    EarthquakeSafety,
    Fallback,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::Shelter,
        Intent::Medical,
        Intent::Report,
        Intent::FloodSafety,
        Intent::EarthquakeSafety,
        Intent::Fallback,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "shelter" => Some(Self::Shelter),
            "medical" => Some(Self::Medical),
            "report" => Some(Self::Report),
            "flood-safety" => Some(Self::FloodSafety),
            "earthquake-safety" => Some(Self::EarthquakeSafety),
            "fallback" => Some(Self::Fallback),
            _ => None,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::Shelter => "shelter",
            Self::Medical => "medical",
            Self::Report => "report",
            Self::FloodSafety => "flood-safety",
            Self::EarthquakeSafety => "earthquake-safety",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub sender: Sender,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
            at,
        }
    }

    pub fn assistant(content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            sender: Sender::Assistant,
            content: content.into(),
            at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    pub owner_id: Option<String>,
    messages: Vec<ConversationMessage>,
}

impl ConversationSession {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            owner_id: None,
            messages: Vec::new(),
        }
    }

    /// Stamping instant for the next append: strictly after the tail message
    /// even when the wall clock has not advanced between exchanges.
    pub fn next_instant(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.messages.last() {
            Some(last) if now <= last.at => last.at + Duration::microseconds(1),
            _ => now,
        }
    }

    pub fn append(&mut self, message: ConversationMessage) -> Result<(), TriageError> {
        if let Some(last) = self.messages.last() {
            if message.at <= last.at {
                return Err(TriageError::OutOfOrderMessage {
                    last: last.at,
                    offered: message.at,
                });
            }
        }

        self.messages.push(message);
        Ok(())
    }

    pub fn history(&self) -> &[ConversationMessage] {
        &self.messages
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInput {
    pub session_id: String,
    pub owner_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageOutcome {
    pub response_text: String,
    pub intent: Intent,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub owner_id: Option<String>,
    pub user_text: String,
    pub response_text: String,
    pub at: DateTime<Utc>,
}
