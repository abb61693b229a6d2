use crate::completion::ResponseSource;
use crate::responder::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Advisory metadata a client may attach to a chat message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    /// Mood score from the user's previous check-in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_mood: Option<f64>,
    /// Excerpt from the user's latest journal entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_journal_entry: Option<String>,
    /// Free-form label such as "morning" or "late night"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
}

impl ChatContext {
    pub fn is_empty(&self) -> bool {
        self.previous_mood.is_none()
            && self.recent_journal_entry.is_none()
            && self.time_of_day.is_none()
    }
}

/// A chat exchange about to be persisted; the store assigns id and timestamp
#[derive(Debug, Clone)]
pub struct NewChatExchange {
    pub user_id: Option<String>,
    pub message: String,
    pub response: String,
    pub context: Option<ChatContext>,
    pub category: Category,
    pub source: ResponseSource,
}

/// One persisted user turn and its reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExchange {
    /// Store assigned identifier (ULID, sortable by creation time)
    pub id: String,
    pub user_id: Option<String>,
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ChatContext>,
    /// Placeholder; no analysis populates it
    #[serde(default)]
    pub sentiment: f64,
    pub category: Category,
    pub source: ResponseSource,
}

/// A validated journal entry about to be persisted
///
/// Built by [`crate::journal::JournalSubmission::validate`], which enforces
/// the mood range and non-empty content.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJournalEntry {
    pub user_id: Option<String>,
    pub content: String,
    pub mood: u8,
    pub tags: Vec<String>,
    pub activities: Vec<String>,
}

/// A persisted mood check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub user_id: Option<String>,
    pub content: String,
    pub mood: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    pub timestamp: DateTime<Utc>,
    /// Placeholder; no analysis populates it
    #[serde(default)]
    pub sentiment: f64,
}

/// Filter for chat exchange listings
#[derive(Debug, Clone, Default)]
pub struct ExchangeFilter {
    pub user_id: Option<String>,
}

impl ExchangeFilter {
    pub fn for_user(user_id: Option<String>) -> Self {
        Self { user_id }
    }

    pub fn matches(&self, exchange: &ChatExchange) -> bool {
        match &self.user_id {
            Some(user) => exchange.user_id.as_deref() == Some(user.as_str()),
            None => true,
        }
    }
}

/// Filter for journal listings; all set predicates must hold
#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    pub user_id: Option<String>,
    /// Inclusive lower bound on the entry timestamp
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the entry timestamp
    pub end: Option<DateTime<Utc>>,
    /// Entry must carry at least one of these tags; empty means no constraint
    pub tags: Vec<String>,
}

impl JournalFilter {
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        if let Some(user) = &self.user_id {
            if entry.user_id.as_deref() != Some(user.as_str()) {
                return false;
            }
        }
        if let Some(start) = self.start {
            if entry.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if entry.timestamp > end {
                return false;
            }
        }
        self.tags.is_empty() || entry.tags.iter().any(|tag| self.tags.contains(tag))
    }
}
