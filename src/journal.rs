//! Mood journal: validated submissions, filtered listings and insights

use crate::error::{FieldError, MindwellError, Result};
use crate::storage::{ConversationStore, JournalEntry, JournalFilter, NewJournalEntry};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Lowest accepted mood score
pub const MIN_MOOD: i64 = 1;
/// Highest accepted mood score
pub const MAX_MOOD: i64 = 5;

const TOP_TOPICS: usize = 5;

/// Journal entry as submitted by a client, before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalSubmission {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub mood: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
}

impl JournalSubmission {
    /// Check every field and build the entry to store
    ///
    /// All problems are reported together. Tags and activities are treated as
    /// sets: blanks are dropped and duplicates collapse, first occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns `MindwellError::Validation` listing each offending field
    ///
    /// # Examples
    ///
    /// ```
    /// use mindwell::journal::JournalSubmission;
    ///
    /// let submission = JournalSubmission {
    ///     content: Some("Slept well".to_string()),
    ///     mood: Some(6),
    ///     ..Default::default()
    /// };
    /// assert!(submission.validate().is_err());
    /// ```
    pub fn validate(self) -> Result<NewJournalEntry> {
        let mut errors = Vec::new();

        let content = match self.content {
            Some(content) if !content.trim().is_empty() => Some(content),
            Some(_) => {
                errors.push(FieldError::new("content", "must not be empty"));
                None
            }
            None => {
                errors.push(FieldError::new("content", "is required"));
                None
            }
        };

        let mood = match self.mood {
            Some(mood) if (MIN_MOOD..=MAX_MOOD).contains(&mood) => u8::try_from(mood).ok(),
            Some(mood) => {
                errors.push(FieldError::new(
                    "mood",
                    format!("must be between {} and {}, got {}", MIN_MOOD, MAX_MOOD, mood),
                ));
                None
            }
            None => {
                errors.push(FieldError::new("mood", "is required"));
                None
            }
        };

        match (content, mood) {
            (Some(content), Some(mood)) if errors.is_empty() => Ok(NewJournalEntry {
                user_id: self.user_id,
                content,
                mood,
                tags: label_set(self.tags),
                activities: label_set(self.activities),
            }),
            _ => Err(MindwellError::Validation(errors).into()),
        }
    }
}

fn label_set(labels: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    labels
        .into_iter()
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty() && seen.insert(label.clone()))
        .collect()
}

/// Listing parameters as they arrive on a query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (start of that day, UTC)
    #[serde(default)]
    pub start_date: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (end of that day, UTC)
    #[serde(default)]
    pub end_date: Option<String>,
    /// Comma separated tag list
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl JournalQuery {
    /// Turn the raw parameters into a store filter
    ///
    /// # Errors
    ///
    /// Returns `MindwellError::Validation` for unparseable dates or a start
    /// date after the end date
    pub fn to_filter(&self) -> Result<JournalFilter> {
        let mut errors = Vec::new();
        let start = parse_bound(
            "startDate",
            self.start_date.as_deref(),
            DayEdge::Start,
            &mut errors,
        );
        let end = parse_bound("endDate", self.end_date.as_deref(), DayEdge::End, &mut errors);

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                errors.push(FieldError::new("startDate", "must not be after endDate"));
            }
        }
        if !errors.is_empty() {
            return Err(MindwellError::Validation(errors).into());
        }

        Ok(JournalFilter {
            user_id: self.user_id.clone().filter(|u| !u.is_empty()),
            start,
            end,
            tags: self.tags.as_deref().map(split_tags).unwrap_or_default(),
        })
    }
}

/// Split a comma separated tag list, dropping blanks
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum DayEdge {
    Start,
    End,
}

fn parse_bound(
    field: &str,
    raw: Option<&str>,
    edge: DayEdge,
    errors: &mut Vec<FieldError>,
) -> Option<DateTime<Utc>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let moment = match edge {
            DayEdge::Start => day.and_hms_milli_opt(0, 0, 0, 0),
            DayEdge::End => day.and_hms_milli_opt(23, 59, 59, 999),
        };
        if let Some(moment) = moment {
            return Some(Utc.from_utc_datetime(&moment));
        }
    }
    errors.push(FieldError::new(
        field,
        format!("expected RFC 3339 timestamp or YYYY-MM-DD, got {:?}", raw),
    ));
    None
}

/// One point on the mood chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodPoint {
    pub date: DateTime<Utc>,
    pub mood: u8,
}

/// Aggregates over a user's journal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalInsights {
    /// Mood per entry, oldest first
    pub mood_trends: Vec<MoodPoint>,
    /// Most used tags, most frequent first; ties in alphabetical order
    pub common_topics: Vec<String>,
    /// `None` when there are no entries
    pub average_mood: Option<f64>,
}

/// Build insights from entries in chronological order
pub fn summarize_entries(entries: &[JournalEntry]) -> JournalInsights {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in entries.iter().flat_map(|e| e.tags.iter()) {
        *counts.entry(tag.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let average_mood = if entries.is_empty() {
        None
    } else {
        let total: u32 = entries.iter().map(|e| u32::from(e.mood)).sum();
        Some(f64::from(total) / entries.len() as f64)
    };

    JournalInsights {
        mood_trends: entries
            .iter()
            .map(|e| MoodPoint {
                date: e.timestamp,
                mood: e.mood,
            })
            .collect(),
        common_topics: ranked
            .into_iter()
            .take(TOP_TOPICS)
            .map(|(tag, _)| tag.to_string())
            .collect(),
        average_mood,
    }
}

/// Records and reads journal entries
#[derive(Debug, Clone)]
pub struct JournalService {
    store: ConversationStore,
}

impl JournalService {
    pub fn new(store: ConversationStore) -> Self {
        Self { store }
    }

    /// Validate and persist a submission
    ///
    /// Nothing is written when validation fails.
    pub async fn submit(&self, submission: JournalSubmission) -> Result<JournalEntry> {
        let entry = submission.validate()?;
        let stored = self.store.append_journal_entry(entry).await?;
        tracing::info!(id = %stored.id, mood = stored.mood, "Journal entry recorded");
        Ok(stored)
    }

    /// Newest-first entries matching `filter`
    pub fn list(&self, filter: &JournalFilter, limit: usize) -> Result<Vec<JournalEntry>> {
        self.store.list_journal_entries(filter, Some(limit))
    }

    /// Summarize every entry for `user_id` (all users when `None`)
    pub fn insights(&self, user_id: Option<String>) -> Result<JournalInsights> {
        let filter = JournalFilter {
            user_id,
            ..Default::default()
        };
        let mut entries = self.store.list_journal_entries(&filter, None)?;
        entries.reverse();
        Ok(summarize_entries(&entries))
    }
}
