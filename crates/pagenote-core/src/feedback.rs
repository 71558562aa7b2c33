//! Feedback records as stored in the backend table.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Feedback submitted for a page, before it is stamped and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackDraft {
    pub url: String,
    pub feedback: String,
}

/// The row written by [`crate::service::FeedbackService::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFeedback<'a> {
    pub url: &'a str,
    pub feedback: &'a str,
    pub user_id: &'a str,
    pub created_at: String,
}

/// A stored feedback row.
///
/// Only the columns the app reads are named; any other column is kept in
/// `extra` so replies pass rows through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Highlighted page text, for highlight-type entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedbackEntry {
    /// The entry's text, trying `feedback`, then `feedback_text`, then `text`.
    pub fn content(&self) -> Option<&str> {
        self.feedback
            .as_deref()
            .or_else(|| self.extra.get("feedback_text").and_then(Value::as_str))
            .or(self.text.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Local calendar day of `created_at`, if it is an RFC 3339 timestamp.
    pub fn created_on(&self) -> Option<NaiveDate> {
        let raw = self.created_at.as_deref()?;
        let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
        Some(parsed.with_timezone(&Local).date_naive())
    }

    /// Case-insensitive substring search over `text` and `feedback`.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [self.text.as_deref(), self.feedback.as_deref()]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

pub fn search<'a>(entries: &'a [FeedbackEntry], query: &str) -> Vec<&'a FeedbackEntry> {
    entries.iter().filter(|entry| entry.matches(query)).collect()
}

/// Number of entries created on `day` (local time).
pub fn count_on(entries: &[FeedbackEntry], day: NaiveDate) -> usize {
    entries
        .iter()
        .filter(|entry| entry.created_on() == Some(day))
        .count()
}
