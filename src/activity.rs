//! Append-only activity log records.
//!
//! Activity entries come from manual logging (`win`, `application`, custom
//! kinds) and from ingestion collaborators (commits, sent mail). The payload
//! is an opaque string; JSON is only parsed at the edges that need it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Source tag for entries created from the CLI.
pub const MANUAL_SOURCE: &str = "manual";

/// Well-known activity kinds.
pub mod kinds {
    pub const WIN: &str = "win";
    pub const APPLICATION: &str = "application";
    pub const COMMIT: &str = "commit";
}

/// A logged activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: u64,
    pub kind: String,
    pub description: String,
    pub category: Option<String>,
    pub source: String,
    pub payload: Option<String>,
    pub timestamp: NaiveDateTime,
}

impl ActivityRecord {
    pub fn is_win(&self) -> bool {
        self.kind == kinds::WIN
    }

    /// Parse the payload as a JSON object. `None` when absent or unreadable.
    pub fn payload_json(&self) -> Option<serde_json::Value> {
        self.payload
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    /// Read a top-level string field from the JSON payload.
    pub fn payload_field(&self, key: &str) -> Option<String> {
        self.payload_json()?
            .get(key)?
            .as_str()
            .map(str::to_string)
    }
}

/// Input for appending an activity. `timestamp: None` means "now".
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub kind: String,
    pub description: String,
    pub category: Option<String>,
    pub source: String,
    pub payload: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

impl NewActivity {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
            category: None,
            source: MANUAL_SOURCE.into(),
            payload: None,
            timestamp: None,
        }
    }

    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn payload(mut self, payload: Option<String>) -> Self {
        self.payload = payload;
        self
    }

    pub fn at(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// A manual win. Notes go into the payload when present.
    pub fn win(description: &str, category: Option<String>, notes: Option<&str>) -> Self {
        let payload = notes.map(|n| serde_json::json!({ "notes": n }).to_string());
        Self::new(kinds::WIN, description)
            .category(category)
            .payload(payload)
    }

    /// A job application: "Applied to <company> [for <role>]".
    pub fn application(
        company: &str,
        role: Option<&str>,
        category: Option<String>,
        notes: Option<&str>,
    ) -> Self {
        let mut description = format!("Applied to {company}");
        if let Some(role) = role {
            description.push_str(" for ");
            description.push_str(role);
        }
        let payload = serde_json::json!({ "company": company, "role": role, "notes": notes });
        Self::new(kinds::APPLICATION, description)
            .category(category)
            .payload(Some(payload.to_string()))
    }

    /// An arbitrary kind logged by hand.
    pub fn custom(kind: &str, description: &str, category: Option<String>) -> Self {
        Self::new(kind, description).category(category)
    }
}

/// Filter for reading the log. Results come back newest first.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub kind: Option<String>,
    pub category: Option<String>,
    /// Inclusive lower bound on the timestamp.
    pub since: Option<NaiveDateTime>,
    pub limit: Option<usize>,
}

impl ActivityFilter {
    pub fn since(since: NaiveDateTime) -> Self {
        Self {
            since: Some(since),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &ActivityRecord) -> bool {
        self.kind.as_deref().is_none_or(|k| record.kind == k)
            && self
                .category
                .as_deref()
                .is_none_or(|c| record.category.as_deref() == Some(c))
            && self.since.is_none_or(|s| record.timestamp >= s)
    }
}
