//! Core data models exchanged with the helpdesk backend.
//!
//! These types mirror the JSON bodies of the backend REST API. Result sets and
//! ticket collections are always received as full snapshots; nothing in this
//! crate patches them locally.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Treats an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a search highlight. The backend sends either a ready string or, for
/// OpenSearch hits, the raw `{field: [fragments]}` map; fragments are joined
/// with ` ... `. Any other shape, and empty text, means no highlight.
fn lenient_highlight<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(highlight_text))
}

fn highlight_text(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    let text = match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(highlight_text)
            .collect::<Vec<_>>()
            .join(" ... "),
        Value::Object(fields) => fields
            .values()
            .filter_map(highlight_text)
            .collect::<Vec<_>>()
            .join(" ... "),
        _ => String::new(),
    };
    (!text.is_empty()).then_some(text)
}

// ============ Sources ============

/// Data source a search result was found in.
///
/// Results without a source (or with an empty one) come from the demo
/// knowledge base, so [`Source::Mock`] is the default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    OpenSearch,
    MediaWiki,
    #[default]
    Mock,
    Unknown(String),
}

impl Source {
    /// The three sources the filter panel knows about, in display order.
    pub const KNOWN: [Source; 3] = [Source::OpenSearch, Source::MediaWiki, Source::Mock];

    /// Wire name of the source.
    pub fn as_str(&self) -> &str {
        match self {
            Source::OpenSearch => "opensearch",
            Source::MediaWiki => "mediawiki",
            Source::Mock => "mock",
            Source::Unknown(s) => s,
        }
    }
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        match value {
            "opensearch" => Source::OpenSearch,
            "mediawiki" => Source::MediaWiki,
            "mock" | "" => Source::Mock,
            other => Source::Unknown(other.to_string()),
        }
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Source::from(value.as_str())
    }
}

impl From<Source> for String {
    fn from(value: Source) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Search ============

/// A single solution returned by `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Relevance on a 0–10 scale.
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Pre-rendered snippet; rendered verbatim when present.
    #[serde(
        default,
        deserialize_with = "lenient_highlight",
        skip_serializing_if = "Option::is_none"
    )]
    pub highlight: Option<String>,
}

/// Body of `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub sources: Vec<Source>,
    pub debug: bool,
}

/// Response of `POST /api/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<SearchResult>,
}

// ============ Tickets ============

/// Ticket priority. Values the backend sends that are not one of the four
/// known levels are kept verbatim in [`Priority::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
    Other(String),
}

impl Priority {
    pub fn as_str(&self) -> &str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
            Priority::Other(s) => s,
        }
    }
}

impl From<&str> for Priority {
    fn from(value: &str) -> Self {
        match value {
            "low" => Priority::Low,
            "normal" => Priority::Normal,
            "high" => Priority::High,
            "urgent" => Priority::Urgent,
            other => Priority::Other(other.to_string()),
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        Priority::from(value.as_str())
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket workflow status. A missing or empty status means `new`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    New,
    InProgress,
    Resolved,
    Closed,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::New => "new",
            Status::InProgress => "in_progress",
            Status::Resolved => "resolved",
            Status::Closed => "closed",
            Status::Other(s) => s,
        }
    }
}

impl From<&str> for Status {
    fn from(value: &str) -> Self {
        match value {
            "new" | "" => Status::New,
            "in_progress" => Status::InProgress,
            "resolved" => Status::Resolved,
            "closed" => Status::Closed,
            other => Status::Other(other.to_string()),
        }
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        Status::from(value.as_str())
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A comment appended to a ticket by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub created_on: Option<String>,
}

/// A support ticket as returned by `GET /api/tickets`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ticket {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: Status,
    /// Server timestamp, kept raw so that formatting can fall back to it.
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<u64>,
}

/// Body of `POST /api/tickets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    pub subject: String,
    pub description: String,
    pub priority: Priority,
    pub project_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<u64>,
}

/// The part of the create-ticket response this client relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTicket {
    pub id: u64,
}

/// Body of `POST /api/tickets/{id}/solution`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionAttachment {
    pub solution: String,
    pub source: Source,
}

/// Body of `POST /api/tickets/{id}/comment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRequest {
    pub comment: String,
}

/// Error envelope the backend attaches to failed responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<String>,
}
