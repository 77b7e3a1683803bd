//! Request and response contracts for the RAG backend.
//!
//! Request types serialize straight into the JSON bodies the backend
//! expects. Response types are only ever built from payloads that already
//! passed the matching guard in [`crate::guards`], so their `Deserialize`
//! impls can stay strict without leaking serde errors to callers.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document category tag.
///
/// `general` and `code` are the categories offered out of the box. Other
/// lowercase tokens (`[a-z0-9_-]+`) are accepted as [`Category::Custom`] so
/// new categories can be added on the backend without a client release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    #[default]
    General,
    Code,
    Custom(String),
}

impl Category {
    /// Categories offered to the user when nothing else is configured.
    pub const BUILTIN: [Category; 2] = [Category::General, Category::Code];

    pub fn as_str(&self) -> &str {
        match self {
            Category::General => "general",
            Category::Code => "code",
            Category::Custom(tag) => tag,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        match tag.as_str() {
            "general" => Ok(Category::General),
            "code" => Ok(Category::Code),
            "" => Err("category must not be empty".to_string()),
            other => {
                let valid = other
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
                if valid {
                    Ok(Category::Custom(other.to_string()))
                } else {
                    Err(format!(
                        "invalid category '{}': use lowercase letters, digits, '-' or '_'",
                        s
                    ))
                }
            }
        }
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

// ============ Add document ============

/// Submission of a document URL for ingestion.
///
/// Serializes to the `POST /documents/add` body: `{url, category, tags?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddDocumentRequest {
    pub url: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl AddDocumentRequest {
    pub fn new(url: impl Into<String>, category: Category) -> Self {
        Self {
            url: url.into(),
            category,
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Ingestion status token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddStatus {
    Success,
    Failure,
}

/// Outcome of an ingestion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDocumentResult {
    pub status: AddStatus,
    pub message: String,
    pub url: String,
}

impl AddDocumentResult {
    pub fn is_success(&self) -> bool {
        self.status == AddStatus::Success
    }
}

// ============ Search ============

/// A natural-language question against the ingested corpus.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchRequest {
    pub query: String,
    /// Model to answer with. `None` means the client's active model.
    pub model: Option<String>,
    /// Number of chunks to retrieve. `None` leaves it to the backend.
    pub k: Option<u32>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_k(mut self, k: u32) -> Self {
        self.k = Some(k);
        self
    }
}

/// Provenance attached to a citation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CitationMetadata {
    #[serde(default)]
    pub source: Option<String>,
}

/// A retrieved chunk the answer was grounded on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub content: String,
    #[serde(default)]
    pub metadata: Option<CitationMetadata>,
}

impl Citation {
    /// Provenance locator, if the backend supplied one.
    pub fn source(&self) -> Option<&str> {
        self.metadata.as_ref()?.source.as_deref()
    }
}

/// Answer to a [`SearchRequest`].
///
/// Only `answer` and `sources` are kept; anything else in the payload is
/// dropped during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Citation>,
}

// ============ Stats ============

/// Per-source summary in [`StatsResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub url: String,
    pub title: String,
    pub chunk_count: u64,
    pub added_at: String,
}

impl SourceSummary {
    /// Ingestion time as UTC.
    ///
    /// Accepts RFC 3339 and naive ISO-8601 timestamps (read as UTC). Returns
    /// `None` for anything else; the raw string is still in `added_at`.
    pub fn added_at_utc(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.added_at) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.added_at, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Corpus introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResult {
    pub total_documents: u64,
    pub total_chunks: u64,
    pub sources: Vec<SourceSummary>,
}

// ============ Health ============

/// Liveness probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResult {
    pub status: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub timestamp: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ============ Model switch ============

/// Minimal acknowledgement of `POST /model/switch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSwitchAck {
    /// The model now active on the backend.
    pub model: String,
    /// Backend-supplied note, when there is one.
    pub message: Option<String>,
}
