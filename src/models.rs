//! Core data models for inspiration records.
//!
//! Records are stored as camelCase JSON blobs in the key-value store and
//! returned verbatim by the HTTP API, so the serde layout here is the wire
//! format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted inspiration entry.
///
/// `id` and `created_at` are fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspirationRecord {
    pub id: String,
    pub original_text: String,
    pub enhanced_content: EnhancedContent,
    pub metadata: RecordMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// AI-derived (or heuristic) enrichment of a record's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedContent {
    pub summary: String,
    pub details: String,
    pub suggestions: Vec<String>,
    pub tags: Vec<String>,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub word_count: usize,
    pub language: String,
    pub sentiment: String,
    /// Decoded size of the audio attached at creation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_bytes: Option<usize>,
}

/// Pointer stored in the list index, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Projection of a record returned by list calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub id: String,
    /// Original text, cut to 100 characters.
    pub original_text: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    pub data: Vec<SummaryRecord>,
    pub pagination: Pagination,
}

/// Aggregate counts over indexed records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_items: usize,
    /// `(category, count)`, most frequent first.
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}
