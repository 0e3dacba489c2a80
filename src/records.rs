//! Inspiration record store.
//!
//! CRUD and paginated listing over a [`KvStore`]. Each record lives at
//! `record:<id>`; a single JSON array of [`IndexEntry`] pointers at
//! [`INDEX_KEY`] orders records newest first and drives pagination.
//!
//! # Consistency
//!
//! Writes are not transactional. `create` writes the record, then the index;
//! `delete` removes the record, then prunes the index. A failure in between
//! leaves either an orphan record (readable by id, absent from listings) or a
//! dangling index entry (skipped by listings). Concurrent writers race on the
//! index and the last write wins.
//!
//! # Listing
//!
//! Filters are applied before pagination. Without a category or search
//! filter, only the requested slice of the index is read. With a filter,
//! every indexed record is read in index order, filtered, then sliced, and
//! the reported totals describe the filtered set.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use chrono::{SubsecRound, Utc};

use crate::enrich::Enricher;
use crate::error::RecordError;
use crate::kv::KvStore;
use crate::models::{
    CategoryCount, IndexEntry, InspirationRecord, ListPage, Pagination, RecordMetadata,
    StoreStats, SummaryRecord,
};
use crate::text::{char_len, contains_cjk, normalize_whitespace, truncate_with_ellipsis, word_count};

pub const INDEX_KEY: &str = "inspirations:index";
pub const RECORD_KEY_PREFIX: &str = "record:";

/// Maximum entries kept in the index; the oldest are evicted.
pub const INDEX_CAP: usize = 1000;
pub const MAX_TEXT_CHARS: usize = 5000;
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;
const SUMMARY_TEXT_CHARS: usize = 100;

/// Parameters for [`RecordStore::list`].
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: usize,
    pub limit: usize,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    fn page(&self) -> usize {
        self.page.max(1)
    }

    fn limit(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.limit.min(MAX_PAGE_SIZE)
        }
    }

    /// Category filter, ignoring empty and `"all"`.
    fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "all")
    }

    /// Lower-cased search needle, ignoring blank input.
    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

pub fn record_key(id: &str) -> String {
    format!("{}{}", RECORD_KEY_PREFIX, id)
}

/// `inspiration_<unix millis>_<6 base36 chars>`.
pub fn generate_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut n = uuid::Uuid::new_v4().as_u128();
    let suffix: String = (0..6)
        .map(|_| {
            let c = ALPHABET[(n % 36) as usize] as char;
            n /= 36;
            c
        })
        .collect();
    format!("inspiration_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Case-insensitive match of `needle` (already lower-cased) against the
/// record's text, summary, and tags.
fn matches_search(record: &InspirationRecord, needle: &str) -> bool {
    record.original_text.to_lowercase().contains(needle)
        || record
            .enhanced_content
            .summary
            .to_lowercase()
            .contains(needle)
        || record
            .enhanced_content
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(needle))
}

fn to_summary(record: &InspirationRecord) -> SummaryRecord {
    SummaryRecord {
        id: record.id.clone(),
        original_text: truncate_with_ellipsis(&record.original_text, SUMMARY_TEXT_CHARS),
        summary: record.enhanced_content.summary.clone(),
        tags: record.enhanced_content.tags.clone(),
        category: record.enhanced_content.category.clone(),
        created_at: record.created_at,
    }
}

fn paginate(page: usize, limit: usize, total: usize) -> Pagination {
    Pagination {
        current_page: page,
        total_pages: total.div_ceil(limit),
        total_items: total,
        has_next: page.saturating_mul(limit) < total,
        has_prev: page > 1,
    }
}

/// Decoded byte length of a base64 payload, optionally prefixed with a
/// `data:<mime>;base64,` header.
fn decoded_audio_len(audio: &str) -> Result<usize, RecordError> {
    let payload = match audio.split_once(";base64,") {
        Some((header, rest)) if header.starts_with("data:") => rest,
        _ => audio,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map(|bytes| bytes.len())
        .map_err(|_| RecordError::validation("audioData must be valid base64"))
}

pub struct RecordStore {
    kv: Arc<dyn KvStore>,
    enricher: Arc<dyn Enricher>,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KvStore>, enricher: Arc<dyn Enricher>) -> Self {
        Self { kv, enricher }
    }

    pub fn backend_name(&self) -> &str {
        self.kv.backend_name()
    }

    pub fn enricher_name(&self) -> &str {
        self.enricher.name()
    }

    /// Validate, enrich, and persist a new record.
    ///
    /// `text` must be non-blank and at most [`MAX_TEXT_CHARS`] characters.
    /// Validation failures perform no writes.
    pub async fn create(
        &self,
        text: &str,
        audio_data: Option<&str>,
    ) -> Result<InspirationRecord, RecordError> {
        if text.trim().is_empty() {
            return Err(RecordError::validation(
                "transcribedText is required and must be a non-empty string",
            ));
        }
        if char_len(text) > MAX_TEXT_CHARS {
            return Err(RecordError::validation(format!(
                "transcribedText is too long (max {} characters)",
                MAX_TEXT_CHARS
            )));
        }
        let audio_bytes = audio_data
            .filter(|a| !a.is_empty())
            .map(decoded_audio_len)
            .transpose()?;

        let original_text = normalize_whitespace(text);
        let enhanced_content = self.enricher.enrich(&original_text).await;

        // Millisecond precision so the stored JSON round-trips exactly.
        let now = Utc::now().trunc_subsecs(3);

        let record = InspirationRecord {
            id: generate_id(),
            metadata: RecordMetadata {
                word_count: word_count(&original_text),
                language: if contains_cjk(&original_text) {
                    "zh-CN".to_string()
                } else {
                    "en".to_string()
                },
                sentiment: "neutral".to_string(),
                audio_bytes,
            },
            original_text,
            enhanced_content,
            created_at: now,
            updated_at: now,
        };

        self.kv
            .put(&record_key(&record.id), &serde_json::to_string(&record)?)
            .await?;

        let mut index = self.read_index().await?;
        index.insert(
            0,
            IndexEntry {
                id: record.id.clone(),
                created_at: record.created_at,
            },
        );
        index.truncate(INDEX_CAP);
        self.write_index(&index).await?;

        tracing::info!(id = %record.id, category = %record.enhanced_content.category, "created inspiration");
        Ok(record)
    }

    /// Fetch a full record by id.
    pub async fn get(&self, id: &str) -> Result<InspirationRecord, RecordError> {
        self.fetch(id)
            .await?
            .ok_or_else(|| RecordError::NotFound(id.to_string()))
    }

    /// One page of summary records plus pagination info.
    pub async fn list(&self, query: &ListQuery) -> Result<ListPage, RecordError> {
        let page = query.page();
        let limit = query.limit();
        let category = query.category_filter();
        let needle = query.search_needle();
        let index = self.read_index().await?;
        let start = (page - 1).saturating_mul(limit);

        if category.is_none() && needle.is_none() {
            let mut data = Vec::new();
            for entry in index.iter().skip(start).take(limit) {
                if let Some(record) = self.fetch_listed(&entry.id).await? {
                    data.push(to_summary(&record));
                }
            }
            return Ok(ListPage {
                data,
                pagination: paginate(page, limit, index.len()),
            });
        }

        let mut matched = Vec::new();
        for entry in &index {
            let Some(record) = self.fetch_listed(&entry.id).await? else {
                continue;
            };
            if category.is_some_and(|c| record.enhanced_content.category != c) {
                continue;
            }
            if needle
                .as_deref()
                .is_some_and(|n| !matches_search(&record, n))
            {
                continue;
            }
            matched.push(to_summary(&record));
        }

        let total = matched.len();
        let data = matched.into_iter().skip(start).take(limit).collect();
        Ok(ListPage {
            data,
            pagination: paginate(page, limit, total),
        })
    }

    /// Remove a record and its index entries.
    pub async fn delete(&self, id: &str) -> Result<(), RecordError> {
        let key = record_key(id);
        if self.kv.get(&key).await?.is_none() {
            return Err(RecordError::NotFound(id.to_string()));
        }
        self.kv.delete(&key).await?;

        let mut index = self.read_index().await?;
        let before = index.len();
        index.retain(|e| e.id != id);
        if index.len() != before {
            self.write_index(&index).await?;
        }

        tracing::info!(id = %id, "deleted inspiration");
        Ok(())
    }

    /// Rebuild the index from every `record:` key in the store.
    ///
    /// Repairs orphans and dangling entries left by partial writes. Returns
    /// the number of indexed records.
    pub async fn rebuild_index(&self) -> Result<usize, RecordError> {
        let keys = self.kv.list().await?;
        let mut entries = Vec::new();
        for key in keys.iter().filter(|k| k.starts_with(RECORD_KEY_PREFIX)) {
            let id = &key[RECORD_KEY_PREFIX.len()..];
            if let Some(record) = self.fetch_listed(id).await? {
                entries.push(IndexEntry {
                    id: record.id,
                    created_at: record.created_at,
                });
            }
        }
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        entries.truncate(INDEX_CAP);
        self.write_index(&entries).await?;
        tracing::info!(entries = entries.len(), "rebuilt inspiration index");
        Ok(entries.len())
    }

    /// Index size and per-category counts over indexed records.
    pub async fn stats(&self) -> Result<StoreStats, RecordError> {
        let index = self.read_index().await?;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for entry in &index {
            if let Some(record) = self.fetch_listed(&entry.id).await? {
                *counts.entry(record.enhanced_content.category).or_default() += 1;
            }
        }
        let mut categories: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();
        categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        Ok(StoreStats {
            total_items: index.len(),
            categories,
        })
    }

    async fn fetch(&self, id: &str) -> Result<Option<InspirationRecord>, RecordError> {
        match self.kv.get(&record_key(id)).await? {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    /// Like [`Self::fetch`], but an unreadable record is skipped with a
    /// warning instead of failing the whole listing.
    async fn fetch_listed(&self, id: &str) -> Result<Option<InspirationRecord>, RecordError> {
        match self.kv.get(&record_key(id)).await? {
            Some(blob) => match serde_json::from_str(&blob) {
                Ok(record) => Ok(Some(record)),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "skipping unreadable inspiration");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// The index, or an empty one if it is absent or unparsable.
    async fn read_index(&self) -> Result<Vec<IndexEntry>, RecordError> {
        let Some(blob) = self.kv.get(INDEX_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&blob) {
            Ok(index) => Ok(index),
            Err(e) => {
                tracing::warn!(error = %e, "inspiration index unreadable, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn write_index(&self, index: &[IndexEntry]) -> Result<(), RecordError> {
        self.kv
            .put(INDEX_KEY, &serde_json::to_string(index)?)
            .await?;
        Ok(())
    }
}
