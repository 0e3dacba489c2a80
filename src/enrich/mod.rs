//! Content enrichment: summary, details, suggestions, tags, and category.
//!
//! Defines the [`Enricher`] trait and two implementations:
//! - **[`FallbackEnricher`]** : local keyword heuristic, always available.
//! - **[`GeminiEnricher`]** : calls an external text-generation endpoint and
//!   falls back to the heuristic on any failure.
//!
//! `enrich` is infallible by contract: upstream failures are logged and
//! replaced with [`fallback_analysis`] output, never returned.
//!
//! # Provider Selection
//!
//! ```rust,no_run
//! # use inspiration_list::config::EnrichmentConfig;
//! # use inspiration_list::enrich::create_enricher;
//! let config = EnrichmentConfig::default(); // provider = "disabled"
//! let enricher = create_enricher(&config).unwrap();
//! assert_eq!(enricher.name(), "fallback");
//! ```

pub mod fallback;
pub mod gemini;

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::config::EnrichmentConfig;
use crate::models::EnhancedContent;
use crate::text::truncate_with_ellipsis;

pub use fallback::{fallback_analysis, DEFAULT_CATEGORY};
pub use gemini::GeminiEnricher;

pub const MAX_SUGGESTIONS: usize = 5;
pub const MAX_TAGS: usize = 6;

const DEFAULT_SUMMARY_CHARS: usize = 50;
const DEFAULT_DETAILS: &str = "这个想法具有潜在价值，值得进一步探索和发展。";
const DEFAULT_SUGGESTIONS: [&str; 3] = ["深入思考这个想法", "收集相关信息", "制定实施计划"];
const DEFAULT_TAGS: [&str; 2] = ["灵感", "想法"];

#[async_trait]
pub trait Enricher: Send + Sync {
    /// Implementation label (e.g. `"gemini"`, `"fallback"`).
    fn name(&self) -> &str;

    /// Enrich `text`. Never fails.
    async fn enrich(&self, text: &str) -> EnhancedContent;
}

/// Enricher that only runs the local heuristic.
pub struct FallbackEnricher;

#[async_trait]
impl Enricher for FallbackEnricher {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn enrich(&self, text: &str) -> EnhancedContent {
        fallback_analysis(text)
    }
}

/// Build the enricher named by `config.provider`.
///
/// For `gemini`, the credential is read from the environment variable named
/// in `config.api_key_env`. A missing credential is not an error here; the
/// enricher then serves fallback content for every call.
pub fn create_enricher(config: &EnrichmentConfig) -> Result<Arc<dyn Enricher>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(FallbackEnricher)),
        "gemini" => {
            let api_key = std::env::var(&config.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty());
            if api_key.is_none() {
                tracing::warn!(
                    env = %config.api_key_env,
                    "enrichment credential not set, fallback analysis will be used"
                );
            }
            Ok(Arc::new(GeminiEnricher::new(config, api_key)?))
        }
        other => bail!("Unknown enrichment provider: {}", other),
    }
}

/// Coerce a parsed model reply into a complete [`EnhancedContent`].
///
/// Missing, empty, or wrongly-typed fields take defaults; non-string array
/// elements are dropped; arrays are capped at [`MAX_SUGGESTIONS`] and
/// [`MAX_TAGS`].
pub fn normalize_content(value: &Value, original_text: &str) -> EnhancedContent {
    let summary = non_empty_str(value, "summary")
        .unwrap_or_else(|| truncate_with_ellipsis(original_text, DEFAULT_SUMMARY_CHARS));
    let details = non_empty_str(value, "details").unwrap_or_else(|| DEFAULT_DETAILS.to_string());
    let category =
        non_empty_str(value, "category").unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let mut suggestions =
        string_array(value, "suggestions").unwrap_or_else(|| to_strings(&DEFAULT_SUGGESTIONS));
    suggestions.truncate(MAX_SUGGESTIONS);

    let mut tags = string_array(value, "tags").unwrap_or_else(|| to_strings(&DEFAULT_TAGS));
    tags.truncate(MAX_TAGS);

    EnhancedContent {
        summary,
        details,
        suggestions,
        tags,
        category,
    }
}

fn non_empty_str(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn string_array(value: &Value, field: &str) -> Option<Vec<String>> {
    value.get(field).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
