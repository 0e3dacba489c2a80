//! CLI entry points.
//!
//! Each `run_*` function opens the configured store, performs one
//! [`RecordStore`] operation, and prints the result to stdout. Errors that
//! map to a user mistake (unknown id, bad input) print a message and exit
//! with status 1; everything else propagates as `anyhow::Error`.

use anyhow::Result;

use crate::config::Config;
use crate::enrich::create_enricher;
use crate::error::RecordError;
use crate::kv::{open_store, SqliteKv};
use crate::models::InspirationRecord;
use crate::records::{ListQuery, RecordStore};

async fn open_records(config: &Config) -> Result<RecordStore> {
    let kv = open_store(&config.store).await?;
    let enricher = create_enricher(&config.enrichment)?;
    Ok(RecordStore::new(kv, enricher))
}

/// Exit on user-facing errors, propagate the rest.
fn exit_on_user_error<T>(result: Result<T, RecordError>) -> Result<T> {
    match result {
        Ok(v) => Ok(v),
        Err(e @ (RecordError::Validation(_) | RecordError::NotFound(_))) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        Err(RecordError::Unavailable(msg)) => {
            eprintln!("Error: {}", msg);
            std::process::exit(1);
        }
        Err(RecordError::Internal(e)) => Err(e),
    }
}

/// Create the store (SQLite file and schema). Idempotent.
pub async fn run_init(config: &Config) -> Result<()> {
    match config.store.backend.as_str() {
        "sqlite" => {
            let path = config
                .store
                .path
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("store.path required for sqlite backend"))?;
            let kv = SqliteKv::connect(path).await?;
            kv.close().await;
            println!("Store initialized at {}", path.display());
        }
        other => println!("Nothing to initialize for '{}' backend.", other),
    }
    Ok(())
}

pub async fn run_add(config: &Config, text: &str, audio: Option<&str>) -> Result<()> {
    let records = open_records(config).await?;
    let record = exit_on_user_error(records.create(text, audio).await)?;
    print_record(&record);
    Ok(())
}

pub async fn run_list(config: &Config, query: ListQuery) -> Result<()> {
    let records = open_records(config).await?;
    let page = exit_on_user_error(records.list(&query).await)?;

    if page.data.is_empty() {
        println!("No inspirations found.");
    }
    for (i, item) in page.data.iter().enumerate() {
        println!(
            "{}. [{}] {}",
            i + 1,
            item.category,
            item.created_at.format("%Y-%m-%d %H:%M")
        );
        println!("    id:      {}", item.id);
        println!("    summary: {}", item.summary);
        println!("    tags:    {}", item.tags.join(", "));
        println!();
    }
    let p = &page.pagination;
    println!(
        "page {}/{}, {} items",
        p.current_page, p.total_pages, p.total_items
    );
    Ok(())
}

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let records = open_records(config).await?;
    let record = exit_on_user_error(records.get(id).await)?;
    print_record(&record);
    Ok(())
}

pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let records = open_records(config).await?;
    exit_on_user_error(records.delete(id).await)?;
    println!("Deleted {}", id);
    Ok(())
}

/// Preview enrichment without storing anything.
pub async fn run_enrich(config: &Config, text: &str) -> Result<()> {
    let enricher = create_enricher(&config.enrichment)?;
    let content = enricher.enrich(text).await;
    println!("{}", serde_json::to_string_pretty(&content)?);
    Ok(())
}

pub async fn run_reindex(config: &Config) -> Result<()> {
    let records = open_records(config).await?;
    let count = exit_on_user_error(records.rebuild_index().await)?;
    println!("Index rebuilt: {} entries", count);
    Ok(())
}

pub async fn run_stats(config: &Config) -> Result<()> {
    let records = open_records(config).await?;
    let stats = exit_on_user_error(records.stats().await)?;
    println!("total items: {}", stats.total_items);
    for c in &stats.categories {
        println!("  {:<12} {}", c.category, c.count);
    }
    Ok(())
}

fn print_record(record: &InspirationRecord) {
    let c = &record.enhanced_content;
    println!("--- Inspiration ---");
    println!("id:         {}", record.id);
    println!("category:   {}", c.category);
    println!("tags:       {}", c.tags.join(", "));
    println!("language:   {}", record.metadata.language);
    println!("words:      {}", record.metadata.word_count);
    println!("created_at: {}", record.created_at.to_rfc3339());
    println!();
    println!("--- Text ---");
    println!("{}", record.original_text);
    println!();
    println!("--- Summary ---");
    println!("{}", c.summary);
    println!();
    println!("--- Details ---");
    println!("{}", c.details);
    println!();
    println!("--- Suggestions ({}) ---", c.suggestions.len());
    for s in &c.suggestions {
        println!("- {}", s);
    }
}
