//! # Inspiration List
//!
//! Record spoken ideas, enrich them with an AI model (or a local heuristic),
//! and keep them in a key-value store behind a small JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  HTTP / CLI  │──▶│ RecordStore  │──▶│   KvStore    │
//! │ server, insp │   │ CRUD + index │   │ SQLite / mem │
//! └──────────────┘   └──────┬───────┘   └──────────────┘
//!                           │
//!                           ▼
//!                    ┌──────────────┐
//!                    │   Enricher   │
//!                    │ Gemini / rule│
//!                    └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! insp init                                  # create the store
//! insp add "我想做一个语音记录的APP"           # enrich and store
//! insp list --search 灵感
//! insp serve                                 # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Record, index, and page types |
//! | [`error`] | Error taxonomy |
//! | [`kv`] | Key-value store trait and backends |
//! | [`records`] | Record CRUD, index maintenance, listing |
//! | [`enrich`] | AI enrichment and fallback heuristic |
//! | [`retry`] | Retry wrapper for outbound calls |
//! | [`validate`] | Declarative request validation |
//! | [`server`] | JSON HTTP API |
//! | [`commands`] | CLI entry points |

pub mod commands;
pub mod config;
pub mod enrich;
pub mod error;
pub mod kv;
pub mod models;
pub mod records;
pub mod retry;
pub mod server;
pub mod text;
pub mod validate;
