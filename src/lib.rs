//! # roster-deck
//!
//! Turn class-roster PDFs into photo flashcard decks.
//!
//! ## Why this crate?
//!
//! Course rosters exported by student information systems are PDFs with a
//! fixed layout: a column of student photos, each next to a
//! `Name: Last, First … Pronouns:` label. Learning a class of eighty faces
//! from that is tedious. This crate reads such a roster, cuts out each photo,
//! pairs it with its name and files the result as cards in a deck that a
//! practice front end can quiz from.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file, URL or bytes to a local PDF
//!  ├─ 2. Render    rasterise each page + read its text via pdfium (spawn_blocking)
//!  ├─ 3. Names     regex over the page text → ordered NameRecords
//!  ├─ 4. Template  fixed photo slots, scaled to raster pixels
//!  ├─ 5. Assemble  pair names with slots by index, crop on white, JPEG
//!  └─ 6. Merge     append to (or create) the target deck, once, at the end
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roster_deck::{ingest_roster, IngestConfig, JsonDeckStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = JsonDeckStore::open_default().await?;
//!     let config = IngestConfig::default();
//!     let outcome = ingest_roster("cs178.pdf", "CS178", "me", &store, &config).await?;
//!     println!("{} cards in '{}'", outcome.deck.cards.len(), outcome.deck.name);
//!     for warning in outcome.warnings() {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `roster-deck` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! roster-deck = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod ingest;
pub mod merge;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod store;
pub mod template;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{IngestConfig, IngestConfigBuilder, PageSelection};
pub use error::{IngestError, StoreError};
pub use ingest::{
    extract_document, extract_roster, ingest_roster, ingest_roster_bytes, ingest_with_renderer,
    inspect,
};
pub use merge::{merge_cards, DeckTarget, MergeOutcome};
pub use model::{
    Card, CardId, Deck, DeckId, DeckStats, ExtractedCard, NameRecord, UserId, MASTERY_THRESHOLD,
};
pub use output::{DocumentMetadata, Extraction, IngestOutcome, PageReport};
pub use pipeline::render::{PageRenderer, PdfiumRenderer, RenderedPage, TextFragment};
pub use progress::{IngestProgressCallback, NoopProgressCallback, ProgressCallback};
pub use store::{DeckStore, DeckUpdate, JsonDeckStore, MemoryDeckStore};
pub use template::{PixelRect, RosterTemplate};
