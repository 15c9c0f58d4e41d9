//! Progress-callback trait for per-page ingestion events.
//!
//! Inject an [`Arc<dyn IngestProgressCallback>`] via
//! [`crate::config::IngestConfigBuilder::progress_callback`] to be told as the
//! pipeline walks the roster. The CLI drives its progress bar from these
//! events; a server could forward them to a websocket instead.
//!
//! # Example
//!
//! ```rust
//! use roster_deck::{IngestConfig, IngestProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     students: AtomicUsize,
//! }
//!
//! impl IngestProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, _page_num: usize, _total_pages: usize, cards: usize) {
//!         self.students.fetch_add(cards, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { students: AtomicUsize::new(0) });
//!
//! let config = IngestConfig::builder()
//!     .progress_callback(counter as Arc<dyn IngestProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the ingestion pipeline as it processes each page.
///
/// Extraction runs on a blocking worker thread, so implementations must be
/// `Send + Sync`. All methods default to no-ops.
pub trait IngestProgressCallback: Send + Sync {
    /// Called once before the first page is rendered.
    fn on_ingest_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is rendered (`page_num` is 1-indexed).
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after a page has been cropped and encoded.
    ///
    /// `cards` is the number of students recovered from the page; 0 for a
    /// page with no recognisable name labels.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, cards: usize) {
        let _ = (page_num, total_pages, cards);
    }

    /// Called when a page fails. The ingestion stops after this event.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every selected page was processed.
    fn on_ingest_complete(&self, total_pages: usize, total_cards: usize) {
        let _ = (total_pages, total_cards);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl IngestProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::IngestConfig`].
pub type ProgressCallback = Arc<dyn IngestProgressCallback>;
