//! Error types for the roster-deck library.
//!
//! Two error types reflect the two places an ingestion can go wrong:
//!
//! * [`IngestError`] — **Fatal**: the roster cannot be processed at all
//!   (bad input file, corrupt PDF, a page pdfium refuses to render). Returned
//!   as `Err(IngestError)` from the top-level `ingest*` / `extract*`
//!   functions, and always before anything has been written to a deck.
//!
//! * [`StoreError`] — a deck store operation failed (unknown deck, invalid
//!   card data, I/O on the backing file).
//!
//! Pages that merely yield fewer students than the template has slots are
//! not errors at all; they show up as [`crate::output::PageReport`] entries.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Roster file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// The document cannot be opened or parsed.
    #[error("Could not process roster '{path}': {detail}")]
    Decode { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("Roster '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for roster '{path}'")]
    WrongPassword { path: PathBuf },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// The renderer failed on a specific page.
    #[error("Rendering failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// A template slot misses the rendered raster or is larger than it.
    #[error(
        "Photo slot {slot} on page {page} does not fit the {raster_width}x{raster_height} px raster\n\
         The roster does not match template '{template}' or the render scale is wrong."
    )]
    SlotOutOfRange {
        page: usize,
        slot: usize,
        raster_width: u32,
        raster_height: u32,
        template: String,
    },

    /// JPEG encoding of a cropped photo failed.
    #[error("Failed to encode photo {slot} on page {page}: {detail}")]
    EncodeFailed {
        page: usize,
        slot: usize,
        detail: String,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A roster template has impossible geometry.
    #[error("Invalid roster template '{name}': {reason}")]
    InvalidTemplate { name: String, reason: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it system-wide, or set\n\
PDFIUM_LIB_PATH to the directory that contains it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Persistence ───────────────────────────────────────────────────────
    /// The deck store rejected the merge.
    #[error("Failed to save cards: {0}")]
    Store(#[from] StoreError),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by a [`crate::store::DeckStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    Invalid(&'static str),
    #[error("storage error: {0}")]
    Storage(String),
}
