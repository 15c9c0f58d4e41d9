//! Pipeline stages for roster ingestion.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on synthetic input and the rendering backend can be swapped
//! without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ names ─────┐
//! (URL/path) (pdfium)              ├──▶ assemble ──▶ encode
//!              └────▶ template ───┘    (crop)       (JPEG)
//! ```
//!
//! 1. [`input`]    — canonicalise the path, URL or bytes to a local PDF
//! 2. [`render`]   — rasterise a page and pull its positioned text runs
//! 3. [`names`]    — find `Name: Last, First … Pronouns` labels
//! 4. [`crate::template`] — project the fixed photo slots to pixels
//! 5. [`assemble`] — pair names with slots by index and crop the photos
//! 6. [`encode`]   — JPEG-encode crops and wrap them as `data:` URLs

pub mod assemble;
pub mod encode;
pub mod input;
pub mod names;
pub mod render;
