//! Name extraction from a page's positioned text fragments.
//!
//! Each student block on a roster carries a label of the form
//! `Name: Last, First Middle` followed by a `Pronouns:` label. Text
//! extraction splits those labels into arbitrary runs, so the fragments are
//! joined back into one blob (space-separated, in stream order) and scanned
//! with a single pattern.
//!
//! The label order in the text stream follows the page top to bottom, which
//! is what lets the assembler pair the `i`-th name with the `i`-th photo slot.

use crate::model::NameRecord;
use crate::pipeline::render::TextFragment;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

// `regex` has no look-ahead, so the `Pronouns` terminator is consumed. It can
// never be part of the next `Name:` label, so matches stay non-overlapping.
static NAME_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Name:\s*([A-Za-z'\-]+),\s*([A-Za-z\s]+?)\s+Pronouns").expect("valid regex")
});

/// Join fragment texts in stream order, one space between fragments.
pub fn join_fragments(fragments: &[TextFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// All student names on a page, in text-stream order.
///
/// An empty result is a valid outcome (a cover page, or a page that does not
/// follow the template); it is not an error.
pub fn extract_names(fragments: &[TextFragment]) -> Vec<NameRecord> {
    let blob = join_fragments(fragments);
    let names = extract_names_from_text(&blob);
    debug!("Found {} name labels in {} fragments", names.len(), fragments.len());
    names
}

/// Scan an already-joined text blob for name labels.
pub fn extract_names_from_text(text: &str) -> Vec<NameRecord> {
    NAME_LABEL
        .captures_iter(text)
        .map(|caps| NameRecord::new(caps[2].trim(), caps[1].trim()))
        .collect()
}
