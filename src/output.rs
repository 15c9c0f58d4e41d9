//! Result types returned by extraction and ingestion.

use crate::model::{Card, Deck, ExtractedCard};
use serde::{Deserialize, Serialize};

/// Document-level PDF metadata, as reported by [`crate::inspect`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub page_count: usize,
    /// Size of the first page in points.
    pub page_width_pt: Option<f64>,
    pub page_height_pt: Option<f64>,
    pub pdf_version: String,
}

/// What one page contributed.
///
/// `names_found` and `slots_filled` differ when a page had more name labels
/// than the template has slots; the surplus names are in `dropped_names`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-indexed page number.
    pub page_num: usize,
    pub names_found: usize,
    pub slots_filled: usize,
    pub slot_capacity: usize,
    pub dropped_names: Vec<String>,
}

impl PageReport {
    /// Human-readable warning for a page that did not yield a full set of students.
    pub fn warning(&self) -> Option<String> {
        if self.names_found == 0 {
            Some(format!("no students recognised on page {}", self.page_num))
        } else if !self.dropped_names.is_empty() {
            Some(format!(
                "page {} lists {} students but the template has {} photo slots; skipped: {}",
                self.page_num,
                self.names_found,
                self.slot_capacity,
                self.dropped_names.join(", ")
            ))
        } else if self.slots_filled < self.slot_capacity {
            Some(format!(
                "{} of {} expected students recovered on page {}",
                self.slots_filled, self.slot_capacity, self.page_num
            ))
        } else {
            None
        }
    }
}

/// All cards recovered from a roster, before anything is persisted.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Document order, then slot order within each page.
    pub cards: Vec<ExtractedCard>,
    pub pages: Vec<PageReport>,
    /// Pages in the document, including unselected ones.
    pub total_pages: usize,
}

impl Extraction {
    /// Fresh [`Card`]s (progress 0) in extraction order.
    pub fn into_cards(self) -> Vec<Card> {
        self.cards.into_iter().map(Card::from_extracted).collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.pages.iter().filter_map(PageReport::warning).collect()
    }
}

/// Result of a completed ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// The deck after the merge.
    pub deck: Deck,
    /// Whether the merge created `deck`.
    pub created: bool,
    pub cards_added: usize,
    pub pages: Vec<PageReport>,
    pub total_pages: usize,
}

impl IngestOutcome {
    pub fn warnings(&self) -> Vec<String> {
        self.pages.iter().filter_map(PageReport::warning).collect()
    }
}
