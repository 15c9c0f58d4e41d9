//! Roster ingestion entry points.
//!
//! Ingestion is two phases. [`extract_document`] walks every selected page
//! and returns an [`Extraction`] without touching any deck. Only once the
//! whole document has been walked does [`ingest_roster`] hand the cards to
//! [`merge_cards`], exactly once. A render failure on page 7 of 8 therefore
//! leaves the store as it was.

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::merge::{merge_cards, DeckTarget};
use crate::output::{DocumentMetadata, Extraction, IngestOutcome};
use crate::pipeline::assemble::{self, PageSlots};
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::names;
use crate::pipeline::render::{self, PageRenderer, PdfiumRenderer};
use crate::store::DeckStore;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Walk the selected pages of an open document and collect every card.
///
/// Pages are processed in document order. A page with no recognisable name
/// labels contributes nothing and processing continues; any renderer error
/// aborts the whole extraction.
pub fn extract_document<R>(renderer: &R, config: &IngestConfig) -> Result<Extraction, IngestError>
where
    R: PageRenderer + ?Sized,
{
    let start = Instant::now();
    let total_pages = renderer.page_count();

    // ── Step 1: Compute page indices ─────────────────────────────────────
    // An empty document simply has no students; only a selection that misses
    // every page of a non-empty document is an error.
    if total_pages == 0 {
        warn!("Roster has no pages, nothing to extract");
        if let Some(ref cb) = config.progress_callback {
            cb.on_ingest_start(0);
            cb.on_ingest_complete(0, 0);
        }
        return Ok(Extraction::default());
    }

    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(IngestError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }
    debug!(
        "Selected {} of {} pages for extraction",
        page_indices.len(),
        total_pages
    );

    let selected = page_indices.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_ingest_start(selected);
    }

    let mut extraction = Extraction {
        total_pages,
        ..Default::default()
    };

    for (pos, &index) in page_indices.iter().enumerate() {
        let page_num = index + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, selected);
        }

        // ── Step 2: Render ───────────────────────────────────────────────
        let page = match renderer.render_page(index, config.render_scale) {
            Ok(page) => page,
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, selected, &e.to_string());
                }
                return Err(e);
            }
        };

        // ── Step 3: Find name labels ─────────────────────────────────────
        let page_names = names::extract_names(&page.fragments);
        debug!("Page {}: {} name labels", page_num, page_names.len());

        // ── Step 4: Project slots and crop ───────────────────────────────
        let rects = config.template.slot_rects(page.scale);
        let (cards, report) = assemble::assemble_page(&PageSlots {
            page_index: index,
            raster: &page.raster,
            names: &page_names,
            rects: &rects,
            template_name: &config.template.name,
            jpeg_quality: config.jpeg_quality,
        })
        .inspect_err(|e| {
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_error(page_num, selected, &e.to_string());
            }
        })?;

        if report.names_found == 0 {
            warn!("Page {}: no student names recognised, skipping", page_num);
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, selected, cards.len());
        }
        debug!(
            "Page {} ({}/{}): {} cards",
            page_num,
            pos + 1,
            selected,
            cards.len()
        );

        extraction.cards.extend(cards);
        extraction.pages.push(report);
    }

    info!(
        "Extracted {} cards from {} pages in {}ms",
        extraction.cards.len(),
        selected,
        start.elapsed().as_millis()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_ingest_complete(selected, extraction.cards.len());
    }

    Ok(extraction)
}

/// Resolve `input` (path or URL) and extract every card with pdfium.
pub async fn extract_roster(
    input_str: impl AsRef<str>,
    config: &IngestConfig,
) -> Result<Extraction, IngestError> {
    let input_str = input_str.as_ref();
    info!("Extracting roster: {}", input_str);
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    extract_resolved(resolved, config).await
}

/// pdfium is not async-safe, so the document is opened and walked on one
/// blocking thread. `resolved` moves in with it and keeps any temp file alive.
async fn extract_resolved(
    resolved: ResolvedInput,
    config: &IngestConfig,
) -> Result<Extraction, IngestError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let pdfium = render::bind_pdfium()?;
        let renderer =
            PdfiumRenderer::open(&pdfium, resolved.path(), config.password.as_deref())?;
        extract_document(&renderer, &config)
    })
    .await
    .map_err(|e| IngestError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Ingest a roster PDF into a deck.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input` — Local file path or HTTP/HTTPS URL to a roster PDF
/// * `target` — Deck name (created if missing) or an existing deck id
/// * `user_id` — Owner of the target deck
/// * `store` — Where decks live
/// * `config` — Ingestion configuration
///
/// # Errors
/// Any error leaves the store untouched: cards are merged only after the
/// whole document has been extracted.
pub async fn ingest_roster(
    input_str: impl AsRef<str>,
    target: impl Into<DeckTarget>,
    user_id: &str,
    store: &dyn DeckStore,
    config: &IngestConfig,
) -> Result<IngestOutcome, IngestError> {
    let extraction = extract_roster(input_str, config).await?;
    finish(extraction, &target.into(), user_id, store).await
}

/// Same as [`ingest_roster`], for a roster already held in memory.
pub async fn ingest_roster_bytes(
    bytes: &[u8],
    target: impl Into<DeckTarget>,
    user_id: &str,
    store: &dyn DeckStore,
    config: &IngestConfig,
) -> Result<IngestOutcome, IngestError> {
    let resolved = input::resolve_bytes(bytes)?;
    let extraction = extract_resolved(resolved, config).await?;
    finish(extraction, &target.into(), user_id, store).await
}

/// Same as [`ingest_roster`], reading pages from a caller-supplied renderer.
///
/// Extraction runs on the calling task.
pub async fn ingest_with_renderer<R>(
    renderer: &R,
    target: impl Into<DeckTarget>,
    user_id: &str,
    store: &dyn DeckStore,
    config: &IngestConfig,
) -> Result<IngestOutcome, IngestError>
where
    R: PageRenderer + ?Sized,
{
    let extraction = extract_document(renderer, config)?;
    finish(extraction, &target.into(), user_id, store).await
}

async fn finish(
    extraction: Extraction,
    target: &DeckTarget,
    user_id: &str,
    store: &dyn DeckStore,
) -> Result<IngestOutcome, IngestError> {
    for warning in extraction.warnings() {
        warn!("{}", warning);
    }

    let total_pages = extraction.total_pages;
    let pages = extraction.pages.clone();
    let cards = extraction.into_cards();

    let merged = merge_cards(store, user_id, target, cards).await?;
    info!(
        "Ingestion complete: {} cards into {} ({})",
        merged.cards_added, target, merged.deck.id
    );

    Ok(IngestOutcome {
        deck: merged.deck,
        created: merged.created,
        cards_added: merged.cards_added,
        pages,
        total_pages,
    })
}

/// Read document metadata without rendering any page.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &IngestConfig,
) -> Result<DocumentMetadata, IngestError> {
    let resolved =
        input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    render::extract_metadata(resolved.path(), config.password.as_deref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageSelection;
    use crate::pipeline::render::{RenderedPage, TextFragment};
    use image::{Rgba, RgbaImage};

    struct Pages(Vec<Vec<&'static str>>);

    impl PageRenderer for Pages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn render_page(&self, index: usize, scale: f64) -> Result<RenderedPage, IngestError> {
            let fragments = self.0[index]
                .iter()
                .enumerate()
                .map(|(i, t)| TextFragment::new(*t, 0.0, i as f64 * 10.0))
                .collect();
            Ok(RenderedPage {
                page_index: index,
                scale,
                raster: RgbaImage::from_pixel(
                    (612.0 * scale) as u32,
                    (792.0 * scale) as u32,
                    Rgba([200, 200, 200, 255]),
                ),
                fragments,
                width_pt: 612.0,
                height_pt: 792.0,
            })
        }
    }

    #[test]
    fn empty_selection_is_out_of_range() {
        let config = IngestConfig::builder()
            .pages(PageSelection::Single(5))
            .build()
            .unwrap();
        let err = extract_document(&Pages(vec![vec![]]), &config).unwrap_err();
        assert!(matches!(err, IngestError::PageOutOfRange { total: 1, .. }));
    }

    #[test]
    fn empty_document_yields_no_cards() {
        for pages in [PageSelection::All, PageSelection::Single(1)] {
            let config = IngestConfig::builder().pages(pages).build().unwrap();
            let ex = extract_document(&Pages(vec![]), &config).unwrap();
            assert!(ex.cards.is_empty());
            assert!(ex.pages.is_empty());
            assert_eq!(ex.total_pages, 0);
        }
    }

    #[test]
    fn pages_without_names_still_report() {
        let renderer = Pages(vec![
            vec!["Name: Smith, Jane Pronouns: she/her"],
            vec!["Course roster, continued"],
        ]);
        let ex = extract_document(&renderer, &IngestConfig::default()).unwrap();
        assert_eq!(ex.cards.len(), 1);
        assert_eq!(ex.pages.len(), 2);
        assert_eq!(ex.pages[1].names_found, 0);
        assert_eq!(ex.total_pages, 2);
    }

    #[test]
    fn only_selected_pages_are_walked() {
        let renderer = Pages(vec![
            vec!["Name: A, One Pronouns"],
            vec!["Name: B, Two Pronouns"],
            vec!["Name: C, Three Pronouns"],
        ]);
        let config = IngestConfig::builder()
            .pages(PageSelection::Set(vec![3, 1]))
            .build()
            .unwrap();
        let ex = extract_document(&renderer, &config).unwrap();
        let names: Vec<_> = ex.cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["One A", "Three C"]);
        assert_eq!(ex.pages[1].page_num, 3);
    }
}
