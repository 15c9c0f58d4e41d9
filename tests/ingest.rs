//! Orchestrator tests driven by an in-memory page renderer.
//!
//! No pdfium here: [`FakeRoster`] hands out synthetic pages whose photo slots
//! are painted in known colours, so crops can be checked pixel by pixel.

use base64::Engine as _;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use roster_deck::{
    extract_document, ingest_with_renderer, DeckStore, DeckTarget, IngestConfig, IngestError,
    IngestProgressCallback, JsonDeckStore, MemoryDeckStore, PageRenderer, PageSelection,
    RenderedPage, RosterTemplate, TextFragment,
};
use std::sync::Arc;

const PAGE_W: f64 = 612.0;
const PAGE_H: f64 = 792.0;

const SLOT_COLOURS: [[u8; 3]; 4] = [[220, 30, 30], [30, 180, 30], [30, 30, 220], [230, 200, 20]];

// ── Fake renderer ────────────────────────────────────────────────────────────

struct FakePage {
    lines: Vec<String>,
}

struct FakeRoster {
    pages: Vec<FakePage>,
    /// Page index whose render fails, if any.
    fail_on: Option<usize>,
}

impl FakeRoster {
    fn new(pages: Vec<Vec<String>>) -> Self {
        Self {
            pages: pages.into_iter().map(|lines| FakePage { lines }).collect(),
            fail_on: None,
        }
    }

    fn failing_on(mut self, index: usize) -> Self {
        self.fail_on = Some(index);
        self
    }
}

impl PageRenderer for FakeRoster {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render_page(&self, index: usize, scale: f64) -> Result<RenderedPage, IngestError> {
        if self.fail_on == Some(index) {
            return Err(IngestError::RenderFailed {
                page: index + 1,
                detail: "synthetic failure".into(),
            });
        }

        let template = RosterTemplate::drake_v1();
        let mut raster = RgbaImage::from_pixel(
            (PAGE_W * scale) as u32,
            (PAGE_H * scale) as u32,
            Rgba([255, 255, 255, 255]),
        );
        for (slot, rect) in template.slot_rects(scale).iter().enumerate() {
            let [r, g, b] = SLOT_COLOURS[slot];
            for y in rect.y..rect.bottom().min(raster.height()) {
                for x in rect.x..rect.right().min(raster.width()) {
                    raster.put_pixel(x, y, Rgba([r, g, b, 255]));
                }
            }
        }

        let fragments = self.pages[index]
            .lines
            .iter()
            .enumerate()
            .map(|(i, t)| TextFragment::new(t.clone(), 160.0, 90.0 + i as f64 * 40.0))
            .collect();

        Ok(RenderedPage {
            page_index: index,
            scale,
            raster,
            fragments,
            width_pt: PAGE_W,
            height_pt: PAGE_H,
        })
    }
}

fn label(last: &str, first: &str) -> String {
    format!("Name: {last}, {first} Pronouns: they/them")
}

const FIRST: [&str; 6] = ["Ada", "Ben", "Cy", "Dee", "Eve", "Finn"];

/// `n` labels with surname `<tag>last`.
fn page_of(n: usize, tag: &str) -> Vec<String> {
    FIRST[..n]
        .iter()
        .map(|first| label(&format!("{tag}last"), first))
        .collect()
}

fn assert_colour(actual: [u8; 3], expected: [u8; 3], what: &str) {
    for c in 0..3 {
        let diff = (actual[c] as i32 - expected[c] as i32).abs();
        assert!(diff < 30, "{what}: got {actual:?}, want {expected:?}");
    }
}

// ── Extraction ───────────────────────────────────────────────────────────────

#[test]
fn two_students_on_one_page() {
    let renderer = FakeRoster::new(vec![vec![
        "Name: Smith, Jane Pronouns: she/her".to_string(),
        "Name: Doe, John Pronouns: he/him".to_string(),
    ]]);
    let ex = extract_document(&renderer, &IngestConfig::default()).unwrap();

    let names: Vec<_> = ex.cards.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Jane Smith", "John Doe"]);

    for (slot, card) in ex.cards.iter().enumerate() {
        let img = image::load_from_memory(&card.image).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (222, 294));
        assert_colour(
            img.get_pixel(111, 147).0,
            SLOT_COLOURS[slot],
            &format!("slot {slot} centre"),
        );
    }

    assert_eq!(ex.pages.len(), 1);
    assert_eq!(ex.pages[0].slots_filled, 2);
    assert_eq!(
        ex.warnings(),
        vec!["2 of 4 expected students recovered on page 1".to_string()]
    );
}

#[test]
fn overfull_page_keeps_first_four() {
    let renderer = FakeRoster::new(vec![page_of(6, "A")]);
    let ex = extract_document(&renderer, &IngestConfig::default()).unwrap();

    assert_eq!(ex.cards.len(), 4);
    assert_eq!(ex.cards[3].name, "Dee Alast");
    assert_eq!(
        ex.pages[0].dropped_names,
        vec!["Eve Alast", "Finn Alast"]
    );
}

#[test]
fn page_without_labels_contributes_nothing() {
    let renderer = FakeRoster::new(vec![
        page_of(4, "A"),
        vec!["Class roster, Fall term".into(), "Instructor: Staff".into()],
        page_of(1, "C"),
    ]);
    let ex = extract_document(&renderer, &IngestConfig::default()).unwrap();

    assert_eq!(ex.cards.len(), 5);
    assert_eq!(ex.pages[1].names_found, 0);
    assert!(ex.warnings().iter().any(|w| w.contains("page 2")));
}

#[test]
fn cards_follow_document_then_slot_order() {
    let renderer = FakeRoster::new(vec![page_of(4, "A"), page_of(4, "B"), page_of(2, "C")]);
    let ex = extract_document(&renderer, &IngestConfig::default()).unwrap();

    let names: Vec<_> = ex.cards.iter().map(|c| c.name.clone()).collect();
    let mut expected = Vec::new();
    for (tag, n) in [("A", 4), ("B", 4), ("C", 2)] {
        for i in 0..n {
            expected.push(format!("{} {tag}last", FIRST[i]));
        }
    }
    assert_eq!(names, expected);
}

#[test]
fn crops_scale_with_render_scale() {
    let renderer = FakeRoster::new(vec![page_of(1, "A")]);
    let config = IngestConfig::builder().render_scale(1.0).build().unwrap();
    let ex = extract_document(&renderer, &config).unwrap();

    let img = image::load_from_memory(&ex.cards[0].image).unwrap();
    assert_eq!((img.width(), img.height()), (111, 147));
}

#[test]
fn slots_beyond_a_short_raster_are_fatal() {
    struct Stub;
    impl PageRenderer for Stub {
        fn page_count(&self) -> usize {
            1
        }
        fn render_page(&self, index: usize, scale: f64) -> Result<RenderedPage, IngestError> {
            Ok(RenderedPage {
                page_index: index,
                scale,
                raster: RgbaImage::from_pixel(400, 300, Rgba([0, 0, 0, 255])),
                fragments: vec![TextFragment::new(
                    format!("{} {}", label("A", "One"), label("B", "Two")),
                    0.0,
                    0.0,
                )],
                width_pt: PAGE_W,
                height_pt: PAGE_H,
            })
        }
    }

    let err = extract_document(&Stub, &IngestConfig::default()).unwrap_err();
    assert!(
        matches!(err, IngestError::SlotOutOfRange { page: 1, slot: 1, .. }),
        "got {err:?}"
    );
}

// ── Ingestion ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_creates_deck_with_fresh_cards() {
    let store = MemoryDeckStore::new();
    let renderer = FakeRoster::new(vec![page_of(4, "A"), page_of(3, "B")]);

    let outcome = ingest_with_renderer(&renderer, "CS178", "u1", &store, &IngestConfig::default())
        .await
        .unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.cards_added, 7);
    assert_eq!(outcome.total_pages, 2);
    assert_eq!(outcome.deck.cards.len(), 7);
    assert_eq!(
        outcome.warnings(),
        vec!["3 of 4 expected students recovered on page 2".to_string()]
    );

    for card in &outcome.deck.cards {
        assert_eq!(card.progress, 0);
        let b64 = card
            .image
            .strip_prefix("data:image/jpeg;base64,")
            .expect("jpeg data url");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .unwrap();
        assert!(image::load_from_memory(&bytes).is_ok());
    }
}

#[tokio::test]
async fn ingesting_twice_duplicates_students() {
    let store = MemoryDeckStore::new();
    let existing = store
        .create_deck("u1", "CS178", vec![roster_deck::Card::new("Old Timer", "data:x")])
        .await
        .unwrap();
    let renderer = FakeRoster::new(vec![page_of(2, "A")]);
    let config = IngestConfig::default();

    ingest_with_renderer(&renderer, "CS178", "u1", &store, &config)
        .await
        .unwrap();
    let second = ingest_with_renderer(&renderer, "CS178", "u1", &store, &config)
        .await
        .unwrap();

    assert!(!second.created);
    assert_eq!(second.deck.id, existing.id);
    let names: Vec<_> = second.deck.cards.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Old Timer",
            "Ada Alast",
            "Ben Alast",
            "Ada Alast",
            "Ben Alast",
        ]
    );
    assert_eq!(store.list_decks("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn ingest_by_deck_id() {
    let store = MemoryDeckStore::new();
    let deck = store.create_deck("u1", "Section 2", vec![]).await.unwrap();
    let renderer = FakeRoster::new(vec![page_of(1, "A")]);

    let outcome = ingest_with_renderer(
        &renderer,
        DeckTarget::Id(deck.id),
        "u1",
        &store,
        &IngestConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(outcome.deck.id, deck.id);
    assert_eq!(outcome.deck.cards.len(), 1);

    // Someone else's deck id is as good as a missing one.
    let err = ingest_with_renderer(
        &renderer,
        DeckTarget::Id(deck.id),
        "u2",
        &store,
        &IngestConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, IngestError::Store(_)), "got {err:?}");
}

#[tokio::test]
async fn render_failure_leaves_existing_deck_untouched() {
    let store = MemoryDeckStore::new();
    let before = store
        .create_deck("u1", "CS178", vec![roster_deck::Card::new("Keep Me", "data:x")])
        .await
        .unwrap();
    let renderer = FakeRoster::new(vec![page_of(4, "A"), page_of(4, "B"), page_of(4, "C")])
        .failing_on(1);

    let err = ingest_with_renderer(&renderer, "CS178", "u1", &store, &IngestConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::RenderFailed { page: 2, .. }));

    let after = store.get_deck("u1", before.id).await.unwrap();
    assert_eq!(after.cards.len(), 1);
    assert_eq!(after.updated_at, before.updated_at);
}

#[tokio::test]
async fn render_failure_never_creates_the_deck() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("decks.json");
    let store = JsonDeckStore::open(&path).await.unwrap();
    let on_disk = std::fs::read_to_string(&path).unwrap();

    let renderer = FakeRoster::new(vec![page_of(4, "A"), page_of(4, "B")]).failing_on(1);
    let result =
        ingest_with_renderer(&renderer, "New Deck", "u1", &store, &IngestConfig::default()).await;
    assert!(result.is_err());

    assert!(store.find_deck_by_name("u1", "New Deck").await.unwrap().is_none());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), on_disk);
}

#[tokio::test]
async fn page_selection_limits_ingestion() {
    let store = MemoryDeckStore::new();
    let renderer = FakeRoster::new(vec![page_of(4, "A"), page_of(4, "B"), page_of(4, "C")])
        .failing_on(0);
    let config = IngestConfig::builder()
        .pages(PageSelection::Range(2, 3))
        .build()
        .unwrap();

    let outcome = ingest_with_renderer(&renderer, "CS178", "u1", &store, &config)
        .await
        .unwrap();
    assert_eq!(outcome.cards_added, 8);
    assert_eq!(outcome.pages[0].page_num, 2);
}

#[tokio::test]
async fn empty_document_ingests_no_students() {
    let store = MemoryDeckStore::new();
    let recorder = Arc::new(Recorder::default());
    let config = IngestConfig::builder()
        .pages(PageSelection::Single(1))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let outcome = ingest_with_renderer(&FakeRoster::new(vec![]), "CS178", "u1", &store, &config)
        .await
        .unwrap();
    assert_eq!(outcome.total_pages, 0);
    assert_eq!(outcome.cards_added, 0);
    assert!(outcome.pages.is_empty());
    assert!(outcome.deck.cards.is_empty());
    assert_eq!(*recorder.events.lock(), vec!["start 0", "done 0/0"]);
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl IngestProgressCallback for Recorder {
    fn on_ingest_start(&self, total_pages: usize) {
        self.events.lock().push(format!("start {total_pages}"));
    }
    fn on_page_complete(&self, page_num: usize, _total: usize, cards: usize) {
        self.events.lock().push(format!("page {page_num}: {cards}"));
    }
    fn on_page_error(&self, page_num: usize, _total: usize, _error: &str) {
        self.events.lock().push(format!("error {page_num}"));
    }
    fn on_ingest_complete(&self, total_pages: usize, total_cards: usize) {
        self.events
            .lock()
            .push(format!("done {total_pages}/{total_cards}"));
    }
}

#[test]
fn progress_events_in_order() {
    let recorder = Arc::new(Recorder::default());
    let config = IngestConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let renderer = FakeRoster::new(vec![page_of(4, "A"), vec![], page_of(1, "C")]);
    extract_document(&renderer, &config).unwrap();
    assert_eq!(
        *recorder.events.lock(),
        vec!["start 3", "page 1: 4", "page 2: 0", "page 3: 1", "done 3/5"]
    );

    let recorder = Arc::new(Recorder::default());
    let config = IngestConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let failing = FakeRoster::new(vec![page_of(4, "A"), page_of(4, "B")]).failing_on(1);
    assert!(extract_document(&failing, &config).is_err());
    assert_eq!(
        *recorder.events.lock(),
        vec!["start 2", "page 1: 4", "error 2"]
    );
}
