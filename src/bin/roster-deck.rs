//! CLI binary for roster-deck.
//!
//! A thin shim over the library crate that maps CLI flags to `IngestConfig`,
//! opens the JSON deck store and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use roster_deck::store::json::default_store_file;
use roster_deck::{
    extract_roster, inspect, merge_cards, DeckId, DeckStore, DeckTarget, Extraction,
    IngestConfig, IngestProgressCallback, JsonDeckStore, PageSelection, ProgressCallback,
    RosterTemplate,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    students: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_ingest_start` tells us how many pages are selected.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening roster…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            students: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn elapsed(&self, page_num: usize) -> String {
        let ms = self
            .start_times
            .lock()
            .remove(&page_num)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        dim(&format!("{:.1}s", ms as f64 / 1000.0))
    }
}

impl IngestProgressCallback for CliProgressCallback {
    fn on_ingest_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {total_pages} roster pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.start_times.lock().insert(page_num, Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, cards: usize) {
        self.students.fetch_add(cards, Ordering::SeqCst);
        let mark = if cards == 0 { yellow("∅") } else { green("✓") };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<12}  {}",
            mark,
            page_num,
            total,
            dim(&format!("{cards} students")),
            self.elapsed(page_num),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            self.elapsed(page_num),
        ));
        self.bar.abandon();
    }

    fn on_ingest_complete(&self, total_pages: usize, total_cards: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} students found on {} pages",
            green("✔"),
            bold(&total_cards.to_string()),
            total_pages
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ingest a roster into a deck (created if it does not exist)
  roster-deck ingest cs178.pdf --deck CS178 --user me

  # Add a second section to an existing deck by id
  roster-deck ingest section2.pdf --deck-id 6f1c…e2 --user me

  # Look before you leap: extract only, save the photos for review
  roster-deck ingest cs178.pdf --deck CS178 --user me --dry-run --export-dir ./photos

  # A roster with a different layout
  roster-deck template > my-layout.json   # edit, then:
  roster-deck ingest roster.pdf --deck Bio101 --user me --template my-layout.json

  # PDF metadata, no rendering
  roster-deck inspect cs178.pdf

  # What is in the store
  roster-deck decks --user me

ENVIRONMENT VARIABLES:
  ROSTER_DECK_USER        Default --user
  ROSTER_DECK_STORE       Deck store file (default: platform data dir)
  PDFIUM_LIB_PATH         Directory containing libpdfium
  RUST_LOG                Overrides -v / -q log filtering
"#;

/// Turn class-roster PDFs into photo flashcard decks.
#[derive(Parser, Debug)]
#[command(
    name = "roster-deck",
    version,
    about = "Turn class-roster PDFs into photo flashcard decks",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "ROSTER_DECK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "ROSTER_DECK_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract students from a roster and add them to a deck.
    Ingest(IngestArgs),
    /// Print PDF metadata without rendering.
    Inspect(InspectArgs),
    /// List a user's decks.
    Decks(DecksArgs),
    /// Print the built-in roster template as JSON.
    Template,
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// Owner of the decks.
    #[arg(long, env = "ROSTER_DECK_USER")]
    user: String,

    /// Deck store file.
    #[arg(long, env = "ROSTER_DECK_STORE")]
    store: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Local roster PDF or HTTP/HTTPS URL.
    input: String,

    /// Target deck name; created if the user has no deck by that name.
    #[arg(long, env = "ROSTER_DECK_DECK", required_unless_present = "deck_id")]
    deck: Option<String>,

    /// Target an existing deck by id instead of by name.
    #[arg(long, env = "ROSTER_DECK_DECK_ID", conflicts_with = "deck")]
    deck_id: Option<DeckId>,

    #[command(flatten)]
    store: StoreArgs,

    /// Pixels per PDF point (0.5–8.0).
    #[arg(long, env = "ROSTER_DECK_SCALE", default_value_t = 2.0)]
    scale: f64,

    /// JPEG quality for cropped photos (1–100).
    #[arg(long, env = "ROSTER_DECK_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "ROSTER_DECK_PAGES", default_value = "all")]
    pages: String,

    /// JSON roster template to use instead of the built-in one.
    #[arg(long, env = "ROSTER_DECK_TEMPLATE")]
    template: Option<PathBuf>,

    /// PDF user password for encrypted rosters.
    #[arg(long, env = "ROSTER_DECK_PASSWORD")]
    password: Option<String>,

    /// Extract only; do not touch the deck store.
    #[arg(long)]
    dry_run: bool,

    /// Also write every cropped photo to this directory.
    #[arg(long, env = "ROSTER_DECK_EXPORT_DIR")]
    export_dir: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long, env = "ROSTER_DECK_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "ROSTER_DECK_NO_PROGRESS")]
    no_progress: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "ROSTER_DECK_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Local roster PDF or HTTP/HTTPS URL.
    input: String,

    /// PDF user password for encrypted rosters.
    #[arg(long, env = "ROSTER_DECK_PASSWORD")]
    password: Option<String>,

    /// Print the metadata as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct DecksArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Print the decks as JSON (cards included).
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs while it is shown.
    let show_progress = match &cli.command {
        Command::Ingest(a) => !cli.quiet && !a.no_progress && !a.json,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Ingest(ref args) => run_ingest(args, cli.quiet, show_progress).await,
        Command::Inspect(ref args) => run_inspect(args).await,
        Command::Decks(ref args) => run_decks(args).await,
        Command::Template => {
            let json = serde_json::to_string_pretty(&RosterTemplate::drake_v1())
                .context("Failed to serialise template")?;
            println!("{json}");
            Ok(())
        }
    }
}

async fn run_ingest(args: &IngestArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn IngestProgressCallback>)
    } else {
        None
    };
    let config = build_config(args, progress_cb).await?;

    let target = match (&args.deck_id, &args.deck) {
        (Some(id), _) => DeckTarget::Id(*id),
        (None, Some(name)) => DeckTarget::Name(name.clone()),
        (None, None) => anyhow::bail!("either --deck or --deck-id is required"),
    };

    // Open the store before the (slow) extraction so a bad path fails fast.
    let store = if args.dry_run {
        None
    } else {
        Some(open_store(&args.store).await?)
    };

    let extraction = extract_roster(&args.input, &config)
        .await
        .context("Ingestion failed")?;

    if let Some(ref dir) = args.export_dir {
        let written = export_photos(&extraction, dir).await?;
        if !quiet {
            eprintln!(
                "{} {} photos written to {}",
                cyan("◆"),
                written,
                bold(&dir.display().to_string())
            );
        }
    }

    let warnings = extraction.warnings();
    if !quiet {
        for warning in &warnings {
            eprintln!("{} {}", yellow("⚠"), warning);
        }
    }

    let Some(store) = store else {
        if args.json {
            let names: Vec<&str> = extraction.cards.iter().map(|c| c.name.as_str()).collect();
            let summary = serde_json::json!({
                "dry_run": true,
                "total_pages": extraction.total_pages,
                "students": names,
                "pages": extraction.pages,
                "warnings": warnings,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialise output")?
            );
        } else if !quiet {
            for card in &extraction.cards {
                println!("{}", card.name);
            }
            eprintln!(
                "{} dry run: {} students, nothing saved",
                dim("·"),
                extraction.cards.len()
            );
        }
        return Ok(());
    };

    let pages = extraction.pages.clone();
    let total_pages = extraction.total_pages;
    let merged = merge_cards(&store, &args.store.user, &target, extraction.into_cards())
        .await
        .with_context(|| format!("Failed to save cards to {target}"))?;

    if args.json {
        let summary = serde_json::json!({
            "deck_id": merged.deck.id,
            "deck_name": merged.deck.name,
            "created": merged.created,
            "cards_added": merged.cards_added,
            "total_cards": merged.deck.cards.len(),
            "total_pages": total_pages,
            "pages": pages,
            "warnings": warnings,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise output")?
        );
    } else if !quiet {
        eprintln!(
            "{}  {} students {} '{}'  ({} cards, id {})",
            if warnings.is_empty() {
                green("✔")
            } else {
                yellow("⚠")
            },
            bold(&merged.cards_added.to_string()),
            if merged.created {
                "added to new deck"
            } else {
                "added to"
            },
            bold(&merged.deck.name),
            merged.deck.cards.len(),
            dim(&merged.deck.id.to_string()),
        );
    }

    Ok(())
}

async fn run_inspect(args: &InspectArgs) -> Result<()> {
    let mut builder = IngestConfig::builder();
    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd.clone());
    }
    let config = builder.build().context("Invalid configuration")?;
    let meta = inspect(&args.input, &config)
        .await
        .context("Failed to inspect roster")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?
        );
        return Ok(());
    }

    println!("File:         {}", args.input);
    if let Some(ref t) = meta.title {
        println!("Title:        {}", t);
    }
    if let Some(ref a) = meta.author {
        println!("Author:       {}", a);
    }
    println!("Pages:        {}", meta.page_count);
    if let (Some(w), Some(h)) = (meta.page_width_pt, meta.page_height_pt) {
        println!("Page size:    {:.0} x {:.0} pt", w, h);
    }
    println!("PDF Version:  {}", meta.pdf_version);
    if let Some(ref p) = meta.producer {
        println!("Producer:     {}", p);
    }
    if let Some(ref c) = meta.creator {
        println!("Creator:      {}", c);
    }
    Ok(())
}

async fn run_decks(args: &DecksArgs) -> Result<()> {
    let store = open_store(&args.store).await?;
    let decks = store
        .list_decks(&args.store.user)
        .await
        .context("Failed to list decks")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&decks).context("Failed to serialise decks")?
        );
        return Ok(());
    }

    if decks.is_empty() {
        eprintln!("No decks for user '{}'", args.store.user);
        return Ok(());
    }
    for deck in &decks {
        let stats = deck.stats();
        println!(
            "{}  {:<24} {:>4} cards  {:>3}% mastered  {}",
            dim(&deck.id.to_string()),
            deck.name,
            stats.total_cards,
            stats.mastered_percent,
            dim(&deck.updated_at.format("%Y-%m-%d %H:%M").to_string()),
        );
    }
    Ok(())
}

async fn open_store(args: &StoreArgs) -> Result<JsonDeckStore> {
    let path = args.store.clone().unwrap_or_else(default_store_file);
    JsonDeckStore::open(&path)
        .await
        .with_context(|| format!("Failed to open deck store {}", path.display()))
}

/// Map CLI args to `IngestConfig`.
async fn build_config(args: &IngestArgs, progress: Option<ProgressCallback>) -> Result<IngestConfig> {
    let pages = parse_pages(&args.pages)?;

    let mut builder = IngestConfig::builder()
        .render_scale(args.scale)
        .jpeg_quality(args.quality)
        .pages(pages)
        .download_timeout_secs(args.download_timeout);

    if let Some(ref path) = args.template {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read template from {:?}", path))?;
        let template = RosterTemplate::from_json(&json)
            .with_context(|| format!("Invalid template {:?}", path))?;
        builder = builder.template(template);
    }
    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Write each extracted photo as `NNN-First-Last.jpg`.
async fn export_photos(extraction: &Extraction, dir: &Path) -> Result<usize> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    for (i, card) in extraction.cards.iter().enumerate() {
        let stem: String = card
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let path = dir.join(format!("{:03}-{}.jpg", i + 1, stem));
        tokio::fs::write(&path, &card.image)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(extraction.cards.len())
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}
