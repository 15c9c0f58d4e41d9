//! Configuration types for roster ingestion.
//!
//! All ingestion behaviour is controlled through [`IngestConfig`], built via
//! its [`IngestConfigBuilder`]. The roster layout itself is part of the
//! config (see [`RosterTemplate`]), so a different roster format is a
//! different config value rather than a code change.

use crate::error::IngestError;
use crate::progress::IngestProgressCallback;
use crate::template::RosterTemplate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const MIN_RENDER_SCALE: f64 = 0.5;
pub const MAX_RENDER_SCALE: f64 = 8.0;

/// Configuration for a roster ingestion.
///
/// Built via [`IngestConfig::builder()`] or using [`IngestConfig::default()`].
///
/// # Example
/// ```rust
/// use roster_deck::IngestConfig;
///
/// let config = IngestConfig::builder()
///     .render_scale(3.0)
///     .jpeg_quality(85)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct IngestConfig {
    /// Pixels per PDF point when rasterising a page. Range: 0.5–8.0. Default: 2.0.
    ///
    /// At 2.0 a 111×147 pt photo slot becomes a 222×294 px portrait, which is
    /// plenty for a flashcard. Raise it for small-print rosters.
    pub render_scale: f64,

    /// JPEG quality for cropped photos, 1–100. Default: 90.
    pub jpeg_quality: u8,

    /// Photo-slot geometry. Default: [`RosterTemplate::drake_v1`].
    pub template: RosterTemplate,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted rosters.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress events.
    pub progress_callback: Option<Arc<dyn IngestProgressCallback>>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            render_scale: 2.0,
            jpeg_quality: 90,
            template: RosterTemplate::default(),
            pages: PageSelection::default(),
            password: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestConfig")
            .field("render_scale", &self.render_scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("template", &self.template.name)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn IngestProgressCallback>"),
            )
            .finish()
    }
}

impl IngestConfig {
    /// Create a new builder for `IngestConfig`.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn render_scale(mut self, scale: f64) -> Self {
        self.config.render_scale = scale;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn template(mut self, template: RosterTemplate) -> Self {
        self.config.template = template;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn IngestProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<IngestConfig, IngestError> {
        let c = &self.config;
        if !c.render_scale.is_finite()
            || c.render_scale < MIN_RENDER_SCALE
            || c.render_scale > MAX_RENDER_SCALE
        {
            return Err(IngestError::InvalidConfig(format!(
                "render scale must be {MIN_RENDER_SCALE}–{MAX_RENDER_SCALE}, got {}",
                c.render_scale
            )));
        }
        c.template.validate()?;
        Ok(self.config)
    }
}

/// Specifies which pages of the roster to ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
