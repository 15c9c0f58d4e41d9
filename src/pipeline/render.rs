//! Page rendering: one roster page → RGBA raster + positioned text.
//!
//! The rest of the pipeline only sees the [`PageRenderer`] trait, so tests
//! (and other document backends) can feed synthetic pages without pdfium.
//!
//! ## Why blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! Everything in this module is synchronous; [`crate::ingest`] runs it inside
//! `tokio::task::spawn_blocking` so Tokio worker threads never stall on a
//! CPU-heavy render.
//!
//! ## Coordinates
//!
//! PDF user space has its origin at the bottom-left. Template slots are
//! measured from the top-left, so fragment positions are flipped here once:
//! `y = page_height - top`.

use crate::error::IngestError;
use crate::output::DocumentMetadata;
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming a directory that contains libpdfium.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// A run of text and where it starts on the page, in points from the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

/// Everything the extraction stages need from one page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 0-based page index within the document.
    pub page_index: usize,
    /// Pixels per PDF point used for `raster`.
    pub scale: f64,
    pub raster: RgbaImage,
    /// Text runs in stream order.
    pub fragments: Vec<TextFragment>,
    pub width_pt: f64,
    pub height_pt: f64,
}

/// Source of rendered pages for the orchestrator.
pub trait PageRenderer {
    /// Number of pages in the open document.
    fn page_count(&self) -> usize;

    /// Render page `index` (0-based) at `scale` pixels per point.
    ///
    /// Failing here is fatal to the whole ingestion.
    fn render_page(&self, index: usize, scale: f64) -> Result<RenderedPage, IngestError>;
}

/// Bind to a pdfium library.
///
/// Lookup order: `$PDFIUM_LIB_PATH`, the current directory, then the system
/// library search path.
pub fn bind_pdfium() -> Result<Pdfium, IngestError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(dir) if !dir.is_empty() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| IngestError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// A PDF opened with pdfium.
pub struct PdfiumRenderer<'a> {
    path: PathBuf,
    document: PdfDocument<'a>,
}

impl<'a> PdfiumRenderer<'a> {
    /// Open `pdf_path`, mapping pdfium's load errors to [`IngestError`].
    pub fn open(
        pdfium: &'a Pdfium,
        pdf_path: &Path,
        password: Option<&'a str>,
    ) -> Result<Self, IngestError> {
        let document = pdfium
            .load_pdf_from_file(pdf_path, password)
            .map_err(|e| load_error(pdf_path, password, e))?;
        info!("Roster loaded: {} pages", document.pages().len());
        Ok(Self {
            path: pdf_path.to_path_buf(),
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Title, author and page geometry without rendering anything.
    pub fn metadata(&self) -> DocumentMetadata {
        let metadata = self.document.metadata();
        let pages = self.document.pages();

        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(tag).and_then(|t| {
                let v = t.value().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        let (page_width_pt, page_height_pt) = match pages.get(0) {
            Ok(first) => (
                Some(first.width().value as f64),
                Some(first.height().value as f64),
            ),
            Err(_) => (None, None),
        };

        DocumentMetadata {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
            page_count: pages.len() as usize,
            page_width_pt,
            page_height_pt,
            pdf_version: format!("{:?}", self.document.version()),
        }
    }
}

impl PageRenderer for PdfiumRenderer<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render_page(&self, index: usize, scale: f64) -> Result<RenderedPage, IngestError> {
        let page_num = index + 1;
        let render_failed = |e: PdfiumError| IngestError::RenderFailed {
            page: page_num,
            detail: format!("{:?}", e),
        };

        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(render_failed)?;

        let width_pt = page.width().value as f64;
        let height_pt = page.height().value as f64;

        let text = page.text().map_err(render_failed)?;
        let fragments: Vec<TextFragment> = text
            .segments()
            .iter()
            .map(|segment| {
                let bounds = segment.bounds();
                TextFragment::new(
                    segment.text(),
                    bounds.left().value as f64,
                    height_pt - bounds.top().value as f64,
                )
            })
            .collect();

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale as f32);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(render_failed)?;
        let raster = bitmap.as_image().to_rgba8();

        debug!(
            "Rendered page {} → {}x{} px, {} text fragments",
            page_num,
            raster.width(),
            raster.height(),
            fragments.len()
        );

        Ok(RenderedPage {
            page_index: index,
            scale,
            raster,
            fragments,
            width_pt,
            height_pt,
        })
    }
}

fn load_error(pdf_path: &Path, password: Option<&str>, e: PdfiumError) -> IngestError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            IngestError::WrongPassword {
                path: pdf_path.to_path_buf(),
            }
        } else {
            IngestError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        }
    } else {
        IngestError::Decode {
            path: pdf_path.to_path_buf(),
            detail: err_str,
        }
    }
}

/// Read document metadata on a blocking thread.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, IngestError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let renderer = PdfiumRenderer::open(&pdfium, &path, pwd.as_deref())?;
        Ok(renderer.metadata())
    })
    .await
    .map_err(|e| IngestError::Internal(format!("Metadata task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    // The password is borrowed from a value owned by the caller, the way the
    // CLI and `extract_resolved` pass `config.password.as_deref()`.
    #[test]
    fn open_borrows_caller_password() {
        let Ok(pdfium) = bind_pdfium() else {
            eprintln!("pdfium not available, skipping");
            return;
        };
        let password = String::from("secret");
        let missing = Path::new("/nonexistent/roster.pdf");
        let result = PdfiumRenderer::open(&pdfium, missing, Some(password.as_str()));
        assert!(result.is_err());
    }
}
