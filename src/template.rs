//! Roster templates: where the student photos sit on a page.
//!
//! A roster page follows a fixed layout, so photo slots are not detected but
//! computed from a handful of measured constants. The constants live in a
//! [`RosterTemplate`] value rather than in code: a different roster format is
//! supported by loading a different template (they serialise to JSON), not by
//! editing the pipeline.
//!
//! All template geometry is in PDF points with a top-left origin. Slots are
//! stacked vertically with a uniform pitch, and slot `i` is assumed to belong
//! to the `i`-th name label found in the page's text stream.

use crate::error::IngestError;
use serde::{Deserialize, Serialize};

/// Largest page side a PDF may declare (200 in), in points.
pub const MAX_PAGE_PT: f64 = 14_400.0;

/// A rectangle in raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Whether any pixel of this rectangle falls inside a `width × height` raster.
    pub fn overlaps_raster(&self, width: u32, height: u32) -> bool {
        self.width > 0 && self.height > 0 && self.x < width && self.y < height
    }

    /// Overlaps the raster and is no larger than it in either dimension.
    pub fn fits_raster(&self, width: u32, height: u32) -> bool {
        self.overlaps_raster(width, height) && self.width <= width && self.height <= height
    }
}

/// Fixed photo-slot geometry for one roster layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterTemplate {
    /// Human-readable identifier, e.g. `"drake-v1"`.
    pub name: String,
    /// Bumped whenever the measurements for `name` change.
    pub version: u32,
    /// Left edge of every slot.
    pub origin_x: f64,
    /// Top edge of the first slot.
    pub origin_y: f64,
    pub slot_width: f64,
    pub slot_height: f64,
    /// Distance between the top edges of consecutive slots.
    pub pitch_y: f64,
    /// Number of photo slots per page.
    pub slots: usize,
}

impl Default for RosterTemplate {
    fn default() -> Self {
        Self::drake_v1()
    }
}

impl RosterTemplate {
    /// The four-students-per-page registrar roster.
    ///
    /// Averages of the measured photo boxes (x 23–25, widths 110–133,
    /// heights 146–148) with a 163 pt vertical pitch.
    pub fn drake_v1() -> Self {
        Self {
            name: "drake-v1".to_string(),
            version: 1,
            origin_x: 24.0,
            origin_y: 78.0,
            slot_width: 111.0,
            slot_height: 147.0,
            pitch_y: 163.0,
            slots: 4,
        }
    }

    /// Parse a template from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, IngestError> {
        let template: RosterTemplate =
            serde_json::from_str(json).map_err(|e| IngestError::InvalidTemplate {
                name: "<json>".to_string(),
                reason: e.to_string(),
            })?;
        template.validate()?;
        Ok(template)
    }

    /// Reject geometry that cannot describe a real page.
    pub fn validate(&self) -> Result<(), IngestError> {
        let fail = |reason: &str| {
            Err(IngestError::InvalidTemplate {
                name: self.name.clone(),
                reason: reason.to_string(),
            })
        };

        if self.name.trim().is_empty() {
            return fail("name must not be empty");
        }
        if self.slots == 0 {
            return fail("a template needs at least one slot");
        }
        let finite = [
            self.origin_x,
            self.origin_y,
            self.slot_width,
            self.slot_height,
            self.pitch_y,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return fail("geometry must be finite");
        }
        if self.origin_x < 0.0 || self.origin_y < 0.0 {
            return fail("origin must not be negative");
        }
        if self.slot_width <= 0.0 || self.slot_height <= 0.0 {
            return fail("slot size must be positive");
        }
        if self.pitch_y < 0.0 {
            return fail("pitch must not be negative");
        }
        let right = self.origin_x + self.slot_width;
        let bottom =
            self.origin_y + (self.slots - 1) as f64 * self.pitch_y + self.slot_height;
        if right > MAX_PAGE_PT || bottom > MAX_PAGE_PT {
            return fail("slots extend past the largest possible PDF page");
        }
        Ok(())
    }

    /// Pixel rectangle of slot `index` on a raster rendered at `scale`.
    ///
    /// Pure arithmetic with each component truncated to a whole pixel. No
    /// check against the raster size is made here; see
    /// [`crate::pipeline::assemble`].
    pub fn slot_rect(&self, index: usize, scale: f64) -> PixelRect {
        let top = self.origin_y + index as f64 * self.pitch_y;
        PixelRect {
            x: to_px(self.origin_x * scale),
            y: to_px(top * scale),
            width: to_px(self.slot_width * scale),
            height: to_px(self.slot_height * scale),
        }
    }

    /// All slot rectangles for one page, top to bottom.
    pub fn slot_rects(&self, scale: f64) -> Vec<PixelRect> {
        (0..self.slots).map(|i| self.slot_rect(i, scale)).collect()
    }
}

fn to_px(v: f64) -> u32 {
    // `as` saturates: negatives become 0, overflow becomes u32::MAX.
    v as u32
}
