//! Card assembly: pair names with photo slots and cut the photos out.
//!
//! Pairing is strictly by index: the `i`-th name goes with slot `i`. This is
//! an assumption of the supported templates (labels appear in the text
//! stream top to bottom), not a spatial match.
//!
//! `n = min(names, slots)` cards are produced. Surplus names on an over-full
//! page produce nothing and are returned in the [`PageReport`] so the caller
//! can surface them; surplus slots simply stay unused.
//!
//! A slot may hang over the raster edge (the overhang is white), but it must
//! overlap the raster and be no larger than it.

use crate::error::IngestError;
use crate::model::{ExtractedCard, NameRecord};
use crate::output::PageReport;
use crate::pipeline::encode;
use crate::template::PixelRect;
use image::{Rgb, RgbImage, RgbaImage};
use tracing::warn;

/// Per-page inputs to [`assemble_page`].
pub struct PageSlots<'a> {
    /// 0-based page index, used for reporting.
    pub page_index: usize,
    pub raster: &'a RgbaImage,
    pub names: &'a [NameRecord],
    pub rects: &'a [PixelRect],
    pub template_name: &'a str,
    pub jpeg_quality: u8,
}

/// Crop, encode and pair every name that has a slot.
pub fn assemble_page(
    page: &PageSlots<'_>,
) -> Result<(Vec<ExtractedCard>, PageReport), IngestError> {
    let page_num = page.page_index + 1;
    let n = page.names.len().min(page.rects.len());

    let mut cards = Vec::with_capacity(n);
    for (slot, (name, rect)) in page.names.iter().zip(page.rects).enumerate() {
        if !rect.fits_raster(page.raster.width(), page.raster.height()) {
            return Err(IngestError::SlotOutOfRange {
                page: page_num,
                slot,
                raster_width: page.raster.width(),
                raster_height: page.raster.height(),
                template: page.template_name.to_string(),
            });
        }

        let photo = crop_on_white(page.raster, rect);
        let image = encode::encode_jpeg(&photo, page.jpeg_quality).map_err(|e| {
            IngestError::EncodeFailed {
                page: page_num,
                slot,
                detail: e.to_string(),
            }
        })?;

        cards.push(ExtractedCard {
            name: name.full_name.clone(),
            image,
        });
    }

    let dropped_names: Vec<String> = page.names[n..]
        .iter()
        .map(|name| name.full_name.clone())
        .collect();
    if !dropped_names.is_empty() {
        warn!(
            "Page {}: {} names but only {} photo slots; dropping {:?}",
            page_num,
            page.names.len(),
            page.rects.len(),
            dropped_names
        );
    }

    let report = PageReport {
        page_num,
        names_found: page.names.len(),
        slots_filled: n,
        slot_capacity: page.rects.len(),
        dropped_names,
    };
    Ok((cards, report))
}

/// Copy `rect` out of `src` onto an opaque white canvas.
///
/// Source pixels are alpha-blended over white, so transparent regions come
/// out white rather than black. Any part of `rect` beyond the raster edge
/// stays white.
pub fn crop_on_white(src: &RgbaImage, rect: &PixelRect) -> RgbImage {
    let mut out = RgbImage::from_pixel(rect.width, rect.height, Rgb([255, 255, 255]));

    let x_end = rect.right().min(src.width());
    let y_end = rect.bottom().min(src.height());

    for sy in rect.y..y_end {
        for sx in rect.x..x_end {
            let px = src.get_pixel(sx, sy);
            let [r, g, b, a] = px.0;
            out.put_pixel(
                sx - rect.x,
                sy - rect.y,
                Rgb([over_white(r, a), over_white(g, a), over_white(b, a)]),
            );
        }
    }
    out
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let c = channel as u32;
    let a = alpha as u32;
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn names(n: usize) -> Vec<NameRecord> {
        (0..n)
            .map(|i| NameRecord::new(format!("First{i}"), "Last"))
            .collect()
    }

    fn rects() -> Vec<PixelRect> {
        (0..4)
            .map(|i| PixelRect {
                x: 0,
                y: i * 10,
                width: 10,
                height: 10,
            })
            .collect()
    }

    /// A 10x40 raster with one solid colour band per slot.
    fn banded_raster() -> RgbaImage {
        RgbaImage::from_fn(10, 40, |_, y| match y / 10 {
            0 => Rgba([255, 0, 0, 255]),
            1 => Rgba([0, 255, 0, 255]),
            2 => Rgba([0, 0, 255, 255]),
            _ => Rgba([0, 0, 0, 255]),
        })
    }

    fn run(raster: &RgbaImage, names: &[NameRecord], rects: &[PixelRect]) -> (Vec<ExtractedCard>, PageReport) {
        assemble_page(&PageSlots {
            page_index: 0,
            raster,
            names,
            rects,
            template_name: "test",
            jpeg_quality: 90,
        })
        .expect("assemble")
    }

    #[test]
    fn transparent_pixels_become_white() {
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        let out = crop_on_white(&src, &PixelRect { x: 1, y: 1, width: 2, height: 2 });
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn opaque_pixels_are_copied() {
        let src = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let out = crop_on_white(&src, &PixelRect { x: 0, y: 0, width: 4, height: 4 });
        assert!(out.pixels().all(|p| p.0 == [10, 20, 30]));
    }

    #[test]
    fn half_alpha_blends_toward_white() {
        assert_eq!(over_white(0, 128), 127);
        assert_eq!(over_white(200, 255), 200);
        assert_eq!(over_white(0, 0), 255);
    }

    #[test]
    fn crop_past_edge_is_padded_white() {
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let out = crop_on_white(&src, &PixelRect { x: 2, y: 2, width: 4, height: 4 });
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(3, 3).0, [255, 255, 255]);
    }

    #[test]
    fn pairs_by_index() {
        let raster = banded_raster();
        let (cards, report) = run(&raster, &names(3), &rects());
        assert_eq!(cards.len(), 3);
        assert_eq!(report.slots_filled, 3);

        let expected = [[255u8, 0, 0], [0, 255, 0], [0, 0, 255]];
        for (i, card) in cards.iter().enumerate() {
            assert_eq!(card.name, format!("First{i} Last"));
            let img = image::load_from_memory(&card.image).unwrap().to_rgb8();
            let centre = img.get_pixel(5, 5).0;
            for c in 0..3 {
                let diff = (centre[c] as i32 - expected[i][c] as i32).abs();
                assert!(diff < 40, "slot {i} channel {c}: {centre:?}");
            }
        }
    }

    #[test]
    fn surplus_names_are_dropped_and_reported() {
        let raster = banded_raster();
        let (cards, report) = run(&raster, &names(6), &rects());
        assert_eq!(cards.len(), 4);
        assert_eq!(cards[3].name, "First3 Last");
        assert_eq!(report.names_found, 6);
        assert_eq!(report.dropped_names, vec!["First4 Last", "First5 Last"]);
    }

    #[test]
    fn fewer_names_use_leading_slots() {
        let raster = banded_raster();
        let (cards, report) = run(&raster, &names(2), &rects());
        assert_eq!(cards.len(), 2);
        assert!(report.dropped_names.is_empty());
        assert_eq!(report.slot_capacity, 4);
    }

    #[test]
    fn slot_larger_than_the_raster_is_an_error() {
        let raster = banded_raster();
        let huge = [PixelRect {
            x: 0,
            y: 0,
            width: u32::MAX,
            height: u32::MAX,
        }];
        let err = assemble_page(&PageSlots {
            page_index: 0,
            raster: &raster,
            names: &names(1),
            rects: &huge,
            template_name: "test",
            jpeg_quality: 90,
        })
        .unwrap_err();
        assert!(matches!(
            err,
            IngestError::SlotOutOfRange { page: 1, slot: 0, .. }
        ));
    }

    #[test]
    fn slot_off_the_raster_is_an_error() {
        let raster = RgbaImage::from_pixel(10, 15, Rgba([0, 0, 0, 255]));
        let err = assemble_page(&PageSlots {
            page_index: 1,
            raster: &raster,
            names: &names(3),
            rects: &rects(),
            template_name: "test",
            jpeg_quality: 90,
        })
        .unwrap_err();
        assert!(matches!(
            err,
            IngestError::SlotOutOfRange { page: 2, slot: 2, .. }
        ));
    }
}
