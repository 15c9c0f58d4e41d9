//! Image encoding: cropped photo → JPEG bytes → `data:` URL.
//!
//! Cards carry their photo inline as a base64 `data:` URL so a deck is a
//! single self-contained record. JPEG at quality 90 keeps a 222×294 px
//! portrait around 15–25 KB; the photos are already lossy scans, so PNG
//! would only triple the deck size without a visible gain.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::debug;

pub const JPEG_MIME: &str = "image/jpeg";

/// Encode an opaque RGB image as JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    img.write_with_encoder(encoder)?;
    debug!(
        "Encoded {}x{} photo → {} bytes JPEG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Wrap JPEG bytes in a base64 `data:` URL.
pub fn jpeg_data_url(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", JPEG_MIME, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn encode_small_image() {
        let img = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
        let bytes = encode_jpeg(&img, 90).expect("encode should succeed");
        // SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).expect("valid jpeg");
        assert_eq!(decoded.width(), 10);
        assert_eq!(decoded.height(), 10);
    }

    #[test]
    fn data_url_is_base64() {
        let url = jpeg_data_url(&[1, 2, 3]);
        let payload = url
            .strip_prefix("data:image/jpeg;base64,")
            .expect("prefix");
        assert_eq!(STANDARD.decode(payload).unwrap(), vec![1, 2, 3]);
    }
}
