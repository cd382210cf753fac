//! Image encoding: `DynamicImage` → base64 JPEG data URL.
//!
//! Chat-completion APIs accept images as `data:` URLs inside the
//! `image_url` content part. Pages are sent as JPEG to keep five-page
//! requests well below upload limits; JPEG has no alpha channel, so the
//! rendered RGBA bitmap is flattened to RGB first.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Prefix of every data URL produced by [`encode_page`].
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Encode a rasterised page as a `data:image/jpeg;base64,…` URL.
pub fn encode_page(img: &DynamicImage) -> Result<String, image::ImageError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(format!("{JPEG_DATA_URL_PREFIX}{b64}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_rgba_page_as_jpeg_data_url() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 128])));
        let url = encode_page(&img).expect("encode should succeed");
        assert!(url.starts_with(JPEG_DATA_URL_PREFIX));

        let bytes = STANDARD
            .decode(&url[JPEG_DATA_URL_PREFIX.len()..])
            .expect("payload is base64");
        // JPEG SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
    }
}
