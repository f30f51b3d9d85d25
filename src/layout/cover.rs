//! Cover image preparation: decode whatever the provider sent and re-encode
//! it as baseline RGB JPEG, which PDF readers display natively via DCTDecode.

use crate::document::CoverImage;
use crate::error::EbookError;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

const JPEG_QUALITY: u8 = 90;

/// A cover ready to embed as an image XObject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

/// Decode `cover` and re-encode it as JPEG.
///
/// `what` names the cover in error messages.
pub fn prepare_cover(cover: &CoverImage, what: &str) -> Result<EncodedImage, EbookError> {
    let decoded = image::load_from_memory(&cover.bytes).map_err(|e| {
        EbookError::LayoutFailed(format!(
            "could not decode {what} ({}): {e}",
            cover.mime_type
        ))
    })?;
    let rgb = decoded.to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| EbookError::LayoutFailed(format!("could not encode {what}: {e}")))?;

    debug!(
        "Prepared {}: {}x{} px, {} -> {} bytes",
        what,
        rgb.width(),
        rgb.height(),
        cover.bytes.len(),
        jpeg.len()
    );
    Ok(EncodedImage {
        width: rgb.width(),
        height: rgb.height(),
        jpeg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([10, 120, 200, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn png_becomes_jpeg() {
        let cover = CoverImage {
            mime_type: "image/png".into(),
            bytes: png(6, 8),
        };
        let enc = prepare_cover(&cover, "front cover").unwrap();
        assert_eq!((enc.width, enc.height), (6, 8));
        assert_eq!(&enc.jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn garbage_is_layout_failure() {
        let cover = CoverImage {
            mime_type: "image/png".into(),
            bytes: vec![1, 2, 3, 4],
        };
        let err = prepare_cover(&cover, "back cover").unwrap_err();
        assert!(matches!(err, EbookError::LayoutFailed(ref m) if m.contains("back cover")));
    }
}
