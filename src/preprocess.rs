use crate::config::{Preprocess, Vision};
use crate::engine::EngineError;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

fn decode(bytes: &[u8]) -> Result<DynamicImage, EngineError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| EngineError::UnsupportedImage(e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(EngineError::UnsupportedImage(
            "image has zero dimensions".into(),
        ));
    }
    Ok(img)
}

/// Grayscale + contrast-threshold binarization before handing the image to
/// the deterministic OCR engine. Returns PNG bytes.
pub fn normalize_for_ocr(cfg: &Preprocess, bytes: &[u8]) -> Result<Vec<u8>, EngineError> {
    let img = decode(bytes)?;
    let mut gray = img.to_luma8();

    if cfg.binarize {
        let thr = cfg.binarize_threshold;
        for px in gray.pixels_mut() {
            px.0[0] = if px.0[0] < thr { 0 } else { 255 };
        }
    }

    debug!(
        "normalized image {}x{} binarize={}",
        gray.width(),
        gray.height(),
        cfg.binarize
    );

    let mut out = Vec::new();
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| EngineError::UnsupportedImage(format!("re-encode failed: {e}")))?;
    Ok(out)
}

/// Downscale for the vision engine so large photos do not blow up request
/// size. Returns JPEG bytes and the matching MIME type.
pub fn downscale_for_vision(
    cfg: &Vision,
    bytes: &[u8],
) -> Result<(Vec<u8>, &'static str), EngineError> {
    let img = decode(bytes)?;

    let img = if img.width().max(img.height()) > cfg.max_dimension {
        img.thumbnail(cfg.max_dimension, cfg.max_dimension)
    } else {
        img
    };

    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Vec::new();
    let mut cursor = Cursor::new(&mut out);
    let enc = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, cfg.jpeg_quality);
    rgb.write_with_encoder(enc)
        .map_err(|e| EngineError::UnsupportedImage(format!("re-encode failed: {e}")))?;
    Ok((out, "image/jpeg"))
}
