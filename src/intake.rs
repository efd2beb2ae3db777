use crate::error::{Result, WasteSortError};
use image::GenericImageView;
use std::sync::Arc;

/// A validated upload. Bytes are kept as received; only the format is sniffed.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Arc<[u8]>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

pub fn decode_image(bytes: &[u8]) -> Result<ImageInput> {
    if bytes.is_empty() {
        return Err(WasteSortError::ImageError("empty upload".into()));
    }

    let format = image::guess_format(bytes)
        .map_err(|e| WasteSortError::ImageError(format!("unknown image format: {}", e)))?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| WasteSortError::ImageError(format!("failed to decode image: {}", e)))?;
    let (width, height) = decoded.dimensions();

    Ok(ImageInput {
        bytes: Arc::from(bytes),
        mime_type: format.to_mime_type().to_string(),
        width,
        height,
    })
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
