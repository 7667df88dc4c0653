//! Photo encoding - decode arbitrary stills, emit baseline JPEG

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;

/// Decode an image from bytes, guessing the format from its signature.
pub fn decode(data: &[u8]) -> Result<DynamicImage, anyhow::Error> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    Ok(reader.decode()?)
}

/// Encode `image` as JPEG at `quality` (1-100).
///
/// JPEG carries no alpha channel, so the image is flattened to RGB first.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, anyhow::Error> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(anyhow::anyhow!("image has no pixels"));
    }

    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)?;
    Ok(buffer)
}
