use crate::dimensions::Dimensions;
use crate::error::{CompressionError, Result};
use crate::validation::is_image_mime_type;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

/// What the prober learns from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub dimensions: Dimensions,
    pub format: ImageFormat,
}

impl ImageMetadata {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Reads native dimensions and format from the image header.
///
/// Only the header is parsed; pixel data is left untouched. Bytes that are
/// not a recognizable raster image yield `CompressionError::Decode`, and a
/// sniffed format whose MIME type falls outside `image/*` yields
/// `CompressionError::NotAnImage`.
pub fn probe(bytes: &[u8]) -> Result<ImageMetadata> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CompressionError::Decode(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| CompressionError::Decode("unrecognized image format".to_string()))?;

    let mime_type = format.to_mime_type();
    if !is_image_mime_type(mime_type) {
        return Err(CompressionError::NotAnImage(format!(
            "{:?} content is sniffed as {}",
            format, mime_type
        )));
    }

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| CompressionError::Decode(e.to_string()))?;

    let dimensions = Dimensions::new(width, height)
        .map_err(|_| CompressionError::Decode(format!("image reports {}x{}", width, height)))?;

    Ok(ImageMetadata { dimensions, format })
}
