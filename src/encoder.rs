use crate::dimensions::Dimensions;
use crate::error::{CompressionError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, RgbImage};
use tracing::debug;

/// One encode step of the search: produce bytes for a size and quality.
///
/// Implementations must not mutate the source image; each call starts from
/// the original pixels so repeated shrinks do not compound resampling blur.
pub trait Encoder {
    /// Size of the decoded source.
    fn native_dimensions(&self) -> Dimensions;

    fn encode(&mut self, dimensions: Dimensions, quality: u8) -> Result<Vec<u8>>;
}

/// JPEG re-encoder over a source decoded once up front.
///
/// Keeps the most recent resample so consecutive attempts at the same size
/// only re-quantize.
pub struct JpegReencoder {
    source: RgbImage,
    resampled: Option<(Dimensions, RgbImage)>,
    resample_count: usize,
}

impl JpegReencoder {
    /// Fully decodes `bytes`. Any failure is reported as a decode error.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| CompressionError::Decode(e.to_string()))?;
        Ok(Self::from_rgb(img.to_rgb8()))
    }

    pub fn from_rgb(source: RgbImage) -> Self {
        Self {
            source,
            resampled: None,
            resample_count: 0,
        }
    }

    /// Number of resamples performed so far.
    pub fn resample_count(&self) -> usize {
        self.resample_count
    }

    fn pixels_at(&mut self, dimensions: Dimensions) -> &RgbImage {
        if dimensions == self.native_dimensions() {
            return &self.source;
        }

        let cached = matches!(&self.resampled, Some((dims, _)) if *dims == dimensions);
        if !cached {
            debug!("Resampling to {}", dimensions);
            let resized = imageops::resize(
                &self.source,
                dimensions.width,
                dimensions.height,
                FilterType::Lanczos3,
            );
            self.resampled = Some((dimensions, resized));
            self.resample_count += 1;
        }

        match &self.resampled {
            Some((_, pixels)) => pixels,
            None => &self.source,
        }
    }
}

impl Encoder for JpegReencoder {
    fn native_dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.source.width(),
            height: self.source.height(),
        }
    }

    fn encode(&mut self, dimensions: Dimensions, quality: u8) -> Result<Vec<u8>> {
        let pixels = self.pixels_at(dimensions);
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality).encode(
            pixels.as_raw(),
            pixels.width(),
            pixels.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(buf)
    }
}
