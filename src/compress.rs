use crate::dimensions::Dimensions;
use crate::encoder::{Encoder, JpegReencoder};
use crate::error::Result;
use crate::finalizer::finalize;
use crate::planner::plan;
use crate::policy::CompressionPolicy;
use crate::probe::probe;
use crate::result::CompressionResult;
use crate::search::{search, SearchOutcome};
use tracing::{debug, info_span};

/// Re-encodes an image so it fits `policy.max_bytes`.
///
/// Pipeline: probe header -> plan start size -> bounded search -> fallback.
///
/// # Arguments
/// * `bytes` - Encoded source image (any format the `image` crate decodes)
/// * `original_filename` - Caller-supplied name, used for log context only
/// * `policy` - Search schedule and byte budget
///
/// # Returns
/// * `Ok(CompressionResult)` - Always, unless the input is not an image or the
///   policy is invalid. Over-budget output is returned with
///   `met_explicit_budget == false`, never as an error.
/// * `Err(CompressionError::Decode)` - If `bytes` is not a decodable raster image
/// * `Err(CompressionError::NotAnImage)` - If the sniffed MIME type is not `image/*`
pub fn compress(
    bytes: &[u8],
    original_filename: &str,
    policy: &CompressionPolicy,
) -> Result<CompressionResult> {
    let span = info_span!("compress", file = original_filename, input_bytes = bytes.len());
    let _enter = span.enter();

    policy.validate()?;

    let metadata = probe(bytes)?;
    let start = plan(metadata.dimensions, policy.max_dimension);
    debug!(
        "Probed {} {}, planned start {}",
        metadata.mime_type(),
        metadata.dimensions,
        start
    );

    let mut encoder = JpegReencoder::decode(bytes)?;
    compress_with(&mut encoder, start, policy)
}

/// Runs search and, if needed, the fallback pass over an already-built encoder.
///
/// `start` is the planned size; it must fit within the encoder's native size.
pub fn compress_with<E: Encoder>(
    encoder: &mut E,
    start: Dimensions,
    policy: &CompressionPolicy,
) -> Result<CompressionResult> {
    match search(encoder, start, policy)? {
        SearchOutcome::Succeeded(attempt) => Ok(attempt.into_result(true)),
        SearchOutcome::Exhausted { attempts } => {
            debug!("Search exhausted after {} attempts, running fallback pass", attempts);
            finalize(encoder, policy)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompressionError;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn solid_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 40])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_compress_small_image_first_attempt() {
        let policy = CompressionPolicy::default();
        let result = compress(&solid_png(64, 32), "tiny.png", &policy).unwrap();

        assert!(result.met_explicit_budget);
        assert_eq!(result.quality, 85);
        assert_eq!(result.dimensions, Dimensions::new(64, 32).unwrap());
        assert_eq!(result.size, result.bytes.len());
        assert_eq!(image::guess_format(&result.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_compress_applies_dimension_cap() {
        let policy = CompressionPolicy::default().with_max_dimension(50);
        let result = compress(&solid_png(200, 100), "wide.png", &policy).unwrap();
        assert_eq!(result.dimensions, Dimensions::new(50, 25).unwrap());

        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (50, 25));
    }

    #[test]
    fn test_compress_rejects_non_image() {
        let result = compress(b"GIF89a but not really", "fake.gif", &CompressionPolicy::default());
        assert!(matches!(result, Err(CompressionError::Decode(_))));
    }

    #[test]
    fn test_compress_rejects_sniffed_non_image_mime() {
        let mut farbfeld = b"farbfeld".to_vec();
        farbfeld.extend_from_slice(&1u32.to_be_bytes());
        farbfeld.extend_from_slice(&1u32.to_be_bytes());
        farbfeld.extend_from_slice(&[0xff; 8]);

        let result = compress(&farbfeld, "pixels.ff", &CompressionPolicy::default());
        assert!(matches!(result, Err(CompressionError::NotAnImage(_))));
    }

    #[test]
    fn test_fallback_stays_within_small_max_dimension() {
        let policy = CompressionPolicy::default()
            .with_max_bytes(1)
            .with_max_dimension(500);
        let result = compress(&solid_png(1000, 1000), "square.png", &policy).unwrap();

        assert!(!result.met_explicit_budget);
        assert_eq!(result.quality, policy.final_fallback_quality);
        assert_eq!(result.dimensions, Dimensions::new(500, 500).unwrap());
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (500, 500));
    }

    #[test]
    fn test_compress_rejects_invalid_policy() {
        let mut policy = CompressionPolicy::default();
        policy.max_attempts = 0;
        let result = compress(&solid_png(8, 8), "ok.png", &policy);
        assert!(matches!(result, Err(CompressionError::InvalidPolicy(_))));
    }
}
