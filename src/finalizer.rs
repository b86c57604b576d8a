use crate::encoder::Encoder;
use crate::error::Result;
use crate::policy::CompressionPolicy;
use crate::result::{Attempt, CompressionResult};
use tracing::warn;

/// Single forced encode used once the search has spent its attempts.
///
/// Encodes the native image fitted inside `final_fallback_dimensions`, itself
/// clamped to `max_dimension` on both axes (never enlarged), at
/// `final_fallback_quality` and accepts whatever size comes out.
pub fn finalize<E: Encoder>(encoder: &mut E, policy: &CompressionPolicy) -> Result<CompressionResult> {
    let fallback = policy.final_fallback_dimensions;
    let dimensions = encoder.native_dimensions().fit_inside(
        fallback.width.min(policy.max_dimension),
        fallback.height.min(policy.max_dimension),
    );

    let bytes = encoder.encode(dimensions, policy.final_fallback_quality)?;
    let result = Attempt {
        quality: policy.final_fallback_quality,
        dimensions,
        bytes,
    }
    .into_result(false);

    warn!(
        "Image saved at fallback quality: {:.2}KB (quality: {}, size: {}, budget {} bytes)",
        result.size as f64 / 1024.0,
        result.quality,
        result.dimensions,
        policy.max_bytes
    );

    Ok(result)
}
