use crate::dimensions::Dimensions;

/// Initial target resolution for the search.
///
/// Images already within `max_dimension` on both axes are returned as-is.
/// Larger ones are scaled by `min(max / width, max / height)` so the longer
/// side lands on the cap and the aspect ratio is kept.
pub fn plan(native: Dimensions, max_dimension: u32) -> Dimensions {
    if native.fits_within(max_dimension) {
        return native;
    }
    native.fit_inside(max_dimension, max_dimension)
}
