//! Bounded search over (quality, dimensions) for an encode that fits the
//! byte budget.
//!
//! The search is a small state machine:
//!
//! ```text
//! Searching --fits--> Succeeded
//!     |
//!     +--over budget, attempts left--> Searching (next knobs)
//!     +--over budget, no attempts left--> Exhausted --fallback--> Finalized
//! ```
//!
//! Acceptance is first-fit: the first attempt under budget wins.

use crate::constants::MIN_QUALITY;
use crate::dimensions::Dimensions;
use crate::encoder::Encoder;
use crate::error::Result;
use crate::finalizer::finalize;
use crate::policy::CompressionPolicy;
use crate::result::{Attempt, CompressionResult};
use std::ops::ControlFlow;
use tracing::{debug, info};

/// Search position: what the next attempt encodes at, and how many ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Knobs {
    pub quality: u8,
    pub dimensions: Dimensions,
    pub attempt: u32,
}

impl Knobs {
    pub fn initial(start: Dimensions, policy: &CompressionPolicy) -> Self {
        Self {
            quality: policy.initial_quality,
            dimensions: start,
            attempt: 0,
        }
    }
}

/// Knobs for the attempt after an over-budget one. Exactly one rule applies:
///
/// 1. quality above the floor: drop quality by `quality_step`;
/// 2. both axes above `min_dimension_before_quality_reset`: shrink the long
///    side by `dimension_shrink_factor` and restore `reset_quality`;
/// 3. otherwise: drop quality by `fine_quality_step`.
///
/// A shrink refits `native` inside the shrunk long side, so the aspect ratio
/// stays within a pixel of the source however many shrinks ran. Quality
/// never goes below 1 and dimensions never grow.
pub fn next_knobs(knobs: &Knobs, native: Dimensions, policy: &CompressionPolicy) -> Knobs {
    let min_axis = policy.min_dimension_before_quality_reset;

    let (quality, dimensions) = if knobs.quality > policy.quality_floor {
        (step_down(knobs.quality, policy.quality_step), knobs.dimensions)
    } else if knobs.dimensions.width > min_axis && knobs.dimensions.height > min_axis {
        let long_side = knobs
            .dimensions
            .scale(policy.dimension_shrink_factor)
            .long_side();
        (
            policy.reset_quality,
            native.fit_inside(long_side, long_side),
        )
    } else {
        (step_down(knobs.quality, policy.fine_quality_step), knobs.dimensions)
    };

    Knobs {
        quality,
        dimensions,
        attempt: knobs.attempt + 1,
    }
}

fn step_down(quality: u8, step: u8) -> u8 {
    quality.saturating_sub(step).max(MIN_QUALITY)
}

/// Where [`search`] stopped. The fallback pass is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Succeeded(Attempt),
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Searching(Knobs),
    Succeeded(Attempt),
    /// Attempt budget spent without meeting the byte budget.
    Exhausted { attempts: u32 },
    /// Output of the fallback pass.
    Finalized(CompressionResult),
}

impl SearchState {
    pub fn start(start: Dimensions, policy: &CompressionPolicy) -> Self {
        SearchState::Searching(Knobs::initial(start, policy))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchState::Succeeded(_) | SearchState::Finalized(_))
    }

    /// Performs one transition. Terminal states are returned unchanged.
    pub fn step<E: Encoder>(self, encoder: &mut E, policy: &CompressionPolicy) -> Result<Self> {
        match self {
            SearchState::Searching(knobs) => Ok(match attempt(encoder, knobs, policy)? {
                ControlFlow::Continue(next) => SearchState::Searching(next),
                ControlFlow::Break(outcome) => outcome.into(),
            }),
            SearchState::Exhausted { .. } => finalize(encoder, policy).map(SearchState::Finalized),
            terminal => Ok(terminal),
        }
    }

    pub fn into_result(self) -> Option<CompressionResult> {
        match self {
            SearchState::Succeeded(attempt) => Some(attempt.into_result(true)),
            SearchState::Finalized(result) => Some(result),
            SearchState::Searching(_) | SearchState::Exhausted { .. } => None,
        }
    }
}

impl From<SearchOutcome> for SearchState {
    fn from(outcome: SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::Succeeded(attempt) => SearchState::Succeeded(attempt),
            SearchOutcome::Exhausted { attempts } => SearchState::Exhausted { attempts },
        }
    }
}

fn attempt<E: Encoder>(
    encoder: &mut E,
    knobs: Knobs,
    policy: &CompressionPolicy,
) -> Result<ControlFlow<SearchOutcome, Knobs>> {
    let bytes = encoder.encode(knobs.dimensions, knobs.quality)?;
    let attempt = Attempt {
        quality: knobs.quality,
        dimensions: knobs.dimensions,
        bytes,
    };

    if attempt.size() <= policy.max_bytes {
        info!(
            "Image compressed: {:.2}KB (quality: {}, size: {}, attempt {})",
            attempt.size() as f64 / 1024.0,
            attempt.quality,
            attempt.dimensions,
            knobs.attempt + 1
        );
        return Ok(ControlFlow::Break(SearchOutcome::Succeeded(attempt)));
    }

    debug!(
        "Attempt {} over budget: {} bytes > {} (quality {}, {})",
        knobs.attempt + 1,
        attempt.size(),
        policy.max_bytes,
        attempt.quality,
        attempt.dimensions
    );

    let next = next_knobs(&knobs, encoder.native_dimensions(), policy);
    if next.attempt >= policy.max_attempts {
        Ok(ControlFlow::Break(SearchOutcome::Exhausted {
            attempts: next.attempt,
        }))
    } else {
        Ok(ControlFlow::Continue(next))
    }
}

/// Runs attempts from `start` until one fits or `max_attempts` are spent.
pub fn search<E: Encoder>(
    encoder: &mut E,
    start: Dimensions,
    policy: &CompressionPolicy,
) -> Result<SearchOutcome> {
    let mut knobs = Knobs::initial(start, policy);
    loop {
        match attempt(encoder, knobs, policy)? {
            ControlFlow::Continue(next) => knobs = next,
            ControlFlow::Break(outcome) => return Ok(outcome),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Output size proportional to pixels x quality; records every call.
    struct ModelEncoder {
        native: Dimensions,
        bytes_per_pixel_quality: f64,
        calls: Vec<(Dimensions, u8)>,
    }

    impl ModelEncoder {
        fn new(width: u32, height: u32, bytes_per_pixel_quality: f64) -> Self {
            Self {
                native: Dimensions::new(width, height).unwrap(),
                bytes_per_pixel_quality,
                calls: Vec::new(),
            }
        }
    }

    impl Encoder for ModelEncoder {
        fn native_dimensions(&self) -> Dimensions {
            self.native
        }

        fn encode(&mut self, dimensions: Dimensions, quality: u8) -> Result<Vec<u8>> {
            self.calls.push((dimensions, quality));
            let size = dimensions.pixel_count() as f64 * quality as f64 * self.bytes_per_pixel_quality;
            Ok(vec![0u8; size as usize])
        }
    }

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions::new(width, height).unwrap()
    }

    fn knobs(quality: u8, width: u32, height: u32) -> Knobs {
        Knobs {
            quality,
            dimensions: Dimensions::new(width, height).unwrap(),
            attempt: 3,
        }
    }

    #[test]
    fn test_next_knobs_coarse_quality_step() {
        let policy = CompressionPolicy::default();
        let next = next_knobs(&knobs(85, 1920, 1152), dims(1920, 1152), &policy);
        assert_eq!(next, Knobs { attempt: 4, ..knobs(75, 1920, 1152) });
    }

    #[test]
    fn test_next_knobs_step_can_cross_floor() {
        let policy = CompressionPolicy::default();
        let next = next_knobs(&knobs(35, 1920, 1152), dims(1920, 1152), &policy);
        assert_eq!(next.quality, 25);
        assert_eq!(next.dimensions, dims(1920, 1152));
    }

    #[test]
    fn test_next_knobs_shrinks_and_resets_at_floor() {
        let policy = CompressionPolicy::default();
        let next = next_knobs(&knobs(30, 1920, 1152), dims(5000, 3000), &policy);
        assert_eq!(next.quality, 70);
        assert_eq!(next.dimensions, dims(1728, 1037));
    }

    #[test]
    fn test_next_knobs_fine_step_when_small() {
        let policy = CompressionPolicy::default();
        let next = next_knobs(&knobs(25, 400, 900), dims(400, 900), &policy);
        assert_eq!(next.quality, 20);
        assert_eq!(next.dimensions, dims(400, 900));
    }

    #[test]
    fn test_next_knobs_quality_never_below_one() {
        let policy = CompressionPolicy::default();
        let native = dims(100, 100);
        let next = next_knobs(&knobs(3, 100, 100), native, &policy);
        assert_eq!(next.quality, 1);
        let next = next_knobs(&next, native, &policy);
        assert_eq!(next.quality, 1);
    }

    #[test]
    fn test_repeated_shrinks_keep_source_aspect() {
        // Shrinking the previous rounded size compounds rounding; this source
        // drifted by more than a pixel after four shrinks that way.
        let policy = CompressionPolicy::default().with_max_bytes(1);
        let native = dims(1894, 1777);
        let mut encoder = ModelEncoder::new(native.width, native.height, 0.0001);

        let outcome = search(&mut encoder, native, &policy).unwrap();
        assert_eq!(outcome, SearchOutcome::Exhausted { attempts: 20 });

        let mut shrinks = 0;
        for pair in encoder.calls.windows(2) {
            if pair[1].0 != pair[0].0 {
                shrinks += 1;
            }
        }
        assert!(shrinks >= 3);

        for (attempted, _) in &encoder.calls {
            let expected_height =
                attempted.width as f64 * native.height as f64 / native.width as f64;
            let error = (attempted.height as f64 - expected_height).abs();
            assert!(error <= 1.0, "{} drifted {:.3}px from {}", attempted, error, native);
        }
    }

    #[test]
    fn test_search_first_fit() {
        let policy = CompressionPolicy::default();
        let mut encoder = ModelEncoder::new(100, 100, 0.01);
        let start = encoder.native_dimensions();

        let outcome = search(&mut encoder, start, &policy).unwrap();
        match outcome {
            SearchOutcome::Succeeded(attempt) => {
                assert_eq!(attempt.quality, 85);
                assert_eq!(attempt.dimensions, start);
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(encoder.calls.len(), 1);
    }

    #[test]
    fn test_search_walks_quality_before_dimensions() {
        // Output is quality * 1000 bytes, so quality 45 is the first to fit.
        let policy = CompressionPolicy::default().with_max_bytes(50_000);
        let mut encoder = ModelEncoder::new(1000, 1000, 0.001);
        let start = encoder.native_dimensions();

        let outcome = search(&mut encoder, start, &policy).unwrap();
        let qualities: Vec<u8> = encoder.calls.iter().map(|(_, q)| *q).collect();
        assert_eq!(qualities, vec![85, 75, 65, 55, 45]);
        assert!(matches!(outcome, SearchOutcome::Succeeded(ref a) if a.quality == 45));
    }

    #[test]
    fn test_search_exhausts_after_max_attempts() {
        let policy = CompressionPolicy::default().with_max_bytes(1);
        let mut encoder = ModelEncoder::new(1920, 1152, 0.0001);
        let start = encoder.native_dimensions();

        let outcome = search(&mut encoder, start, &policy).unwrap();
        assert_eq!(outcome, SearchOutcome::Exhausted { attempts: 20 });
        assert_eq!(encoder.calls.len(), 20);

        // Seven coarse steps, then a shrink with the quality reset.
        assert_eq!(encoder.calls[6], (start, 25));
        assert_eq!(encoder.calls[7], (dims(1728, 1037), 70));

        for pair in encoder.calls.windows(2) {
            let (prev, next) = (pair[0].0, pair[1].0);
            assert!(next.width <= prev.width && next.height <= prev.height);
        }
    }

    #[test]
    fn test_state_machine_runs_to_finalized() {
        let policy = CompressionPolicy::default().with_max_bytes(1);
        let mut encoder = ModelEncoder::new(1920, 1152, 0.001);

        let mut state = SearchState::start(encoder.native_dimensions(), &policy);
        while let SearchState::Searching(_) = state {
            state = state.step(&mut encoder, &policy).unwrap();
        }
        assert_eq!(state, SearchState::Exhausted { attempts: 20 });
        assert!(!state.is_terminal());
        assert!(state.clone().into_result().is_none());

        let finalized = state.step(&mut encoder, &policy).unwrap();
        assert!(finalized.is_terminal());
        let result = finalized.into_result().unwrap();
        assert!(!result.met_explicit_budget);
        assert_eq!(result.quality, 30);
        assert_eq!(result.dimensions, dims(800, 480));
        assert_eq!(encoder.calls.len(), 21);
    }

    #[test]
    fn test_terminal_step_is_identity() {
        let policy = CompressionPolicy::default();
        let mut encoder = ModelEncoder::new(10, 10, 0.01);
        let start = encoder.native_dimensions();

        let state = SearchState::start(start, &policy)
            .step(&mut encoder, &policy)
            .unwrap();
        assert!(matches!(state, SearchState::Succeeded(_)));

        let again = state.clone().step(&mut encoder, &policy).unwrap();
        assert_eq!(state, again);
        assert_eq!(encoder.calls.len(), 1);
    }
}
