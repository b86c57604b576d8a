use crate::constants::{
    DEFAULT_DIMENSION_SHRINK_FACTOR, DEFAULT_FALLBACK_HEIGHT, DEFAULT_FALLBACK_QUALITY,
    DEFAULT_FALLBACK_WIDTH, DEFAULT_FINE_QUALITY_STEP, DEFAULT_INITIAL_QUALITY,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BYTES, DEFAULT_MAX_DIMENSION,
    DEFAULT_MIN_DIMENSION_BEFORE_QUALITY_RESET, DEFAULT_QUALITY_FLOOR, DEFAULT_QUALITY_STEP,
    DEFAULT_RESET_QUALITY, MAX_QUALITY, MIN_QUALITY, PRE_UPLOAD_MAX_BYTES,
};
use crate::dimensions::Dimensions;
use crate::error::{CompressionError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Parameters of the quality/size search.
///
/// The same schedule is used by every caller; contexts differ only in
/// `max_bytes`. Policy files may override any subset of fields, the rest
/// fall back to [`CompressionPolicy::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionPolicy {
    /// Byte budget an output must fit to count as a success.
    pub max_bytes: usize,
    /// Cap applied to both axes before the search starts.
    pub max_dimension: u32,
    pub initial_quality: u8,
    /// Coarse quality steps stop here; below it the search shrinks instead.
    pub quality_floor: u8,
    pub quality_step: u8,
    /// Last-resort step once quality is at the floor and the image is small.
    pub fine_quality_step: u8,
    /// Quality restored after each dimension shrink.
    pub reset_quality: u8,
    pub dimension_shrink_factor: f64,
    /// Both axes must exceed this for a shrink to happen.
    pub min_dimension_before_quality_reset: u32,
    pub max_attempts: u32,
    pub final_fallback_dimensions: Dimensions,
    pub final_fallback_quality: u8,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_dimension: DEFAULT_MAX_DIMENSION,
            initial_quality: DEFAULT_INITIAL_QUALITY,
            quality_floor: DEFAULT_QUALITY_FLOOR,
            quality_step: DEFAULT_QUALITY_STEP,
            fine_quality_step: DEFAULT_FINE_QUALITY_STEP,
            reset_quality: DEFAULT_RESET_QUALITY,
            dimension_shrink_factor: DEFAULT_DIMENSION_SHRINK_FACTOR,
            min_dimension_before_quality_reset: DEFAULT_MIN_DIMENSION_BEFORE_QUALITY_RESET,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            final_fallback_dimensions: Dimensions {
                width: DEFAULT_FALLBACK_WIDTH,
                height: DEFAULT_FALLBACK_HEIGHT,
            },
            final_fallback_quality: DEFAULT_FALLBACK_QUALITY,
        }
    }
}

impl CompressionPolicy {
    /// Canonical schedule with the larger budget used before uploading.
    pub fn pre_upload() -> Self {
        Self::default().with_max_bytes(PRE_UPLOAD_MAX_BYTES)
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn from_toml_str(source: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Loads and validates a TOML policy file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        let policy = Self::from_toml_str(&source).map_err(|source| {
            CompressionError::PolicyFile {
                path: path.to_path_buf(),
                source,
            }
        })?;
        policy.validate()?;
        info!("Loaded compression policy from {:?}", path);
        Ok(policy)
    }

    /// Checks that the schedule is internally consistent and terminates.
    pub fn validate(&self) -> Result<()> {
        for quality in [
            self.initial_quality,
            self.quality_floor,
            self.reset_quality,
            self.final_fallback_quality,
        ] {
            if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
                return Err(CompressionError::InvalidQuality(quality));
            }
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes must be positive"));
        }
        if self.max_dimension == 0 {
            return Err(invalid("max_dimension must be positive"));
        }
        if self.quality_step == 0 || self.fine_quality_step == 0 {
            return Err(invalid("quality steps must be positive"));
        }
        // The reset quality must be tried before the next shrink.
        if self.reset_quality <= self.quality_floor {
            return Err(invalid("reset_quality must be above quality_floor"));
        }
        if !(self.dimension_shrink_factor > 0.0 && self.dimension_shrink_factor < 1.0) {
            return Err(invalid("dimension_shrink_factor must be in (0, 1)"));
        }
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts must be at least 1"));
        }
        if !self.final_fallback_dimensions.is_valid() {
            return Err(invalid("final_fallback_dimensions must be positive"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> CompressionError {
    CompressionError::InvalidPolicy(message.to_string())
}
