use crate::error::{CompressionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel size of an image. Both axes are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CompressionError::InvalidDimensions(width, height));
        }
        Ok(Self { width, height })
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn long_side(&self) -> u32 {
        self.width.max(self.height)
    }

    /// True when neither axis exceeds `max_dimension`.
    pub fn fits_within(&self, max_dimension: u32) -> bool {
        self.width <= max_dimension && self.height <= max_dimension
    }

    /// Scales both axes by the same factor, rounding to the nearest pixel.
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            width: scale_axis(self.width, factor),
            height: scale_axis(self.height, factor),
        }
    }

    /// Largest aspect-preserving size that fits inside `max_width` x `max_height`.
    /// Never enlarges.
    pub fn fit_inside(&self, max_width: u32, max_height: u32) -> Self {
        if self.width <= max_width && self.height <= max_height {
            return *self;
        }
        let ratio = (max_width as f64 / self.width as f64)
            .min(max_height as f64 / self.height as f64);
        self.scale(ratio)
    }
}

fn scale_axis(value: u32, factor: f64) -> u32 {
    ((value as f64 * factor).round() as u32).max(1)
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
