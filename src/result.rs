use crate::constants::{OUTPUT_EXTENSION, OUTPUT_MIME_TYPE};
use crate::dimensions::Dimensions;
use base64::{engine::general_purpose::STANDARD, Engine};

/// One encode in the search trajectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub quality: u8,
    pub dimensions: Dimensions,
    pub bytes: Vec<u8>,
}

impl Attempt {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn into_result(self, met_explicit_budget: bool) -> CompressionResult {
        CompressionResult {
            size: self.bytes.len(),
            bytes: self.bytes,
            dimensions: self.dimensions,
            quality: self.quality,
            met_explicit_budget,
        }
    }
}

/// Re-encoded output handed back to the caller.
///
/// `met_explicit_budget` is false only for output of the fallback pass,
/// which may exceed the budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionResult {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
    pub size: usize,
    pub quality: u8,
    pub met_explicit_budget: bool,
}

impl CompressionResult {
    pub fn mime_type(&self) -> &'static str {
        OUTPUT_MIME_TYPE
    }

    pub fn extension(&self) -> &'static str {
        OUTPUT_EXTENSION
    }

    /// `data:` URL with the base64-encoded output, for inline previews.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }
}
