use crate::dimensions::Dimensions;
use crate::error::Result;
use crate::planner::plan;
use crate::policy::CompressionPolicy;
use crate::probe::{probe, ImageMetadata};
use crate::utils::format_file_size;

/// Header-only view of what a compression would start from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageReport {
    pub metadata: ImageMetadata,
    pub input_size: usize,
    pub planned: Dimensions,
    pub max_bytes: usize,
}

impl ImageReport {
    pub fn needs_resize(&self) -> bool {
        self.planned != self.metadata.dimensions
    }

    /// The source already fits the budget byte-wise. It is still re-encoded.
    pub fn input_within_budget(&self) -> bool {
        self.input_size <= self.max_bytes
    }
}

/// Probes `bytes` and previews the planner's start size. Nothing is decoded
/// beyond the header and nothing is encoded.
pub fn describe(bytes: &[u8], policy: &CompressionPolicy) -> Result<ImageReport> {
    let metadata = probe(bytes)?;
    Ok(ImageReport {
        metadata,
        input_size: bytes.len(),
        planned: plan(metadata.dimensions, policy.max_dimension),
        max_bytes: policy.max_bytes,
    })
}

pub fn print_report(report: &ImageReport) {
    let native = report.metadata.dimensions;
    println!("📋 Basic Information:");
    println!("  🎭 Format: {}", report.metadata.mime_type());
    println!("  📏 Dimensions: {} pixels", native);
    println!("  📐 Aspect ratio: {:.2}:1", native.aspect_ratio());
    println!(
        "  📦 File size: {} bytes ({})",
        report.input_size,
        format_file_size(report.input_size as u64)
    );

    println!("\n💡 Compression Plan:");
    if report.needs_resize() {
        println!("  📏 Will start at {} (capped)", report.planned);
    } else {
        println!("  📏 Will start at native size {}", report.planned);
    }
    println!(
        "  🎯 Budget: {} ({})",
        format_file_size(report.max_bytes as u64),
        if report.input_within_budget() {
            "input already fits"
        } else {
            "input exceeds budget"
        }
    );
}
