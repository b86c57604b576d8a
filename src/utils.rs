/// Helpers shared by the CLI reporting code.
use crate::result::CompressionResult;
use crate::storage::StoredImage;

/// Format a byte count in human-readable units ("512 B", "1.5 KB").
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    let mut size = bytes as f64;
    let mut unit_index = 0;
    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Size reduction as a percentage; negative when the output grew.
pub fn calculate_compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    ((original_size as f64 - compressed_size as f64) / original_size as f64) * 100.0
}

pub fn print_compression_result(original_size: usize, result: &CompressionResult, stored: &StoredImage) {
    let ratio = calculate_compression_ratio(original_size as u64, result.size as u64);

    println!("🆔 Stored as: {}", stored.storage_name);
    println!("🌐 URL: {}", stored.relative_url);
    println!("📁 Path: {}", stored.absolute_path.display());
    println!(
        "📈 Size: {} ({}) at quality {}, {}",
        result.size,
        format_file_size(result.size as u64),
        result.quality,
        result.dimensions
    );
    println!("🎯 Compression ratio: {:.1}%", ratio);

    if result.met_explicit_budget {
        println!("✅ Fits the byte budget");
    } else {
        println!("⚠️  Over budget: saved from the fallback pass");
    }
}
