use crate::constants::PROGRESS_BAR_TEMPLATE;
use crate::error::{CompressionError, Result};
use crate::storage::{ImageStore, StoredImage};
use crate::validation::{is_image_file, read_image_file};
use crate::worker::CompressionPool;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Per-file outcome of a batch run.
#[derive(Debug)]
pub struct BatchItem {
    pub input: PathBuf,
    pub original_size: usize,
    pub outcome: Result<(StoredImage, bool)>,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub items: Vec<BatchItem>,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn processed(&self) -> usize {
        self.items.iter().filter(|item| item.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.processed()
    }

    /// Files stored from the fallback pass, i.e. still over budget.
    pub fn over_budget(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, Ok((_, false))))
            .count()
    }

    pub fn total_original_size(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.outcome.is_ok())
            .map(|item| item.original_size)
            .sum()
    }

    pub fn total_stored_size(&self) -> usize {
        self.items
            .iter()
            .filter_map(|item| item.outcome.as_ref().ok())
            .map(|(stored, _)| stored.size)
            .sum()
    }
}

/// Compresses every image under `input` on `pool` and stores the outputs.
///
/// Failures of individual files are collected into the summary; the batch
/// itself only fails when `input` cannot be enumerated.
pub fn batch_compress_images(
    input: &str,
    store: &ImageStore,
    pool: &CompressionPool,
    recursive: bool,
) -> Result<BatchSummary> {
    let start_time = Instant::now();
    let image_files = collect_image_files(input, recursive)?;

    if image_files.is_empty() {
        warn!("No image files found in {}", input);
        return Ok(BatchSummary::default());
    }

    info!(
        "Compressing {} images with {} workers into {:?}",
        image_files.len(),
        pool.threads(),
        store.root()
    );

    let progress = ProgressBar::new(image_files.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_BAR_TEMPLATE) {
        progress.set_style(style);
    }

    let items: Vec<BatchItem> = pool.install(|| {
        image_files
            .par_iter()
            .map(|input_path| {
                let item = process_single_image(input_path, store, pool);
                if let Err(e) = &item.outcome {
                    error!("Failed to process {:?}: {}", input_path, e);
                }
                progress.inc(1);
                item
            })
            .collect()
    });

    progress.finish_with_message("done");

    Ok(BatchSummary {
        items,
        elapsed: start_time.elapsed(),
    })
}

fn process_single_image(input_path: &Path, store: &ImageStore, pool: &CompressionPool) -> BatchItem {
    let file_name = input_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut original_size = 0;
    let outcome = read_image_file(input_path).and_then(|bytes| {
        original_size = bytes.len();
        let (stored, result) = store.compress_and_store(&bytes, &file_name, pool.policy())?;
        Ok((stored, result.met_explicit_budget))
    });

    BatchItem {
        input: input_path.to_path_buf(),
        original_size,
        outcome,
    }
}

/// Resolves a file, directory or glob pattern into image paths.
pub fn collect_image_files(input: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let input_path = Path::new(input);
    let mut image_files = Vec::new();

    if input_path.is_file() {
        image_files.push(
            input_path
                .canonicalize()
                .map_err(|_| CompressionError::NoImageFilesFound(input.to_string()))?,
        );
    } else if input_path.is_dir() {
        let walker = if recursive {
            WalkDir::new(input_path)
        } else {
            WalkDir::new(input_path).max_depth(1)
        };

        for entry in walker
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_image_file(path) {
                if let Ok(canonical_path) = path.canonicalize() {
                    image_files.push(canonical_path);
                }
            }
        }
    } else {
        let pattern =
            glob(input).map_err(|_| CompressionError::NoImageFilesFound(input.to_string()))?;
        for entry in pattern.flatten() {
            if entry.is_file() && is_image_file(&entry) {
                if let Ok(canonical_path) = entry.canonicalize() {
                    image_files.push(canonical_path);
                }
            }
        }
    }

    image_files.sort();
    Ok(image_files)
}
