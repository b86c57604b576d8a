use anyhow::{Context, Result};
use clap::Parser;
use img_budget::batch::{batch_compress_images, BatchSummary};
use img_budget::cli::{Args, Commands, PolicyArgs};
use img_budget::info::{describe, print_report};
use img_budget::logger;
use img_budget::storage::{DeleteOutcome, ImageStore};
use img_budget::utils::{calculate_compression_ratio, format_file_size, print_compression_result};
use img_budget::validation::read_image_file;
use img_budget::worker::CompressionPool;
use std::path::{Path, PathBuf};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.quiet, args.verbose);
    let quiet = args.quiet;

    match args.command {
        Commands::Compress {
            input,
            storage_dir,
            policy,
            data_url,
        } => run_compress(&input, &storage_dir, &policy, data_url, quiet).await?,
        Commands::Batch {
            input,
            storage_dir,
            policy,
            threads,
            recursive,
        } => run_batch(&input, &storage_dir, &policy, threads, recursive, quiet)?,
        Commands::Delete {
            reference,
            storage_dir,
        } => run_delete(reference, storage_dir, quiet).await,
        Commands::Info { input, policy } => run_info(&input, &policy)?,
    }

    Ok(())
}

async fn run_compress(
    input: &Path,
    storage_dir: &Path,
    policy_args: &PolicyArgs,
    data_url: bool,
    quiet: bool,
) -> Result<()> {
    let policy = policy_args.resolve()?;
    let bytes = read_image_file(input).with_context(|| format!("cannot read {:?}", input))?;
    let original_filename = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let original_size = bytes.len();

    let store = ImageStore::open(storage_dir)?;
    let pool = CompressionPool::new(policy, Some(1))?;
    let result = pool
        .compress_async(bytes, original_filename.clone())
        .await
        .with_context(|| format!("cannot compress {:?}", input))?;
    let stored = store.store(&original_filename, &result)?;

    if !quiet {
        println!("🔄 Compressed: {:?}", input);
        print_compression_result(original_size, &result, &stored);
    }
    if data_url {
        println!("{}", result.to_data_url());
    }
    Ok(())
}

fn run_batch(
    input: &str,
    storage_dir: &Path,
    policy_args: &PolicyArgs,
    threads: Option<usize>,
    recursive: bool,
    quiet: bool,
) -> Result<()> {
    let policy = policy_args.resolve()?;
    let store = ImageStore::open(storage_dir)?;
    let pool = CompressionPool::new(policy, threads)?;
    let summary = batch_compress_images(input, &store, &pool, recursive)?;

    if !quiet {
        print_batch_summary(&summary);
    }
    Ok(())
}

fn print_batch_summary(summary: &BatchSummary) {
    let total_before = summary.total_original_size() as u64;
    let total_after = summary.total_stored_size() as u64;

    println!("\n📊 Batch Compression Summary:");
    println!(
        "  ✅ Successfully processed: {}/{}",
        summary.processed(),
        summary.items.len()
    );
    println!(
        "  📊 Total original size: {} ({})",
        total_before,
        format_file_size(total_before)
    );
    println!(
        "  📊 Total stored size: {} ({})",
        total_after,
        format_file_size(total_after)
    );
    println!(
        "  🎯 Overall compression ratio: {:.1}%",
        calculate_compression_ratio(total_before, total_after)
    );
    println!("  ⏱️  Total time: {:?}", summary.elapsed);

    if summary.over_budget() > 0 {
        println!("  ⚠️  Stored over budget: {}", summary.over_budget());
    }
    if summary.failed() > 0 {
        println!("  ⚠️  Failed files: {}", summary.failed());
    }
}

/// Deletion is best effort: every problem is logged and the exit code stays 0.
async fn run_delete(reference: String, storage_dir: PathBuf, quiet: bool) {
    let store = match ImageStore::open_existing(&storage_dir) {
        Ok(store) => store,
        Err(e) => {
            warn!("Storage directory {:?} is not available: {}", storage_dir, e);
            if !quiet {
                println!("ℹ️  Nothing to delete: {}", reference);
            }
            return;
        }
    };

    let outcome = match store.delete_in_background(reference.clone()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Delete task for {:?} did not complete: {}", reference, e);
            DeleteOutcome::Failed
        }
    };

    if !quiet {
        match outcome {
            DeleteOutcome::Deleted => println!("🗑️  Deleted: {}", reference),
            DeleteOutcome::NotFound => println!("ℹ️  Nothing to delete: {}", reference),
            DeleteOutcome::Rejected(reason) => {
                println!("🚫 Refused reference {}: {:?}", reference, reason)
            }
            DeleteOutcome::Failed => println!("⚠️  Could not delete: {}", reference),
        }
    }
}

fn run_info(input: &Path, policy_args: &PolicyArgs) -> Result<()> {
    let policy = policy_args.resolve()?;
    println!("📋 Getting info for: {:?}", input);

    let bytes = read_image_file(input).with_context(|| format!("cannot read {:?}", input))?;
    let report = describe(&bytes, &policy).with_context(|| format!("cannot probe {:?}", input))?;
    print_report(&report);
    Ok(())
}
