use crate::constants::PRE_UPLOAD_MAX_BYTES;
use crate::error::Result;
use crate::policy::CompressionPolicy;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img-budget",
    about = "Re-encode images as JPEG until they fit a byte budget",
    long_about = "img-budget re-encodes raster images (JPEG, PNG, WebP, GIF, BMP, TIFF) as baseline JPEG. \
                  It caps the larger side, lowers quality and shrinks dimensions step by step until the \
                  output fits a byte budget, and always produces an output, even when the budget is \
                  unreachable. Outputs are written under opaque names into a managed storage directory.",
    version,
    after_help = "EXAMPLES:\n  \
    img-budget compress receipt.png -s ./uploads\n  \
    img-budget compress scan.jpg --max-bytes 524288 --max-dimension 1280\n  \
    img-budget batch \"./receipts/*.jpg\" -s ./uploads -r -j 4\n  \
    img-budget delete /images/1700000000000_abc123def4567.jpg -s ./uploads\n  \
    img-budget info photo.png"
)]
pub struct Args {
    #[arg(short, long, global = true, help = "Only print warnings and errors")]
    pub quiet: bool,

    #[arg(short, long, global = true, help = "Print every search attempt")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags that shape the compression policy.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct PolicyArgs {
    #[arg(
        short = 'b',
        long,
        help = "Byte budget for each output (default: 1048576)",
        long_help = "Largest accepted output size in bytes. When no attempt fits, a fallback \
                     within 800x800 (and --max-dimension) at quality 30 is stored and reported \
                     as over budget."
    )]
    pub max_bytes: Option<usize>,

    #[arg(
        short = 'm',
        long,
        help = "Cap for the larger side in pixels (default: 1920)",
        long_help = "Both axes are scaled down proportionally so neither exceeds this value. \
                     Images are never enlarged."
    )]
    pub max_dimension: Option<u32>,

    #[arg(
        short = 'p',
        long,
        help = "TOML file overriding the compression schedule",
        long_help = "Any field of the policy may be set; missing fields keep their defaults. \
                     --max-bytes and --max-dimension still win over the file."
    )]
    pub policy: Option<PathBuf>,

    #[arg(
        long,
        help = "Use the 2 MiB pre-upload budget",
        conflicts_with = "max_bytes"
    )]
    pub pre_upload: bool,
}

impl PolicyArgs {
    /// Builds the effective policy: defaults or `--pre-upload`, then the
    /// policy file, then the explicit flags.
    pub fn resolve(&self) -> Result<CompressionPolicy> {
        let mut policy = match &self.policy {
            Some(path) => CompressionPolicy::load(path)?,
            None => CompressionPolicy::default(),
        };
        if self.pre_upload {
            policy = policy.with_max_bytes(PRE_UPLOAD_MAX_BYTES);
        }
        if let Some(max_bytes) = self.max_bytes {
            policy = policy.with_max_bytes(max_bytes);
        }
        if let Some(max_dimension) = self.max_dimension {
            policy = policy.with_max_dimension(max_dimension);
        }
        policy.validate()?;
        Ok(policy)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress a single image into the storage directory",
        long_about = "Compress one image under the byte budget and store it under a fresh, \
                      collision-resistant name. Prints the storage name and public URL."
    )]
    Compress {
        #[arg(help = "Input image file path")]
        input: PathBuf,

        #[arg(
            short = 's',
            long,
            default_value = "uploads",
            help = "Storage directory for compressed outputs"
        )]
        storage_dir: PathBuf,

        #[command(flatten)]
        policy: PolicyArgs,

        #[arg(
            long,
            help = "Also print the output as a base64 data URL",
            long_help = "Prints `data:image/jpeg;base64,...` after storing, for embedding \
                         the result in JSON payloads."
        )]
        data_url: bool,
    },

    #[command(
        about = "Compress multiple images in parallel",
        long_about = "Compress every image matched by a directory, file or glob pattern on a \
                      bounded worker pool. Individual failures are reported and skipped."
    )]
    Batch {
        #[arg(
            help = "Input directory, file pattern, or glob",
            long_help = "Input can be a directory path, file pattern, or glob expression. \
                         Examples: './images', '*.jpg', '/path/to/images/*.png'"
        )]
        input: String,

        #[arg(
            short = 's',
            long,
            default_value = "uploads",
            help = "Storage directory for compressed outputs"
        )]
        storage_dir: PathBuf,

        #[command(flatten)]
        policy: PolicyArgs,

        #[arg(
            short = 'j',
            long,
            help = "Number of worker threads (default: auto)",
            long_help = "Size of the compression pool. If not specified, uses number of CPU cores."
        )]
        threads: Option<usize>,

        #[arg(
            short = 'r',
            long,
            help = "Process subdirectories recursively",
            long_help = "Recursively process all subdirectories when input is a directory."
        )]
        recursive: bool,
    },

    #[command(
        about = "Delete a stored image by name or URL",
        long_about = "Remove a stored image given its storage name or public URL. Query strings \
                      are ignored and references that try to leave the storage directory are \
                      refused. Never fails: problems are logged and the exit code stays 0."
    )]
    Delete {
        #[arg(help = "Storage name or /images/<name> URL")]
        reference: String,

        #[arg(
            short = 's',
            long,
            default_value = "uploads",
            help = "Storage directory holding the image"
        )]
        storage_dir: PathBuf,
    },

    #[command(
        about = "Show image header information and the planned start size",
        long_about = "Read the image header only and report format, dimensions and the size \
                      the compression search would start from."
    )]
    Info {
        #[arg(help = "Image file path to analyze")]
        input: PathBuf,

        #[command(flatten)]
        policy: PolicyArgs,
    },
}
