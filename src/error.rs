use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("Invalid compression policy: {0}")]
    InvalidPolicy(String),

    #[error("Failed to parse policy file {path}: {source}")]
    PolicyFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u8),

    #[error("Invalid image dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),

    #[error("File too large: {0} bytes. Maximum allowed: {1} bytes")]
    FileTooLarge(u64, u64),

    #[error("Not an image: {0}")]
    NotAnImage(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to create storage directory: {0}")]
    DirectoryCreationFailed(PathBuf),

    #[error("No image files found in input path: {0}")]
    NoImageFilesFound(String),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Compression did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

impl CompressionError {
    /// True when the input itself could not be read as a raster image.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, CompressionError::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;
