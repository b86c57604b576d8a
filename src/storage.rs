//! Flat on-disk store for compressed outputs.
//!
//! Names are opaque (`<unix-millis>_<token>.<ext>`) and never derived from
//! image content; the public URL and the file on disk share the basename.

use crate::compress::compress;
use crate::constants::{DEFAULT_STORAGE_EXTENSION, PUBLIC_URL_PREFIX, STORAGE_TOKEN_LEN};
use crate::error::{CompressionError, Result};
use crate::policy::CompressionPolicy;
use crate::result::CompressionResult;
use crate::validation::{is_image_file, sanitize_reference, ReferenceRejection};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// A compressed image persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub storage_name: String,
    /// Public reference, `/images/<storage_name>`.
    pub relative_url: String,
    pub absolute_path: PathBuf,
    pub size: usize,
}

/// What a delete request ended up doing. Deletion never fails outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    Rejected(ReferenceRejection),
    Failed,
}

/// Builds a collision-resistant storage name for an upload.
///
/// The extension comes from `original_filename` when it is a recognized raster
/// extension, otherwise `jpg`.
pub fn generate_storage_name(original_filename: &str) -> String {
    let path = Path::new(original_filename);
    let extension = if is_image_file(path) {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_else(|| DEFAULT_STORAGE_EXTENSION.to_string())
    } else {
        DEFAULT_STORAGE_EXTENSION.to_string()
    };

    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STORAGE_TOKEN_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();

    format!("{}_{}.{}", Utc::now().timestamp_millis(), token, extension)
}

/// Managed directory holding every stored output. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: Arc<PathBuf>,
}

impl ImageStore {
    /// Opens (creating if needed) the managed directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)
            .map_err(|_| CompressionError::DirectoryCreationFailed(root.to_path_buf()))?;
        let canonical = root
            .canonicalize()
            .map_err(|_| CompressionError::DirectoryCreationFailed(root.to_path_buf()))?;
        Ok(Self {
            root: Arc::new(canonical),
        })
    }

    /// Opens an already existing directory without creating anything.
    pub fn open_existing(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = root
            .canonicalize()
            .map_err(|_| CompressionError::FileNotFound(root.to_path_buf()))?;
        if !canonical.is_dir() {
            return Err(CompressionError::FileNotFound(root.to_path_buf()));
        }
        Ok(Self {
            root: Arc::new(canonical),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_url(storage_name: &str) -> String {
        format!("{}{}", PUBLIC_URL_PREFIX, storage_name)
    }

    /// Writes `result` under a fresh name. Write errors propagate.
    pub fn store(&self, original_filename: &str, result: &CompressionResult) -> Result<StoredImage> {
        let storage_name = generate_storage_name(original_filename);
        let absolute_path = self.root.join(&storage_name);
        fs::write(&absolute_path, &result.bytes)?;

        info!(
            "Stored {} ({} bytes, quality {}, {})",
            storage_name, result.size, result.quality, result.dimensions
        );

        Ok(StoredImage {
            relative_url: Self::public_url(&storage_name),
            storage_name,
            absolute_path,
            size: result.size,
        })
    }

    /// Compresses `bytes` under `policy` and stores the output.
    ///
    /// Nothing is written when the input fails to decode.
    pub fn compress_and_store(
        &self,
        bytes: &[u8],
        original_filename: &str,
        policy: &CompressionPolicy,
    ) -> Result<(StoredImage, CompressionResult)> {
        let result = compress(bytes, original_filename, policy)?;
        let stored = self.store(original_filename, &result)?;
        Ok((stored, result))
    }

    /// Removes a stored image by filename or URL. Never fails; every outcome
    /// other than `Deleted` is logged.
    pub fn delete_by_reference(&self, reference: &str) -> DeleteOutcome {
        let name = match sanitize_reference(reference) {
            Ok(name) => name,
            Err(rejection) => {
                warn!("Invalid image reference {:?}: {:?}", reference, rejection);
                return DeleteOutcome::Rejected(rejection);
            }
        };

        let path = self.root.join(&name);
        match fs::symlink_metadata(&path) {
            Ok(metadata) if metadata.is_file() || metadata.file_type().is_symlink() => {}
            Ok(_) => {
                warn!("Image reference {:?} is not a file", reference);
                return DeleteOutcome::Rejected(ReferenceRejection::InvalidName);
            }
            Err(_) => {
                warn!("Image file not found: {} (from: {})", name, reference);
                return DeleteOutcome::NotFound;
            }
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted image: {}", name);
                DeleteOutcome::Deleted
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Image file vanished before delete: {}", name);
                DeleteOutcome::NotFound
            }
            Err(e) => {
                error!("Error deleting image {}: {}", reference, e);
                DeleteOutcome::Failed
            }
        }
    }

    /// Fire-and-forget delete on the blocking pool. Must be called from
    /// within a Tokio runtime; the handle may be dropped.
    pub fn delete_in_background(&self, reference: impl Into<String>) -> JoinHandle<DeleteOutcome> {
        let store = self.clone();
        let reference = reference.into();
        tokio::task::spawn_blocking(move || store.delete_by_reference(&reference))
    }
}
