pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

pub const MIB: usize = 1024 * 1024;

// Canonical compression schedule, shared by every call site.
pub const DEFAULT_MAX_BYTES: usize = MIB;
pub const PRE_UPLOAD_MAX_BYTES: usize = 2 * MIB;
pub const DEFAULT_MAX_DIMENSION: u32 = 1920;
pub const DEFAULT_INITIAL_QUALITY: u8 = 85;
pub const DEFAULT_QUALITY_FLOOR: u8 = 30;
pub const DEFAULT_QUALITY_STEP: u8 = 10;
pub const DEFAULT_FINE_QUALITY_STEP: u8 = 5;
pub const DEFAULT_RESET_QUALITY: u8 = 70;
pub const DEFAULT_DIMENSION_SHRINK_FACTOR: f64 = 0.9;
pub const DEFAULT_MIN_DIMENSION_BEFORE_QUALITY_RESET: u32 = 400;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;
pub const DEFAULT_FALLBACK_WIDTH: u32 = 800;
pub const DEFAULT_FALLBACK_HEIGHT: u32 = 800;
pub const DEFAULT_FALLBACK_QUALITY: u8 = 30;

/// Largest input file accepted from disk (matches the upload limit of the web service).
pub const MAX_INPUT_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const OUTPUT_MIME_TYPE: &str = "image/jpeg";
pub const OUTPUT_EXTENSION: &str = "jpg";

// Storage naming
pub const DEFAULT_STORAGE_EXTENSION: &str = "jpg";
pub const STORAGE_TOKEN_LEN: usize = 13;
pub const PUBLIC_URL_PREFIX: &str = "/images/";

pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "webp", "bmp", "tiff", "tif", "gif"];

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
