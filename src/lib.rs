pub mod batch;
pub mod cli;
pub mod compress;
pub mod constants;
pub mod dimensions;
pub mod encoder;
pub mod error;
pub mod finalizer;
pub mod info;
pub mod logger;
pub mod planner;
pub mod policy;
pub mod probe;
pub mod result;
pub mod search;
pub mod storage;
pub mod utils;
pub mod validation;
pub mod worker;

pub use batch::{batch_compress_images, collect_image_files, BatchSummary};
pub use compress::{compress, compress_with};
pub use dimensions::Dimensions;
pub use encoder::{Encoder, JpegReencoder};
pub use error::{CompressionError, Result};
pub use finalizer::finalize;
pub use info::{describe, ImageReport};
pub use planner::plan;
pub use policy::CompressionPolicy;
pub use probe::{probe, ImageMetadata};
pub use result::{Attempt, CompressionResult};
pub use search::{next_knobs, search, Knobs, SearchOutcome, SearchState};
pub use storage::{generate_storage_name, DeleteOutcome, ImageStore, StoredImage};
pub use validation::{sanitize_reference, ReferenceRejection};
pub use worker::CompressionPool;
