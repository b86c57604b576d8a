use crate::compress::compress;
use crate::error::{CompressionError, Result};
use crate::policy::CompressionPolicy;
use crate::result::CompressionResult;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

/// Bounded pool that runs whole compressions off the caller's thread.
///
/// One job is one full `compress` call; jobs never share state, so the pool
/// only bounds CPU usage.
pub struct CompressionPool {
    pool: ThreadPool,
    policy: Arc<CompressionPolicy>,
}

impl CompressionPool {
    /// Builds a pool with `threads` workers, or one per CPU core.
    pub fn new(policy: CompressionPolicy, threads: Option<usize>) -> Result<Self> {
        policy.validate()?;
        let num_threads = threads.unwrap_or_else(num_cpus::get).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("img-budget-{}", i))
            .build()
            .map_err(|e| CompressionError::WorkerPool(e.to_string()))?;

        debug!("Compression pool started with {} workers", num_threads);
        Ok(Self {
            pool,
            policy: Arc::new(policy),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn policy(&self) -> &CompressionPolicy {
        &self.policy
    }

    /// Runs `f` inside the pool, so rayon parallel iterators use its workers.
    pub fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        self.pool.install(f)
    }

    /// Compresses on a pool worker and blocks until done.
    pub fn compress(&self, bytes: &[u8], original_filename: &str) -> Result<CompressionResult> {
        let policy = &self.policy;
        self.pool
            .install(|| compress(bytes, original_filename, policy))
    }

    /// Compresses on a pool worker without blocking the async executor.
    pub async fn compress_async(
        &self,
        bytes: Vec<u8>,
        original_filename: String,
    ) -> Result<CompressionResult> {
        let (tx, rx) = oneshot::channel();
        let policy = Arc::clone(&self.policy);

        self.pool.spawn(move || {
            let result = compress(&bytes, &original_filename, &policy);
            // The receiver is gone when the caller gave up waiting.
            let _ = tx.send(result);
        });

        rx.await
            .map_err(|_| CompressionError::WorkerPool("worker dropped the job".to_string()))?
    }

    /// Like [`compress_async`](Self::compress_async) but abandons the result
    /// after `deadline`. The worker still runs the job to completion.
    pub async fn compress_with_deadline(
        &self,
        bytes: Vec<u8>,
        original_filename: String,
        deadline: Duration,
    ) -> Result<CompressionResult> {
        tokio::time::timeout(deadline, self.compress_async(bytes, original_filename))
            .await
            .map_err(|_| CompressionError::DeadlineExceeded(deadline))?
    }
}
