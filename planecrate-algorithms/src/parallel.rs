//! Bounded worker pool for the embarrassingly parallel stages
//!
//! Every parallel loop here writes one output slot per stable element id, so
//! no locking is needed. Collecting the results is the barrier between loops.

use planecrate_core::{Error, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

/// Thread pool configuration for parallel processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadPoolConfig {
    /// Number of threads to use (None = automatic)
    pub num_threads: Option<usize>,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Enable parallel processing (can be disabled for debugging)
    pub enabled: bool,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: "planecrate".to_string(),
            enabled: true,
        }
    }
}

impl ThreadPoolConfig {
    /// Set number of threads
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Enable or disable parallel processing
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_threads == Some(0) {
            return Err(Error::InvalidParameter("thread count must be positive".to_string()));
        }
        Ok(())
    }
}

/// A rayon pool sized by [`ThreadPoolConfig`], or sequential execution when disabled
pub struct WorkerPool {
    pool: Option<ThreadPool>,
}

impl WorkerPool {
    pub fn new(config: &ThreadPoolConfig) -> Result<Self> {
        config.validate()?;
        if !config.enabled {
            return Ok(Self::sequential());
        }

        let mut builder = ThreadPoolBuilder::new();
        if let Some(num_threads) = config.num_threads {
            builder = builder.num_threads(num_threads);
        }
        if !config.thread_name_prefix.is_empty() {
            let prefix = config.thread_name_prefix.clone();
            builder = builder.thread_name(move |index| format!("{}-{}", prefix, index));
        }

        let pool = builder
            .build()
            .map_err(|e| Error::Algorithm(format!("Failed to create thread pool: {}", e)))?;
        Ok(Self { pool: Some(pool) })
    }

    /// Pool that runs everything on the calling thread
    pub fn sequential() -> Self {
        Self { pool: None }
    }

    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    pub fn current_num_threads(&self) -> usize {
        self.pool.as_ref().map_or(1, |pool| pool.current_num_threads())
    }

    /// Evaluate `f` for every id in `0..count`; output slot `i` holds `f(i)`.
    pub fn map_indexed<U, F>(&self, count: usize, f: F) -> Vec<U>
    where
        U: Send,
        F: Fn(usize) -> U + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| (0..count).into_par_iter().map(&f).collect()),
            None => (0..count).map(f).collect(),
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.current_num_threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_pool_config() {
        let config = ThreadPoolConfig::default().with_threads(4).with_enabled(true);

        assert_eq!(config.num_threads, Some(4));
        assert!(config.enabled);
        assert!(config.validate().is_ok());
        assert!(ThreadPoolConfig::default().with_threads(0).validate().is_err());
    }

    #[test]
    fn test_map_indexed_keeps_order() {
        let pool = WorkerPool::new(&ThreadPoolConfig::default().with_threads(3)).unwrap();
        assert_eq!(pool.current_num_threads(), 3);
        let squares = pool.map_indexed(1000, |i| i * i);
        assert_eq!(squares.len(), 1000);
        assert!(squares.iter().enumerate().all(|(i, &s)| s == i * i));
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let parallel = WorkerPool::new(&ThreadPoolConfig::default()).unwrap();
        let sequential = WorkerPool::new(&ThreadPoolConfig::default().with_enabled(false)).unwrap();
        assert!(!sequential.is_parallel());
        let f = |i: usize| (i as f64).sqrt();
        assert_eq!(parallel.map_indexed(257, f), sequential.map_indexed(257, f));
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: ThreadPoolConfig = serde_json::from_str(r#"{"num_threads": 2}"#).unwrap();
        assert_eq!(config.num_threads, Some(2));
        assert!(config.enabled);
        assert_eq!(config.thread_name_prefix, "planecrate");
    }
}
