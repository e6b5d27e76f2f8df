use crate::error::{ConfigError, Result};
use crate::reader::DEFAULT_CAPACITY;

/// Settings of a split run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    /// Largest edit distance accepted by the fuzzy pass (0 disables it)
    pub max_mismatch: i32,

    /// Number of records decoded per pipeline iteration
    pub buffer_capacity: usize,

    /// Number of threads matching a buffer
    pub worker_count: usize,
}
impl SplitConfig {
    /// Builds a validated configuration
    pub fn new(max_mismatch: i32, buffer_capacity: usize, worker_count: usize) -> Result<Self> {
        let config = Self {
            max_mismatch,
            buffer_capacity,
            worker_count,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_mismatch < 0 {
            return Err(ConfigError::NegativeMismatch(self.max_mismatch).into());
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::EmptyBuffer.into());
        }
        if self.worker_count == 0 {
            return Err(ConfigError::NoWorkers.into());
        }
        Ok(())
    }
}
impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_mismatch: 0,
            buffer_capacity: DEFAULT_CAPACITY,
            worker_count: 1,
        }
    }
}
