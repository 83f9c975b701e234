use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::config::BYTES_PER_MEGABYTE;
use crate::core::cache::Cache;
use crate::error::{CacheError, Result};
use crate::policy::Mode;
use crate::size::Measure;

/// Builds a [`Cache`] with various configuration knobs: `memory_limit`
/// (megabytes, positive), `mode` (`"LRU"`/`"LRA"`/`"LFU"`), and
/// `serialize_limit` (megabytes, zero disables serialization).
///
/// # Examples
///
/// ```
/// use boundedcache::Cache;
///
/// let cache: Cache<String> = Cache::builder()
///     .memory_limit_mb(64)
///     .mode("LRU")
///     .build()
///     .unwrap();
/// ```
#[must_use]
pub struct CacheBuilder<V> {
    memory_limit_mb: Option<u64>,
    mode: Option<String>,
    serialize_limit_mb: u64,
    _marker: PhantomData<V>,
}

impl<V> Default for CacheBuilder<V> {
    fn default() -> Self {
        Self {
            memory_limit_mb: None,
            mode: None,
            serialize_limit_mb: 0,
            _marker: PhantomData,
        }
    }
}

impl<V> CacheBuilder<V>
where
    V: Measure + Serialize + DeserializeOwned + Clone,
{
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets `memory_limit`, in megabytes. Required: must be strictly
    /// positive.
    pub fn memory_limit_mb(mut self, megabytes: u64) -> Self {
        self.memory_limit_mb = Some(megabytes);
        self
    }

    /// Sets the eviction `mode`: one of `"LRU"`, `"LRA"`, `"LFU"`. Required.
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Sets `serialize_limit`, in megabytes. Zero (the default) disables
    /// serialization.
    pub fn serialize_limit_mb(mut self, megabytes: u64) -> Self {
        self.serialize_limit_mb = megabytes;
        self
    }

    /// Validates the accumulated parameters and builds the [`Cache`].
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidMode`] if `mode` was never set or is not
    /// one of `"LRU"`/`"LRA"`/`"LFU"`, and [`CacheError::InvalidLimit`] if
    /// `memory_limit` is missing, zero, or `serialize_limit` would overflow
    /// the byte conversion.
    pub fn build(self) -> Result<Cache<V>> {
        let mode: Mode = self
            .mode
            .ok_or_else(|| CacheError::InvalidMode("mode was not set".to_string()))?
            .parse()?;

        let memory_limit_mb = self
            .memory_limit_mb
            .ok_or_else(|| CacheError::InvalidLimit("memory_limit was not set".to_string()))?;
        if memory_limit_mb == 0 {
            return Err(CacheError::InvalidLimit(
                "memory_limit must be a positive number of megabytes".to_string(),
            ));
        }

        let memory_limit_bytes = memory_limit_mb
            .checked_mul(BYTES_PER_MEGABYTE)
            .ok_or_else(|| CacheError::InvalidLimit("memory_limit overflows bytes".to_string()))?;
        let serialize_threshold_bytes = self
            .serialize_limit_mb
            .checked_mul(BYTES_PER_MEGABYTE)
            .ok_or_else(|| CacheError::InvalidLimit("serialize_limit overflows bytes".to_string()))?;

        Ok(Cache::from_parts(mode, memory_limit_bytes, serialize_threshold_bytes))
    }
}
