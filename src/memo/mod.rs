//! The memoization adapter: a thin wrapper that turns a function's result
//! into a value that flows through the cache core. The adapter holds only
//! what it needs to compute an identifier — a [`Cache`][crate::Cache]
//! handle, and, for [`ArgMemoizer`], a stable function name — and calls
//! only `contains`/`get`/`put`/`update` on it.

mod arg;
mod tag;

pub use arg::ArgMemoizer;
pub use tag::TagMemoizer;

use serde::{de::DeserializeOwned, Serialize};

use crate::core::Cache;
use crate::error::{CacheError, Result};
use crate::size::Measure;

/// Resolves one memoized call: returns the cached hit unless `update_cache`
/// forces recomputation, in which case the wrapped function runs and its
/// result is written through, creating the entry if it was absent.
pub(crate) fn resolve<V>(cache: &Cache<V>, id: &str, update_cache: bool, compute: impl FnOnce() -> V) -> Result<V>
where
    V: Measure + Serialize + DeserializeOwned + Clone,
{
    if !update_cache {
        match cache.get(id) {
            Ok(value) => return Ok(value),
            Err(CacheError::NotFound(_)) => {}
            Err(other) => return Err(other),
        }
    }

    let value = compute();
    match cache.update(id, value.clone()) {
        Ok(()) => {}
        Err(CacheError::NotFound(_)) => cache.put(id, value.clone())?,
        Err(other) => return Err(other),
    }
    Ok(value)
}
