use serde::{de::DeserializeOwned, Serialize};

use crate::core::Cache;
use crate::error::Result;
use crate::memo::resolve;
use crate::size::Measure;

/// Tag-keyed memoization: the wrapped function's result is stored under a
/// fixed, client-known identifier. Because the identifier is known to the
/// client, it may also read or overwrite the entry directly through the
/// underlying [`Cache`].
pub struct TagMemoizer<V> {
    cache: Cache<V>,
    tag: String,
}

impl<V> TagMemoizer<V>
where
    V: Measure + Serialize + DeserializeOwned + Clone,
{
    /// Creates a memoizer that stores its result under `tag` in `cache`.
    pub fn new(cache: Cache<V>, tag: impl Into<String>) -> Self {
        Self {
            cache,
            tag: tag.into(),
        }
    }

    /// Returns the identifier this memoizer reads and writes, so the
    /// caller can bypass the memoizer and use the core directly.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the cached result of `compute`, computing it on a miss and
    /// on every call once `update_cache` is `true`.
    pub fn call(&self, update_cache: bool, compute: impl FnOnce() -> V) -> Result<V> {
        resolve(&self.cache, &self.tag, update_cache, compute)
    }
}
