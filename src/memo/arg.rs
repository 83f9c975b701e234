use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{de::DeserializeOwned, Serialize};

use crate::codec;
use crate::core::Cache;
use crate::error::Result;
use crate::memo::resolve;
use crate::size::Measure;

/// Argument-keyed memoization: the identifier is derived from a stable name
/// for the wrapped function plus a canonical fingerprint of its arguments,
/// so the client never sees — and must not rely on — the identifier under
/// which a result is stored.
pub struct ArgMemoizer<V> {
    cache: Cache<V>,
    function_name: String,
}

impl<V> ArgMemoizer<V>
where
    V: Measure + Serialize + DeserializeOwned + Clone,
{
    /// Creates a memoizer for the function named `function_name`.
    pub fn new(cache: Cache<V>, function_name: impl Into<String>) -> Self {
        Self {
            cache,
            function_name: function_name.into(),
        }
    }

    /// Returns the cached result for `args`, computing it on a miss and on
    /// every call once `update_cache` is `true`. `args` is any
    /// `Serialize`-able tuple-like value representing the wrapped
    /// function's positional and keyword arguments, with `update_cache`
    /// already stripped by the caller.
    pub fn call<A>(&self, args: &A, update_cache: bool, compute: impl FnOnce() -> V) -> Result<V>
    where
        A: Serialize,
    {
        let id = self.identifier(args)?;
        resolve(&self.cache, &id, update_cache, compute)
    }

    /// Derives the storage identifier for a given argument tuple: the
    /// function name, followed by a hex-encoded hash of the arguments'
    /// canonical `bincode` encoding. Two calls with equal arguments always
    /// fingerprint to the same identifier.
    fn identifier<A>(&self, args: &A) -> Result<String>
    where
        A: Serialize,
    {
        let encoded = codec::encode(&self.function_name, args)?;
        let mut hasher = DefaultHasher::new();
        encoded.hash(&mut hasher);
        Ok(format!("{}#{:016x}", self.function_name, hasher.finish()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn cache() -> Cache<i64> {
        Cache::builder()
            .memory_limit_mb(1)
            .mode("LRU")
            .build()
            .unwrap()
    }

    #[test]
    fn equal_arguments_fingerprint_to_the_same_identifier() {
        let memoizer = ArgMemoizer::<i64>::new(cache(), "f");
        let a = memoizer.identifier(&(1_i64, "hi".to_string())).unwrap();
        let b = memoizer.identifier(&(1_i64, "hi".to_string())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_arguments_fingerprint_differently() {
        let memoizer = ArgMemoizer::<i64>::new(cache(), "f");
        let a = memoizer.identifier(&(1_i64, "hi".to_string())).unwrap();
        let b = memoizer.identifier(&(2_i64, "hi".to_string())).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn forced_refresh_scenario() {
        let memoizer = ArgMemoizer::new(cache(), "f");
        let calls = Cell::new(0_i64);
        let args = (1_i64, "hi".to_string());
        let compute = || {
            calls.set(calls.get() + 1);
            calls.get()
        };

        assert_eq!(memoizer.call(&args, false, compute).unwrap(), 1);
        assert_eq!(memoizer.call(&args, false, compute).unwrap(), 1);
        assert_eq!(memoizer.call(&args, true, compute).unwrap(), 2);
        assert_eq!(memoizer.call(&args, false, compute).unwrap(), 2);
    }
}
