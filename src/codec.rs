//! The opaque serialization codec backing serialize-on-threshold storage.
//!
//! The format is private to this crate: no cross-process or cross-version
//! compatibility is promised. `bincode` is self-describing enough to decode
//! back into a statically-known `T: DeserializeOwned` without an external
//! schema.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::CacheError;

pub fn encode<V: Serialize>(id: &str, value: &V) -> Result<Vec<u8>, CacheError> {
    bincode::serialize(value).map_err(|source| CacheError::SerializationFailure {
        id: id.to_string(),
        source,
    })
}

pub fn decode<V: DeserializeOwned>(id: &str, bytes: &[u8]) -> Result<V, CacheError> {
    bincode::deserialize(bytes).map_err(|source| CacheError::SerializationFailure {
        id: id.to_string(),
        source,
    })
}
