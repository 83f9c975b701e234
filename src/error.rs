use thiserror::Error;

/// Errors produced by the cache core and its adapters.
///
/// All errors are reported synchronously; there is no internal retry. A
/// `get`/`update`/`delete` miss is always [`CacheError::NotFound`], never a
/// silently-returned sentinel.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no entry found for id {0:?}")]
    NotFound(String),

    #[error("invalid mode: {0}")]
    InvalidMode(String),

    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    #[error("value for id {id:?} needs {needed} bytes, which exceeds the memory limit of {limit} bytes")]
    CapacityExceeded {
        id: String,
        needed: u64,
        limit: u64,
    },

    #[error("serialization failed for id {id:?}: {source}")]
    SerializationFailure {
        id: String,
        #[source]
        source: bincode::Error,
    },
}

pub type Result<T> = std::result::Result<T, CacheError>;
