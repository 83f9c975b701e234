use serde::{de::DeserializeOwned, Serialize};

use crate::codec;
use crate::error::CacheError;
use crate::size::{serialized_size, Measure};

/// An entry's payload: either a live value, or an opaque serialized byte
/// blob produced once the value crossed `serialize_threshold_bytes`.
///
/// The "is this serialized" flag is the enum discriminant rather than a
/// separate bool, so "a serialized entry has no live value" holds at the
/// type level.
pub(crate) enum Payload<V> {
    Live(V),
    Serialized(Vec<u8>),
}

/// One stored entry: its payload and the byte charge it carries against
/// `total_charged_bytes`. Policy metadata (recency/frequency bookkeeping)
/// lives in the order/frequency table, not here, since it is specific to
/// the active eviction mode.
pub(crate) struct Entry<V> {
    pub(crate) payload: Payload<V>,
    pub(crate) charged_bytes: u64,
}

impl<V> Entry<V>
where
    V: Measure + Serialize + DeserializeOwned + Clone,
{
    /// Prepares the payload and charge for a value about to be admitted,
    /// applying the serialize-on-threshold rule.
    pub(crate) fn prepare(id: &str, value: V, serialize_threshold_bytes: u64) -> Result<Self, CacheError> {
        let live_size = value.measure();

        if serialize_threshold_bytes > 0 && live_size >= serialize_threshold_bytes {
            let bytes = codec::encode(id, &value)?;
            let charged_bytes = serialized_size(&bytes);
            Ok(Self {
                payload: Payload::Serialized(bytes),
                charged_bytes,
            })
        } else {
            Ok(Self {
                payload: Payload::Live(value),
                charged_bytes: live_size,
            })
        }
    }

    /// Returns the live value, deserializing from the stored blob if
    /// necessary. The stored form is left untouched either way — a
    /// serialized entry stays serialized across repeated reads.
    pub(crate) fn value(&self, id: &str) -> Result<V, CacheError> {
        match &self.payload {
            Payload::Live(v) => Ok(v.clone()),
            Payload::Serialized(bytes) => codec::decode(id, bytes),
        }
    }
}
