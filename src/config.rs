//! Unit conversion between the public construction boundary (megabytes) and
//! the internal byte accounting.

/// `memory_limit`/`serialize_limit` are given in megabytes at the public
/// boundary and converted internally to bytes.
pub const BYTES_PER_MEGABYTE: u64 = 1_048_576;
