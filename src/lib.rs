#![warn(clippy::all)]
#![warn(rust_2018_idioms)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! `boundedcache` is a bounded-memory, in-process key-value cache with a
//! pluggable eviction policy.
//!
//! Clients store arbitrary values under string identifiers. When the total
//! estimated memory footprint of stored values would exceed a configured
//! limit, the cache evicts existing entries according to one of three
//! policies until the new entry fits:
//!
//! - **LRU** (Least Recently Used) — every read or write promotes an entry;
//!   the least-recently-touched entry is evicted first.
//! - **LRA** (Least Recently Added) — only writes promote an entry; reads
//!   never change eviction order.
//! - **LFU** (Least Frequently Used) — the entry with the lowest access
//!   frequency (ties broken by oldest access) is evicted first.
//!
//! An optional size threshold causes large values to be stored in a
//! serialized, opaque byte-blob form, transparently restored on read.
//!
//! # Features
//!
//! - Bounded by an estimated byte footprint, not an entry count.
//! - Three interchangeable eviction policies behind one [`Cache`] type.
//! - Optional serialize-on-threshold storage for large values.
//! - A thin [`memo`] adapter for memoizing pure functions through the core.
//!
//! # Examples
//!
//! ```
//! use boundedcache::Cache;
//!
//! let cache: Cache<String> = Cache::builder()
//!     .memory_limit_mb(1)
//!     .mode("LRU")
//!     .build()
//!     .unwrap();
//!
//! cache.put("greeting", "hello".to_string()).unwrap();
//! assert_eq!(cache.get("greeting").unwrap(), "hello");
//! ```
//!
//! # Minimum Supported Rust Version
//!
//! This crate's minimum supported Rust version (MSRV) is 1.76.0.

pub(crate) mod codec;
pub(crate) mod config;
pub mod core;
pub mod error;
pub mod memo;
pub(crate) mod policy;
pub(crate) mod size;

pub use crate::core::{Cache, CacheBuilder};
pub use crate::error::{CacheError, Result};
pub use crate::memo::{ArgMemoizer, TagMemoizer};
pub use crate::policy::{Mode, Policy};
pub use crate::size::Measure;

#[cfg(doctest)]
mod doctests {
    // https://doc.rust-lang.org/rustdoc/write-documentation/documentation-tests.html#include-items-only-when-collecting-doctests
    #[doc = include_str!("../README.md")]
    struct ReadMeDoctests;
}
