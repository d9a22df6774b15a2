//! # cache-by-key
//!
//! Memoization keyed on one designated argument, with a bounded two-level
//! cache underneath.
//!
//! Many repeatedly invoked functions share an identifying argument (a user
//! id, a recursion index) while differing in the rest of their signature.
//! `cache-by-key` groups cached results by the value of that argument and
//! bounds both the number of groups and the number of results per group:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ MemoizedFn                                                          │
//! │   invoke(args) ──▶ primary = args[hash_arg]   secondary = sha224(…)  │
//! │                        │                           │                 │
//! │   TwoLevelCache        ▼                           ▼                 │
//! │   ┌──────────── outer: BoundedOrderedMap<primary, inner> ─────────┐  │
//! │   │  inner: BoundedOrderedMap<secondary, value>  (one per primary) │  │
//! │   └────────────────────────────────────────────────────────────────┘  │
//! │   hits / misses                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction is insertion-ordered
//!
//! Both levels evict the entry that was inserted first. Reading an entry, or
//! storing another result under an already resident primary key, never moves
//! it back in line. This is FIFO, not LRU.
//!
//! ## Quick Reference
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BoundedOrderedMap`] | Fixed-capacity map evicting the oldest insertion |
//! | [`TwoLevelCache`] | Bounded map of bounded maps |
//! | [`MemoizedFn`] | Computation plus cache plus hit/miss counters |
//! | [`CallArgs`] | Positional and keyword arguments of one call |
//! | [`config::MemoConfig`] | Designated argument and capacities |
//!
//! ## Example
//!
//! ```rust
//! use cache_by_key::config::MemoConfig;
//! use cache_by_key::{memoize, CallArgs, MemoizedFn};
//!
//! let config = MemoConfig {
//!     hash_arg: "n".into(),
//!     max_primary_size: 3,
//!     max_secondary_size: 1,
//!     ..MemoConfig::default()
//! };
//! let mut fib: MemoizedFn<u64> = memoize(config, |memo, args| {
//!     let n = args.get_kwarg("n").and_then(|v| v.as_int()).unwrap_or(0);
//!     if n <= 1 {
//!         return Ok(n as u64);
//!     }
//!     Ok(memo.invoke(&CallArgs::new().kwarg("n", n - 1))?
//!         + memo.invoke(&CallArgs::new().kwarg("n", n - 2))?)
//! });
//!
//! assert_eq!(fib.invoke(&CallArgs::new().kwarg("n", 10)), Ok(55));
//! let first = fib.stats();
//! assert_eq!(fib.invoke(&CallArgs::new().kwarg("n", 10)), Ok(55));
//! assert_eq!(fib.stats().cache_hit, first.cache_hit + 1);
//! ```
//!
//! ## Keying rules
//!
//! - The designated argument is looked up by keyword only. A call passing it
//!   positionally lands in the shared [`PrimaryKey::NoKey`] group.
//! - Values that cannot be map keys (lists, maps) are keyed by their
//!   canonical text instead. Floats key by value, so `1.5` and `"1.5"` stay
//!   apart while `2.0` and `2` share a group.
//! - Out-of-range capacities are clamped, never rejected.
//!
//! ## Features
//!
//! - `hashbrown` (default): use `hashbrown` maps; without it the `std`
//!   collections are used.
//! - `std`: link the standard library.
//! - `serde`: `Serialize` for [`CacheInfo`] and argument types.

#![no_std]

extern crate alloc;

#[cfg(any(feature = "std", not(feature = "hashbrown")))]
extern crate std;

/// Insertion-ordered doubly linked list backing [`BoundedOrderedMap`].
///
/// Internal: it hands out raw node pointers whose validity the map maintains.
pub(crate) mod list;

/// Configuration structures.
pub mod config;

/// Fixed-capacity map with insertion-order eviction.
pub mod bounded;

/// Two-level cache built from bounded maps.
pub mod two_level;

/// Argument values and cache key derivation.
pub mod key;

/// Hit/miss counters and metrics reporting.
pub mod metrics;

/// The memoizing wrapper.
pub mod memo;

pub use bounded::BoundedOrderedMap;
pub use key::{ArgValue, CallArgs, HashKey, PrimaryKey, SecondaryKey};
pub use memo::{memoize, Computation, Invoke, Memo, MemoizedFn};
pub use metrics::{CacheInfo, CacheMetrics, MemoMetrics};
pub use two_level::{EvictionCounts, TwoLevelCache};
