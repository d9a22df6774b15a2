//! Cache Configuration Module
//!
//! Configuration structures for the bounded map and the memoizing wrapper.
//! Like the rest of the crate, configs are plain structs with public fields:
//! build them with a struct literal, usually on top of `Default`.
//!
//! | Config | Used by | Description |
//! |--------|---------|-------------|
//! | `BoundedMapConfig` | [`BoundedOrderedMap`](crate::BoundedOrderedMap) | Entry capacity |
//! | `MemoConfig` | [`MemoizedFn`](crate::MemoizedFn) | Designated argument and both capacities |
//! | `CapacityBounds` | [`MemoConfig`] | Clamping range for requested capacities |
//!
//! # Examples
//!
//! ```
//! use cache_by_key::config::MemoConfig;
//!
//! let config = MemoConfig {
//!     hash_arg: "n".into(),
//!     max_primary_size: 3,
//!     max_secondary_size: 1,
//!     ..MemoConfig::default()
//! };
//! assert_eq!(config.primary_capacity().get(), 3);
//! ```

pub mod bounded;
pub mod memo;

pub use bounded::BoundedMapConfig;
pub use memo::{
    CapacityBounds, MemoConfig, DEFAULT_PRIMARY_SIZE, DEFAULT_SECONDARY_SIZE, MAX_PRIMARY_SIZE,
    MAX_SECONDARY_SIZE, MIN_PRIMARY_SIZE, MIN_SECONDARY_SIZE,
};
