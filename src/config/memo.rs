//! Configuration for [`MemoizedFn`](crate::MemoizedFn).
//!
//! # Sizing
//!
//! A memoized function holds at most `max_primary_size` inner caches, one per
//! distinct value of the designated argument, and each inner cache holds at
//! most `max_secondary_size` results, one per distinct full call signature:
//!
//! ```text
//! resident results <= max_primary_size × max_secondary_size
//! ```
//!
//! For a recursion keyed on its only argument (Fibonacci on `n`) every primary
//! key sees exactly one signature, so `max_secondary_size = 1` is enough and
//! `max_primary_size` is the depth of the recursion window worth keeping.
//!
//! # Clamping
//!
//! Requested sizes are never rejected. Anything outside [`CapacityBounds`] is
//! moved to the nearest bound, and zero or negative requests become the
//! minimum (which is itself never below 1).

extern crate alloc;

use alloc::string::String;
use core::fmt;
use core::num::NonZeroUsize;

/// Default number of primary keys kept by a memoized function.
pub const DEFAULT_PRIMARY_SIZE: usize = 10;
/// Default number of signatures kept per primary key.
pub const DEFAULT_SECONDARY_SIZE: usize = 10;
/// Smallest primary capacity a config resolves to.
pub const MIN_PRIMARY_SIZE: usize = 1;
/// Largest primary capacity a config resolves to.
pub const MAX_PRIMARY_SIZE: usize = 1024;
/// Smallest secondary capacity a config resolves to.
pub const MIN_SECONDARY_SIZE: usize = 1;
/// Largest secondary capacity a config resolves to.
pub const MAX_SECONDARY_SIZE: usize = 1024;

/// Inclusive range that requested capacities are clamped into.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CapacityBounds {
    /// Lower bound for the primary capacity.
    pub min_primary: usize,
    /// Upper bound for the primary capacity.
    pub max_primary: usize,
    /// Lower bound for the secondary capacity.
    pub min_secondary: usize,
    /// Upper bound for the secondary capacity.
    pub max_secondary: usize,
}

impl CapacityBounds {
    /// Resolves a requested primary capacity.
    pub fn clamp_primary(&self, requested: isize) -> NonZeroUsize {
        clamp(requested, self.min_primary, self.max_primary)
    }

    /// Resolves a requested secondary capacity.
    pub fn clamp_secondary(&self, requested: isize) -> NonZeroUsize {
        clamp(requested, self.min_secondary, self.max_secondary)
    }
}

impl Default for CapacityBounds {
    fn default() -> Self {
        Self {
            min_primary: MIN_PRIMARY_SIZE,
            max_primary: MAX_PRIMARY_SIZE,
            min_secondary: MIN_SECONDARY_SIZE,
            max_secondary: MAX_SECONDARY_SIZE,
        }
    }
}

impl fmt::Debug for CapacityBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapacityBounds")
            .field("min_primary", &self.min_primary)
            .field("max_primary", &self.max_primary)
            .field("min_secondary", &self.min_secondary)
            .field("max_secondary", &self.max_secondary)
            .finish()
    }
}

// The upper bound wins over the lower one if they are given inverted, and the
// result is never below 1.
fn clamp(requested: isize, min: usize, max: usize) -> NonZeroUsize {
    let min = min.max(1);
    let max = max.max(1);
    let value = match usize::try_from(requested) {
        Ok(v) if v > max => max,
        Ok(v) if v >= min => v,
        _ => min.min(max),
    };
    NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN)
}

/// Configuration for a memoized function.
///
/// # Fields
///
/// - `hash_arg`: keyword name of the designated argument. Its value selects
///   the inner cache. Calls that do not pass it by keyword share one inner
///   cache under the no-key sentinel.
/// - `max_primary_size`: requested number of inner caches.
/// - `max_secondary_size`: requested entries per inner cache.
/// - `bounds`: clamping range for the two requested sizes.
///
/// # Examples
///
/// ```
/// use cache_by_key::config::MemoConfig;
///
/// // Out-of-range requests are corrected, not rejected
/// let config = MemoConfig {
///     hash_arg: "user_id".into(),
///     max_primary_size: -5,
///     max_secondary_size: 1_000_000,
///     ..MemoConfig::default()
/// };
/// assert_eq!(config.primary_capacity().get(), 1);
/// assert_eq!(config.secondary_capacity().get(), 1024);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct MemoConfig {
    /// Keyword name whose value is the primary key.
    pub hash_arg: String,
    /// Requested primary capacity, clamped into `bounds`.
    pub max_primary_size: isize,
    /// Requested secondary capacity, clamped into `bounds`.
    pub max_secondary_size: isize,
    /// Clamping range.
    pub bounds: CapacityBounds,
}

impl MemoConfig {
    /// Effective number of primary keys.
    pub fn primary_capacity(&self) -> NonZeroUsize {
        self.bounds.clamp_primary(self.max_primary_size)
    }

    /// Effective number of signatures per primary key.
    pub fn secondary_capacity(&self) -> NonZeroUsize {
        self.bounds.clamp_secondary(self.max_secondary_size)
    }
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            hash_arg: String::new(),
            max_primary_size: DEFAULT_PRIMARY_SIZE as isize,
            max_secondary_size: DEFAULT_SECONDARY_SIZE as isize,
            bounds: CapacityBounds::default(),
        }
    }
}

impl fmt::Debug for MemoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoConfig")
            .field("hash_arg", &self.hash_arg)
            .field("max_primary_size", &self.max_primary_size)
            .field("max_secondary_size", &self.max_secondary_size)
            .field("bounds", &self.bounds)
            .finish()
    }
}
