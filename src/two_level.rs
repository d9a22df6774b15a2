//! Two-Level Cache
//!
//! An outer [`BoundedOrderedMap`] from primary key to an inner
//! [`BoundedOrderedMap`] from secondary key to value.
//!
//! ```text
//! ┌──────────────────────────── outer (max_primary) ───────────────────────────┐
//! │  p1 ──▶ ┌ inner (max_secondary) ┐   p2 ──▶ ┌ inner ┐   p3 ──▶ ┌ inner ┐   │
//! │         │ s1 → v   s2 → v  ...  │           │ s → v │           │ s → v │   │
//! │         └───────────────────────┘           └───────┘           └───────┘   │
//! └─────────────────────────────────────────────────────────────────────────────┘
//!   oldest primary key                                      newest primary key
//! ```
//!
//! The same primary key always routes to the same inner cache, and each inner
//! cache evicts independently, so a busy primary key cannot push out entries
//! stored under another one. Inner caches are created on the first store for
//! their primary key and dropped when that key is evicted, removed, or the
//! whole cache is cleared.
//!
//! Both levels use insertion order: storing into an existing inner cache does
//! not refresh the primary key's position.

extern crate alloc;

use crate::bounded::BoundedOrderedMap;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::num::NonZeroUsize;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

/// Eviction counters for both levels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvictionCounts {
    /// Whole inner caches dropped because the outer map was full.
    pub primary: u64,
    /// Single entries dropped because their inner cache was full.
    pub secondary: u64,
}

/// A bounded map of bounded maps.
///
/// # Examples
///
/// ```
/// use cache_by_key::TwoLevelCache;
/// use core::num::NonZeroUsize;
///
/// let mut cache = TwoLevelCache::new(
///     NonZeroUsize::new(2).unwrap(),
///     NonZeroUsize::new(2).unwrap(),
/// );
/// cache.store("user:1", "profile", 10);
/// cache.store("user:1", "orders", 11);
/// cache.store("user:2", "profile", 20);
///
/// assert_eq!(cache.lookup(&"user:1", &"orders"), Some(&11));
/// assert_eq!(cache.size(), 2);
/// assert_eq!(cache.entry_count(), 3);
///
/// // A third primary key evicts the oldest one with all of its entries
/// cache.store("user:3", "profile", 30);
/// assert_eq!(cache.lookup(&"user:1", &"profile"), None);
/// ```
pub struct TwoLevelCache<P, Q, V, S = DefaultHashBuilder> {
    outer: BoundedOrderedMap<P, BoundedOrderedMap<Q, V, S>, S>,
    secondary_cap: NonZeroUsize,
    hash_builder: S,
    evictions: EvictionCounts,
}

impl<P: Hash + Eq + Clone, Q: Hash + Eq + Clone, V> TwoLevelCache<P, Q, V> {
    /// Creates an empty cache with the given capacities.
    pub fn new(primary_cap: NonZeroUsize, secondary_cap: NonZeroUsize) -> Self {
        Self::with_hasher(primary_cap, secondary_cap, DefaultHashBuilder::default())
    }
}

impl<P, Q, V, S> TwoLevelCache<P, Q, V, S>
where
    P: Hash + Eq + Clone,
    Q: Hash + Eq + Clone,
    S: BuildHasher + Clone,
{
    /// Creates an empty cache whose maps all use clones of `hash_builder`.
    pub fn with_hasher(
        primary_cap: NonZeroUsize,
        secondary_cap: NonZeroUsize,
        hash_builder: S,
    ) -> Self {
        TwoLevelCache {
            outer: BoundedOrderedMap::with_hasher(primary_cap, hash_builder.clone()),
            secondary_cap,
            hash_builder,
            evictions: EvictionCounts::default(),
        }
    }

    /// Maximum number of primary keys.
    #[inline]
    pub fn primary_cap(&self) -> NonZeroUsize {
        self.outer.cap()
    }

    /// Maximum number of entries per primary key.
    #[inline]
    pub fn secondary_cap(&self) -> NonZeroUsize {
        self.secondary_cap
    }

    /// Number of resident primary keys.
    ///
    /// This counts inner caches, not cached values; see
    /// [`entry_count`](Self::entry_count) for the latter.
    #[inline]
    pub fn size(&self) -> usize {
        self.outer.len()
    }

    /// Returns `true` if no primary key is resident.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }

    /// Total number of cached values across all inner caches.
    pub fn entry_count(&self) -> usize {
        self.outer.iter().map(|(_, inner)| inner.len()).sum()
    }

    /// Eviction counters since creation or the last [`clear`](Self::clear).
    #[inline]
    pub fn evictions(&self) -> EvictionCounts {
        self.evictions
    }

    /// Returns `true` if an inner cache exists for `primary`.
    pub fn contains<P2>(&self, primary: &P2) -> bool
    where
        P: Borrow<P2>,
        P2: ?Sized + Hash + Eq,
    {
        self.outer.contains(primary)
    }

    /// Read-only view of the inner cache for `primary`.
    pub fn inner<P2>(&self, primary: &P2) -> Option<&BoundedOrderedMap<Q, V, S>>
    where
        P: Borrow<P2>,
        P2: ?Sized + Hash + Eq,
    {
        self.outer.get(primary)
    }

    /// Returns the value stored under both keys.
    ///
    /// Absence at either level is a plain `None`.
    pub fn lookup<P2, Q2>(&self, primary: &P2, secondary: &Q2) -> Option<&V>
    where
        P: Borrow<P2>,
        P2: ?Sized + Hash + Eq,
        Q: Borrow<Q2>,
        Q2: ?Sized + Hash + Eq,
    {
        self.outer.get(primary)?.get(secondary)
    }

    /// Stores `value` under `primary` and `secondary`.
    ///
    /// The inner cache for `primary` is created on demand, which may evict the
    /// oldest primary key. Storing into the inner cache may in turn evict its
    /// oldest entry.
    pub fn store(&mut self, primary: P, secondary: Q, value: V) {
        if let Some(inner) = self.outer.get_mut(&primary) {
            if inner.put(secondary, value).is_some() {
                self.evictions.secondary += 1;
                tracing::trace!("inner cache full, evicted oldest signature");
            }
            return;
        }

        let mut inner =
            BoundedOrderedMap::with_hasher(self.secondary_cap, self.hash_builder.clone());
        inner.put(secondary, value);
        tracing::debug!(resident = self.outer.len(), "allocating inner cache");
        if let Some((_, dropped)) = self.outer.put(primary, inner) {
            self.evictions.primary += 1;
            tracing::trace!(
                dropped_entries = dropped.len(),
                "outer cache full, evicted oldest primary key"
            );
        }
    }

    /// Drops the inner cache for `primary` and everything in it.
    ///
    /// Returns `false` if there was none.
    pub fn remove<P2>(&mut self, primary: &P2) -> bool
    where
        P: Borrow<P2>,
        P2: ?Sized + Hash + Eq,
    {
        self.outer.remove(primary).is_some()
    }

    /// Drops every inner cache and resets the eviction counters.
    pub fn clear(&mut self) {
        self.outer.clear();
        self.evictions = EvictionCounts::default();
    }

    /// Iterates primary keys from oldest to newest.
    pub fn primary_keys(&self) -> impl Iterator<Item = &P> + '_ {
        self.outer.keys()
    }
}

impl<P, Q, V, S> fmt::Debug for TwoLevelCache<P, Q, V, S>
where
    P: Hash + Eq + Clone + fmt::Debug,
    Q: Hash + Eq + Clone,
    S: BuildHasher + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoLevelCache")
            .field("primary_cap", &self.outer.cap())
            .field("secondary_cap", &self.secondary_cap)
            .field("primary_keys", &self.outer.keys().collect::<Vec<_>>())
            .field("evictions", &self.evictions)
            .finish()
    }
}
