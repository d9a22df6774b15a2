//! Bounded Insertion-Ordered Map
//!
//! A fixed-capacity key-value map that remembers the order in which keys were
//! first inserted and, once full, evicts the oldest surviving key to make room
//! for a new one.
//!
//! # Algorithm
//!
//! Entries live in an insertion-ordered doubly linked list; a hash map points
//! from each key to its node. A new key is appended at the back and, if the map
//! is full, the node at the front is evicted first. Nothing else ever moves a
//! node:
//!
//! - `get` does not promote the entry (this is FIFO, not LRU)
//! - `put` on a resident key replaces the value in place and keeps the key's
//!   original eviction priority
//!
//! # Performance Characteristics
//!
//! - Get, Put, Remove: O(1)
//! - Memory: one list node plus one map slot per entry; keys are stored twice
//!
//! # Thread Safety
//!
//! Not thread-safe. Wrap it in a `Mutex` if it must be shared.

extern crate alloc;

use crate::config::BoundedMapConfig;
use crate::list::{Entry, List};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::num::NonZeroUsize;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// A capacity-limited map evicting the oldest-inserted entry on overflow.
///
/// # Examples
///
/// ```
/// use cache_by_key::BoundedOrderedMap;
///
/// let mut map = BoundedOrderedMap::with_capacity(2);
/// map.put("apple", 1);
/// map.put("banana", 2);
///
/// // Reading does not protect an entry from eviction
/// assert_eq!(map.get(&"apple"), Some(&1));
///
/// // "apple" was inserted first, so it goes first
/// map.put("cherry", 3);
/// assert_eq!(map.get(&"apple"), None);
/// assert_eq!(map.get(&"banana"), Some(&2));
/// assert_eq!(map.get(&"cherry"), Some(&3));
/// ```
pub struct BoundedOrderedMap<K, V, S = DefaultHashBuilder> {
    config: BoundedMapConfig,
    list: List<(K, V)>,
    map: HashMap<K, *mut Entry<(K, V)>, S>,
}

// SAFETY: the map owns every node its pointers refer to; moving the map moves
// ownership of all of them together.
unsafe impl<K: Send, V: Send, S: Send> Send for BoundedOrderedMap<K, V, S> {}

// SAFETY: every mutation goes through &mut self.
unsafe impl<K: Sync, V: Sync, S: Sync> Sync for BoundedOrderedMap<K, V, S> {}

impl<K: Hash + Eq, V> BoundedOrderedMap<K, V> {
    /// Creates a map holding at most `capacity` entries.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::init(BoundedMapConfig::clamped(capacity), None)
    }

    /// Creates a map holding at most `cap` entries.
    pub fn new(cap: NonZeroUsize) -> Self {
        Self::init(BoundedMapConfig { capacity: cap }, None)
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> BoundedOrderedMap<K, V, S> {
    /// Creates a map from a config and an optional hash builder.
    pub fn init(config: BoundedMapConfig, hasher: Option<S>) -> Self
    where
        S: Default,
    {
        Self::with_hasher(config.capacity, hasher.unwrap_or_default())
    }

    /// Creates a map holding at most `cap` entries with the given hash builder.
    pub fn with_hasher(cap: NonZeroUsize, hash_builder: S) -> Self {
        BoundedOrderedMap {
            config: BoundedMapConfig { capacity: cap },
            list: List::new(),
            map: HashMap::with_capacity_and_hasher(cap.get(), hash_builder),
        }
    }

    /// Maximum number of resident entries.
    #[inline]
    pub fn cap(&self) -> NonZeroUsize {
        self.config.capacity
    }

    /// Number of resident entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if nothing is resident.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the value stored under `key` without touching eviction order.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let node = self.map.get(key).copied()?;
        // SAFETY: node comes from our map, so it is a live value node
        unsafe { Some(&(*node).get_value().1) }
    }

    /// Mutable variant of [`get`](Self::get); also leaves order untouched.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let node = self.map.get(key).copied()?;
        // SAFETY: node comes from our map, and &mut self rules out aliasing
        unsafe { Some(&mut (*node).get_value_mut().1) }
    }

    /// Returns `true` if `key` is resident.
    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }

    /// Inserts or updates `key`.
    ///
    /// A resident key gets its value replaced in place and keeps its position
    /// in the eviction order. A new key is appended as the newest entry; if
    /// the map was full, the oldest entry is evicted first and returned.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)>
    where
        K: Clone,
    {
        if let Some(v) = self.get_mut(&key) {
            *v = value;
            return None;
        }

        let evicted = if self.map.len() >= self.cap().get() {
            self.pop_oldest()
        } else {
            None
        };

        let node = self.list.push_back((key.clone(), value));
        self.map.insert(key, node);
        evicted
    }

    /// Removes `key` and returns its value, or `None` if it was not resident.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let node = self.map.remove(key)?;
        // SAFETY: node came out of our map, so it is linked into our list
        let (_, value) = unsafe { self.list.unlink(node).into_value() };
        Some(value)
    }

    /// Removes and returns the oldest resident entry.
    pub fn pop_oldest(&mut self) -> Option<(K, V)> {
        let node = self.list.pop_front()?;
        // SAFETY: pop_front only yields value nodes
        let (key, value) = unsafe { node.into_value() };
        self.map.remove(&key);
        Some((key, value))
    }

    /// The entry that would be evicted next.
    pub fn oldest(&self) -> Option<(&K, &V)> {
        self.list.front().map(|(k, v)| (k, v))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.map.clear();
        self.list.clear();
    }

    /// Iterates entries from oldest to newest.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.list.iter(),
        }
    }

    /// Iterates keys from oldest to newest.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }
}

impl<K, V, S> fmt::Debug for BoundedOrderedMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedOrderedMap")
            .field("capacity", &self.config.capacity)
            .field("entries", &self.list)
            .finish()
    }
}

impl<'a, K: Hash + Eq, V, S: BuildHasher> IntoIterator for &'a BoundedOrderedMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Oldest-first iterator over a [`BoundedOrderedMap`].
pub struct Iter<'a, K, V> {
    inner: crate::list::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").finish_non_exhaustive()
    }
}
