//! Configuration for [`BoundedOrderedMap`](crate::BoundedOrderedMap).

use core::fmt;
use core::num::NonZeroUsize;

/// Configuration for a bounded, insertion-ordered map.
///
/// The capacity is a `NonZeroUsize`: a map that evicts every entry on
/// insertion cannot be built. Use [`BoundedMapConfig::clamped`] to turn an
/// arbitrary request into a valid config.
///
/// # Examples
///
/// ```
/// use cache_by_key::config::BoundedMapConfig;
/// use cache_by_key::BoundedOrderedMap;
/// use core::num::NonZeroUsize;
///
/// let config = BoundedMapConfig {
///     capacity: NonZeroUsize::new(100).unwrap(),
/// };
/// let map: BoundedOrderedMap<u32, u32> = BoundedOrderedMap::init(config, None);
/// assert_eq!(map.cap().get(), 100);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BoundedMapConfig {
    /// Maximum number of resident entries.
    pub capacity: NonZeroUsize,
}

impl BoundedMapConfig {
    /// Builds a config from a requested capacity, raising 0 to 1.
    pub fn clamped(capacity: usize) -> Self {
        Self {
            capacity: NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl fmt::Debug for BoundedMapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedMapConfig")
            .field("capacity", &self.capacity)
            .finish()
    }
}
