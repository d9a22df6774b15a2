//! Memoized functions keyed on one designated argument.
//!
//! [`MemoizedFn`] owns a computation and a [`TwoLevelCache`]. Each call is
//! described by [`CallArgs`]; the value passed under the configured keyword
//! picks the inner cache and a digest of the whole call picks the entry:
//!
//! ```text
//! invoke(args)
//!   primary   = args[hash_arg] (made hashable)  | NoKey
//!   secondary = sha224(canonical_text(args))
//!   lookup(primary, secondary)
//!     hit  -> hits += 1, return clone
//!     miss -> v = computation(memo, args)?, store, misses += 1, return v
//! ```
//!
//! The computation receives a [`Memo`] handle for the same cache, so recursive
//! calls made through it are memoized too. That is what turns naive recursive
//! Fibonacci into a near-linear number of computations.
//!
//! A computation that returns `Err` stores nothing and counts as neither hit
//! nor miss; the error goes back to the caller untouched.
//!
//! # Thread Safety
//!
//! Calls take `&mut self` and a lookup followed by a store is not atomic.
//! Sharing a memoized function between threads needs an external `Mutex`
//! around every call.

extern crate alloc;

use crate::config::MemoConfig;
use crate::key::{ArgValue, CallArgs, PrimaryKey, SecondaryKey};
use crate::metrics::{CacheInfo, CacheMetrics, MemoMetrics};
use crate::two_level::TwoLevelCache;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::convert::Infallible;
use core::fmt;

/// The shape of a memoizable computation.
///
/// It gets a [`Memo`] handle for recursive calls and the arguments of the
/// current call.
pub type Computation<V, E> = dyn Fn(&mut Memo<'_, V, E>, &CallArgs) -> Result<V, E>;

/// Anything that can be called with [`CallArgs`] through a memo cache.
pub trait Invoke<V, E> {
    /// Answers the call from cache or by running the computation.
    fn invoke(&mut self, args: &CallArgs) -> Result<V, E>;
}

struct MemoState<V> {
    hash_arg: String,
    cache: TwoLevelCache<PrimaryKey, SecondaryKey, V>,
    metrics: MemoMetrics,
}

/// Handle passed to a running computation.
///
/// Calls made through it share the cache and counters of the
/// [`MemoizedFn`] that started the computation.
pub struct Memo<'a, V, E = Infallible> {
    func: &'a Computation<V, E>,
    state: &'a mut MemoState<V>,
}

impl<V: Clone, E> Memo<'_, V, E> {
    /// Answers the call from cache or by running the computation.
    pub fn invoke(&mut self, args: &CallArgs) -> Result<V, E> {
        let primary = PrimaryKey::for_call(args, &self.state.hash_arg);
        let secondary = SecondaryKey::for_call(args);

        if let Some(value) = self.state.cache.lookup(&primary, &secondary) {
            let value = value.clone();
            self.state.metrics.record_hit();
            tracing::trace!(%primary, "cache hit");
            return Ok(value);
        }

        let func = self.func;
        let value = func(self, args)?;
        tracing::trace!(%primary, %secondary, "cache miss");
        self.state.cache.store(primary, secondary, value.clone());
        self.state.metrics.record_miss();
        Ok(value)
    }
}

impl<V: Clone, E> Invoke<V, E> for Memo<'_, V, E> {
    fn invoke(&mut self, args: &CallArgs) -> Result<V, E> {
        Memo::invoke(self, args)
    }
}

impl<V, E> fmt::Debug for Memo<'_, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("hash_arg", &self.state.hash_arg)
            .field("resident", &self.state.cache.size())
            .finish_non_exhaustive()
    }
}

/// A computation wrapped with a two-level memo cache.
///
/// # Examples
///
/// ```
/// use cache_by_key::config::MemoConfig;
/// use cache_by_key::{memoize, CallArgs, MemoizedFn};
///
/// let config = MemoConfig {
///     hash_arg: "n".into(),
///     max_primary_size: 3,
///     max_secondary_size: 1,
///     ..MemoConfig::default()
/// };
/// let mut fib: MemoizedFn<u64> = memoize(config, |memo, args| {
///     let n = args.get_kwarg("n").and_then(|v| v.as_int()).unwrap_or(0);
///     if n <= 1 {
///         return Ok(n as u64);
///     }
///     let a = memo.invoke(&CallArgs::new().kwarg("n", n - 1))?;
///     let b = memo.invoke(&CallArgs::new().kwarg("n", n - 2))?;
///     Ok(a + b)
/// });
///
/// assert_eq!(fib.invoke(&CallArgs::new().kwarg("n", 10)), Ok(55));
/// assert_eq!(fib.stats().cache_len, 3);
/// ```
pub struct MemoizedFn<V, E = Infallible> {
    func: Box<Computation<V, E>>,
    config: MemoConfig,
    state: MemoState<V>,
}

/// Wraps `func` in a [`MemoizedFn`] configured by `config`.
pub fn memoize<V, E, F>(config: MemoConfig, func: F) -> MemoizedFn<V, E>
where
    V: Clone,
    F: Fn(&mut Memo<'_, V, E>, &CallArgs) -> Result<V, E> + 'static,
{
    MemoizedFn::new(config, func)
}

impl<V: Clone, E> MemoizedFn<V, E> {
    /// Wraps `func`; capacities in `config` are clamped, never rejected.
    pub fn new<F>(config: MemoConfig, func: F) -> Self
    where
        F: Fn(&mut Memo<'_, V, E>, &CallArgs) -> Result<V, E> + 'static,
    {
        let primary = config.primary_capacity();
        let secondary = config.secondary_capacity();
        tracing::debug!(
            hash_arg = %config.hash_arg,
            max_primary_size = primary.get(),
            max_secondary_size = secondary.get(),
            "memoized function created"
        );
        MemoizedFn {
            func: Box::new(func),
            state: MemoState {
                hash_arg: config.hash_arg.clone(),
                cache: TwoLevelCache::new(primary, secondary),
                metrics: MemoMetrics::default(),
            },
            config,
        }
    }

    /// Answers the call from cache or by running the computation.
    pub fn invoke(&mut self, args: &CallArgs) -> Result<V, E> {
        Memo {
            func: &*self.func,
            state: &mut self.state,
        }
        .invoke(args)
    }

    /// Current occupancy, effective capacities and cumulative counters.
    pub fn stats(&self) -> CacheInfo {
        CacheInfo {
            cache_len: self.state.cache.size(),
            max_primary_size: self.state.cache.primary_cap().get(),
            max_secondary_size: self.state.cache.secondary_cap().get(),
            cache_hit: self.state.metrics.hits,
            cache_miss: self.state.metrics.misses,
        }
    }

    /// Empties the cache and zeroes the hit and miss counters.
    pub fn clear(&mut self) {
        self.state.cache.clear();
        self.state.metrics.reset();
        tracing::debug!(hash_arg = %self.state.hash_arg, "cache cleared");
    }

    /// Drops every cached result whose designated argument was `value`.
    ///
    /// Counters are left alone. Returns `false` if nothing was cached for it.
    pub fn invalidate(&mut self, value: impl Into<ArgValue>) -> bool {
        self.invalidate_key(&PrimaryKey::value(value))
    }

    /// Like [`invalidate`](Self::invalidate) but takes a derived key, which
    /// also reaches the [`PrimaryKey::NoKey`] bucket.
    pub fn invalidate_key(&mut self, key: &PrimaryKey) -> bool {
        let removed = self.state.cache.remove(key);
        tracing::debug!(primary = %key, removed, "invalidated");
        removed
    }

    /// The keyword whose value selects the inner cache.
    pub fn hash_arg(&self) -> &str {
        &self.state.hash_arg
    }

    /// The configuration as given, before clamping.
    pub fn config(&self) -> &MemoConfig {
        &self.config
    }

    /// Raw hit and miss counters.
    pub fn counters(&self) -> MemoMetrics {
        self.state.metrics
    }

    /// Read-only access to the underlying cache.
    pub fn cache(&self) -> &TwoLevelCache<PrimaryKey, SecondaryKey, V> {
        &self.state.cache
    }
}

impl<V: Clone, E> Invoke<V, E> for MemoizedFn<V, E> {
    fn invoke(&mut self, args: &CallArgs) -> Result<V, E> {
        MemoizedFn::invoke(self, args)
    }
}

impl<V: Clone, E> CacheMetrics for MemoizedFn<V, E> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.stats().to_btreemap();
        let counters = self.state.metrics;
        let evictions = self.state.cache.evictions();
        metrics.insert("requests".to_string(), counters.requests() as f64);
        metrics.insert("hit_rate".to_string(), counters.hit_rate());
        metrics.insert("primary_evictions".to_string(), evictions.primary as f64);
        metrics.insert(
            "secondary_evictions".to_string(),
            evictions.secondary as f64,
        );
        metrics
    }

    fn algorithm_name(&self) -> &'static str {
        "CACHE_BY_KEY"
    }
}

impl<V, E> fmt::Debug for MemoizedFn<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoizedFn")
            .field("config", &self.config)
            .field("resident", &self.state.cache.size())
            .field("metrics", &self.state.metrics)
            .finish_non_exhaustive()
    }
}
