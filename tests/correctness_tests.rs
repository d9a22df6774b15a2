//! Correctness Tests for the Two-Level Memo Cache
//!
//! Validates eviction policy and memoization behaviour with small, predictable
//! capacities. Eviction tests check explicitly which key was dropped.
//!
//! ## Test Strategy
//! - Capacities of 1-5 so every eviction is observable
//! - Deterministic insertion patterns
//! - End-to-end runs of a memoized recursive Fibonacci with known counters

use cache_by_key::config::{BoundedMapConfig, MemoConfig};
use cache_by_key::{
    memoize, ArgValue, BoundedOrderedMap, CallArgs, MemoizedFn, PrimaryKey, TwoLevelCache,
};
use std::cell::Cell;
use std::num::NonZeroUsize;
use std::rc::Rc;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn make_map<K: std::hash::Hash + Eq + Clone, V>(cap: usize) -> BoundedOrderedMap<K, V> {
    let config = BoundedMapConfig {
        capacity: NonZeroUsize::new(cap).unwrap(),
    };
    BoundedOrderedMap::init(config, None)
}

fn make_two_level<V>(primary: usize, secondary: usize) -> TwoLevelCache<u32, u32, V> {
    TwoLevelCache::new(
        NonZeroUsize::new(primary).unwrap(),
        NonZeroUsize::new(secondary).unwrap(),
    )
}

fn fib_config(primary: isize, secondary: isize) -> MemoConfig {
    MemoConfig {
        hash_arg: "n".to_string(),
        max_primary_size: primary,
        max_secondary_size: secondary,
        ..MemoConfig::default()
    }
}

/// Naive recursive Fibonacci; `calls` counts how often the body actually runs.
fn make_fib(primary: isize, secondary: isize, calls: Rc<Cell<u64>>) -> MemoizedFn<u128> {
    memoize(fib_config(primary, secondary), move |memo, args| {
        calls.set(calls.get() + 1);
        let n = args.get_kwarg("n").and_then(ArgValue::as_int).unwrap_or(0);
        if n <= 1 {
            return Ok(n as u128);
        }
        let a = memo.invoke(&fib_args(n - 1))?;
        let b = memo.invoke(&fib_args(n - 2))?;
        Ok(a + b)
    })
}

fn fib_args(n: i64) -> CallArgs {
    CallArgs::new().kwarg("n", n)
}

// ============================================================================
// BOUNDED ORDERED MAP
// ============================================================================

#[test]
fn test_map_evicts_first_inserted() {
    let mut map = make_map(3);
    map.put("k1", 1);
    map.put("k2", 2);
    map.put("k3", 3);
    let evicted = map.put("k4", 4);
    assert_eq!(evicted, Some(("k1", 1)));
    assert!(!map.contains(&"k1"));
    for k in ["k2", "k3", "k4"] {
        assert!(map.contains(&k), "{k} should still be resident");
    }
}

#[test]
fn test_map_lookups_do_not_protect_entries() {
    let mut map = make_map(3);
    map.put(1, "a");
    map.put(2, "b");
    map.put(3, "c");
    // LRU would keep 1 after these reads; FIFO does not
    assert_eq!(map.get(&1), Some(&"a"));
    assert_eq!(map.get(&1), Some(&"a"));
    map.put(4, "d");
    assert_eq!(map.get(&1), None);
    assert_eq!(map.get(&2), Some(&"b"));
}

#[test]
fn test_map_update_preserves_eviction_priority() {
    let mut map = make_map(2);
    map.put("old", 1);
    map.put("new", 2);
    map.put("old", 10);
    assert_eq!(map.get(&"old"), Some(&10));
    let evicted = map.put("newest", 3);
    assert_eq!(evicted, Some(("old", 10)));
    assert_eq!(map.get(&"new"), Some(&2));
}

#[test]
fn test_map_capacity_never_exceeded() {
    for cap in 1..=5 {
        let mut map = make_map(cap);
        for i in 0..50u32 {
            map.put(i % 11, i);
            assert!(map.len() <= cap);
        }
        assert_eq!(map.len(), cap);
    }
}

#[test]
fn test_map_zero_capacity_clamped() {
    let mut map: BoundedOrderedMap<u8, u8> = BoundedOrderedMap::with_capacity(0);
    map.put(1, 1);
    map.put(2, 2);
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&2), Some(&2));
}

#[test]
fn test_map_remove_absent_is_none() {
    let mut map: BoundedOrderedMap<&str, i32> = make_map(2);
    assert_eq!(map.remove(&"missing"), None);
    map.put("present", 1);
    assert_eq!(map.remove(&"present"), Some(1));
    assert!(map.is_empty());
}

// ============================================================================
// TWO-LEVEL CACHE
// ============================================================================

#[test]
fn test_two_level_n_plus_one_primary_keys() {
    let n = 4;
    let mut cache = make_two_level(n, 1);
    for p in 1..=(n as u32 + 1) {
        cache.store(p, 0, p);
    }
    assert_eq!(cache.size(), n);
    assert_eq!(cache.lookup(&1, &0), None);
    for p in 2..=(n as u32 + 1) {
        assert_eq!(cache.lookup(&p, &0), Some(&p));
    }
}

#[test]
fn test_two_level_restore_does_not_reorder() {
    let mut cache = make_two_level(3, 2);
    cache.store(1, 0, "a");
    cache.store(2, 0, "b");
    cache.store(3, 0, "c");
    cache.store(1, 1, "a2");
    cache.store(1, 0, "a3");
    cache.store(4, 0, "d");
    assert!(!cache.contains(&1));
    assert_eq!(
        cache.primary_keys().copied().collect::<Vec<_>>(),
        vec![2, 3, 4]
    );
}

#[test]
fn test_two_level_absent_lookups() {
    let mut cache = make_two_level(2, 2);
    assert_eq!(cache.lookup(&9, &9), None);
    cache.store(1, 1, 11);
    assert_eq!(cache.lookup(&1, &2), None);
    assert_eq!(cache.lookup(&2, &1), None);
    assert_eq!(cache.lookup(&1, &1), Some(&11));
}

#[test]
fn test_two_level_remove_leaves_other_keys() {
    let mut cache = make_two_level(3, 3);
    for s in 0..3 {
        cache.store(1, s, s * 10);
        cache.store(2, s, s * 100);
    }
    assert!(cache.remove(&1));
    for s in 0..3 {
        assert_eq!(cache.lookup(&1, &s), None);
        assert_eq!(cache.lookup(&2, &s), Some(&(s * 100)));
    }
}

#[test]
fn test_two_level_bounds_for_many_capacities() {
    for primary in 1..=4 {
        for secondary in 1..=3 {
            let mut cache = make_two_level(primary, secondary);
            for i in 0..60u32 {
                cache.store(i % 7, i % 5, i);
                assert!(cache.size() <= primary);
                assert!(cache.entry_count() <= primary * secondary);
            }
        }
    }
}

// ============================================================================
// MEMOIZED FUNCTION
// ============================================================================

#[test]
fn test_fib_second_run_adds_exactly_one_hit() {
    let calls = Rc::new(Cell::new(0));
    let mut fib = make_fib(3, 1, calls.clone());

    assert_eq!(fib.invoke(&fib_args(10)), Ok(55));
    let first = fib.stats();
    assert_eq!(first.cache_hit, 8);
    assert_eq!(first.cache_miss, 11);
    assert_eq!(calls.get(), 11);

    assert_eq!(fib.invoke(&fib_args(10)), Ok(55));
    let second = fib.stats();
    assert_eq!(second.cache_hit, first.cache_hit + 1);
    assert_eq!(second.cache_miss, first.cache_miss);
    assert_eq!(calls.get(), 11);
}

#[test]
fn test_fib_recursion_collapses_to_linear() {
    let calls = Rc::new(Cell::new(0));
    let mut fib = make_fib(3, 1, calls.clone());
    assert_eq!(
        fib.invoke(&fib_args(100)),
        Ok(354_224_848_179_261_915_075)
    );
    let info = fib.stats();
    assert_eq!(info.cache_hit, 98);
    assert_eq!(info.cache_miss, 101);
    assert_eq!(calls.get(), 101);
}

#[test]
fn test_fib_wider_cache_across_calls() {
    let mut fib = make_fib(5, 3, Rc::new(Cell::new(0)));
    fib.invoke(&fib_args(10)).unwrap();
    let info = fib.stats();
    assert_eq!((info.cache_len, info.cache_hit, info.cache_miss), (5, 8, 11));

    fib.invoke(&fib_args(12)).unwrap();
    let info = fib.stats();
    assert_eq!((info.cache_len, info.cache_hit, info.cache_miss), (5, 11, 13));

    assert!(fib.invalidate(11));
    let info = fib.stats();
    assert_eq!((info.cache_len, info.cache_hit, info.cache_miss), (4, 11, 13));

    fib.clear();
    let info = fib.stats();
    assert_eq!((info.cache_len, info.cache_hit, info.cache_miss), (0, 0, 0));
    assert_eq!((info.max_primary_size, info.max_secondary_size), (5, 3));
}

#[test]
fn test_invalidate_absent_key_is_noop() {
    let mut fib = make_fib(3, 1, Rc::new(Cell::new(0)));
    fib.invoke(&fib_args(5)).unwrap();
    let before = fib.stats();
    assert!(!fib.invalidate(999));
    assert!(!fib.invalidate("5"));
    assert_eq!(fib.stats(), before);
}

#[test]
fn test_invalidate_then_lookup_is_absent() {
    let mut fib = make_fib(4, 2, Rc::new(Cell::new(0)));
    fib.invoke(&fib_args(6)).unwrap();
    assert!(fib.cache().contains(&PrimaryKey::value(6)));
    assert!(fib.invalidate(6));
    assert!(fib.cache().inner(&PrimaryKey::value(6)).is_none());
    assert!(fib.cache().contains(&PrimaryKey::value(5)));
}

#[test]
fn test_signatures_share_primary_bucket() {
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let mut scale: MemoizedFn<i64> = memoize(
        MemoConfig {
            hash_arg: "user".to_string(),
            max_primary_size: 2,
            max_secondary_size: 2,
            ..MemoConfig::default()
        },
        move |_, args| {
            counter.set(counter.get() + 1);
            let user = args.get_kwarg("user").and_then(ArgValue::as_int).unwrap_or(0);
            let factor = args.get_kwarg("factor").and_then(ArgValue::as_int).unwrap_or(1);
            Ok(user * factor)
        },
    );

    let call = |factor: i64| CallArgs::new().kwarg("user", 7).kwarg("factor", factor);
    assert_eq!(scale.invoke(&call(2)), Ok(14));
    assert_eq!(scale.invoke(&call(3)), Ok(21));
    assert_eq!(scale.invoke(&call(2)), Ok(14));
    assert_eq!(runs.get(), 2);
    assert_eq!(scale.stats().cache_len, 1);

    // a third signature pushes out the oldest one for this user only
    assert_eq!(scale.invoke(&call(4)), Ok(28));
    assert_eq!(scale.invoke(&call(2)), Ok(14));
    assert_eq!(runs.get(), 4);

    assert!(scale.invalidate(7));
    assert_eq!(scale.invoke(&call(3)), Ok(21));
    assert_eq!(runs.get(), 5);
}

#[test]
fn test_failed_computation_propagates_and_stores_nothing() {
    #[derive(Debug, PartialEq)]
    struct Overflow(i64);

    let mut checked: MemoizedFn<i64, Overflow> = memoize(fib_config(3, 1), |_, args| {
        let n = args.get_kwarg("n").and_then(ArgValue::as_int).unwrap_or(0);
        n.checked_mul(n).ok_or(Overflow(n))
    });

    assert_eq!(checked.invoke(&fib_args(i64::MAX)), Err(Overflow(i64::MAX)));
    assert_eq!(checked.stats().cache_len, 0);
    assert_eq!(checked.stats().cache_miss, 0);
    assert_eq!(checked.invoke(&fib_args(i64::MAX)), Err(Overflow(i64::MAX)));
    assert_eq!(checked.stats().cache_hit, 0);

    assert_eq!(checked.invoke(&fib_args(3)), Ok(9));
    assert_eq!(checked.stats().cache_miss, 1);
}

#[test]
fn test_out_of_range_capacities_are_clamped() {
    let fib = make_fib(-10, 0, Rc::new(Cell::new(0)));
    let info = fib.stats();
    assert_eq!(info.max_primary_size, 1);
    assert_eq!(info.max_secondary_size, 1);

    let fib = make_fib(1 << 20, 1 << 20, Rc::new(Cell::new(0)));
    let info = fib.stats();
    assert_eq!(info.max_primary_size, 1024);
    assert_eq!(info.max_secondary_size, 1024);
}

#[test]
fn test_missing_designated_argument_uses_sentinel() {
    let mut echo: MemoizedFn<String> = memoize(fib_config(3, 3), |_, args| {
        Ok(args.canonical_text())
    });
    echo.invoke(&CallArgs::new().arg(1)).unwrap();
    echo.invoke(&CallArgs::new().arg(2)).unwrap();
    echo.invoke(&CallArgs::new().kwarg("other", 2)).unwrap();
    assert_eq!(echo.stats().cache_len, 1);
    assert_eq!(
        echo.cache().inner(&PrimaryKey::NoKey).map(|m| m.len()),
        Some(3)
    );
}

#[test]
fn test_float_and_string_keys_get_separate_buckets() {
    let mut echo: MemoizedFn<String> = memoize(
        MemoConfig {
            hash_arg: "k".to_string(),
            ..MemoConfig::default()
        },
        |_, args| Ok(args.canonical_text()),
    );
    assert_eq!(echo.invoke(&CallArgs::new().kwarg("k", 1.5)), Ok("(){'k': 1.5}".to_string()));
    assert_eq!(
        echo.invoke(&CallArgs::new().kwarg("k", "1.5")),
        Ok("(){'k': '1.5'}".to_string())
    );
    assert_eq!(echo.stats().cache_len, 2);

    assert!(echo.invalidate("1.5"));
    assert!(echo.cache().contains(&PrimaryKey::value(1.5)));
    assert_eq!(echo.stats().cache_len, 1);

    // an integral float shares the integer's bucket
    echo.invoke(&CallArgs::new().kwarg("k", 2)).unwrap();
    echo.invoke(&CallArgs::new().kwarg("k", 2.0)).unwrap();
    assert_eq!(echo.stats().cache_len, 2);
}
