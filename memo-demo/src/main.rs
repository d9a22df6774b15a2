//! Memoized Fibonacci demo
//!
//! Wraps a naive recursive Fibonacci in a `cache-by-key` memo cache keyed on
//! `n`, computes `fib(n)` twice and reports timings and cache statistics. The
//! second run is answered by a single cache hit.

use cache_by_key::config::MemoConfig;
use cache_by_key::{memoize, ArgValue, CacheInfo, CacheMetrics, CallArgs, MemoizedFn};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Memoized Fibonacci demo CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Fibonacci index to compute (recursion depth grows with it)
    #[arg(short, long, default_value = "100")]
    n: i64,

    /// Maximum number of distinct `n` values kept (clamped to 1..=1024)
    #[arg(short, long, default_value = "3")]
    primary: isize,

    /// Maximum number of results kept per `n` (clamped to 1..=1024)
    #[arg(short, long, default_value = "1")]
    secondary: isize,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// One timed computation.
#[derive(Serialize, Debug)]
struct Run {
    n: i64,
    value: u128,
    elapsed_us: u128,
}

#[derive(Serialize, Debug)]
struct Report {
    runs: Vec<Run>,
    stats: CacheInfo,
    hit_rate: f64,
}

/// Naive recursive Fibonacci; values past `fib(186)` wrap.
fn make_fib(primary: isize, secondary: isize) -> MemoizedFn<u128> {
    let config = MemoConfig {
        hash_arg: "n".to_string(),
        max_primary_size: primary,
        max_secondary_size: secondary,
        ..MemoConfig::default()
    };
    memoize(config, |memo, args| {
        let n = args.get_kwarg("n").and_then(ArgValue::as_int).unwrap_or(0);
        if n <= 1 {
            return Ok(u128::try_from(n).unwrap_or(0));
        }
        let a = memo.invoke(&CallArgs::new().kwarg("n", n - 1))?;
        let b = memo.invoke(&CallArgs::new().kwarg("n", n - 2))?;
        Ok(a.wrapping_add(b))
    })
}

fn timed_run(fib: &mut MemoizedFn<u128>, n: i64) -> Run {
    let args = CallArgs::new().kwarg("n", n);
    let start = Instant::now();
    let value = match fib.invoke(&args) {
        Ok(value) => value,
        Err(never) => match never {},
    };
    let elapsed: Duration = start.elapsed();
    tracing::info!(n, ?elapsed, "computed");
    Run {
        n,
        value,
        elapsed_us: elapsed.as_micros(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut fib = make_fib(args.primary, args.secondary);

    let runs = vec![timed_run(&mut fib, args.n), timed_run(&mut fib, args.n)];
    let stats = fib.stats();
    let hit_rate = fib.metrics().get("hit_rate").copied().unwrap_or(0.0);

    match args.format {
        Format::Text => {
            for run in &runs {
                println!(
                    "fib({}) = {}  ({:.3} ms)",
                    run.n,
                    run.value,
                    run.elapsed_us as f64 / 1000.0
                );
            }
            println!("{stats}");
            println!("hit rate: {:.2}%", hit_rate * 100.0);
        }
        Format::Json => {
            let report = Report {
                runs,
                stats,
                hit_rate,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
