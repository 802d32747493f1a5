//! tidekv - Workload Driver
//!
//! This binary opens an engine through the backend registry, hammers it with
//! a mixed read/write/TTL workload from several threads, and reports the
//! resulting throughput and cache statistics.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tidekv::backend::{Cache, Params, Registry, MEMORY};
use tidekv::storage::config::{PARAM_SHARD_COUNT, PARAM_SWEEP_INTERVAL_MS};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Workload configuration
struct Config {
    /// Number of worker threads
    threads: usize,
    /// Size of the key space
    keys: u64,
    /// TTL given to expiring writes
    ttl: Duration,
    /// How long to run
    duration: Duration,
    /// Shard count override
    shards: Option<usize>,
    /// Sweep interval in milliseconds (0 disables the sweeper)
    sweep_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 4,
            keys: 100_000,
            ttl: Duration::from_millis(500),
            duration: Duration::from_secs(5),
            shards: None,
            sweep_ms: 1000,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--threads" | "-t" => {
                    config.threads = parse_value(&args, i, "--threads");
                    i += 2;
                }
                "--keys" | "-k" => {
                    config.keys = parse_value(&args, i, "--keys");
                    i += 2;
                }
                "--ttl-ms" => {
                    config.ttl = Duration::from_millis(parse_value(&args, i, "--ttl-ms"));
                    i += 2;
                }
                "--duration-secs" | "-d" => {
                    config.duration =
                        Duration::from_secs(parse_value(&args, i, "--duration-secs"));
                    i += 2;
                }
                "--shards" | "-s" => {
                    config.shards = Some(parse_value(&args, i, "--shards"));
                    i += 2;
                }
                "--sweep-ms" => {
                    config.sweep_ms = parse_value(&args, i, "--sweep-ms");
                    i += 2;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("tidekv version {}", tidekv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Backend parameters for the registry
    fn params(&self) -> Params {
        let mut params = Params::new().with(PARAM_SWEEP_INTERVAL_MS, self.sweep_ms.to_string());
        if let Some(shards) = self.shards {
            params.insert(PARAM_SHARD_COUNT, shards.to_string());
        }
        params
    }
}

/// Parses the value following the flag at `i`, exiting on bad input
fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    let Some(raw) = args.get(i + 1) else {
        eprintln!("Error: {} requires a value", flag);
        std::process::exit(1);
    };
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid value for {}: {}", flag, raw);
        std::process::exit(1);
    })
}

fn print_help() {
    println!(
        r#"
tidekv - Sharded In-Process Cache Workload Driver

USAGE:
    tidekv [OPTIONS]

OPTIONS:
    -t, --threads <N>          Worker threads (default: 4)
    -k, --keys <N>             Size of the key space (default: 100000)
        --ttl-ms <MS>          TTL for expiring writes (default: 500)
    -d, --duration-secs <S>    How long to run (default: 5)
    -s, --shards <N>           Shard count (default: 2 x CPUs)
        --sweep-ms <MS>        Sweep interval, 0 disables (default: 1000)
    -v, --version              Print version information
    -h, --help                 Print this help message

Set RUST_LOG=debug to watch the sweeper at work.
"#
    );
}

/// One worker: a fixed mix of reads, writes, not-overwrite writes and deletes
fn run_worker(
    cache: Arc<dyn Cache<u64>>,
    worker: u64,
    keys: u64,
    ttl: Duration,
    stop: Arc<AtomicBool>,
    ops: Arc<AtomicU64>,
) {
    let mut i = worker;
    let mut done = 0u64;
    while !stop.load(Ordering::Relaxed) {
        let key = format!("key:{}", i % keys);
        match i % 10 {
            0..=5 => {
                cache.get(&key);
            }
            6 | 7 => {
                cache.set_x(&key, i, ttl);
            }
            8 => {
                cache.set_nx(&key, i, ttl);
            }
            _ => {
                cache.del(&key);
            }
        }
        // Stride by a prime so workers do not walk the same keys in lockstep
        i = i.wrapping_add(7919);
        done += 1;

        if done % 1024 == 0 {
            ops.fetch_add(1024, Ordering::Relaxed);
        }
    }
    ops.fetch_add(done % 1024, Ordering::Relaxed);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    // Open the engine through the registry, as an application would
    let registry: Registry<u64> = Registry::with_memory();
    let cache: Arc<dyn Cache<u64>> = Arc::from(registry.open(MEMORY, &config.params())?);

    info!(
        threads = config.threads,
        keys = config.keys,
        ttl_ms = config.ttl.as_millis() as u64,
        duration_secs = config.duration.as_secs(),
        "Starting workload"
    );

    let stop = Arc::new(AtomicBool::new(false));
    let ops = Arc::new(AtomicU64::new(0));
    let started = Instant::now();

    let workers: Vec<_> = (0..config.threads as u64)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            let stop = Arc::clone(&stop);
            let ops = Arc::clone(&ops);
            let (keys, ttl) = (config.keys.max(1), config.ttl);
            tokio::task::spawn_blocking(move || run_worker(cache, worker, keys, ttl, stop, ops))
        })
        .collect();

    // Run until the deadline or Ctrl+C
    tokio::select! {
        _ = tokio::time::sleep(config.duration) => {}
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Interrupted, stopping workload..."),
                Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
            }
        }
    }

    stop.store(true, Ordering::Relaxed);
    for worker in workers {
        worker.await?;
    }

    let elapsed = started.elapsed();
    let total = ops.load(Ordering::Relaxed);
    let stats = cache.stats();

    info!(
        ops = total,
        elapsed_ms = elapsed.as_millis() as u64,
        ops_per_sec = (total as f64 / elapsed.as_secs_f64()) as u64,
        "Workload finished"
    );
    info!(
        live_keys = cache.len(),
        gets = stats.gets,
        hit_rate = %format!("{:.2}%", stats.hit_rate() * 100.0),
        sets = stats.sets,
        deletes = stats.deletes,
        expired_lazy = stats.expired_lazy,
        expired_swept = stats.expired_swept,
        sweeps = stats.sweeps,
        "Cache statistics"
    );

    cache.close();
    Ok(())
}
