//! Environment configuration shared by the emasim binaries.
//!
//! Reads `EMASIM_THREADS` (fallback `RAYON_NUM_THREADS`) for the rayon pool
//! and `RUST_LOG` for the log filter.

use tracing_subscriber::EnvFilter;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "emasim=info,ema_simulate=info";

/// Install the fmt subscriber. `RUST_LOG` overrides [`DEFAULT_LOG_FILTER`].
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // try_init: tolerate a subscriber installed by an embedding program
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Thread count from `EMASIM_THREADS`, falling back to `RAYON_NUM_THREADS`.
pub fn configured_threads() -> Option<usize> {
    std::env::var("EMASIM_THREADS")
        .or_else(|_| std::env::var("RAYON_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n > 0)
}

/// Build the rayon global pool, tolerating an already-initialized pool.
/// Returns the thread count in effect.
pub fn init_rayon_threads() -> usize {
    if let Some(n) = configured_threads() {
        if rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .is_err()
        {
            tracing::warn!(requested = n, "rayon pool already initialized");
        }
    }
    let n = rayon::current_num_threads();
    tracing::debug!(threads = n, "rayon pool ready");
    n
}
