pub mod builders;
pub mod fake_runner;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use jobmatrix::logging::LOG_ENV;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured per test and only shown for failures. Set
/// `JOBMATRIX_LOG=debug` (or `RUST_LOG`) to raise verbosity.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"));

        // Another harness may already own the global subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `fut`, turning a hang into an error instead of a stuck test.
pub async fn with_timeout<F, T>(limit: Duration, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| anyhow::anyhow!("timed out after {limit:?}"))
}
