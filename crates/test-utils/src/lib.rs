//! Shared helpers for tester's integration tests.

pub mod builders;
pub mod fake_backend;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tester::logging::LOG_ENV_VAR;
use tracing_subscriber::{EnvFilter, fmt};

static TRACING: Once = Once::new();

/// Upper bound for a whole test run against real or fake children.
pub const TEST_DEADLINE: Duration = Duration::from_secs(10);

/// Install a test-captured subscriber once per test binary.
///
/// The filter comes from `TESTER_LOG` (same variable the binary reads),
/// falling back to `RUST_LOG`, then `info`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it outlives [`TEST_DEADLINE`].
///
/// A hung child or a drain loop that never stops shows up as a panic here
/// instead of a stuck test binary.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_DEADLINE, f).await {
        Ok(value) => value,
        Err(_) => panic!("test did not finish within {TEST_DEADLINE:?}"),
    }
}
