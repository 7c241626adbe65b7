use std::sync::Once;

static LOGGER: Once = Once::new();

/// Installs a verbose log subscriber, once per test binary.
///
/// Router internals log through the `log` facade; the `tracing_subscriber`
/// fmt layer picks those records up, so test failures come with the full
/// admission and fanout history.
pub fn setup_test_environment() {
    LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .compact()
            .with_max_level(tracing_core::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    });
}
