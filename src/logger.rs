//! Logging setup for so-geodesic binaries and benchmarks
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to executables, which call [`init_logger`] once at startup.

use tracing::{Level, debug};

/// Initialize the tracing subscriber with the default INFO level
///
/// Format: timestamp, level and target module. The level can be overridden
/// through `RUST_LOG`.
///
/// # Example
/// ```no_run
/// use so_geodesic::init_logger;
///
/// fn main() {
///     init_logger();
///     tracing::info!("Probe started");
/// }
/// ```
///
/// # Environment Variables
/// ```bash
/// RUST_LOG=debug cargo run --bin geodesic_survey
/// RUST_LOG=so_geodesic::manifold=debug cargo run --bin geodesic_survey
/// ```
pub fn init_logger() {
    init_logger_with_level(Level::INFO)
}

/// Initialize the tracing subscriber with a custom default level
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber in place and report the refusal at DEBUG level through it.
pub fn init_logger_with_level(default_level: Level) {
    use tracing_subscriber::fmt::time::SystemTime;

    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_timer(SystemTime)
        .with_target(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();

    if let Err(err) = installed {
        debug!("Keeping the existing tracing subscriber: {err}");
    }
}
