//! Tracing subscriber setup.
//!
//! Installed once, in `main`, before the runtime is built. Reads `RUST_LOG`
//! if set; otherwise falls back to the configuration's `log_level`, and
//! finally to `info`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the global tracing subscriber.
///
/// `log_level` is the configuration file's fallback, used only when
/// `RUST_LOG` is unset.
pub fn init_tracing(log_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .init();
}
