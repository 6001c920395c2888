//! Log subscriber setup. Records emitted through the `log` macros are
//! collected by `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

use config::Logging;

/// Installs the global subscriber. `RUST_LOG` wins over `logging.level`.
pub fn init(config: &Logging) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}
