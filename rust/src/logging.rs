//! Diagnostics go to stderr through `tracing`; stdout is reserved for the report.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "VAULT_CHECK_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber. `VAULT_CHECK_LOG` takes the usual
/// `EnvFilter` syntax, e.g. `vault_check=debug`.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
