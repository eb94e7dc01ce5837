//! Logging setup
//!
//! Both tools use stdout as their data channel, so every log line goes to
//! stderr.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates that belong to this project (for the default filter)
const PROJECT_CRATES: &[&str] = &["uidscan", "uidresp", "uid_tools", "uid_protocol", "uid_sim", "uid_scan"];

/// Default filter for a verbosity count (`-v` = debug, `-vv` = trace)
pub fn default_filter(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    PROJECT_CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize logging to stderr; `RUST_LOG` overrides the default filter
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
