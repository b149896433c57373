//! Log output for the server.
//!
//! `RUST_LOG` overrides the default filter, e.g.
//! `RUST_LOG=debug,playzone::wallet=trace,tower_http=info`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info,playzone=info,tower_http=info,axum=info";

pub fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber: compact lines with targets, so settlement
/// and forfeit events can be filtered per module. Fails if one is already set.
pub fn init() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().compact().with_target(true))
        .try_init()?;
    Ok(())
}
