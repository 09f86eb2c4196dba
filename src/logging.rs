use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default directive when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "capabilities=info,capability_server=info";

/// Initialize logging for the capability server.
///
/// Logs go to stderr so stdout stays reserved for protocol responses. The
/// level is controlled with `RUST_LOG`, e.g. `RUST_LOG=capabilities=debug`.
pub fn init() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()
        .context("Failed to initialize tracing subscriber")?;
    Ok(())
}
