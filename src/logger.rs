use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str) -> anyhow::Result<()> {
  let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_timer(ChronoUtc::rfc_3339())
    .with_target(false)
    .try_init()
    .map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))?;
  Ok(())
}
