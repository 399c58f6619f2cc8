//! Subscriber setup for the `isa32` binary.
//!
//! Events go to stderr so stdout only ever carries the register dump and
//! the performance report.

use std::env;
use std::io;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// How the global subscriber should behave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
  /// Explicit filter directives (e.g. `simulator=trace`). When absent the
  /// filter comes from `RUST_LOG`, then [`LogConfig::default_directive`].
  pub directives: Option<String>,
  pub default_directive: String,
  /// Show module paths alongside events
  pub include_targets: bool,
  pub ansi: bool,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      directives: None,
      // rejected lines are printed by the binary; logging is diagnostics only
      default_directive: "warn".to_string(),
      include_targets: false,
      ansi: true,
    }
  }
}

impl LogConfig {
  /// Defaults, adjusted by the environment.
  ///
  /// - `ISA32_LOG` overrides the filter directives
  /// - `NO_COLOR` (any value) disables ANSI colouring
  pub fn from_env() -> Self {
    let mut config = Self::default();
    if let Ok(directives) = env::var("ISA32_LOG") {
      if !directives.trim().is_empty() {
        config.directives = Some(directives);
      }
    }
    if env::var_os("NO_COLOR").is_some() {
      config.ansi = false;
    }
    config
  }

  fn resolve_filter(&self) -> Result<EnvFilter, Error> {
    match &self.directives {
      Some(directives) => {
        EnvFilter::try_new(directives).map_err(|err| Error::InvalidFilter(err.to_string()))
      }
      None => Ok(
        EnvFilter::try_from_default_env()
          .unwrap_or_else(|_| EnvFilter::new(&self.default_directive)),
      ),
    }
  }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("invalid log directive: {0}")]
  InvalidFilter(String),

  #[error("failed to install global subscriber: {0}")]
  SubscriberInit(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the configured subscriber as the process-wide default.
pub fn init(config: &LogConfig) -> Result<(), Error> {
  let filter = config.resolve_filter()?;
  let layer = fmt::layer()
    .with_writer(io::stderr)
    .with_target(config.include_targets)
    .with_ansi(config.ansi)
    .without_time();
  Registry::default().with(filter).with(layer).try_init()?;
  Ok(())
}
