//! # Observability
//!
//! Initializes tracing for the bot. Every turn, dispatch decision and dialog
//! step is emitted as a structured event under the `rambo` target, so a single
//! `RAMBO_LOG=debug` is enough to follow a conversation.

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Configuration for initializing the observability system.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// The maximum log level to capture.
    pub level: Level,
    /// The target for the logs.
    pub target: LogTarget,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            target: LogTarget::default(),
        }
    }
}

impl ObservabilityConfig {
    /// Builds a config from a level name such as `"debug"`.
    ///
    /// Unknown names fall back to `INFO`.
    pub fn with_level_name(mut self, name: &str) -> Self {
        self.level = Level::from_str(name).unwrap_or(Level::INFO);
        self
    }

    /// Sends logs to the given file instead of the console.
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.target = LogTarget::File(path.into());
        self
    }
}

/// Defines the output target for logs.
#[derive(Debug, Clone, Default)]
pub enum LogTarget {
    /// Log to the console (stderr, so bot replies on stdout stay clean).
    #[default]
    Console,
    /// Log to a file.
    File(String),
}

/// Initializes the global tracing subscriber.
///
/// Call once at the start of `main`. Returns an error if a subscriber is
/// already installed or the log file cannot be created.
pub fn init(config: ObservabilityConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::from_default_env().add_directive(format!("rambo={}", config.level).parse()?);

    let subscriber = tracing_subscriber::registry().with(filter);

    match config.target {
        LogTarget::Console => {
            let layer = fmt::layer().with_writer(std::io::stderr);
            subscriber.with(layer).try_init()?;
        }
        LogTarget::File(path) => {
            let file = std::fs::File::create(path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(file);
            subscriber.with(layer).try_init()?;
        }
    };

    Ok(())
}
