//! Stderr logging for the CLI.
//!
//! Levels map from the repeated `-v` flag: none shows warnings, `-v` adds
//! submission progress, `-vv` adds per-edit detail. Answer values are never
//! part of an event, only field names and counts.

use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy)]
pub struct LogConfig {
    pub level: Level,
    pub with_target: bool,
}

impl LogConfig {
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            with_target: verbosity >= 2,
        }
    }

    fn filter(&self) -> EnvFilter {
        let level = self.level.as_str().to_ascii_lowercase();
        EnvFilter::new(format!(
            "warn,lens_form={level},lens_spec={level},lens_intake={level}"
        ))
    }
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_target(config.with_target)
        .with_writer(std::io::stderr)
        .try_init();
}
