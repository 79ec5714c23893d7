//! Tracing subscriber setup for the CLI.
//!
//! Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
//! takes precedence over the default level; `CRAIC_LOG_FORMAT=json` switches
//! to one JSON object per line.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("CRAIC_LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Default filter directive for the given verbosity.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "craic=debug,info" } else { "craic=warn,warn" }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_parses() {
        for verbose in [true, false] {
            assert!(EnvFilter::try_new(default_directive(verbose)).is_ok());
        }
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false, LogFormat::Pretty);
        init(true, LogFormat::Json);
    }
}
