//! Diagnostic logging setup
//!
//! Logs go to stderr so they never mix with remote output on stdout.
//! `RUST_LOG` takes precedence over the `-v` count.

use tracing_subscriber::EnvFilter;

/// Default level when neither `RUST_LOG` nor `-v` is given
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Map the number of `-v` flags to a level
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_LOG_LEVEL,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber
pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) if !value.is_empty() => EnvFilter::try_new(value)?,
        _ => EnvFilter::new(level_for(verbosity)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(9), "trace");
    }
}
