//! Logging configuration using tracing
//!
//! The library only emits `tracing` events; the binary installs this
//! subscriber, writing to stderr so command output on stdout stays clean.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing_subscriber::util::TryInitError;

/// Initialize the tracing subscriber
///
/// `RUST_LOG` wins when set. Otherwise the level is `warn`, or `debug` for
/// this crate when `verbose` is on.
///
/// # Errors
/// Returns an error if a global subscriber has already been installed
pub fn init(verbose: bool) -> Result<(), TryInitError> {
    let default_directive = if verbose { "warn,workspace_api=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        // The first call may fail if another test installed a subscriber
        let _ = init(false);
        assert!(init(true).is_err());
    }
}
