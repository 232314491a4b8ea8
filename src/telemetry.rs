//! Structured logging setup
//!
//! Diagnostics go to stderr through tracing-subscriber, leaving stdout for
//! completion text and catalog listings.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Filter directive used when RUST_LOG is unset
///
/// The crate logs at `level`; the HTTP stack only reports warnings.
pub fn default_directive(level: &str) -> String {
    let level = match level.trim() {
        "" => "info",
        other => other,
    };
    format!("modelgate={},reqwest=warn,hyper=warn", level)
}

/// Install the global subscriber
///
/// RUST_LOG takes precedence over `default_level`. Only the first call in a
/// process has any effect.
///
/// ```no_run
/// modelgate::telemetry::init("debug");
/// tracing::debug!("catalog fetch starting");
/// ```
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(default_level)));

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init();

        if let Err(e) = installed {
            eprintln!("modelgate: logging not initialized: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_scopes_level_to_crate() {
        assert_eq!(
            default_directive("debug"),
            "modelgate=debug,reqwest=warn,hyper=warn"
        );
    }

    #[test]
    fn test_blank_level_falls_back_to_info() {
        assert!(default_directive("  ").starts_with("modelgate=info,"));
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init("debug");
        init("trace");
        tracing::debug!("second init ignored");
    }
}
