//! Tracing init. Logs go to stderr so stdout carries only payloads.
//!
//! Uses config::ObservabilityConfig for SCRIPTLET_QUIET, SCRIPTLET_LOG_LEVEL, SCRIPTLET_LOG_JSON.

use scriptlet_core::config::ObservabilityConfig;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Initialize tracing. Call at process startup.
/// When SCRIPTLET_QUIET=1, only WARN and above are logged.
pub fn init_tracing() {
    let cfg = ObservabilityConfig::from_env();
    let level = filter_directive(cfg);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    };
}

fn filter_directive(cfg: &ObservabilityConfig) -> String {
    if cfg.quiet {
        "scriptlet=warn".to_string()
    } else {
        cfg.log_level.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_overrides_level() {
        let cfg = ObservabilityConfig {
            quiet: true,
            log_level: "scriptlet=debug".to_string(),
            log_json: false,
        };
        assert_eq!(filter_directive(&cfg), "scriptlet=warn");
        let cfg = ObservabilityConfig {
            quiet: false,
            ..cfg
        };
        assert_eq!(filter_directive(&cfg), "scriptlet=debug");
    }
}
