//! Quiet-mode aware logging. When SCRIPTLET_QUIET=1 (e.g. a host calling the
//! engine in a tight loop), suppress info-level engine logs.
//! Uses `tracing::info!` so output is captured by the tracing subscriber.

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        if !$crate::log::is_quiet() {
            tracing::info!($($arg)*);
        }
    }};
}

pub fn is_quiet() -> bool {
    scriptlet_core::config::ObservabilityConfig::from_env().quiet
}
