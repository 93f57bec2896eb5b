//! Reserved names and shared defaults.

use std::path::PathBuf;

use scriptlet_core::config::EngineConfig;

/// Namespace key that receives the entry point's return value.
pub const RESULT_KEY: &str = "result";

/// Sole key of a failure payload.
pub const ERROR_KEY: &str = "error";

/// Context key naming the base directory for script embeds.
pub const TEMPLATE_DIR_KEY: &str = "templateDir";

/// Names that never reach a payload. `require` is engine syntax, not data;
/// the helper functions live outside the namespace and need no filtering.
pub const INJECTED_BINDINGS: &[&str] = &["require"];

/// Base directory for embeds when the context carries no `templateDir`:
/// the configured template dir, else the directory of the running executable,
/// else the current directory.
pub fn default_template_dir(config: &EngineConfig) -> PathBuf {
    if let Some(ref dir) = config.template_dir {
        return dir.clone();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
