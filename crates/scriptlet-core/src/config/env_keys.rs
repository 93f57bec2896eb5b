//! Environment variable key constants and aliases.
//!
//! Primary variables use the `SCRIPTLET_*` prefix.

/// Embedding and script files
pub mod paths {
    /// Base directory for `require("file.rhai")` when the context has no `templateDir`.
    pub const SCRIPTLET_TEMPLATE_DIR: &str = "SCRIPTLET_TEMPLATE_DIR";
    pub const TEMPLATE_DIR_ALIASES: &[&str] = &["TEMPLATE_DIR"];

    /// Comma-separated list of extensions treated as script files by `require`.
    pub const SCRIPTLET_SCRIPT_EXTENSIONS: &str = "SCRIPTLET_SCRIPT_EXTENSIONS";
}

/// External package manager
pub mod packages {
    /// "pip" (default), "npm" or "none".
    pub const SCRIPTLET_PACKAGE_MANAGER: &str = "SCRIPTLET_PACKAGE_MANAGER";

    /// Python interpreter used for `-m pip`.
    pub const SCRIPTLET_PYTHON: &str = "SCRIPTLET_PYTHON";
    pub const PYTHON_ALIASES: &[&str] = &["PYTHON"];

    /// npm executable.
    pub const SCRIPTLET_NPM: &str = "SCRIPTLET_NPM";
}

/// Captured output reserved keys
pub mod capture {
    pub const SCRIPTLET_STDOUT_KEY: &str = "SCRIPTLET_STDOUT_KEY";
    pub const SCRIPTLET_STDERR_KEY: &str = "SCRIPTLET_STDERR_KEY";
    pub const SCRIPTLET_CAPTURE_STDERR: &str = "SCRIPTLET_CAPTURE_STDERR";
}

/// Interpreter limits (all unlimited unless set)
pub mod limits {
    pub const SCRIPTLET_MAX_OPERATIONS: &str = "SCRIPTLET_MAX_OPERATIONS";
    pub const SCRIPTLET_MAX_CALL_LEVELS: &str = "SCRIPTLET_MAX_CALL_LEVELS";
    pub const SCRIPTLET_MAX_EXPR_DEPTH: &str = "SCRIPTLET_MAX_EXPR_DEPTH";
    pub const SCRIPTLET_MAX_STRING_SIZE: &str = "SCRIPTLET_MAX_STRING_SIZE";
    pub const SCRIPTLET_MAX_ARRAY_SIZE: &str = "SCRIPTLET_MAX_ARRAY_SIZE";
    pub const SCRIPTLET_MAX_MAP_SIZE: &str = "SCRIPTLET_MAX_MAP_SIZE";
}

/// Observability and logging
pub mod observability {
    pub const SCRIPTLET_QUIET: &str = "SCRIPTLET_QUIET";
    pub const QUIET_ALIASES: &[&str] = &[];

    pub const SCRIPTLET_LOG_LEVEL: &str = "SCRIPTLET_LOG_LEVEL";
    pub const LOG_LEVEL_ALIASES: &[&str] = &[];

    pub const SCRIPTLET_LOG_JSON: &str = "SCRIPTLET_LOG_JSON";
    pub const LOG_JSON_ALIASES: &[&str] = &[];
}
