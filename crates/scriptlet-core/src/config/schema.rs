//! Configuration structs grouped by concern.
//!
//! Loaded from environment variables with unified fallback logic.

use super::env_keys::{capture as cap_keys, limits as lim_keys, observability as obv_keys};
use super::env_keys::{packages as pkg_keys, paths as path_keys};
use super::loader::{env_bool, env_optional, env_or, env_parse, load_dotenv};
use std::path::PathBuf;
use std::str::FromStr;

/// Default reserved key for captured standard output.
pub const DEFAULT_STDOUT_KEY: &str = "__captured_stdout__";
/// Default reserved key for captured standard error.
pub const DEFAULT_STDERR_KEY: &str = "__captured_stderr__";
/// Default script file extension recognized by `require`.
pub const DEFAULT_SCRIPT_EXTENSION: &str = "rhai";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown package manager '{0}' (expected pip, npm or none)")]
    UnknownPackageManager(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fallback base directory for script embeds (the context `templateDir` wins).
    pub template_dir: Option<PathBuf>,
    /// Extensions (without dot) that mark a `require` identifier as a script file.
    pub script_extensions: Vec<String>,
    pub packages: PackageConfig,
    pub capture: CaptureConfig,
    pub limits: ScriptLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            template_dir: None,
            script_extensions: vec![DEFAULT_SCRIPT_EXTENSION.to_string()],
            packages: PackageConfig::default(),
            capture: CaptureConfig::default(),
            limits: ScriptLimits::default(),
        }
    }
}

impl EngineConfig {
    /// Load from environment variables (loads `.env` first).
    pub fn from_env() -> Self {
        load_dotenv();
        let script_extensions = env_optional(path_keys::SCRIPTLET_SCRIPT_EXTENSIONS, &[])
            .map(|raw| parse_extensions(&raw))
            .filter(|exts| !exts.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_SCRIPT_EXTENSION.to_string()]);
        Self {
            template_dir: env_optional(
                path_keys::SCRIPTLET_TEMPLATE_DIR,
                path_keys::TEMPLATE_DIR_ALIASES,
            )
            .map(PathBuf::from),
            script_extensions,
            packages: PackageConfig::from_env(),
            capture: CaptureConfig::from_env(),
            limits: ScriptLimits::from_env(),
        }
    }

    /// Override the fallback template directory (e.g. from a CLI flag).
    pub fn with_template_dir(mut self, dir: Option<PathBuf>) -> Self {
        if dir.is_some() {
            self.template_dir = dir;
        }
        self
    }
}

/// Split "rhai, .script" into ["rhai", "script"].
fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Which external package manager backs `require("<package>")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManagerKind {
    Pip,
    Npm,
    /// Package installation disabled.
    None,
}

impl FromStr for PackageManagerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pip" | "python" => Ok(Self::Pip),
            "npm" | "node" => Ok(Self::Npm),
            "none" | "off" | "0" => Ok(Self::None),
            other => Err(ConfigError::UnknownPackageManager(other.to_string())),
        }
    }
}

/// External package manager settings.
#[derive(Debug, Clone)]
pub struct PackageConfig {
    pub manager: PackageManagerKind,
    /// Python interpreter for `-m pip`; `None` means probe `python3` then `python` on PATH.
    pub python: Option<String>,
    pub npm: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            manager: PackageManagerKind::Pip,
            python: None,
            npm: "npm".to_string(),
        }
    }
}

impl PackageConfig {
    pub fn from_env() -> Self {
        let manager = match env_optional(pkg_keys::SCRIPTLET_PACKAGE_MANAGER, &[]) {
            Some(raw) => raw.parse().unwrap_or_else(|e: ConfigError| {
                tracing::warn!("{}, using pip", e);
                PackageManagerKind::Pip
            }),
            None => PackageManagerKind::Pip,
        };
        Self {
            manager,
            python: env_optional(pkg_keys::SCRIPTLET_PYTHON, pkg_keys::PYTHON_ALIASES),
            npm: env_or(pkg_keys::SCRIPTLET_NPM, &[], || "npm".to_string()),
        }
    }
}

/// Reserved result keys for captured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub stdout_key: String,
    pub stderr_key: String,
    /// When false, stderr text is still swallowed but not attached to the result.
    pub capture_stderr: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            stdout_key: DEFAULT_STDOUT_KEY.to_string(),
            stderr_key: DEFAULT_STDERR_KEY.to_string(),
            capture_stderr: true,
        }
    }
}

impl CaptureConfig {
    pub fn from_env() -> Self {
        Self {
            stdout_key: env_or(cap_keys::SCRIPTLET_STDOUT_KEY, &[], || {
                DEFAULT_STDOUT_KEY.to_string()
            }),
            stderr_key: env_or(cap_keys::SCRIPTLET_STDERR_KEY, &[], || {
                DEFAULT_STDERR_KEY.to_string()
            }),
            capture_stderr: env_bool(cap_keys::SCRIPTLET_CAPTURE_STDERR, &[], true),
        }
    }
}

/// Interpreter limits. `None` keeps the interpreter's built-in default;
/// there is no wall-clock timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptLimits {
    pub max_operations: Option<u64>,
    pub max_call_levels: Option<usize>,
    pub max_expr_depth: Option<usize>,
    pub max_string_size: Option<usize>,
    pub max_array_size: Option<usize>,
    pub max_map_size: Option<usize>,
}

impl ScriptLimits {
    pub fn from_env() -> Self {
        Self {
            max_operations: env_parse(lim_keys::SCRIPTLET_MAX_OPERATIONS),
            max_call_levels: env_parse(lim_keys::SCRIPTLET_MAX_CALL_LEVELS),
            max_expr_depth: env_parse(lim_keys::SCRIPTLET_MAX_EXPR_DEPTH),
            max_string_size: env_parse(lim_keys::SCRIPTLET_MAX_STRING_SIZE),
            max_array_size: env_parse(lim_keys::SCRIPTLET_MAX_ARRAY_SIZE),
            max_map_size: env_parse(lim_keys::SCRIPTLET_MAX_MAP_SIZE),
        }
    }

    /// Override with CLI parameters
    pub fn with_cli_overrides(mut self, max_operations: Option<u64>) -> Self {
        if let Some(ops) = max_operations {
            self.max_operations = Some(ops);
        }
        self
    }
}

/// Logging settings.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            load_dotenv();
            Self {
                quiet: env_bool(obv_keys::SCRIPTLET_QUIET, obv_keys::QUIET_ALIASES, false),
                log_level: env_or(obv_keys::SCRIPTLET_LOG_LEVEL, obv_keys::LOG_LEVEL_ALIASES, || {
                    "scriptlet=info".to_string()
                }),
                log_json: env_bool(obv_keys::SCRIPTLET_LOG_JSON, obv_keys::LOG_JSON_ALIASES, false),
            }
        })
    }
}
