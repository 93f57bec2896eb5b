//! Unified configuration layer.
//!
//! All environment variable reads are centralized here; engine code accesses
//! structured config instead of calling `std::env::var` directly.
//!
//! - `loader`: `env_or`, `env_optional`, `env_bool` helpers and `.env` loading
//! - `schema`: `EngineConfig`, `PackageConfig`, `CaptureConfig`, `ScriptLimits`,
//!   `ObservabilityConfig`
//! - `env_keys`: key constants (with aliases)

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_optional, env_or, env_parse, load_dotenv, load_dotenv_from_dir};
pub use schema::{
    CaptureConfig, ConfigError, EngineConfig, ObservabilityConfig, PackageConfig,
    PackageManagerKind, ScriptLimits,
};
