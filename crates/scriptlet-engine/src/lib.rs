//! Embeddable script-execution engine.
//!
//! One call takes a Rhai source snippet and a JSON context, evaluates the
//! snippet in a fresh namespace seeded from the context, and returns the
//! resulting bindings plus captured output as a JSON string:
//!
//! ```no_run
//! let payload = scriptlet_engine::run("let x = 5; return x * 2;", r#"{"name":"job"}"#);
//! // {"__captured_stderr__":"","__captured_stdout__":"","name":"job","result":10,"x":5}
//! ```
//!
//! Submitted code may call `require("pkg")` to install a missing package,
//! `require("lib.rhai")` to embed another script into the namespace,
//! `printit(..)` to write progress past the capture, `eprint(..)` to write raw
//! text to the captured stderr, and `silence(|| ..)` to swallow its own output.
//! Functions defined in an embedded file are callable once its `require` has run.

pub mod capture;
pub mod common;
pub mod embed;
mod engine;
pub mod env;
pub mod error;
pub mod executor;
pub mod installer;
pub mod log;
pub mod require;
pub mod runner;
pub mod serializer;

pub use capture::{CaptureGuard, CaptureStack, CapturedOutput, DirectOutput, Silenced};
pub use env::{Context, Environment, EnvironmentBuilder, LargeInteger, Namespace};
pub use error::{EngineError, EngineResult};
pub use installer::{
    CommandInstaller, DependencyResolver, InstallError, NoopInstaller, PackageInstaller,
};
pub use require::Requirement;
pub use runner::{run, ScriptRunner};
pub use serializer::Payload;
