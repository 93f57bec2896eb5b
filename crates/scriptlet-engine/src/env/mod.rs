//! Per-call environment: decoded context, namespace, and interpreter.

mod builder;
mod context;
mod namespace;

pub use builder::{Environment, EnvironmentBuilder};
pub use context::Context;
pub use namespace::{LargeInteger, Namespace};
