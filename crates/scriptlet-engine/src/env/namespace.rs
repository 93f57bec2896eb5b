use rhai::{Dynamic, Scope};
use serde_json::{Number, Value};

use super::context::Context;
use crate::error::{EngineError, EngineResult};

/// A context integer outside the script integer range (above `i64::MAX`).
/// Scripts can pass it around and print it; it serializes back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LargeInteger(Number);

impl LargeInteger {
    pub fn number(&self) -> &Number {
        &self.0
    }

    pub fn into_number(self) -> Number {
        self.0
    }
}

impl std::fmt::Display for LargeInteger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Script value for a context value. Integers that would otherwise degrade
/// to floats become [`LargeInteger`], at any depth.
fn script_value(value: &Value) -> Result<Dynamic, String> {
    match value {
        Value::Number(n) if n.is_u64() && n.as_i64().is_none() => {
            Ok(Dynamic::from(LargeInteger(n.clone())))
        }
        Value::Array(items) => items
            .iter()
            .map(script_value)
            .collect::<Result<rhai::Array, _>>()
            .map(Dynamic::from_array),
        Value::Object(entries) => entries
            .iter()
            .map(|(k, v)| script_value(v).map(|v| (k.as_str().into(), v)))
            .collect::<Result<rhai::Map, _>>()
            .map(Dynamic::from_map),
        other => rhai::serde::to_dynamic(other).map_err(|e| e.to_string()),
    }
}

/// The mutable binding environment of one call.
///
/// Entries are script values. A name bound twice keeps both entries; lookups
/// and serialization see the latest one.
#[derive(Debug, Default)]
pub struct Namespace {
    scope: Scope<'static>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a namespace with every context entry converted to a script value.
    pub fn from_context(context: &Context) -> EngineResult<Self> {
        let mut ns = Self::new();
        for (name, value) in context.iter() {
            let value =
                script_value(value).map_err(|e| EngineError::Decode(format!("{name}: {e}")))?;
            ns.set(name, value);
        }
        Ok(ns)
    }

    pub fn get(&self, name: &str) -> Option<Dynamic> {
        self.scope.get_value::<Dynamic>(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scope.contains(name)
    }

    /// Bind `name`, replacing the latest existing binding if there is one.
    pub fn set(&mut self, name: &str, value: Dynamic) {
        self.scope.set_or_push(name, value);
    }

    pub fn len(&self) -> usize {
        self.scope.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scope.is_empty()
    }

    /// Entries in binding order, shadowed ones included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Dynamic)> {
        self.scope.iter().map(|(name, _, value)| (name, value))
    }

    pub(crate) fn scope(&self) -> &Scope<'static> {
        &self.scope
    }

    pub(crate) fn scope_mut(&mut self) -> &mut Scope<'static> {
        &mut self.scope
    }
}
