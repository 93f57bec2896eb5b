//! Result serializer: namespace + captured output → one JSON payload.

use rhai::Dynamic;
use scriptlet_core::config::CaptureConfig;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::capture::CapturedOutput;
use crate::common::{ERROR_KEY, INJECTED_BINDINGS};
use crate::env::{LargeInteger, Namespace};

/// The answer to one call: filtered bindings, or a single error message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Success(Map<String, Value>),
    Failure { error: String },
}

impl Payload {
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let error = if message.trim().is_empty() {
            "unknown error".to_string()
        } else {
            message
        };
        Self::Failure { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn encode(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to encode payload: {}", e);
                let mut fallback = Map::new();
                fallback.insert(ERROR_KEY.to_string(), Value::String(e.to_string()));
                Value::Object(fallback).to_string()
            }
        }
    }
}

/// Keep every transport-safe binding, drop the `require` name, and attach the
/// captured output under the reserved keys (which win over user bindings).
pub fn serialize(namespace: &Namespace, captured: &CapturedOutput, capture: &CaptureConfig) -> Payload {
    let mut out = Map::new();
    for (name, value) in namespace.iter() {
        if INJECTED_BINDINGS.contains(&name) {
            continue;
        }
        match transport_value(&value) {
            Some(json) => {
                out.insert(name.to_string(), json);
            }
            None => {
                // The latest binding is what the script sees; an older safe one must not resurface.
                out.remove(name);
                tracing::trace!("Dropping non-transportable binding {} ({})", name, value.type_name());
            }
        }
    }

    out.insert(capture.stdout_key.clone(), Value::String(captured.stdout.clone()));
    if capture.capture_stderr {
        out.insert(capture.stderr_key.clone(), Value::String(captured.stderr.clone()));
    }
    Payload::Success(out)
}

/// JSON form of a script value, or `None` when any part of it cannot travel:
/// function pointers, custom types, blobs, timestamps, non-finite floats.
pub fn transport_value(value: &Dynamic) -> Option<Value> {
    let value = value.flatten_clone();
    if value.is_unit() {
        return Some(Value::Null);
    }
    if let Ok(b) = value.as_bool() {
        return Some(Value::Bool(b));
    }
    if let Ok(i) = value.as_int() {
        return Some(Value::from(i));
    }
    if let Ok(f) = value.as_float() {
        return Number::from_f64(f).map(Value::Number);
    }
    if let Ok(c) = value.as_char() {
        return Some(Value::String(c.to_string()));
    }
    if value.is_string() {
        return value.into_string().ok().map(Value::String);
    }
    if value.is_array() {
        let items = value.into_array().ok()?;
        return items
            .iter()
            .map(transport_value)
            .collect::<Option<Vec<_>>>()
            .map(Value::Array);
    }
    if value.is_map() {
        let map = value.try_cast::<rhai::Map>()?;
        let mut obj = Map::new();
        for (k, v) in map.iter() {
            obj.insert(k.to_string(), transport_value(v)?);
        }
        return Some(Value::Object(obj));
    }
    if value.is::<LargeInteger>() {
        return value
            .try_cast::<LargeInteger>()
            .map(|n| Value::Number(n.into_number()));
    }
    None
}
