use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::common::TEMPLATE_DIR_KEY;
use crate::error::{EngineError, EngineResult};

/// Decoded call context: the initial named values of a namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: Map<String, Value>,
}

impl Context {
    /// Decode a JSON object. Malformed JSON or any other top-level value is an error.
    pub fn parse(json: &str) -> EngineResult<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| EngineError::Decode(e.to_string()))?;
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(EngineError::Decode(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Base directory for embeds, when the context names one.
    pub fn template_dir(&self) -> Option<PathBuf> {
        self.values
            .get(TEMPLATE_DIR_KEY)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Map<String, Value>> for Context {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object() {
        let ctx = Context::parse(r#"{"a": 1, "templateDir": "/srv/tpl"}"#).unwrap();
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.template_dir(), Some(PathBuf::from("/srv/tpl")));
    }

    #[test]
    fn test_empty_object() {
        let ctx = Context::parse("{}").unwrap();
        assert!(ctx.is_empty());
        assert_eq!(ctx.template_dir(), None);
    }

    #[test]
    fn test_rejects_malformed_and_non_objects() {
        assert!(matches!(Context::parse("{not json"), Err(EngineError::Decode(_))));
        match Context::parse("[1, 2]") {
            Err(EngineError::Decode(msg)) => assert!(msg.contains("an array")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_non_string_template_dir_is_ignored() {
        let ctx = Context::parse(r#"{"templateDir": 5}"#).unwrap();
        assert_eq!(ctx.template_dir(), None);
    }
}
