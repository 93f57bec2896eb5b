use std::path::PathBuf;

use rhai::{Dynamic, EvalAltResult, ParseError, Position};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Faults that end a call with an error payload.
///
/// Install failures are not listed here: the dependency resolver reports them
/// to the script as a status string and the call continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The context was not a well-formed JSON object.
    #[error("Invalid context: {0}")]
    Decode(String),

    /// An embed target does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Compile-time or run-time fault in submitted or embedded code.
    #[error("{0}")]
    Execution(String),

    /// The driver that runs the entry point could not be started.
    #[error("Failed to start script driver: {0}")]
    Runtime(String),

    /// An embed target exists but could not be read.
    #[error("Failed to read {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
}

impl EngineError {
    /// Map a failed read of `path`; a missing file becomes [`EngineError::FileNotFound`].
    pub fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path)
        } else {
            Self::Io {
                path,
                message: err.to_string(),
            }
        }
    }
}

impl EngineError {
    /// Wrap into an interpreter error so a host binding can raise it through
    /// the running script. [`EngineError::from_script_error`] recovers it.
    pub(crate) fn into_script_error(self) -> Box<EvalAltResult> {
        EvalAltResult::ErrorRuntime(Dynamic::from(self), Position::NONE).into()
    }

    /// Convert an interpreter fault. Engine errors raised by host bindings keep
    /// their kind; everything else becomes [`EngineError::Execution`].
    pub(crate) fn from_script_error(err: Box<EvalAltResult>) -> Self {
        if let EvalAltResult::ErrorRuntime(value, _) = root_cause(&err) {
            if let Some(engine_err) = value.clone().try_cast::<EngineError>() {
                return engine_err;
            }
        }
        Self::Execution(err.to_string())
    }
}

impl From<ParseError> for EngineError {
    fn from(err: ParseError) -> Self {
        Self::Execution(format!("Parse error: {err}"))
    }
}

/// Skip the wrappers added by function calls and embedded files.
fn root_cause(err: &EvalAltResult) -> &EvalAltResult {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _)
        | EvalAltResult::ErrorInModule(_, inner, _) => root_cause(inner),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_survives_script_round_trip() {
        let original = EngineError::FileNotFound(PathBuf::from("/tmp/missing.rhai"));
        let wrapped = original.clone().into_script_error();
        assert_eq!(EngineError::from_script_error(wrapped), original);
    }

    #[test]
    fn test_nested_engine_error_is_recovered() {
        let inner = EngineError::FileNotFound(PathBuf::from("lib.rhai")).into_script_error();
        let outer: Box<EvalAltResult> =
            EvalAltResult::ErrorInModule("outer.rhai".to_string(), inner, Position::NONE).into();
        assert_eq!(
            EngineError::from_script_error(outer),
            EngineError::FileNotFound(PathBuf::from("lib.rhai"))
        );
    }

    #[test]
    fn test_plain_runtime_error_becomes_execution() {
        let err: Box<EvalAltResult> =
            EvalAltResult::ErrorRuntime("boom".into(), Position::NONE).into();
        match EngineError::from_script_error(err) {
            EngineError::Execution(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            EngineError::Decode("expected a JSON object".into()).to_string(),
            "Invalid context: expected a JSON object"
        );
        assert_eq!(
            EngineError::FileNotFound(PathBuf::from("/a/b.rhai")).to_string(),
            "File not found: /a/b.rhai"
        );
    }

    #[test]
    fn test_from_io_maps_not_found() {
        let path = PathBuf::from("gone.rhai");
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        assert_eq!(EngineError::from_io(path.clone(), err), EngineError::FileNotFound(path));

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            EngineError::from_io(PathBuf::from("x.rhai"), denied),
            EngineError::Io { .. }
        ));
    }
}
