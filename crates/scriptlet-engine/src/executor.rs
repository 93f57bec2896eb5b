//! Wrapped executor: compiles submitted source into an entry unit and drives
//! it as an asynchronous entry point against the namespace.

use rhai::{Dynamic, Engine, Scope, AST};

use crate::common::RESULT_KEY;
use crate::env::Environment;
use crate::error::{EngineError, EngineResult};

/// Submitted source compiled into the unit that runs for one call.
#[derive(Debug, Clone)]
pub struct WrappedSource {
    ast: AST,
}

impl WrappedSource {
    /// Compile `source` with the names already bound in `scope` in view.
    pub fn prepare(engine: &Engine, source: &str, scope: &Scope<'_>) -> EngineResult<Self> {
        let ast = engine.compile_with_scope(scope, source)?;
        Ok(Self { ast })
    }

    /// Run the unit with `scope` as its global scope. A top-level `return`
    /// ends the unit with that value.
    pub fn evaluate(&self, engine: &Engine, scope: &mut Scope) -> EngineResult<Dynamic> {
        engine
            .eval_ast_with_scope::<Dynamic>(scope, &self.ast)
            .map_err(EngineError::from_script_error)
    }

    pub fn ast(&self) -> &AST {
        &self.ast
    }
}

/// Entry point of one call: prepare, evaluate, and bind the return value at
/// `result` (`()` binds null). The returned future is not `Send`.
pub async fn execute_async(env: &mut Environment, source: &str) -> EngineResult<()> {
    let (engine, namespace) = env.parts_mut();
    let wrapped = WrappedSource::prepare(engine, source, namespace.scope())?;
    let value = wrapped.evaluate(engine, namespace.scope_mut())?;
    namespace.set(RESULT_KEY, value);
    Ok(())
}

/// Drive [`execute_async`] to completion on the calling thread.
///
/// Fails with [`EngineError::Runtime`] when the thread already runs an async
/// runtime; such callers await [`execute_async`] instead.
pub fn execute(env: &mut Environment, source: &str) -> EngineResult<()> {
    current_thread_runtime()?.block_on(execute_async(env, source))
}

pub(crate) fn current_thread_runtime() -> EngineResult<tokio::runtime::Runtime> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(EngineError::Runtime(
            "cannot block on a script inside an async runtime".to_string(),
        ));
    }
    tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| EngineError::Runtime(e.to_string()))
}
