//! Script embedder: evaluates external script files into the live namespace.
//!
//! An embedded file runs against the caller's scope, so its top-level `let`
//! bindings and side effects are visible afterwards. Its `fn` definitions are
//! collected in an [`EmbeddedFunctions`] registry; the `require` binding pushes
//! them onto the caller's function namespaces, together with those of any file
//! the embed itself required.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rhai::{Engine, EvalAltResult, Module, Position, Scope, Shared, AST};

use crate::error::{EngineError, EngineResult};
use crate::info_log;

/// Function libraries of the files embedded during one call, in embed order.
/// Shared by every interpreter of the call.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedFunctions {
    libraries: Rc<RefCell<Vec<Shared<Module>>>>,
}

impl EmbeddedFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.libraries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.borrow().is_empty()
    }

    /// Record the functions of an evaluated file. Files without any are skipped.
    pub fn record(&self, ast: &AST) {
        if ast.iter_functions().next().is_some() {
            self.libraries.borrow_mut().push(ast.shared_lib().clone());
        }
    }

    /// Libraries recorded since the registry had `mark` entries.
    pub fn since(&self, mark: usize) -> Vec<Shared<Module>> {
        self.libraries
            .borrow()
            .get(mark..)
            .map(<[_]>::to_vec)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ScriptEmbedder {
    base_dir: PathBuf,
    script_extensions: Vec<String>,
}

impl ScriptEmbedder {
    pub fn new(base_dir: impl Into<PathBuf>, script_extensions: Vec<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            script_extensions,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn script_extensions(&self) -> &[String] {
        &self.script_extensions
    }

    /// Absolute paths are kept; anything else is joined onto the base directory.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    /// Read the whole file named by `path`.
    pub fn read(&self, path: &str) -> EngineResult<(PathBuf, String)> {
        let full = self.resolve(path);
        match std::fs::read_to_string(&full) {
            Ok(text) => Ok((full, text)),
            Err(e) => Err(EngineError::from_io(full, e)),
        }
    }

    /// Compile the file at `path` and evaluate it directly in `scope`.
    /// Returns the compiled unit, whose function library the caller may expose.
    ///
    /// Faults inside the file come back wrapped with the file path; a missing
    /// file is raised as [`EngineError::FileNotFound`].
    pub fn embed(
        &self,
        engine: &Engine,
        scope: &mut Scope,
        path: &str,
    ) -> Result<AST, Box<EvalAltResult>> {
        let (full, text) = self.read(path).map_err(EngineError::into_script_error)?;
        info_log!("Embedding {}", full.display());
        let in_file = |err: Box<EvalAltResult>| {
            Box::new(EvalAltResult::ErrorInModule(
                full.display().to_string(),
                err,
                Position::NONE,
            ))
        };
        let ast = engine
            .compile_with_scope(scope, &text)
            .map_err(|e| in_file(e.into()))?;
        engine.run_ast_with_scope(scope, &ast).map_err(in_file)?;
        Ok(ast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::build_engine;
    use scriptlet_core::config::ScriptLimits;

    fn embedder(dir: &Path) -> ScriptEmbedder {
        ScriptEmbedder::new(dir, vec!["rhai".to_string()])
    }

    #[test]
    fn test_resolve() {
        let e = embedder(Path::new("/srv/tpl"));
        assert_eq!(e.resolve("lib.rhai"), PathBuf::from("/srv/tpl/lib.rhai"));
        assert_eq!(e.resolve("/abs/lib.rhai"), PathBuf::from("/abs/lib.rhai"));
    }

    #[test]
    fn test_embed_binds_into_scope() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("vars.rhai"), "let y = 10;\nlet z = y * 2;").unwrap();
        let engine = build_engine(&ScriptLimits::default());
        let mut scope = Scope::new();

        let ast = embedder(tmp.path()).embed(&engine, &mut scope, "vars.rhai").unwrap();
        assert_eq!(ast.iter_functions().count(), 0);
        assert_eq!(scope.get_value::<i64>("y"), Some(10));
        assert_eq!(scope.get_value::<i64>("z"), Some(20));
    }

    #[test]
    fn test_embed_returns_function_library() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("math.rhai"),
            "fn square(x) { x * x }\nlet nine = square(3);",
        )
        .unwrap();
        let engine = build_engine(&ScriptLimits::default());
        let mut scope = Scope::new();

        let ast = embedder(tmp.path()).embed(&engine, &mut scope, "math.rhai").unwrap();
        let names: Vec<String> = ast.iter_functions().map(|f| f.name.to_string()).collect();
        assert_eq!(names, vec!["square"]);
        assert_eq!(scope.get_value::<i64>("nine"), Some(9));
    }

    #[test]
    fn test_embed_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = build_engine(&ScriptLimits::default());
        let mut scope = Scope::new();
        let err = embedder(tmp.path())
            .embed(&engine, &mut scope, "missing.rhai")
            .unwrap_err();
        assert_eq!(
            EngineError::from_script_error(err),
            EngineError::FileNotFound(tmp.path().join("missing.rhai"))
        );
    }

    #[test]
    fn test_embed_fault_is_tagged_with_path() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("bad.rhai"), "let x = ;").unwrap();
        std::fs::write(tmp.path().join("throws.rhai"), "throw \"nope\";").unwrap();
        let engine = build_engine(&ScriptLimits::default());
        let mut scope = Scope::new();
        for file in ["bad.rhai", "throws.rhai"] {
            let err = embedder(tmp.path())
                .embed(&engine, &mut scope, file)
                .unwrap_err();
            assert!(err.to_string().contains(file), "{err}");
        }
    }

    #[test]
    fn test_registry_skips_files_without_functions() {
        let engine = build_engine(&ScriptLimits::default());
        let registry = EmbeddedFunctions::new();
        registry.record(&engine.compile("let a = 1;").unwrap());
        assert!(registry.is_empty());

        registry.record(&engine.compile("fn one() { 1 }").unwrap());
        let mark = registry.len();
        registry.record(&engine.compile("fn two() { 2 }").unwrap());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.since(mark).len(), 1);
        assert_eq!(registry.since(0).len(), 2);
        assert!(registry.since(5).is_empty());
    }
}
