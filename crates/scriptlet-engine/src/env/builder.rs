//! Environment builder: context → namespace, plus an interpreter carrying the
//! host bindings every call gets.
//!
//! Host bindings:
//! - `require(id)`: embeds a script file or ensures a package (see [`Requirement`]).
//!   Implemented as custom syntax so an embed can write into the caller's scope
//!   and hand its functions to the caller.
//! - `printit(value)`: writes to the direct output (the real stdout), bypassing capture.
//! - `eprint(value)`: writes `value` unformatted to the captured stderr stream.
//! - `silence(|| ..)`: runs a closure inside a nested capture frame and returns
//!   a `Silenced` value whose `output` and `errors` hold the swallowed text.
//! - `print` / `debug`: routed into the current capture frame.

use rhai::{Dynamic, Engine, EvalAltResult, EvalContext, FnPtr, NativeCallContext};
use scriptlet_core::config::{EngineConfig, ScriptLimits};

use super::context::Context;
use super::namespace::{LargeInteger, Namespace};
use crate::capture::{CaptureStack, DirectOutput, Silenced, Stream};
use crate::common::default_template_dir;
use crate::embed::{EmbeddedFunctions, ScriptEmbedder};
use crate::engine::build_engine;
use crate::error::{EngineError, EngineResult};
use crate::installer::DependencyResolver;
use crate::require::Requirement;

/// Everything a host binding needs. Cheap to clone; every interpreter built
/// for a call (the top-level one and one per nested embed) shares it.
#[derive(Debug, Clone)]
pub(crate) struct HostBindings {
    capture: CaptureStack,
    direct: DirectOutput,
    embedder: ScriptEmbedder,
    functions: EmbeddedFunctions,
    resolver: DependencyResolver,
    limits: ScriptLimits,
}

impl HostBindings {
    pub(crate) fn engine(&self) -> EngineResult<Engine> {
        let mut engine = build_engine(&self.limits);
        self.register(&mut engine)?;
        Ok(engine)
    }

    fn register(&self, engine: &mut Engine) -> EngineResult<()> {
        let out = self.capture.clone();
        engine.on_print(move |text| out.write_line(Stream::Stdout, text));
        let err = self.capture.clone();
        engine.on_debug(move |text, _source, _pos| err.write_line(Stream::Stderr, text));

        let direct = self.direct.clone();
        engine.register_fn("printit", move |value: Dynamic| {
            direct.write_line(&value.to_string())
        });
        let err = self.capture.clone();
        engine.register_fn("eprint", move |value: Dynamic| {
            err.write_line(Stream::Stderr, &value.to_string())
        });

        engine
            .register_type_with_name::<LargeInteger>("LargeInteger")
            .register_fn("to_string", |n: &mut LargeInteger| n.to_string())
            .register_fn("to_debug", |n: &mut LargeInteger| n.to_string());
        engine
            .register_type_with_name::<Silenced>("Silenced")
            .register_get("output", |s: &mut Silenced| s.output().to_string())
            .register_get("errors", |s: &mut Silenced| s.errors().to_string());
        let capture = self.capture.clone();
        engine.register_fn(
            "silence",
            move |ctx: NativeCallContext, body: FnPtr| -> Result<Silenced, Box<EvalAltResult>> {
                let guard = capture.begin();
                body.call_within_context::<Dynamic>(&ctx, ())?;
                Ok(Silenced::new(guard.finish()))
            },
        );

        let bindings = self.clone();
        engine.register_custom_syntax(
            ["require", "(", "$expr$", ")"],
            true,
            move |context, inputs| {
                let id = context.eval_expression_tree(&inputs[0])?;
                let id = id
                    .into_string()
                    .map_err(|t| format!("require expects a string, got {t}"))?;
                bindings.require(context, &id)
            },
        )?;
        Ok(())
    }

    fn require(
        &self,
        context: &mut EvalContext,
        identifier: &str,
    ) -> Result<Dynamic, Box<EvalAltResult>> {
        match Requirement::classify(identifier, self.embedder.script_extensions()) {
            Requirement::Package(name) => Ok(self.resolver.ensure_package(&name).into()),
            Requirement::File(path) => {
                let engine = self.engine().map_err(EngineError::into_script_error)?;
                let mark = self.functions.len();
                let ast = self.embedder.embed(&engine, context.scope_mut(), &path)?;
                self.functions.record(&ast);
                // Files the embed required were recorded first; the file's own
                // functions sit on top and are searched before them.
                context
                    .global_runtime_state_mut()
                    .lib
                    .extend(self.functions.since(mark));
                Ok(format!("Embedded {path}").into())
            }
        }
    }
}

/// Builds one [`Environment`] per call.
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    config: EngineConfig,
    resolver: DependencyResolver,
    direct: DirectOutput,
}

impl EnvironmentBuilder {
    pub fn new(config: EngineConfig, resolver: DependencyResolver) -> Self {
        Self {
            config,
            resolver,
            direct: DirectOutput::stdout(),
        }
    }

    /// Send `printit` output somewhere other than the process stdout.
    pub fn with_direct_output(mut self, direct: DirectOutput) -> Self {
        self.direct = direct;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decode `context_json` and build a fresh namespace and interpreter.
    pub fn build(&self, context_json: &str) -> EngineResult<Environment> {
        let context = Context::parse(context_json)?;
        self.build_from(&context)
    }

    pub fn build_from(&self, context: &Context) -> EngineResult<Environment> {
        let namespace = Namespace::from_context(context)?;
        let base_dir = context
            .template_dir()
            .unwrap_or_else(|| default_template_dir(&self.config));
        tracing::debug!(
            entries = namespace.len(),
            base_dir = %base_dir.display(),
            "Built namespace"
        );

        let bindings = HostBindings {
            capture: CaptureStack::new(),
            direct: self.direct.clone(),
            embedder: ScriptEmbedder::new(base_dir, self.config.script_extensions.clone()),
            functions: EmbeddedFunctions::new(),
            resolver: self.resolver.clone(),
            limits: self.config.limits,
        };
        let engine = bindings.engine()?;
        Ok(Environment {
            engine,
            namespace,
            bindings,
        })
    }
}

/// Namespace and interpreter of one call. Dropped when the call ends.
pub struct Environment {
    engine: Engine,
    namespace: Namespace,
    bindings: HostBindings,
}

impl Environment {
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn namespace_mut(&mut self) -> &mut Namespace {
        &mut self.namespace
    }

    pub fn into_namespace(self) -> Namespace {
        self.namespace
    }

    pub fn capture(&self) -> &CaptureStack {
        &self.bindings.capture
    }

    pub fn embedder(&self) -> &ScriptEmbedder {
        &self.bindings.embedder
    }

    /// Disjoint borrows for evaluation.
    pub(crate) fn parts_mut(&mut self) -> (&Engine, &mut Namespace) {
        (&self.engine, &mut self.namespace)
    }
}
