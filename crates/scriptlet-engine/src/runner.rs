//! Top-level call: build → capture → execute → serialize, as one atomic answer.

use std::sync::{Arc, OnceLock};

use scriptlet_core::config::EngineConfig;
use tracing::Instrument;

use crate::capture::DirectOutput;
use crate::env::EnvironmentBuilder;
use crate::error::EngineResult;
use crate::executor::{current_thread_runtime, execute_async};
use crate::info_log;
use crate::installer::{installer_from_config, DependencyResolver, PackageInstaller};
use crate::serializer::{serialize, Payload};

/// Runs script jobs. Cheap to clone; clones share the installed-package memo.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    builder: EnvironmentBuilder,
}

impl ScriptRunner {
    pub fn new(config: EngineConfig) -> Self {
        let resolver = DependencyResolver::new(installer_from_config(&config.packages));
        Self {
            builder: EnvironmentBuilder::new(config, resolver),
        }
    }

    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    /// Replace the package installer. Starts a fresh installed-package memo.
    pub fn with_installer(self, installer: Arc<dyn PackageInstaller>) -> Self {
        let config = self.builder.config().clone();
        Self {
            builder: EnvironmentBuilder::new(config, DependencyResolver::new(installer)),
        }
    }

    /// Send `printit` output to `direct` instead of the process stdout.
    pub fn with_direct_output(self, direct: DirectOutput) -> Self {
        Self {
            builder: self.builder.with_direct_output(direct),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.builder.config()
    }

    /// Execute `source` with the JSON object `context` (blank means `{}`) and
    /// return the encoded payload. Blocks the calling thread; inside an async
    /// runtime prefer [`ScriptRunner::run_async`].
    pub fn run(&self, source: &str, context: &str) -> String {
        self.execute(source, context).encode()
    }

    pub async fn run_async(&self, source: &str, context: &str) -> String {
        self.execute_async(source, context).await.encode()
    }

    pub fn execute(&self, source: &str, context: &str) -> Payload {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.block_on(source, context);
        }
        // A runtime cannot be started on a thread that already drives one.
        tracing::debug!("Called inside an async runtime; running on a scoped thread");
        std::thread::scope(|s| {
            s.spawn(|| self.block_on(source, context))
                .join()
                .unwrap_or_else(|_| Payload::failure("script thread panicked"))
        })
    }

    fn block_on(&self, source: &str, context: &str) -> Payload {
        match current_thread_runtime() {
            Ok(rt) => rt.block_on(self.execute_async(source, context)),
            Err(e) => {
                tracing::warn!("{}", e);
                Payload::failure(e.to_string())
            }
        }
    }

    pub async fn execute_async(&self, source: &str, context: &str) -> Payload {
        let call_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("call", id = %call_id);
        async move {
            match self.pipeline(source, context).await {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!("Call failed: {}", e);
                    Payload::failure(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn pipeline(&self, source: &str, context: &str) -> EngineResult<Payload> {
        let context = if context.trim().is_empty() { "{}" } else { context };
        let mut env = self.builder.build(context)?;
        info_log!("Executing script ({} bytes)", source.len());

        let guard = env.capture().begin();
        let outcome = execute_async(&mut env, source).await;
        let captured = guard.finish();
        outcome?;

        let payload = serialize(env.namespace(), &captured, &self.config().capture);
        tracing::debug!("Call finished");
        Ok(payload)
    }
}

/// Run one job with a process-wide runner configured from the environment.
pub fn run(source: &str, context: &str) -> String {
    static DEFAULT: OnceLock<ScriptRunner> = OnceLock::new();
    DEFAULT.get_or_init(ScriptRunner::from_env).run(source, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::SharedBuffer;
    use crate::installer::tests::FakeInstaller;
    use crate::installer::NoopInstaller;
    use serde_json::{json, Value};

    fn runner() -> ScriptRunner {
        ScriptRunner::new(EngineConfig::default()).with_installer(Arc::new(NoopInstaller))
    }

    fn run_json(runner: &ScriptRunner, source: &str, context: &str) -> Value {
        serde_json::from_str(&runner.run(source, context)).unwrap()
    }

    #[test]
    fn test_context_round_trips() {
        let ctx = json!({"name": "job", "n": 3, "ratio": 0.5, "tags": ["a", "b"], "meta": {"ok": true}, "nothing": null});
        let out = run_json(&runner(), "", &ctx.to_string());
        for (key, value) in ctx.as_object().unwrap() {
            assert_eq!(&out[key], value, "{key}");
        }
    }

    #[test]
    fn test_binding_appears() {
        let out = run_json(&runner(), "let x = 5;", "{}");
        assert_eq!(out["x"], json!(5));
        assert_eq!(out["result"], Value::Null);
    }

    #[test]
    fn test_return_value() {
        let out = run_json(&runner(), "return 2 + 2;", "{}");
        assert_eq!(out["result"], json!(4));
    }

    #[test]
    fn test_error_payload_is_exclusive() {
        for (source, context) in [
            ("let x = 1; throw \"boom\";", "{}"),
            ("let = ;", "{}"),
            ("let x = 1;", "{not json"),
            ("let x = 1;", "[1]"),
        ] {
            let out = run_json(&runner(), source, context);
            let obj = out.as_object().unwrap();
            assert_eq!(obj.len(), 1, "{source} / {context}: {out}");
            assert!(!obj["error"].as_str().unwrap().is_empty());
        }
    }

    #[test]
    fn test_print_is_captured() {
        let out = run_json(&runner(), r#"print("hi");"#, "{}");
        assert_eq!(
            out,
            json!({"result": null, "__captured_stdout__": "hi\n", "__captured_stderr__": ""})
        );
    }

    #[test]
    fn test_output_before_error_is_discarded() {
        let out = run_json(&runner(), r#"print("partial"); throw "late";"#, "{}");
        assert!(out.get("__captured_stdout__").is_none());
        assert!(out["error"].as_str().unwrap().contains("late"));
    }

    #[test]
    fn test_unsafe_values_are_dropped_silently() {
        let out = run_json(
            &runner(),
            r#"let f = Fn("foo"); let s = silence(|| print("x")); let ok = 1;"#,
            "{}",
        );
        let obj = out.as_object().unwrap();
        assert!(!obj.contains_key("f"));
        assert!(!obj.contains_key("s"));
        assert_eq!(obj["ok"], json!(1));
    }

    #[test]
    fn test_require_dispatch() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("X.rhai"), "let from_x = 1;").unwrap();
        std::fs::write(tmp.path().join("y.rhai"), "let from_y = 2;").unwrap();
        let abs = tmp.path().join("z.rhai");
        std::fs::write(&abs, "let from_z = 3;").unwrap();

        let fake = Arc::new(FakeInstaller::with_present(&["numpy"]));
        let runner = runner().with_installer(fake);
        let source = format!(
            r#"
                let a = require("X.rhai");
                let b = require("./y.rhai");
                let c = require("{}");
                let d = require("numpy");
            "#,
            abs.display()
        );
        let ctx = json!({ "templateDir": tmp.path() }).to_string();
        let out = run_json(&runner, &source, &ctx);
        assert_eq!(out["a"], json!("Embedded X.rhai"));
        assert_eq!(out["b"], json!("Embedded ./y.rhai"));
        assert_eq!(out["c"], json!(format!("Embedded {}", abs.display())));
        assert_eq!(out["d"], json!("numpy is ready to use."));
        assert_eq!(out["from_x"], json!(1));
        assert_eq!(out["from_y"], json!(2));
        assert_eq!(out["from_z"], json!(3));
    }

    #[test]
    fn test_failing_install_does_not_fail_call() {
        let fake = Arc::new(FakeInstaller::with_broken(&["nonexistent-pkg-xyz"]));
        let runner = runner().with_installer(fake);
        let out = run_json(&runner, r#"let r = require("nonexistent-pkg-xyz");"#, "{}");
        assert!(out["r"]
            .as_str()
            .unwrap()
            .starts_with("Error installing nonexistent-pkg-xyz"));
    }

    #[test]
    fn test_missing_embed_fails_call() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = json!({ "templateDir": tmp.path() }).to_string();
        let out = run_json(&runner(), r#"require("missing.rhai");"#, &ctx);
        assert!(out["error"].as_str().unwrap().starts_with("File not found"));
    }

    #[test]
    fn test_embedded_output_is_captured() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("noisy.rhai"), r#"print("from embed");"#).unwrap();
        let ctx = json!({ "templateDir": tmp.path() }).to_string();
        let out = run_json(&runner(), r#"require("noisy.rhai"); print("main");"#, &ctx);
        assert_eq!(out["__captured_stdout__"], json!("from embed\nmain\n"));
    }

    #[test]
    fn test_blank_context_means_empty_object() {
        let out = run_json(&runner(), "let x = 1;", "  ");
        assert_eq!(out["x"], json!(1));
    }

    #[test]
    fn test_calls_are_isolated() {
        let runner = runner();
        run_json(&runner, "let leaked = 1;", "{}");
        let out = run_json(&runner, "", "{}");
        assert!(out.get("leaked").is_none());
    }

    #[test]
    fn test_operation_limit_stops_runaway_script() {
        let mut config = EngineConfig::default();
        config.limits.max_operations = Some(10_000);
        let runner = ScriptRunner::new(config).with_installer(Arc::new(NoopInstaller));
        let out = run_json(&runner, "loop { }", "{}");
        assert!(out.get("error").is_some());
    }

    #[test]
    fn test_run_async_inside_runtime() {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let payload = rt.block_on(runner().run_async("return 7;", "{}"));
        let out: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(out["result"], json!(7));
    }

    #[test]
    fn test_sync_run_inside_runtime() {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let payload = rt.block_on(async { runner().run("return 1;", r#"{"a": 2}"#) });
        let out: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(out["result"], json!(1));
        assert_eq!(out["a"], json!(2));
    }

    #[test]
    fn test_nested_and_dynamic_embeds_expose_functions() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("b.rhai"), "fn triple(x) { x * 3 }").unwrap();
        std::fs::write(tmp.path().join("a.rhai"), "require(\"b.rhai\"); let nine = triple(3);").unwrap();
        std::fs::write(tmp.path().join("f.rhai"), "fn sq(x) { x * x }").unwrap();
        let ctx = json!({ "templateDir": tmp.path(), "lib": "f.rhai" }).to_string();

        let out = run_json(&runner(), r#"require("a.rhai"); return nine;"#, &ctx);
        assert_eq!(out["result"], json!(9), "{out}");
        let out = run_json(&runner(), "require(lib); return sq(3);", &ctx);
        assert_eq!(out["result"], json!(9), "{out}");
        let out = run_json(&runner(), r#"if false { require("f.rhai"); } return sq(3);"#, &ctx);
        assert!(out["error"].as_str().unwrap().contains("sq"), "{out}");
    }

    #[test]
    fn test_only_printit_reaches_direct_output() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("noisy.rhai"), r#"print("embed"); debug("dbg");"#).unwrap();
        let buffer = SharedBuffer::default();
        let runner = runner().with_direct_output(DirectOutput::new(buffer.clone()));
        let ctx = json!({ "templateDir": tmp.path() }).to_string();
        let out = run_json(
            &runner,
            r#"
                require("noisy.rhai");
                print("main");
                eprint("warn");
                let s = silence(|| print("hushed"));
                printit("progress");
            "#,
            &ctx,
        );
        assert_eq!(out["__captured_stdout__"], json!("embed\nmain\n"));
        assert_eq!(out["__captured_stderr__"], json!("\"dbg\"\nwarn\n"));
        assert_eq!(buffer.contents(), "progress\n");
    }

    #[test]
    fn test_large_integers_round_trip() {
        let ctx = r#"{"big": 18446744073709551615, "nested": [9223372036854775808], "small": -1}"#;
        let payload = runner().run("", ctx);
        assert!(payload.contains(r#""big":18446744073709551615"#), "{payload}");
        assert!(payload.contains(r#""nested":[9223372036854775808]"#), "{payload}");
        assert!(payload.contains(r#""small":-1"#), "{payload}");
    }

    #[test]
    fn test_helper_names_are_ordinary_bindings() {
        let out = run_json(&runner(), "let printit_count = 1;", r#"{"silence": true, "printit": "x"}"#);
        assert_eq!(out["silence"], json!(true));
        assert_eq!(out["printit"], json!("x"));
        assert_eq!(out["printit_count"], json!(1));
    }
}
