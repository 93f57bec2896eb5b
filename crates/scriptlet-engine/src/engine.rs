use rhai::{
    packages::{Package, StandardPackage},
    Engine,
};
use scriptlet_core::config::ScriptLimits;

/// Interpreter with the standard library and the configured limits.
/// Host bindings are registered separately by the environment builder.
pub(crate) fn build_engine(limits: &ScriptLimits) -> Engine {
    let mut engine = Engine::new_raw();
    engine.register_global_module(StandardPackage::new().as_shared_module());

    // Namespace entries come from the context at run time, so names cannot be
    // checked at compile time.
    engine.set_strict_variables(false);
    engine.set_fail_on_invalid_map_property(false);

    apply_limits(&mut engine, limits);
    engine
}

fn apply_limits(engine: &mut Engine, limits: &ScriptLimits) {
    if let Some(ops) = limits.max_operations {
        engine.set_max_operations(ops);
    }
    if let Some(levels) = limits.max_call_levels {
        engine.set_max_call_levels(levels);
    }
    if let Some(depth) = limits.max_expr_depth {
        engine.set_max_expr_depths(depth, depth);
    }
    if let Some(size) = limits.max_string_size {
        engine.set_max_string_size(size);
    }
    if let Some(size) = limits.max_array_size {
        engine.set_max_array_size(size);
    }
    if let Some(size) = limits.max_map_size {
        engine.set_max_map_size(size);
    }
}
