//! In-process script runner.
//!
//! Runs Rhai sources on a freshly built raw engine with only the value
//! manipulation packages registered, so scripts get arithmetic, strings,
//! arrays, maps, and iterators but no process, filesystem, or network
//! surface. `print` and `debug` statements are routed into a per-invocation
//! capture buffer, and a wall-clock deadline is enforced through the engine's
//! progress hook.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use rhai::packages::{
    ArithmeticPackage, BasicArrayPackage, BasicIteratorPackage, BasicMapPackage, BasicMathPackage,
    BasicStringPackage, LogicPackage, Package,
};
use rhai::{Dynamic, Engine, EvalAltResult, Scope};
use serde_json::{Map, Value};
use tracing::debug;

use harbor_gate::Language;

use crate::config::ExecutorConfig;
use crate::output;
use crate::result::ExecutionResult;

/// Tracing target for script runner operations.
const SCRIPT_TARGET: &str = "harbor_exec::script";

/// Structural depth limit for expressions at global level.
const MAX_EXPR_DEPTH: usize = 64;
/// Structural depth limit for expressions inside functions.
const MAX_FUNCTION_EXPR_DEPTH: usize = 32;
/// Maximum nesting of function calls.
const MAX_CALL_LEVELS: usize = 64;
/// Maximum size of any string value, in bytes.
const MAX_STRING_SIZE: usize = 1 << 20;
/// Maximum number of elements in any array or map.
const MAX_COLLECTION_SIZE: usize = 16_384;

/// Compiles and runs a script, returning the captured output.
pub(crate) fn run(
    source: &str,
    parameters: &Map<String, Value>,
    config: &ExecutorConfig,
) -> ExecutionResult {
    let started = Instant::now();
    let capture = Rc::new(RefCell::new(String::new()));
    let engine = build_engine(config, &capture);

    let ast = match engine.compile(source) {
        Ok(ast) => ast,
        Err(err) => {
            return ExecutionResult::failed(
                Language::Rhai,
                format!("script compilation error: {err}"),
                String::new(),
                None,
                started.elapsed(),
            );
        }
    };

    let params = match rhai::serde::to_dynamic(parameters) {
        Ok(params) => params,
        Err(err) => {
            return ExecutionResult::failed(
                Language::Rhai,
                format!("parameter conversion error: {err}"),
                String::new(),
                None,
                started.elapsed(),
            );
        }
    };
    let mut scope = Scope::new();
    scope.push_constant("params", params);

    let outcome = engine.run_ast_with_scope(&mut scope, &ast);
    let bounded = output::bound(capture.borrow().clone(), config.max_output_length());
    match outcome {
        Ok(()) => {
            debug!(
                target: SCRIPT_TARGET,
                output_chars = bounded.chars().count(),
                "script completed"
            );
            ExecutionResult::completed(Language::Rhai, bounded, None, started.elapsed())
        }
        Err(err) if matches!(err.as_ref(), EvalAltResult::ErrorTerminated(..)) => {
            debug!(target: SCRIPT_TARGET, "script hit the wall-clock deadline");
            ExecutionResult::timed_out(Language::Rhai, config.timeout_secs(), started.elapsed())
        }
        Err(err) if matches!(err.as_ref(), EvalAltResult::ErrorTooManyOperations(..)) => {
            ExecutionResult::failed(
                Language::Rhai,
                format!(
                    "script operation budget exceeded ({} operations)",
                    config.max_operations()
                ),
                bounded,
                None,
                started.elapsed(),
            )
        }
        Err(err) => ExecutionResult::failed(
            Language::Rhai,
            format!("script runtime error: {err}"),
            bounded,
            None,
            started.elapsed(),
        ),
    }
}

/// Builds a raw engine with the value packages, resource bounds, and capture
/// hooks installed.
fn build_engine(config: &ExecutorConfig, capture: &Rc<RefCell<String>>) -> Engine {
    let mut engine = Engine::new_raw();
    register_value_packages(&mut engine);
    engine.disable_symbol("eval");
    engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_FUNCTION_EXPR_DEPTH);
    engine.set_max_call_levels(MAX_CALL_LEVELS);
    engine.set_max_string_size(MAX_STRING_SIZE);
    engine.set_max_array_size(MAX_COLLECTION_SIZE);
    engine.set_max_map_size(MAX_COLLECTION_SIZE);
    if config.max_operations() > 0 {
        engine.set_max_operations(config.max_operations());
    }

    // checked_add saturates pathological timeouts into "no deadline".
    let deadline = Instant::now().checked_add(config.timeout());
    engine.on_progress(move |_operations| {
        deadline.and_then(|limit| {
            (Instant::now() >= limit).then(|| Dynamic::from("deadline exceeded"))
        })
    });

    let print_sink = Rc::clone(capture);
    engine.on_print(move |text| {
        let mut buffer = print_sink.borrow_mut();
        buffer.push_str(text);
        buffer.push('\n');
    });
    let debug_sink = Rc::clone(capture);
    engine.on_debug(move |text, _source, _pos| {
        let mut buffer = debug_sink.borrow_mut();
        buffer.push_str(text);
        buffer.push('\n');
    });
    engine
}

/// Registers the packages covering value manipulation only.
fn register_value_packages(engine: &mut Engine) {
    ArithmeticPackage::new().register_into_engine(engine);
    LogicPackage::new().register_into_engine(engine);
    BasicStringPackage::new().register_into_engine(engine);
    BasicArrayPackage::new().register_into_engine(engine);
    BasicMapPackage::new().register_into_engine(engine);
    BasicMathPackage::new().register_into_engine(engine);
    BasicIteratorPackage::new().register_into_engine(engine);
}
