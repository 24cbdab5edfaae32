//! Rhai expression engine
//!
//! Evaluates the expressions embedded in templates against a JSON context.
//! Each top-level context key is bound as a variable of the same name, so
//! with a context of `{"user": {"name": "ada"}, "n": 2}` the expression
//! `user.name + "!"` yields `"ada!"` and `n * 21` yields `42`.
//!
//! ## Helper Functions
//!
//! - `lowercase(s)` / `uppercase(s)` - Change the case of a string
//! - `str(x)` - Render any value as a string
//! - `join(array, separator)` - Join array items into one string
//! - `defined(name)` - Whether `name` is a key of the context
//!
//! Numbers follow JSON-e: every context number is bound as a float, so
//! `7 / 2` over context values is `3.5`, and integral results come back as
//! integers (`2 * 1.5` renders as `3`, not `3.0`).

use crate::scripting::{CompiledExpression, ExpressionCache, ScriptError, SharedExpressionCache};
use rhai::{Array, Dynamic, Engine, Scope, FLOAT};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

/// Sandboxed rhai engine plus a cache of compiled expressions
pub struct ExpressionEngine {
    engine: Engine,
    cache: SharedExpressionCache,
    /// Keys of the context currently bound, read by `defined()`
    bound: Arc<RwLock<HashSet<String>>>,
}

impl ExpressionEngine {
    /// Create a new expression engine with default limits
    pub fn new() -> Self {
        Self::with_cache(Arc::new(RwLock::new(ExpressionCache::new())))
    }

    /// Create an engine sharing an existing cache
    pub fn with_cache(cache: SharedExpressionCache) -> Self {
        let bound = Arc::new(RwLock::new(HashSet::new()));
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine, bound.clone());

        Self {
            engine,
            cache,
            bound,
        }
    }

    /// Configure the Rhai engine with helper functions and safety limits
    fn configure_engine(engine: &mut Engine, bound: Arc<RwLock<HashSet<String>>>) {
        // Templates come from graph data, so keep evaluation cheap and bounded
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(16);
        engine.set_max_operations(10_000);
        engine.set_max_string_size(100_000);
        engine.set_max_array_size(10_000);
        engine.set_max_map_size(10_000);

        engine.register_fn("lowercase", |s: &str| s.to_lowercase());
        engine.register_fn("uppercase", |s: &str| s.to_uppercase());
        engine.register_fn("str", |value: Dynamic| dynamic_text(&value));
        engine.register_fn("join", |items: Array, separator: &str| -> String {
            items
                .iter()
                .map(dynamic_text)
                .collect::<Vec<_>>()
                .join(separator)
        });
        engine.register_fn("defined", move |name: &str| -> bool {
            bound
                .read()
                .map(|keys| keys.contains(name))
                .unwrap_or(false)
        });
    }

    /// Compile an expression and cache it
    pub fn compile(&self, source: &str) -> Result<CompiledExpression, ScriptError> {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.get_or_compile(&self.engine, source)
    }

    /// Evaluate a compiled expression with every context key bound as a variable
    pub fn evaluate(
        &self,
        expression: &CompiledExpression,
        context: &Map<String, Value>,
    ) -> Result<Value, ScriptError> {
        let mut scope = Scope::new();
        let mut bound = HashSet::with_capacity(context.len());
        for (key, value) in context {
            if !is_identifier(key) {
                tracing::trace!("Context key '{}' is not a valid variable name, skipped", key);
                continue;
            }
            scope.push_dynamic(key.clone(), json_to_dynamic(value));
            bound.insert(key.clone());
        }
        *self.bound.write().unwrap_or_else(PoisonError::into_inner) = bound;

        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, expression.ast())
            .map_err(|e| ScriptError::Eval {
                expression: expression.source().to_string(),
                message: e.to_string(),
            })?;

        rhai::serde::from_dynamic::<Value>(&result)
            .map(normalize_numbers)
            .map_err(|e| ScriptError::Conversion(format!("result of '{}': {}", expression.source(), e)))
    }

    /// Compile and evaluate in one step
    pub fn eval(&self, source: &str, context: &Map<String, Value>) -> Result<Value, ScriptError> {
        let expression = self.compile(source)?;
        self.evaluate(&expression, context)
    }
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExpressionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionEngine")
            .field(
                "cache_size",
                &self.cache.read().unwrap_or_else(PoisonError::into_inner).len(),
            )
            .finish()
    }
}

/// Bind a JSON value for rhai, with every number as a float
fn json_to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from_bool(*b),
        Value::Number(n) => Dynamic::from_float(n.as_f64().unwrap_or(FLOAT::NAN)),
        Value::String(s) => Dynamic::from(s.clone()),
        Value::Array(items) => Dynamic::from_array(items.iter().map(json_to_dynamic).collect()),
        Value::Object(map) => {
            let mut object = rhai::Map::new();
            for (key, value) in map {
                object.insert(key.as_str().into(), json_to_dynamic(value));
            }
            Dynamic::from_map(object)
        }
    }
}

/// Turn integral floats back into integers, recursively
fn normalize_numbers(value: Value) -> Value {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER => {
                Value::from(f as i64)
            }
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize_numbers(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Largest float that is still an exact integer (2^53)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Text form of a value, with integral floats printed without `.0`
fn dynamic_text(value: &Dynamic) -> String {
    if value.is_unit() {
        return "null".to_string();
    }
    match value.as_float() {
        Ok(f) if f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER => format!("{}", f as i64),
        _ => value.to_string(),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("context must be an object"),
        }
    }

    #[test]
    fn test_arithmetic_on_context() {
        let engine = ExpressionEngine::new();
        let result = engine.eval("n * 21", &ctx(json!({ "n": 2 }))).unwrap();
        assert_eq!(result, json!(42));
    }

    #[test]
    fn test_nested_property_access() {
        let engine = ExpressionEngine::new();
        let context = ctx(json!({ "user": { "name": "ada", "tags": ["a", "b"] } }));
        assert_eq!(engine.eval("user.name", &context).unwrap(), json!("ada"));
        assert_eq!(engine.eval("user.tags[1]", &context).unwrap(), json!("b"));
    }

    #[test]
    fn test_helper_functions() {
        let engine = ExpressionEngine::new();
        let context = ctx(json!({ "name": "Ada", "items": [1, 2, 3] }));
        assert_eq!(engine.eval("uppercase(name)", &context).unwrap(), json!("ADA"));
        assert_eq!(engine.eval("join(items, \"-\")", &context).unwrap(), json!("1-2-3"));
        assert_eq!(engine.eval("defined(\"name\")", &context).unwrap(), json!(true));
        assert_eq!(engine.eval("defined(\"age\")", &context).unwrap(), json!(false));
    }

    #[test]
    fn test_unknown_variable_is_an_error() {
        let engine = ExpressionEngine::new();
        let err = engine.eval("missing + 1", &Map::new()).unwrap_err();
        assert!(matches!(err, ScriptError::Eval { .. }));
    }

    #[test]
    fn test_statements_are_rejected() {
        let engine = ExpressionEngine::new();
        assert!(matches!(
            engine.compile("let x = 1; x"),
            Err(ScriptError::Compile(_))
        ));
    }

    #[test]
    fn test_compiled_expressions_are_cached() {
        let cache = Arc::new(RwLock::new(ExpressionCache::new()));
        let engine = ExpressionEngine::with_cache(cache.clone());
        engine.compile("1 + 1").unwrap();
        engine.compile("1 + 1").unwrap();
        assert_eq!(cache.read().unwrap().len(), 1);
    }

    #[test]
    fn test_context_numbers_divide_as_floats() {
        let engine = ExpressionEngine::new();
        let context = ctx(json!({ "a": 7, "b": 2 }));
        assert_eq!(engine.eval("a / b", &context).unwrap(), json!(3.5));
        assert_eq!(engine.eval("a / 2", &context).unwrap(), json!(3.5));
    }

    #[test]
    fn test_integral_results_come_back_as_integers() {
        let engine = ExpressionEngine::new();
        let context = ctx(json!({ "a": 2, "items": [1, 2.5] }));
        assert_eq!(engine.eval("a * 1.5", &context).unwrap(), json!(3));
        assert_eq!(engine.eval("items", &context).unwrap(), json!([1, 2.5]));
        assert_eq!(engine.eval("str(a * 3)", &context).unwrap(), json!("6"));
        assert_eq!(engine.eval("a > 1", &context).unwrap(), json!(true));
    }

    #[test]
    fn test_identifier_check() {
        assert!(is_identifier("user_1"));
        assert!(!is_identifier("1user"));
        assert!(!is_identifier("content-type"));
        assert!(!is_identifier(""));
    }
}
