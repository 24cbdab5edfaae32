//! Rhai-backed templating for the JSON-e renderer node
//!
//! Two layers:
//!
//! - [`ExpressionEngine`] evaluates single expressions against a JSON
//!   context, with every context key bound as a variable.
//! - [`TemplateRenderer`] walks a JSON template and expands the JSON-e
//!   constructs it supports using the expression engine.
//!
//! ## Supported Template Constructs
//!
//! - `"${expr}"` - Interpolation inside any string, including object keys
//! - `{"$eval": "expr"}` - Replaced by the value of `expr`
//! - `{"$if": "expr", "then": a, "else": b}` - Conditional; a missing branch
//!   removes the value from its parent
//! - `"$${"` and `"$$key"` - Escapes producing a literal `${` or `$key`
//!
//! ## Example
//!
//! ```ignore
//! let renderer = TemplateRenderer::new();
//! let template = json!({ "greeting": "hello ${name}", "$if": "admin", "then": "root" });
//! ```
//!
//! Truthiness follows JSON-e: `false`, `null`, `0`, `""`, `[]` and `{}` are
//! false, everything else is true.

mod engine;
mod template;

pub use engine::ExpressionEngine;
pub use template::{is_truthy, TemplateError, TemplateRenderer};

use rhai::{Engine, AST};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Failure while compiling or evaluating an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("Compilation error: {0}")]
    Compile(String),

    #[error("Evaluation of '{expression}' failed: {message}")]
    Eval { expression: String, message: String },

    #[error("Value conversion failed: {0}")]
    Conversion(String),
}

/// A compiled expression that can be evaluated repeatedly
#[derive(Clone)]
pub struct CompiledExpression {
    ast: AST,
    source: String,
}

impl CompiledExpression {
    /// Get the source text of this expression
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn ast(&self) -> &AST {
        &self.ast
    }
}

impl std::fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("source", &self.source)
            .finish()
    }
}

/// Most expressions kept by a default [`ExpressionCache`]
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Cache for compiled expressions to avoid recompilation
///
/// Bounded: when full, the cache is emptied before the next insert, so
/// expressions from templates that were edited away do not pile up.
pub struct ExpressionCache {
    /// Map from expression source to compiled form
    cache: HashMap<String, CompiledExpression>,
    capacity: usize,
}

impl Default for ExpressionCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Get a cached expression or compile and cache it
    pub fn get_or_compile(
        &mut self,
        engine: &Engine,
        source: &str,
    ) -> Result<CompiledExpression, ScriptError> {
        if let Some(expression) = self.cache.get(source) {
            return Ok(expression.clone());
        }

        let ast = engine
            .compile_expression(source)
            .map_err(|e| ScriptError::Compile(format!("'{}': {}", source, e)))?;

        let expression = CompiledExpression {
            ast,
            source: source.to_string(),
        };
        if self.cache.len() >= self.capacity {
            tracing::debug!("Expression cache full ({} entries), clearing", self.cache.len());
            self.cache.clear();
        }
        self.cache.insert(source.to_string(), expression.clone());
        Ok(expression)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Thread-safe shared expression cache
pub type SharedExpressionCache = Arc<RwLock<ExpressionCache>>;
