//! JSON-e template rendering (subset)

use crate::scripting::{ExpressionEngine, ScriptError};
use serde_json::{Map, Value};
use thiserror::Error;

/// Failure while rendering a template
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("Unterminated interpolation in '{0}'")]
    UnterminatedInterpolation(String),

    #[error("Cannot interpolate {kind} value of '{expression}' into a string")]
    InterpolateNonScalar {
        expression: String,
        kind: &'static str,
    },

    #[error("{operator} expects a string expression")]
    ExpressionNotString { operator: &'static str },

    #[error("{operator} has undefined properties: {keys}")]
    UnexpectedKeys {
        operator: &'static str,
        keys: String,
    },

    #[error("Unknown operator {0}")]
    UnknownOperator(String),

    #[error("Template context must be an object")]
    ContextNotObject,
}

/// Renders JSON-e templates against a context object
#[derive(Debug, Default)]
pub struct TemplateRenderer {
    engine: ExpressionEngine,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `template` against `context`, which must be a JSON object.
    ///
    /// A top-level value deleted by a branchless `$if` renders as `null`.
    pub fn render(&self, template: &Value, context: &Value) -> Result<Value, TemplateError> {
        let context = context.as_object().ok_or(TemplateError::ContextNotObject)?;
        Ok(self.render_value(template, context)?.unwrap_or(Value::Null))
    }

    /// `None` means the value is removed from its parent.
    fn render_value(
        &self,
        template: &Value,
        context: &Map<String, Value>,
    ) -> Result<Option<Value>, TemplateError> {
        match template {
            Value::String(text) => self.interpolate(text, context).map(|s| Some(Value::String(s))),
            Value::Array(items) => {
                let mut rendered = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(value) = self.render_value(item, context)? {
                        rendered.push(value);
                    }
                }
                Ok(Some(Value::Array(rendered)))
            }
            Value::Object(object) => self.render_object(object, context),
            scalar => Ok(Some(scalar.clone())),
        }
    }

    fn render_object(
        &self,
        object: &Map<String, Value>,
        context: &Map<String, Value>,
    ) -> Result<Option<Value>, TemplateError> {
        if let Some(expression) = object.get("$eval") {
            expect_only(object, "$eval", &[])?;
            let source = expression
                .as_str()
                .ok_or(TemplateError::ExpressionNotString { operator: "$eval" })?;
            return Ok(Some(self.engine.eval(source, context)?));
        }

        if let Some(condition) = object.get("$if") {
            expect_only(object, "$if", &["then", "else"])?;
            let source = condition
                .as_str()
                .ok_or(TemplateError::ExpressionNotString { operator: "$if" })?;
            let branch = if is_truthy(&self.engine.eval(source, context)?) {
                "then"
            } else {
                "else"
            };
            return match object.get(branch) {
                Some(value) => self.render_value(value, context),
                None => Ok(None),
            };
        }

        let mut rendered = Map::with_capacity(object.len());
        for (key, value) in object {
            let key = match key.strip_prefix("$$") {
                Some(rest) => format!("${}", rest),
                None if key.starts_with('$') => {
                    return Err(TemplateError::UnknownOperator(key.clone()))
                }
                None => self.interpolate(key, context)?,
            };
            if let Some(value) = self.render_value(value, context)? {
                rendered.insert(key, value);
            }
        }
        Ok(Some(Value::Object(rendered)))
    }

    /// Expand every `${expr}` in `text`; `$${` is a literal `${`.
    fn interpolate(&self, text: &str, context: &Map<String, Value>) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            if rest[..start].ends_with('$') {
                out.push_str(&rest[..start - 1]);
                out.push_str("${");
                rest = &rest[start + 2..];
                continue;
            }
            out.push_str(&rest[..start]);

            let after = &rest[start + 2..];
            let end = closing_brace(after)
                .ok_or_else(|| TemplateError::UnterminatedInterpolation(text.to_string()))?;
            let source = after[..end].trim();
            let value = self.engine.eval(source, context)?;
            match value {
                Value::Null => {}
                Value::String(s) => out.push_str(&s),
                Value::Bool(_) | Value::Number(_) => out.push_str(&value.to_string()),
                Value::Array(_) => {
                    return Err(TemplateError::InterpolateNonScalar {
                        expression: source.to_string(),
                        kind: "array",
                    })
                }
                Value::Object(_) => {
                    return Err(TemplateError::InterpolateNonScalar {
                        expression: source.to_string(),
                        kind: "object",
                    })
                }
            }
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Byte offset of the `}` closing an interpolation, skipping braces inside
/// string literals.
fn closing_brace(expression: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in expression.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if matches!(c, '"' | '\'' | '`') => quote = Some(c),
            None if c == '}' => return Some(i),
            None => {}
        }
    }
    None
}

fn expect_only(
    object: &Map<String, Value>,
    operator: &'static str,
    allowed: &[&str],
) -> Result<(), TemplateError> {
    let extra: Vec<&str> = object
        .keys()
        .map(String::as_str)
        .filter(|k| *k != operator && !allowed.contains(k))
        .collect();
    if extra.is_empty() {
        Ok(())
    } else {
        Err(TemplateError::UnexpectedKeys {
            operator,
            keys: extra.join(", "),
        })
    }
}

/// JSON-e truthiness
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
