//! Sandboxed expression host for user-defined filter and transform
//! expressions.
//!
//! Compiles a string into a reusable `Program` and evaluates it against a
//! per-entry `Env { text, json }`. Built on [`rhai`], a pure-Rust embeddable
//! scripting engine whose compile-once/`AST`-reuse model mirrors the
//! `expr-lang/expr` library the original Go implementation used
//! (`expr.Compile` → `vm.Run(program, env)`).

mod convert;

use rhai::{Dynamic, Engine, Scope, AST};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExprError {
    #[error("failed to compile expression: {0}")]
    Compile(String),
    #[error("failed to evaluate expression: {0}")]
    Evaluate(String),
    #[error("expression did not evaluate to a boolean")]
    NotBoolean,
}

/// A compiled, reusable expression.
pub struct Program {
    ast: AST,
}

/// Evaluation bindings available to every expression: the raw line text and
/// the optionally-parsed JSON object.
pub struct Env<'a> {
    pub text: &'a str,
    pub json: Option<&'a Map<String, Value>>,
}

/// Compiles and evaluates filter/transform expressions, with the three
/// built-ins specified for the log viewer: `filterLevel`, `toDateStr`,
/// `toLocalDateStr`.
pub struct ExpressionHost {
    engine: Engine,
}

impl Default for ExpressionHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionHost {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        register_builtins(&mut engine);
        Self { engine }
    }

    /// Compile `src` as a single expression (not a full script), matching
    /// `expr-lang`'s expression-only surface.
    pub fn compile(&self, src: &str) -> Result<Program, ExprError> {
        let ast = self
            .engine
            .compile_expression(src)
            .map_err(|e| ExprError::Compile(e.to_string()))?;
        Ok(Program { ast })
    }

    /// Evaluate `program` against `env`, returning the result as a
    /// `serde_json::Value` (applying the usual int-preferred numeric
    /// policy on the way out).
    pub fn evaluate(&self, program: &Program, env: &Env<'_>) -> Result<Value, ExprError> {
        let mut scope = Scope::new();
        scope.push("text", env.text.to_string());
        scope.push(
            "json",
            match env.json {
                Some(m) => convert::to_dynamic(&Value::Object(m.clone())),
                None => Dynamic::UNIT,
            },
        );
        let result: Dynamic = self
            .engine
            .eval_ast_with_scope(&mut scope, &program.ast)
            .map_err(|e| ExprError::Evaluate(e.to_string()))?;
        Ok(convert::from_dynamic(&result))
    }

    /// Evaluate `program` and require a boolean result, as filter
    /// expressions must. A non-boolean result is treated as an evaluation
    /// error so the caller can fall back to `filter_default`.
    pub fn evaluate_bool(&self, program: &Program, env: &Env<'_>) -> Result<bool, ExprError> {
        match self.evaluate(program, env)? {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(true), // an empty/no-op predicate admits the entry
            _ => Err(ExprError::NotBoolean),
        }
    }
}

fn level_rank(level: &str) -> i64 {
    match level.to_ascii_lowercase().as_str() {
        "debug" => 0,
        "info" => 1,
        "warn" | "warning" => 2,
        "error" => 3,
        "fatal" | "panic" => 4,
        _ => 0,
    }
}

fn unix_to_utc_string(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn unix_to_local_string(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_default()
}

fn register_builtins(engine: &mut Engine) {
    engine.register_fn(
        "filterLevel",
        |entry_level: rhai::ImmutableString, min_level: rhai::ImmutableString| -> bool {
            level_rank(entry_level.as_str()) >= level_rank(min_level.as_str())
        },
    );
    engine.register_fn("toDateStr", |ts: i64| -> String { unix_to_utc_string(ts) });
    engine.register_fn("toDateStr", |ts: f64| -> String {
        unix_to_utc_string(ts as i64)
    });
    engine.register_fn("toLocalDateStr", |ts: i64| -> String {
        unix_to_local_string(ts)
    });
    engine.register_fn("toLocalDateStr", |ts: f64| -> String {
        unix_to_local_string(ts as i64)
    });
}

/// Lazily-initialized engine shared by call sites that don't own one (kept
/// for convenience; `core-pipeline` owns its own `ExpressionHost` instance
/// per pipeline so programs compiled against it share state correctly).
pub fn shared_host() -> &'static ExpressionHost {
    static HOST: OnceLock<ExpressionHost> = OnceLock::new();
    HOST.get_or_init(ExpressionHost::new)
}
