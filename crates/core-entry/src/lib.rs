//! Core data model for the log streaming and display engine.
//!
//! This crate owns the plain data types that flow through the pipeline —
//! `LogEntry`, `View`, `Transform`, `PipelineConfig` — and nothing else. It
//! has no dependency beyond `serde`/`serde_json` so every other crate in the
//! workspace can depend on it without pulling in expression evaluation,
//! formatting, or terminal machinery.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One ingested log line, mutated in place as it moves through the pipeline.
///
/// `parsed`/`show`/`formatted`/`height`/`cum_height` all start at their
/// "not yet processed" defaults and are filled in by `core-pipeline`'s
/// stages; `core-ring` never mutates an entry itself, only reads the fields
/// back out for scroll/height bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogEntry {
    /// The original, unmodified text of the line.
    pub raw: String,
    /// Present iff `raw` begins with `{` and parses as a JSON object.
    pub parsed: Option<Map<String, Value>>,
    /// Whether the active filter predicate currently accepts this entry.
    pub show: bool,
    /// The string to draw; empty when `show` is false.
    pub formatted: String,
    /// Number of visible lines in `formatted` after wrapping; 0 when hidden.
    pub height: usize,
    /// Cumulative `height` over all entries up to and including this one, in
    /// ring order. Hidden entries contribute 0.
    pub cum_height: usize,
    /// Monotonic ingestion sequence number, never reused.
    pub index: u64,
}

impl LogEntry {
    /// A fresh entry for `raw`, with every pipeline-derived field at its
    /// zero value. Stages fill the rest in on the first pipeline run.
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Default::default()
        }
    }
}

/// A single `{field, expression}` transform applied during the transform
/// stage: `json[field] = evaluate(expression, {text, json})`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    pub field: String,
    pub expression: String,
}

/// A named bundle of filter predicate, field projection, and field
/// transforms — the user-facing unit of configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct View {
    pub name: String,
    pub filter: String,
    pub filter_default: bool,
    pub returned_fields: Vec<String>,
    pub transforms: Vec<Transform>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            name: String::new(),
            filter: String::new(),
            filter_default: false,
            returned_fields: Vec::new(),
            transforms: Vec::new(),
        }
    }
}

/// Light/dark terminal theme used by the highlighter. Mirrors the original
/// Go config's `color: light|dark` string, as a proper enum on this side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Dark
    }
}

impl std::str::FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(()),
        }
    }
}

/// The currently active `View` plus the render-affecting parameters the
/// formatter needs: terminal width, whether to syntax-highlight, and theme.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub view: View,
    pub width: u16,
    pub highlight: bool,
    pub theme: Theme,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            view: View::default(),
            width: 0,
            highlight: true,
            theme: Theme::default(),
        }
    }
}
