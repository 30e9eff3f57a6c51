//! The per-entry processing pipeline: index assignment, JSON parsing,
//! transforms, filtering, projection/formatting, and cumulative height.
//!
//! Ported from `LogPipeline` in
//! `examples/original_source/internal/logs/pipeline/pipeline.go`. The
//! original models its pipeline as `[]func(*LogEntry) error` and re-runs a
//! *suffix* of that slice whenever one setting changes, so a width change
//! doesn't have to re-parse JSON or re-filter every entry. This crate keeps
//! that shape with six named stages instead of a closure slice — easier to
//! read, same re-run table (SPEC_FULL.md §4.3):
//!
//! | change            | re-run from stage    |
//! |-------------------|-----------------------|
//! | width             | `project_and_format`  |
//! | filter            | `run_filter`          |
//! | returned fields   | `project_and_format`  |
//! | transforms        | (not re-run in place; set alongside a view change) |
//! | view              | `parse_json` (index kept) |

use core_entry::{LogEntry, PipelineConfig, Theme, Transform, View};
use core_expr::{Env, ExprError, ExpressionHost, Program};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to compile filter expression: {0}")]
    FilterCompile(#[source] ExprError),
}

/// A single `{field, compiled expression}` transform, kept alongside the
/// source text so `set_view`/`DESIGN.md` can report what's active.
struct CompiledTransform {
    field: String,
    program: Program,
}

/// Stage index, used by the `run_*_changed` re-run helpers below. Kept as a
/// plain constant table rather than a closure `Vec` (the original's
/// `[]func(*LogEntry) error`) — Rust's borrow checker makes a `Vec` of
/// closures that capture `&mut self` awkward, and a `match` over six named
/// methods is no less readable than indexing into a slice of functions.
const STAGE_SET_INDEX: u8 = 0;
const STAGE_PARSE_JSON: u8 = 1;
const STAGE_TRANSFORM: u8 = 2;
const STAGE_FILTER: u8 = 3;
const STAGE_FORMAT: u8 = 4;
const STAGE_CUM_HEIGHT: u8 = 5;

pub struct Pipeline {
    host: ExpressionHost,
    view: View,
    width: u16,
    highlight: bool,
    theme: Theme,
    filter_program: Option<Program>,
    transforms: Vec<CompiledTransform>,
    index: u64,
    cum_height: usize,
}

impl Pipeline {
    /// Build a pipeline for `cfg`, compiling its filter and transform
    /// expressions up front. A transform that fails to compile is skipped
    /// with a `tracing::warn!`, matching the original's `fmt.Printf` and
    /// `continue`; a malformed *filter* is a hard error, since an entry with
    /// no usable predicate has no well-defined `show` value.
    pub fn new(cfg: PipelineConfig) -> Result<Self, PipelineError> {
        let host = ExpressionHost::new();
        let filter_program = compile_filter(&host, &cfg.view.filter)?;
        let transforms = compile_transforms(&host, &cfg.view.transforms);
        Ok(Self {
            host,
            view: cfg.view,
            width: cfg.width,
            highlight: cfg.highlight,
            theme: cfg.theme,
            filter_program,
            transforms,
            index: 0,
            cum_height: 0,
        })
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    /// Cumulative height counter reset to zero without touching `index`,
    /// mirroring `LogPipeline.Reset` — the index is a permanent ingestion
    /// sequence number, the cumulative height is recomputed from scratch
    /// every time a re-run sweeps the whole ring.
    fn reset(&mut self) {
        self.cum_height = 0;
    }

    /// Full six-stage run for a freshly ingested entry.
    pub fn run(&mut self, entry: &mut LogEntry) {
        self.run_from(entry, STAGE_SET_INDEX);
    }

    /// Re-run stage 4 onward (`project_and_format`, `set_cum_height`) after
    /// a width change.
    pub fn run_width_changed(&mut self, entry: &mut LogEntry) {
        self.run_from(entry, STAGE_FORMAT);
    }

    /// Re-run stage 3 onward (`run_filter` through `set_cum_height`) after a
    /// filter change.
    pub fn run_filter_changed(&mut self, entry: &mut LogEntry) {
        self.run_from(entry, STAGE_FILTER);
    }

    /// Re-run stage 4 onward after the returned-fields projection changes.
    pub fn run_returned_fields_changed(&mut self, entry: &mut LogEntry) {
        self.run_from(entry, STAGE_FORMAT);
    }

    /// Re-run stage 1 onward (everything but index assignment) after a view
    /// change — a different view means a different filter, transform set,
    /// and projection, so the JSON reparse is repeated too.
    pub fn run_view_changed(&mut self, entry: &mut LogEntry) {
        self.run_from(entry, STAGE_PARSE_JSON);
    }

    fn run_from(&mut self, entry: &mut LogEntry, from: u8) {
        for stage in from..=STAGE_CUM_HEIGHT {
            match stage {
                STAGE_SET_INDEX => self.set_index(entry),
                STAGE_PARSE_JSON => parse_json(entry),
                STAGE_TRANSFORM => self.run_transform(entry),
                STAGE_FILTER => self.run_filter(entry),
                STAGE_FORMAT => self.project_and_format(entry),
                STAGE_CUM_HEIGHT => self.set_cum_height(entry),
                _ => unreachable!(),
            }
        }
    }

    fn set_index(&mut self, entry: &mut LogEntry) {
        self.index += 1;
        entry.index = self.index;
    }

    /// Applies each compiled transform in declaration order, writing the
    /// result into `parsed[field]`. Unlike the original, a transform is
    /// simply skipped for a line that didn't parse as JSON — Go assigns
    /// into a nil map here, which panics at runtime; there is no
    /// SPEC_FULL.md scenario that depends on that crash, so this silently
    /// no-ops instead.
    fn run_transform(&mut self, entry: &mut LogEntry) {
        if self.transforms.is_empty() || entry.parsed.is_none() {
            return;
        }
        let raw = entry.raw.clone();
        for t in &self.transforms {
            let result = {
                let parsed = entry.parsed.as_ref().expect("checked above");
                let env = Env {
                    text: &raw,
                    json: Some(parsed),
                };
                self.host.evaluate(&t.program, &env)
            };
            match result {
                Ok(value) => {
                    entry
                        .parsed
                        .as_mut()
                        .expect("checked above")
                        .insert(t.field.clone(), value);
                }
                Err(e) => {
                    tracing::warn!(field = %t.field, error = %e, "transform evaluation failed");
                }
            }
        }
    }

    fn run_filter(&mut self, entry: &mut LogEntry) {
        let Some(program) = &self.filter_program else {
            entry.show = true;
            return;
        };
        let env = Env {
            text: &entry.raw,
            json: entry.parsed.as_ref(),
        };
        match self.host.evaluate_bool(program, &env) {
            Ok(show) => entry.show = show,
            Err(e) => {
                tracing::warn!(error = %e, "filter evaluation failed, using default");
                entry.show = self.view.filter_default;
            }
        }
    }

    fn project_and_format(&mut self, entry: &mut LogEntry) {
        if !entry.show {
            entry.height = 0;
            entry.formatted.clear();
            return;
        }

        let is_json = entry.parsed.as_ref().is_some_and(|m| !m.is_empty());
        if !is_json {
            entry.formatted = entry.raw.clone();
            if self.width != 0 {
                entry.formatted = core_format::wrap::wrap(&entry.formatted, self.width as i64);
            }
            entry.height = core_format::height_of(&entry.formatted);
            return;
        }

        let parsed = entry.parsed.as_ref().expect("checked above");
        let projected: Map<String, Value> = if self.view.returned_fields.is_empty() {
            parsed.clone()
        } else {
            core_format::project::project(parsed, &self.view.returned_fields)
        };

        entry.formatted = core_format::json::marshal(&projected, self.highlight, self.theme);
        if self.width != 0 {
            // The original reserves five columns for the highlighter's own
            // escape-sequence overhead (`int(lt.Width)-5`); kept here so
            // JSON wraps at the same effective column as the reference
            // implementation.
            let adjusted = self.width as i64 - 5;
            entry.formatted = core_format::wrap::wrap(&entry.formatted, adjusted);
        }
        entry.height = core_format::height_of(&entry.formatted);
    }

    fn set_cum_height(&mut self, entry: &mut LogEntry) {
        if entry.show {
            self.cum_height += entry.height;
        }
        entry.cum_height = self.cum_height;
    }

    pub fn set_width(&mut self, width: u16) {
        self.reset();
        self.width = width;
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) -> Result<(), PipelineError> {
        self.reset();
        let filter = filter.into();
        self.filter_program = compile_filter(&self.host, &filter)?;
        self.view.filter = filter;
        Ok(())
    }

    pub fn set_returned_fields(&mut self, mut fields: Vec<String>) {
        self.reset();
        fields.retain(|f| !f.trim().is_empty());
        self.view.returned_fields = fields;
    }

    pub fn set_transforms(&mut self, transforms: Vec<Transform>) {
        self.reset();
        self.transforms = compile_transforms(&self.host, &transforms);
        self.view.transforms = transforms;
    }

    /// Switch to a whole new view: resets transforms, filter, and
    /// projection together, matching `LogPipeline.SetView`'s call order.
    pub fn set_view(&mut self, view: View) -> Result<(), PipelineError> {
        self.reset();
        self.transforms = compile_transforms(&self.host, &view.transforms);
        self.filter_program = compile_filter(&self.host, &view.filter)?;
        self.view = view;
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn set_highlight(&mut self, highlight: bool) {
        self.highlight = highlight;
    }
}

fn compile_filter(host: &ExpressionHost, expr: &str) -> Result<Option<Program>, PipelineError> {
    if expr.trim().is_empty() {
        return Ok(None);
    }
    host.compile(expr)
        .map(Some)
        .map_err(PipelineError::FilterCompile)
}

fn compile_transforms(host: &ExpressionHost, transforms: &[Transform]) -> Vec<CompiledTransform> {
    transforms
        .iter()
        .filter_map(|t| match host.compile(&t.expression) {
            Ok(program) => Some(CompiledTransform {
                field: t.field.clone(),
                program,
            }),
            Err(e) => {
                tracing::warn!(field = %t.field, error = %e, "transform expression failed to compile");
                None
            }
        })
        .collect()
}

/// `{raw[0] == '{'}` then full-object parse, matching
/// `runToJson`/`numberToGoTypes`. `serde_json::Value`'s own number
/// deserialization already applies the int-preferred policy `numberToGoTypes`
/// exists to retrofit onto Go's `json.Number`, so no post-processing pass is
/// needed here. A streaming `Deserializer` is used rather than
/// `serde_json::from_str` so only the leading JSON value is consumed and any
/// trailing bytes are ignored, matching the original's
/// `json.NewDecoder(...).Decode(&l.Json)` (`pipeline.go:58-60`) rather than a
/// whole-string parse.
fn parse_json(entry: &mut LogEntry) {
    entry.parsed = None;
    if !entry.raw.starts_with('{') {
        return;
    }
    let mut stream = serde_json::Deserializer::from_str(&entry.raw).into_iter::<Value>();
    if let Some(Ok(Value::Object(map))) = stream.next() {
        entry.parsed = Some(map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(view: View, width: u16) -> PipelineConfig {
        PipelineConfig {
            view,
            width,
            highlight: false,
            theme: Theme::Dark,
        }
    }

    #[test]
    fn non_json_line_passes_through_unfiltered() {
        let mut p = Pipeline::new(cfg(View::default(), 0)).unwrap();
        let mut e = LogEntry::new("plain text line");
        p.run(&mut e);
        assert!(e.show);
        assert_eq!(e.formatted, "plain text line");
        assert_eq!(e.height, 1);
        assert_eq!(e.index, 1);
    }

    #[test]
    fn leading_whitespace_before_brace_is_not_json() {
        // Matches the Go original's exact `l.Raw[0] == '{'` check: leading
        // whitespace means this is raw text, not JSON, even though the rest
        // of the line parses.
        let mut p = Pipeline::new(cfg(View::default(), 0)).unwrap();
        let mut e = LogEntry::new(r#"  {"a":1}"#);
        p.run(&mut e);
        assert_eq!(e.formatted, r#"  {"a":1}"#);
    }

    #[test]
    fn trailing_content_after_the_json_value_is_ignored() {
        let view = View {
            returned_fields: vec!["level".into()],
            ..Default::default()
        };
        let mut p = Pipeline::new(cfg(view, 0)).unwrap();
        let mut e = LogEntry::new(r#"{"level":"info"} some trailing text"#);
        p.run(&mut e);
        assert!(e.formatted.contains("\"level\""));
        assert!(e.formatted.contains("info"));
        assert!(!e.formatted.contains("trailing"));
    }

    #[test]
    fn s1_json_projection_selects_named_fields_sorted() {
        let view = View {
            returned_fields: vec!["msg".into(), "n".into()],
            ..Default::default()
        };
        let mut p = Pipeline::new(cfg(view, 80)).unwrap();
        let mut e = LogEntry::new(r#"{"level":"info","msg":"hi","n":3}"#);
        p.run(&mut e);
        assert!(e.show);
        assert!(!e.formatted.contains("level"));
        assert!(e.formatted.contains("\"msg\""));
        assert!(e.formatted.contains("\"n\""));
        assert_eq!(e.height, 4);
    }

    #[test]
    fn filter_rejects_entries_that_fail_the_predicate() {
        let view = View {
            filter: r#"filterLevel(json.level, "warn")"#.into(),
            ..Default::default()
        };
        let mut p = Pipeline::new(cfg(view, 0)).unwrap();

        let mut info = LogEntry::new(r#"{"level":"info","msg":"x"}"#);
        p.run(&mut info);
        assert!(!info.show);
        assert_eq!(info.formatted, "");
        assert_eq!(info.height, 0);

        let mut err = LogEntry::new(r#"{"level":"error","msg":"x"}"#);
        p.run(&mut err);
        assert!(err.show);
    }

    #[test]
    fn invalid_filter_expression_is_a_construction_error() {
        let view = View {
            filter: "json.level ==".into(),
            ..Default::default()
        };
        assert!(Pipeline::new(cfg(view, 0)).is_err());
    }

    #[test]
    fn transform_adds_a_computed_field_before_filtering_and_projection() {
        let view = View {
            transforms: vec![Transform {
                field: "shout".into(),
                expression: r#"text + "!""#.into(),
            }],
            returned_fields: vec!["shout".into()],
            ..Default::default()
        };
        let mut p = Pipeline::new(cfg(view, 0)).unwrap();
        let mut e = LogEntry::new(r#"{"msg":"hi"}"#);
        p.run(&mut e);
        assert!(e.formatted.contains("shout"));
        assert!(e.formatted.contains("hi!"));
    }

    #[test]
    fn width_change_rerun_only_touches_formatting_stage() {
        let mut p = Pipeline::new(cfg(View::default(), 0)).unwrap();
        let mut e = LogEntry::new("hello world");
        p.run(&mut e);
        let index_before = e.index;

        p.set_width(5);
        p.run_width_changed(&mut e);
        assert_eq!(e.index, index_before, "index stage must not re-run");
        assert!(e.height >= 1);
    }

    #[test]
    fn cum_height_accumulates_only_across_shown_entries() {
        let view = View {
            filter: r#"filterLevel(json.level, "warn")"#.into(),
            ..Default::default()
        };
        let mut p = Pipeline::new(cfg(view, 0)).unwrap();

        let mut a = LogEntry::new(r#"{"level":"error","msg":"a"}"#);
        p.run(&mut a);
        let mut b = LogEntry::new(r#"{"level":"info","msg":"b"}"#);
        p.run(&mut b);
        let mut c = LogEntry::new(r#"{"level":"error","msg":"c"}"#);
        p.run(&mut c);

        assert_eq!(b.cum_height, a.cum_height);
        assert!(c.cum_height > b.cum_height);
    }

    #[test]
    fn reset_on_width_change_does_not_reset_index() {
        let mut p = Pipeline::new(cfg(View::default(), 0)).unwrap();
        let mut a = LogEntry::new("one");
        p.run(&mut a);
        let mut b = LogEntry::new("two");
        p.run(&mut b);
        assert_eq!(b.index, a.index + 1);
        p.set_width(40);
        let mut c = LogEntry::new("three");
        p.run(&mut c);
        assert_eq!(c.index, b.index + 1);
    }
}
