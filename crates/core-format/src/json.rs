//! JSON marshaling: 1-space indent, lexicographically sorted keys, and an
//! optional terminal-color highlighter applied at marshal time.
//!
//! `examples/original_source/internal/logs/pipeline/pipeline.go` marshals
//! with `jsoniter.MarshalIndent(j, "", " ")` then pipes the result through
//! `chroma`'s terminal256 JSON lexer/formatter keyed by `config.Theme` — a
//! second pass that re-tokenizes the text the marshaller just produced. A
//! custom `serde_json::ser::Formatter` lets us color each token as we write
//! it, in the same pass, using the structural information the serializer
//! already has (key vs. value, object vs. array, the value's own type) —
//! see SPEC_FULL.md §4.4 Added.
//!
//! `serde_json::Map` (the non-`preserve_order` default, as used throughout
//! this workspace) is a `BTreeMap`, so iterating it already yields keys in
//! lexicographic order; no separate sort step is needed here.

use core_entry::Theme;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::io::{self, Write};

#[derive(Clone, Copy)]
struct Palette {
    key: &'static str,
    string: &'static str,
    number: &'static str,
    literal: &'static str,
    punct: &'static str,
    reset: &'static str,
}

const NONE: Palette = Palette {
    key: "",
    string: "",
    number: "",
    literal: "",
    punct: "",
    reset: "",
};

impl Palette {
    fn for_theme(theme: Theme, highlight: bool) -> Self {
        if !highlight {
            return NONE;
        }
        match theme {
            Theme::Dark => Palette {
                key: "\x1b[36m",     // cyan
                string: "\x1b[32m",  // green
                number: "\x1b[33m",  // yellow
                literal: "\x1b[35m", // magenta
                punct: "\x1b[37m",   // white
                reset: "\x1b[0m",
            },
            Theme::Light => Palette {
                key: "\x1b[34m",     // blue
                string: "\x1b[32m",  // green
                number: "\x1b[31m",  // red
                literal: "\x1b[35m", // magenta
                punct: "\x1b[30m",   // black
                reset: "\x1b[0m",
            },
        }
    }
}

/// One level of `indent` per nesting depth, matching spec.md §4.4's
/// "1-space indent" requirement (the teacher's own pretty-printer style
/// conventions use 4; this crate's wire format is spec-mandated, not a
/// style choice).
struct HighlightFormatter {
    palette: Palette,
    current_indent: usize,
    has_value: bool,
    in_key: bool,
}

impl HighlightFormatter {
    fn new(palette: Palette) -> Self {
        Self {
            palette,
            current_indent: 0,
            has_value: false,
            in_key: false,
        }
    }
}

fn indent<W: ?Sized + io::Write>(writer: &mut W, n: usize) -> io::Result<()> {
    for _ in 0..n {
        writer.write_all(b" ")?;
    }
    Ok(())
}

fn punct<W: ?Sized + io::Write>(writer: &mut W, palette: &Palette, b: &[u8]) -> io::Result<()> {
    writer.write_all(palette.punct.as_bytes())?;
    writer.write_all(b)?;
    writer.write_all(palette.reset.as_bytes())
}

impl Formatter for HighlightFormatter {
    fn write_null<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.palette.literal.as_bytes())?;
        writer.write_all(b"null")?;
        writer.write_all(self.palette.reset.as_bytes())
    }

    fn write_bool<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: bool) -> io::Result<()> {
        writer.write_all(self.palette.literal.as_bytes())?;
        writer.write_all(if value { b"true" } else { b"false" })?;
        writer.write_all(self.palette.reset.as_bytes())
    }

    fn write_i64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: i64) -> io::Result<()> {
        writer.write_all(self.palette.number.as_bytes())?;
        write!(writer, "{value}")?;
        writer.write_all(self.palette.reset.as_bytes())
    }

    fn write_u64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: u64) -> io::Result<()> {
        writer.write_all(self.palette.number.as_bytes())?;
        write!(writer, "{value}")?;
        writer.write_all(self.palette.reset.as_bytes())
    }

    fn write_f64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(self.palette.number.as_bytes())?;
        write!(writer, "{value}")?;
        writer.write_all(self.palette.reset.as_bytes())
    }

    fn begin_string<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        let color = if self.in_key {
            self.palette.key
        } else {
            self.palette.string
        };
        writer.write_all(color.as_bytes())?;
        writer.write_all(b"\"")
    }

    fn end_string<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b"\"")?;
        writer.write_all(self.palette.reset.as_bytes())
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.current_indent += 1;
        self.has_value = false;
        punct(writer, &self.palette, b"[")
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            indent(writer, self.current_indent)?;
        }
        punct(writer, &self.palette, b"]")
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            writer.write_all(b"\n")?;
        } else {
            punct(writer, &self.palette, b",")?;
            writer.write_all(b"\n")?;
        }
        indent(writer, self.current_indent)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.current_indent += 1;
        self.has_value = false;
        punct(writer, &self.palette, b"{")
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            indent(writer, self.current_indent)?;
        }
        punct(writer, &self.palette, b"}")
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            writer.write_all(b"\n")?;
        } else {
            punct(writer, &self.palette, b",")?;
            writer.write_all(b"\n")?;
        }
        self.in_key = true;
        indent(writer, self.current_indent)
    }

    fn end_object_key<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.in_key = false;
        Ok(())
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        punct(writer, &self.palette, b":")?;
        writer.write_all(b" ")
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }
}

/// Marshal `value` as pretty-printed JSON with 1-space indentation and
/// lexicographically sorted keys, optionally highlighting tokens with ANSI
/// SGR codes for `theme`.
pub fn marshal(value: &Map<String, Value>, highlight: bool, theme: Theme) -> String {
    let palette = Palette::for_theme(theme, highlight);
    let mut buf = Vec::new();
    {
        let formatter = HighlightFormatter::new(palette);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        serde::Serialize::serialize(&Value::Object(value.clone()), &mut ser)
            .expect("in-memory serialization of a serde_json::Value cannot fail");
    }
    String::from_utf8(buf).expect("HighlightFormatter only ever writes valid UTF-8")
}

/// A float produced by a transform is normalized to an integer-kind number
/// when it has no fractional part and fits an `i64`, matching the
/// int-preferred numeric policy applied at parse time (§3).
pub fn normalize_number(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::Number((f as i64).into())
    } else {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
