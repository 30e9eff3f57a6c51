//! Renders a window of visible text out of a [`Ring`], and tracks scroll
//! position across appends and evictions.
//!
//! Ported from `circularLogBuffer.View`/`findLinePos`/`binarySearchFirstVisible`
//! in `examples/original_source/internal/logs/logbuffer.go` (rendering), and
//! from `Model.scrollUp`/`scrollDown`/the `autoScroll`/`maxScroll` fields in
//! `examples/original_source/internal/logs/model.go` (scroll bookkeeping).
//! `core-ring`'s `entry_at_offset` already does the binary search the
//! original hand-rolls over a raw head/tail slice; this crate only has to
//! walk forward from whatever it returns.

use core_ring::Ring;

/// Render the `height` visible rows starting at vertical offset `scroll`.
///
/// `scroll` is clamped to `[first.cum_height - first.height, last.cum_height
/// - last.height]` before use, matching the original — you can never scroll
/// past the point where the last entry's first line is the top row. An
/// empty ring renders `height` blank rows (SPEC_FULL.md §8), unlike the
/// original's `""` (see DESIGN.md's deviations list).
pub fn render(ring: &Ring, scroll: i64, height: usize) -> String {
    if height == 0 {
        return String::new();
    }
    if ring.is_empty() {
        return "\n".repeat(height);
    }

    let first = ring.first().expect("checked non-empty above");
    let last = ring.last().expect("checked non-empty above");
    let last_top = last.cum_height as i64 - last.height as i64;
    let first_top = first.cum_height as i64 - first.height as i64;

    let mut scroll = scroll;
    if scroll > last_top {
        scroll = last_top;
    }
    if scroll < first_top {
        scroll = first_top;
    }
    let scroll = scroll.max(0) as usize;

    let Some(start) = ring.entry_at_offset(scroll) else {
        return "\n".repeat(height);
    };
    let start_index = start.index;

    let mut out = String::new();
    let mut line_count = 0usize;
    let mut first_entry = true;

    for entry in ring.iter().skip_while(|e| e.index != start_index) {
        if line_count == height {
            break;
        }
        let is_first = first_entry;
        first_entry = false;

        if !entry.show {
            continue;
        }

        let first_line_offset = entry.cum_height - entry.height;

        if is_first && (scroll > first_line_offset || entry.height > height) {
            let n = scroll - first_line_offset;
            let p = find_line_pos(&entry.formatted, n).unwrap_or(entry.formatted.len());
            let mut slice = &entry.formatted[p..];
            let mut line_height = entry.height - n;
            if line_height > height {
                line_height = height;
                let cut = find_line_pos(slice, height).unwrap_or(slice.len());
                slice = &slice[..cut];
            }
            out.push_str(slice);
            line_count += line_height;
            if line_count < height {
                out.push('\n');
            }
            continue;
        }

        if line_count + entry.height > height {
            let remaining = height - line_count;
            let p = find_line_pos(&entry.formatted, remaining).unwrap_or(entry.formatted.len());
            out.push_str(&entry.formatted[..p]);
            line_count += remaining;
            if line_count < height {
                out.push('\n');
            }
            break;
        }

        out.push_str(&entry.formatted);
        out.push('\n');
        line_count += entry.height;
    }

    for _ in 0..height.saturating_sub(line_count) {
        out.push('\n');
    }

    out
}

/// Byte offset of the first character after the `n`-th `'\n'` in `s`, or the
/// end of `s` if `n` names the final, unterminated line. `None` if `s` has
/// fewer than `n` lines. Operates on bytes, not chars: `'\n'` is single-byte
/// in UTF-8 and never appears as a continuation byte, so this is safe on
/// arbitrary UTF-8 (and ANSI-escaped) text.
fn find_line_pos(s: &str, n: usize) -> Option<usize> {
    if n == 0 {
        return Some(0);
    }
    let mut remaining = n;
    for (i, b) in s.bytes().enumerate() {
        if b == b'\n' {
            remaining -= 1;
            if remaining == 0 {
                return Some(i + 1);
            }
        }
    }
    if remaining == 1 {
        Some(s.len())
    } else {
        None
    }
}

/// Tracks the user's scroll position relative to a [`Ring`]'s cumulative
/// height, including the "stick to the bottom as new lines arrive" auto-follow
/// mode (`autoScroll` in the original).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollController {
    offset: i64,
    auto_follow: bool,
}

impl ScrollController {
    /// A fresh controller, following the tail by default.
    pub fn new() -> Self {
        Self {
            offset: 0,
            auto_follow: true,
        }
    }

    pub fn auto_follow(&self) -> bool {
        self.auto_follow
    }

    fn max_scroll(ring: &Ring, viewport_height: usize) -> i64 {
        ring.total_height() as i64 - viewport_height as i64
    }

    /// Scroll up `n` rows, disabling auto-follow (matches `scrollUp`: moving
    /// up is always a deliberate exit from follow mode).
    pub fn scroll_up(&mut self, n: i64, ring: &Ring) {
        self.auto_follow = false;
        let min_offset = ring
            .first()
            .map(|f| f.cum_height as i64 - f.height as i64)
            .unwrap_or(0);
        self.offset = (self.offset - n).max(min_offset);
    }

    /// Scroll down `n` rows. Re-enables auto-follow once the new offset
    /// reaches or passes the bottom, matching `scrollDown`.
    pub fn scroll_down(&mut self, n: i64, ring: &Ring, viewport_height: usize) {
        let max_scroll = Self::max_scroll(ring, viewport_height);
        if self.offset + n >= max_scroll {
            self.auto_follow = true;
        }
        self.offset = (self.offset + n).min(max_scroll);
    }

    /// Called after every append: snaps to the bottom while auto-follow is
    /// on, mirroring the original's `View()` recomputing `maxScroll` on
    /// every frame and resetting `scrollOffset` when `autoScroll`.
    pub fn note_append(&mut self, ring: &Ring, viewport_height: usize) {
        if self.auto_follow {
            self.offset = Self::max_scroll(ring, viewport_height);
        }
    }

    /// Called after an eviction with the evicted entry's height, so the
    /// user's visual position is preserved across the ring losing its
    /// oldest entry (spec.md §4.2's "evicted entry's height is subtracted
    /// from the viewport's scroll offset").
    pub fn note_eviction(&mut self, evicted_height: usize, ring: &Ring, viewport_height: usize) {
        self.offset -= evicted_height as i64;
        if self.auto_follow {
            self.offset = Self::max_scroll(ring, viewport_height);
        }
    }

    /// The offset to pass to [`render`]: `self.offset` clamped to `[0,
    /// max_scroll]`, matching `start := max(0, min(m.maxScroll,
    /// m.scrollOffset))`.
    pub fn visible_offset(&self, ring: &Ring, viewport_height: usize) -> i64 {
        let max_scroll = Self::max_scroll(ring, viewport_height);
        self.offset.min(max_scroll).max(0)
    }
}
