//! Small layout and text helpers shared by screens and components.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::tui::theme::Theme;

/// A `width` x `height` rect centered in `outer`, clamped to fit.
pub fn centered_fixed(width: u16, height: u16, outer: Rect) -> Rect {
    let width = width.min(outer.width);
    let height = height.min(outer.height);
    Rect {
        x: outer.x + (outer.width - width) / 2,
        y: outer.y + (outer.height - height) / 2,
        width,
        height,
    }
}

/// Truncate or right-pad `s` to exactly `width` display columns.
///
/// Overflowing text ends in `...` when there is room for at least one
/// character before it; narrower cells are hard-cut.
pub fn fit_width(s: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let current = s.width();
    if current <= width {
        return format!("{}{}", s, " ".repeat(width - current));
    }

    let (budget, suffix) = if width > 3 { (width - 3, "...") } else { (width, "") };
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push_str(suffix);
    let used = out.width();
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// `[●]` for each remaining slot, `[ ]` for each spent one.
pub fn slot_tracker(used: i32, total: i32) -> String {
    checkbox_row(total - used, total, "[●]", "[ ]")
}

fn checkbox_row(checked: i32, total: i32, on: &str, off: &str) -> String {
    (0..total.max(0))
        .map(|i| if i < checked { on } else { off })
        .collect()
}

/// `label: value` with the label right-aligned in `label_width` columns.
pub fn key_value(label: &str, value: impl Into<String>, label_width: usize, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:>label_width$}", format!("{label}:")), theme.muted_text),
        Span::raw(" "),
        Span::styled(value.into(), theme.text),
    ])
}

/// Concatenated span contents of a line, without styling.
pub fn plain(line: &Line) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}
