//! # ScrollableTable Component
//!
//! A paged list with a cursor, a viewport and a typed payload per row.
//!
//! ## Viewport
//!
//! The viewport is the index of the first visible row. After every cursor
//! move it shifts by the minimum needed to keep the cursor visible, so
//! the window never jumps:
//!
//! ```text
//!   viewport ≤ cursor < viewport + visible_rows
//!   0 ≤ viewport ≤ max(0, rows - visible_rows)
//! ```
//!
//! ## Intents
//!
//! `Enter`, `e` and `d`/`Delete` emit [`TableEvent`]s carrying the whole
//! selected row, and only while the table is focused. Unfocused tables
//! ignore every key.

use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::component::{Component, EventHandler};
use crate::tui::components::widgets::fit_width;
use crate::tui::event::Key;
use crate::tui::theme::Theme;

const DEFAULT_VISIBLE_ROWS: usize = 10;
const DEFAULT_WIDTH: u16 = 80;
const MIN_FLEX_WIDTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub title: String,
    /// Fixed width; `0` means flexible.
    pub width: u16,
    /// Lower bound for a flexible column.
    pub min_width: u16,
}

impl TableColumn {
    pub fn fixed(title: impl Into<String>, width: u16) -> Self {
        Self { title: title.into(), width, min_width: 0 }
    }

    pub fn flex(title: impl Into<String>, min_width: u16) -> Self {
        Self { title: title.into(), width: 0, min_width }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow<T> {
    pub id: String,
    pub cells: Vec<String>,
    pub data: T,
}

impl<T> TableRow<T> {
    pub fn new(id: impl Into<String>, cells: Vec<String>, data: T) -> Self {
        Self { id: id.into(), cells, data }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent<T> {
    Select(TableRow<T>),
    Edit(TableRow<T>),
    Delete(TableRow<T>),
}

pub struct ScrollableTable<T> {
    columns: Vec<TableColumn>,
    rows: Vec<TableRow<T>>,
    cursor: usize,
    viewport: usize,
    visible_rows: usize,
    focused: bool,
    width: u16,
    empty_message: String,
    theme: Arc<Theme>,
}

impl<T: Clone> ScrollableTable<T> {
    pub fn new(columns: Vec<TableColumn>, theme: Arc<Theme>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            cursor: 0,
            viewport: 0,
            visible_rows: DEFAULT_VISIBLE_ROWS,
            focused: false,
            width: DEFAULT_WIDTH,
            empty_message: "No items".to_string(),
            theme,
        }
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    /// Replace all rows, clamping the cursor to the new last row.
    pub fn set_rows(&mut self, rows: Vec<TableRow<T>>) {
        self.rows = rows;
        if self.cursor >= self.rows.len() {
            self.cursor = self.rows.len().saturating_sub(1);
        }
        self.adjust_viewport();
    }

    pub fn add_row(&mut self, row: TableRow<T>) {
        self.rows.push(row);
        self.adjust_viewport();
    }

    pub fn remove_row(&mut self, id: &str) {
        let Some(index) = self.rows.iter().position(|r| r.id == id) else {
            return;
        };
        self.rows.remove(index);
        if self.cursor >= self.rows.len() && self.cursor > 0 {
            self.cursor -= 1;
        }
        self.adjust_viewport();
    }

    pub fn update_row(&mut self, id: &str, row: TableRow<T>) {
        if let Some(slot) = self.rows.iter_mut().find(|r| r.id == id) {
            *slot = row;
        }
    }

    pub fn selected_row(&self) -> Option<&TableRow<T>> {
        self.rows.get(self.cursor)
    }

    /// Cursor index, or `None` when the table is empty.
    pub fn cursor(&self) -> Option<usize> {
        (!self.rows.is_empty()).then_some(self.cursor)
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    pub fn rows(&self) -> &[TableRow<T>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    pub fn set_visible_rows(&mut self, n: usize) {
        self.visible_rows = n.max(1);
        self.adjust_viewport();
    }

    pub fn set_width(&mut self, width: u16) {
        self.width = width;
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    fn adjust_viewport(&mut self) {
        if self.cursor < self.viewport {
            self.viewport = self.cursor;
        }
        if self.cursor >= self.viewport + self.visible_rows {
            self.viewport = self.cursor + 1 - self.visible_rows;
        }
        let max_viewport = self.rows.len().saturating_sub(self.visible_rows);
        self.viewport = self.viewport.min(max_viewport);
    }

    fn last_index(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    fn intent(&self, make: fn(TableRow<T>) -> TableEvent<T>) -> Option<TableEvent<T>> {
        self.selected_row().cloned().map(make)
    }

    /// Column widths for the current table width.
    pub fn column_widths(&self) -> Vec<usize> {
        let mut fixed = 0usize;
        let mut flex_count = 0usize;
        for col in &self.columns {
            if col.width > 0 {
                fixed += usize::from(col.width) + 1;
            } else {
                flex_count += 1;
            }
        }

        let flex_width = if flex_count > 0 {
            let remaining = usize::from(self.width).saturating_sub(fixed + 2);
            (remaining / flex_count).max(MIN_FLEX_WIDTH)
        } else {
            0
        };

        self.columns
            .iter()
            .map(|col| {
                if col.width > 0 {
                    usize::from(col.width)
                } else {
                    flex_width.max(usize::from(col.min_width))
                }
            })
            .collect()
    }

    /// Render as styled lines: header, separator, the visible rows (padded
    /// to `visible_rows`) and a scroll indicator when rows overflow.
    pub fn lines(&self) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let widths = self.column_widths();
        let mut lines = Vec::with_capacity(self.visible_rows + 3);

        let header = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| fit_width(&col.title, *w))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(Line::from(Span::styled(header, theme.header)));

        let separator = widths.iter().map(|w| "─".repeat(*w)).collect::<Vec<_>>().join("─");
        lines.push(Line::from(Span::styled(separator, theme.muted_text)));

        if self.rows.is_empty() {
            lines.push(Line::from(Span::styled(self.empty_message.clone(), theme.muted_text)));
            return lines;
        }

        let end = (self.viewport + self.visible_rows).min(self.rows.len());
        for (i, row) in self.rows[self.viewport..end].iter().enumerate() {
            let cells: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(c, w)| fit_width(row.cells.get(c).map(String::as_str).unwrap_or(""), *w))
                .collect();
            let selected = self.focused && self.viewport + i == self.cursor;
            let style = if selected { theme.selected } else { theme.text };
            lines.push(Line::from(Span::styled(cells.join(" "), style)));
        }
        for _ in (end - self.viewport)..self.visible_rows {
            lines.push(Line::default());
        }

        if self.rows.len() > self.visible_rows {
            lines.push(Line::from(Span::styled(
                format!("  ↑↓ {}-{} of {}", self.viewport + 1, end, self.rows.len()),
                theme.muted_text,
            )));
        }
        lines
    }
}

impl<T: Clone> Component for ScrollableTable<T> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.width = area.width;
        frame.render_widget(Paragraph::new(self.lines()), area);
    }
}

impl<T: Clone> EventHandler for ScrollableTable<T> {
    type Event = TableEvent<T>;

    fn handle_event(&mut self, key: Key) -> Option<Self::Event> {
        if !self.focused {
            return None;
        }

        match key {
            Key::Up | Key::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            Key::Down | Key::Char('j') => {
                if self.cursor < self.last_index() {
                    self.cursor += 1;
                }
            }
            Key::PageUp => {
                self.cursor = self.cursor.saturating_sub(self.visible_rows);
            }
            Key::PageDown => {
                self.cursor = (self.cursor + self.visible_rows).min(self.last_index());
            }
            Key::Home | Key::Char('g') => self.cursor = 0,
            Key::End | Key::Char('G') => self.cursor = self.last_index(),
            Key::Enter => return self.intent(TableEvent::Select),
            Key::Char('e') => return self.intent(TableEvent::Edit),
            Key::Char('d') | Key::Delete => return self.intent(TableEvent::Delete),
            _ => return None,
        }
        self.adjust_viewport();
        None
    }
}
