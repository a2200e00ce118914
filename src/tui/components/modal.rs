//! # ModalForm Component
//!
//! A centered overlay holding an ordered list of typed fields.
//!
//! ## Keys
//!
//! | Key                 | Effect                                        |
//! |---------------------|-----------------------------------------------|
//! | `tab` / `↓`         | next field (wraps)                            |
//! | `shift+tab` / `↑`   | previous field (wraps)                        |
//! | `←` / `→`           | cycle a select                                |
//! | `space` / `enter`   | toggle a checkbox, cycle a select forward     |
//! | `ctrl+s`            | validate required fields, emit `Save`, hide   |
//! | `esc`               | emit `Cancel`, hide                           |
//!
//! Anything else goes to the focused text or number input. A save with an
//! empty required field is refused silently; the owner decides whether to
//! say anything about it.

use std::collections::HashMap;
use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::components::text_input::TextInput;
use crate::tui::components::widgets::centered_fixed;
use crate::tui::event::Key;
use crate::tui::theme::Theme;

const LABEL_WIDTH: usize = 15;
const MAX_WIDTH: u16 = 60;
const HELP: &str = "tab: next field • ctrl+s: save • esc: cancel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Select(Vec<String>),
    Checkbox,
}

/// Declaration of one form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: String,
    pub required: bool,
    pub placeholder: String,
}

impl Field {
    fn new(key: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            value: String::new(),
            required: false,
            placeholder: String::new(),
        }
    }

    pub fn text(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    pub fn number(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Number)
    }

    pub fn select<S: AsRef<str>>(key: &str, label: &str, options: &[S]) -> Self {
        let options = options.iter().map(|o| o.as_ref().to_string()).collect();
        Self::new(key, label, FieldKind::Select(options))
    }

    pub fn checkbox(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Checkbox)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalEvent {
    Save(HashMap<String, String>),
    Cancel,
}

fn truthy(value: &str) -> bool {
    matches!(value, "true" | "1" | "yes")
}

struct FieldState {
    field: Field,
    input: TextInput,
    selected: usize,
    checked: bool,
}

impl FieldState {
    fn new(field: Field, theme: &Arc<Theme>) -> Self {
        let mut input = TextInput::new(Arc::clone(theme)).with_placeholder(field.placeholder.clone());
        if field.kind == FieldKind::Number {
            input = input.numeric();
        }
        let mut state = Self { field, input, selected: 0, checked: false };
        let initial = state.field.value.clone();
        state.set(&initial);
        state
    }

    fn is_textual(&self) -> bool {
        matches!(self.field.kind, FieldKind::Text | FieldKind::Number)
    }

    fn set(&mut self, value: &str) {
        self.input.set_value(value);
        match &self.field.kind {
            FieldKind::Select(options) => {
                if let Some(i) = options.iter().position(|o| o == value) {
                    self.selected = i;
                }
            }
            FieldKind::Checkbox => self.checked = truthy(value),
            FieldKind::Text | FieldKind::Number => {}
        }
    }

    fn get(&self) -> Option<String> {
        match &self.field.kind {
            FieldKind::Text | FieldKind::Number => Some(self.input.value().to_string()),
            FieldKind::Select(options) => options.get(self.selected).cloned(),
            FieldKind::Checkbox => Some(self.checked.to_string()),
        }
    }

    fn cycle(&mut self, forward: bool) {
        if let FieldKind::Select(options) = &self.field.kind {
            let n = options.len();
            if n > 0 {
                self.selected = if forward { (self.selected + 1) % n } else { (self.selected + n - 1) % n };
            }
        }
    }
}

pub struct ModalForm {
    title: String,
    fields: Vec<FieldState>,
    cursor: usize,
    visible: bool,
    theme: Arc<Theme>,
}

impl ModalForm {
    /// A visible form with the first field focused.
    pub fn new(title: impl Into<String>, fields: Vec<Field>, theme: Arc<Theme>) -> Self {
        let fields = fields.into_iter().map(|f| FieldState::new(f, &theme)).collect();
        let mut modal = Self { title: title.into(), fields, cursor: 0, visible: false, theme };
        modal.show();
        modal
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.focus(0);
    }

    pub fn hide(&mut self) {
        self.visible = false;
        for state in &mut self.fields {
            state.input.blur();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn focused_index(&self) -> usize {
        self.cursor
    }

    /// Every field's current value; checkboxes read `"true"` / `"false"`.
    pub fn values(&self) -> HashMap<String, String> {
        self.fields
            .iter()
            .filter_map(|s| s.get().map(|v| (s.field.key.clone(), v)))
            .collect()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.fields.iter().find(|s| s.field.key == key).and_then(FieldState::get)
    }

    pub fn set_value(&mut self, key: &str, value: &str) {
        if let Some(state) = self.fields.iter_mut().find(|s| s.field.key == key) {
            state.set(value);
        }
    }

    pub fn tick(&mut self) {
        if let Some(state) = self.fields.get_mut(self.cursor) {
            state.input.tick();
        }
    }

    fn focus(&mut self, index: usize) {
        if let Some(state) = self.fields.get_mut(self.cursor) {
            state.input.blur();
        }
        self.cursor = index;
        if let Some(state) = self.fields.get_mut(index) {
            if state.is_textual() {
                state.input.focus();
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.fields
            .iter()
            .filter(|s| s.field.required)
            .all(|s| s.get().is_some_and(|v| !v.trim().is_empty()))
    }

    fn field_line(&self, index: usize, input_width: usize) -> Line<'static> {
        let theme = &self.theme;
        let state = &self.fields[index];
        let focused = index == self.cursor;

        let mut label = state.field.label.clone();
        if state.field.required {
            label.push_str(" *");
        }
        let label_style = if focused { theme.cursor } else { theme.text };
        let mut spans = vec![Span::styled(format!("{label:>LABEL_WIDTH$} "), label_style)];

        let value_style = if focused { theme.border_focused } else { theme.muted_text };
        match &state.field.kind {
            FieldKind::Text | FieldKind::Number => {
                spans.extend(state.input.line(input_width).spans);
            }
            FieldKind::Select(options) => {
                let shown = options
                    .get(state.selected)
                    .map_or_else(|| "(none)".to_string(), |o| format!("◀ {o} ▶"));
                spans.push(Span::styled(shown, value_style));
            }
            FieldKind::Checkbox => {
                let shown = if state.checked { "[✓]" } else { "[ ]" };
                let style = if focused { theme.button_focused } else { theme.button };
                spans.push(Span::styled(shown, style));
            }
        }
        Line::from(spans)
    }
}

impl Component for ModalForm {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if !self.visible {
            return;
        }

        let width = MAX_WIDTH.min(area.width.saturating_sub(10)).max(20);
        // borders 2 + padding 2 + blank + help
        let wanted = self.fields.len() as u16 + 6;
        let height = wanted.min(area.height.saturating_sub(2)).max(5);
        let overlay = centered_fixed(width, height, area);

        let rows = usize::from(height.saturating_sub(6)).max(1);
        let first = (self.cursor + 1).saturating_sub(rows);
        let input_width = usize::from(width.saturating_sub(4)).saturating_sub(LABEL_WIDTH + 1);

        let mut lines: Vec<Line> = (first..self.fields.len().min(first + rows))
            .map(|i| self.field_line(i, input_width))
            .collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(HELP, self.theme.help)));

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(self.theme.border_focused)
            .title(Span::styled(format!(" {} ", self.title), self.theme.title))
            .padding(Padding::uniform(1));

        frame.render_widget(Clear, overlay);
        frame.render_widget(Paragraph::new(lines).block(block), overlay);
    }
}

impl EventHandler for ModalForm {
    type Event = ModalEvent;

    fn handle_event(&mut self, key: Key) -> Option<Self::Event> {
        if !self.visible || self.fields.is_empty() {
            return None;
        }
        let n = self.fields.len();

        match key {
            Key::Esc => {
                self.hide();
                return Some(ModalEvent::Cancel);
            }
            Key::Ctrl('s') => {
                if !self.is_complete() {
                    return None;
                }
                let values = self.values();
                self.hide();
                return Some(ModalEvent::Save(values));
            }
            Key::Tab | Key::Down => {
                self.focus((self.cursor + 1) % n);
                return None;
            }
            Key::BackTab | Key::Up => {
                self.focus((self.cursor + n - 1) % n);
                return None;
            }
            _ => {}
        }

        let state = &mut self.fields[self.cursor];
        let is_select = matches!(state.field.kind, FieldKind::Select(_));
        let is_checkbox = state.field.kind == FieldKind::Checkbox;
        match key {
            Key::Left if is_select => state.cycle(false),
            Key::Right | Key::Char(' ') | Key::Enter if is_select => state.cycle(true),
            Key::Char(' ') | Key::Enter if is_checkbox => state.checked = !state.checked,
            _ if state.is_textual() => {
                state.input.handle_event(key);
            }
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn attack_form() -> ModalForm {
        ModalForm::new(
            "Add Attack",
            vec![
                Field::text("name", "Name").required(),
                Field::text("bonus", "Attack Bonus").placeholder("+5"),
                Field::select("type", "Damage Type", &["slashing", "piercing", "fire"]),
                Field::checkbox("ranged", "Ranged"),
            ],
            Arc::new(Theme::default()),
        )
    }

    fn type_str(m: &mut ModalForm, s: &str) {
        for c in s.chars() {
            m.handle_event(Key::Char(c));
        }
    }

    #[test]
    fn test_required_field_blocks_save() {
        let mut m = attack_form();
        assert_eq!(m.handle_event(Key::Ctrl('s')), None);
        assert!(m.is_visible());

        type_str(&mut m, "   ");
        assert_eq!(m.handle_event(Key::Ctrl('s')), None);

        type_str(&mut m, "Longsword");
        match m.handle_event(Key::Ctrl('s')) {
            Some(ModalEvent::Save(values)) => {
                assert_eq!(values["name"], "   Longsword");
                assert_eq!(values["type"], "slashing");
                assert_eq!(values["ranged"], "false");
            }
            other => panic!("expected save, got {:?}", other),
        }
        assert!(!m.is_visible());
    }

    #[test]
    fn test_escape_cancels_and_hides() {
        let mut m = attack_form();
        assert_eq!(m.handle_event(Key::Esc), Some(ModalEvent::Cancel));
        assert!(!m.is_visible());
        assert_eq!(m.handle_event(Key::Char('x')), None);
    }

    #[test]
    fn test_focus_wraps_both_ways() {
        let mut m = attack_form();
        m.handle_event(Key::BackTab);
        assert_eq!(m.focused_index(), 3);
        m.handle_event(Key::Down);
        assert_eq!(m.focused_index(), 0);
        m.handle_event(Key::Tab);
        m.handle_event(Key::Up);
        assert_eq!(m.focused_index(), 0);
    }

    #[test]
    fn test_select_and_checkbox_keys() {
        let mut m = attack_form();
        m.handle_event(Key::Tab);
        m.handle_event(Key::Tab);
        m.handle_event(Key::Left);
        assert_eq!(m.value("type").as_deref(), Some("fire"));
        m.handle_event(Key::Enter);
        assert_eq!(m.value("type").as_deref(), Some("slashing"));

        // letters do not leak into a select
        m.handle_event(Key::Char('z'));
        assert_eq!(m.value("type").as_deref(), Some("slashing"));

        m.handle_event(Key::Tab);
        m.handle_event(Key::Char(' '));
        assert_eq!(m.value("ranged").as_deref(), Some("true"));
    }

    #[test]
    fn test_set_value_and_initial_values() {
        let mut m = ModalForm::new(
            "Edit",
            vec![
                Field::select("school", "School", &["Evocation", "Illusion"]).value("Illusion"),
                Field::checkbox("ritual", "Ritual").value("yes"),
                Field::number("level", "Level").value("3"),
            ],
            Arc::new(Theme::default()),
        );
        assert_eq!(m.value("school").as_deref(), Some("Illusion"));
        assert_eq!(m.value("ritual").as_deref(), Some("true"));

        m.set_value("level", "5");
        m.set_value("ritual", "false");
        let values = m.values();
        assert_eq!(values["level"], "5");
        assert_eq!(values["ritual"], "false");
    }

    #[test]
    fn test_number_field_filters_input() {
        let mut m = ModalForm::new(
            "HP",
            vec![Field::number("hp", "HP")],
            Arc::new(Theme::default()),
        );
        type_str(&mut m, "1x2");
        assert_eq!(m.value("hp").as_deref(), Some("12"));
    }

    #[test]
    fn test_render_overlay() {
        let backend = TestBackend::new(80, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut m = attack_form();

        terminal.draw(|f| m.render(f, f.area())).unwrap();

        let text: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Add Attack"));
        assert!(text.contains("Name *"));
        assert!(text.contains("◀ slashing ▶"));
        assert!(text.contains("[ ]"));
        assert!(text.contains("ctrl+s: save"));
    }
}
