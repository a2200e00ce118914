use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// A normalized key press. Screens and components match on this instead of
/// raw crossterm events; space arrives as `Char(' ')`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    /// Control chord, lowercase letter (`Ctrl('s')`).
    Ctrl(char),
    Enter,
    Esc,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    Key(Key),
    Resize(u16, u16),
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> std::io::Result<Option<TuiEvent>> {
    poll_event_timeout(std::time::Duration::ZERO)
}

pub fn poll_event_timeout(timeout: std::time::Duration) -> std::io::Result<Option<TuiEvent>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    Ok(translate(event::read()?))
}

/// Map a crossterm event onto a `TuiEvent`, dropping anything the UI ignores
/// (mouse, focus, key releases and repeats).
pub fn translate(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key_event) => translate_key(key_event).map(TuiEvent::Key),
        Event::Resize(w, h) => Some(TuiEvent::Resize(w, h)),
        _ => None,
    }
}

fn translate_key(key_event: KeyEvent) -> Option<Key> {
    // Keyboard enhancement reports releases too
    if key_event.kind != KeyEventKind::Press {
        return None;
    }
    log::debug!("Key event: {:?} with modifiers {:?}", key_event.code, key_event.modifiers);
    let key = match (key_event.modifiers, key_event.code) {
        (m, KeyCode::Char(c)) if m.contains(KeyModifiers::CONTROL) => Key::Ctrl(c.to_ascii_lowercase()),
        (_, KeyCode::Char(c)) => Key::Char(c),
        (_, KeyCode::Enter) => Key::Enter,
        (_, KeyCode::Esc) => Key::Esc,
        (m, KeyCode::Tab) if m.contains(KeyModifiers::SHIFT) => Key::BackTab,
        (_, KeyCode::Tab) => Key::Tab,
        (_, KeyCode::BackTab) => Key::BackTab,
        (_, KeyCode::Backspace) => Key::Backspace,
        (_, KeyCode::Delete) => Key::Delete,
        (_, KeyCode::Up) => Key::Up,
        (_, KeyCode::Down) => Key::Down,
        (_, KeyCode::Left) => Key::Left,
        (_, KeyCode::Right) => Key::Right,
        (_, KeyCode::Home) => Key::Home,
        (_, KeyCode::End) => Key::End,
        (_, KeyCode::PageUp) => Key::PageUp,
        (_, KeyCode::PageDown) => Key::PageDown,
        _ => return None,
    };
    Some(key)
}
