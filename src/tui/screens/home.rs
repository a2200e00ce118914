//! # Home Screen
//!
//! The signed-in user's character list. The row after the last character
//! is "+ Create New Character", so the cursor ranges over `0..=len`.

use std::sync::Arc;

use log::warn;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};

use crate::core::model::{Character, User};
use crate::core::store::CharacterStore;
use crate::tui::event::Key;
use crate::tui::message::{Command, Message};
use crate::tui::screens::{Screen, error_line, help_line, render_centered, small_logo_lines};
use crate::tui::theme::Theme;

/// Load `user_id`'s characters, answering with `CharactersLoaded`.
pub fn load_characters(store: Arc<dyn CharacterStore>, user_id: uuid::Uuid) -> Command {
    Command::new("load characters", async move {
        Message::CharactersLoaded(store.list_characters(user_id).await)
    })
}

pub struct HomeScreen {
    store: Arc<dyn CharacterStore>,
    user: User,
    theme: Arc<Theme>,

    characters: Vec<Character>,
    selected: usize,
    confirm_delete: bool,
    error: Option<String>,
    width: u16,
    height: u16,
}

impl HomeScreen {
    pub fn new(store: Arc<dyn CharacterStore>, user: User, theme: Arc<Theme>) -> Self {
        Self {
            store,
            user,
            theme,
            characters: Vec::new(),
            selected: 0,
            confirm_delete: false,
            error: None,
            width: 80,
            height: 24,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_confirming_delete(&self) -> bool {
        self.confirm_delete
    }

    /// Replace the list, keeping the cursor on a character when possible.
    pub fn set_characters(&mut self, characters: Vec<Character>) {
        self.characters = characters;
        if self.selected >= self.characters.len() && !self.characters.is_empty() {
            self.selected = self.characters.len() - 1;
        }
        self.selected = self.selected.min(self.characters.len());
    }

    fn selected_character(&self) -> Option<&Character> {
        self.characters.get(self.selected)
    }

    fn handle_key(&mut self, key: Key) -> Vec<Command> {
        if self.confirm_delete {
            return self.handle_confirm(key);
        }
        match key {
            Key::Up | Key::Char('k') => self.selected = self.selected.saturating_sub(1),
            Key::Down | Key::Char('j') => {
                if self.selected < self.characters.len() {
                    self.selected += 1;
                }
            }
            Key::Enter => {
                return match self.selected_character() {
                    Some(character) => vec![Command::message(Message::CharacterSelected(character.clone()))],
                    None => vec![Command::message(Message::NavigateToCreate)],
                };
            }
            Key::Char('d') | Key::Delete => {
                if self.selected_character().is_some() {
                    self.confirm_delete = true;
                }
            }
            Key::Char('l') => return vec![Command::message(Message::Logout)],
            Key::Char('q') => return vec![Command::message(Message::Quit)],
            _ => {}
        }
        Vec::new()
    }

    fn handle_confirm(&mut self, key: Key) -> Vec<Command> {
        match key {
            Key::Char('y' | 'Y') => {
                self.confirm_delete = false;
                let Some(id) = self.selected_character().map(|c| c.id) else {
                    return Vec::new();
                };
                let store = Arc::clone(&self.store);
                vec![Command::new("delete character", async move {
                    match store.delete_character(id).await {
                        Ok(()) => Message::CharacterDeleted(id),
                        Err(e) => Message::Failed(format!("Failed to delete character: {e}")),
                    }
                })]
            }
            Key::Char('n' | 'N') | Key::Esc => {
                self.confirm_delete = false;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn list_lines(&self) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let mut lines = Vec::new();

        if self.characters.is_empty() {
            lines.push(Line::from(Span::styled(
                "No characters yet. Create your first adventurer!",
                theme.muted_text,
            )));
        } else {
            for (i, c) in self.characters.iter().enumerate() {
                let selected = i == self.selected;
                let cursor = if selected { "> " } else { "  " };
                let style = if selected { theme.selected } else { theme.text };
                lines.push(Line::from(Span::styled(
                    format!("{cursor}{} - Level {} {} {}", c.name, c.level, c.race, c.class),
                    style,
                )));
            }
        }
        lines.push(Line::default());

        let on_create = self.selected == self.characters.len();
        lines.push(Line::from(vec![
            Span::styled(if on_create { "> " } else { "  " }, theme.cursor),
            Span::styled(
                "+ Create New Character",
                if on_create { theme.selected } else { theme.text },
            ),
        ]));
        lines
    }
}

impl Screen for HomeScreen {
    fn init(&mut self) -> Vec<Command> {
        vec![load_characters(Arc::clone(&self.store), self.user.id)]
    }

    fn update(&mut self, msg: Message) -> Vec<Command> {
        match msg {
            Message::Key(key) => {
                self.error = None;
                self.handle_key(key)
            }
            Message::CharactersLoaded(Ok(characters)) => {
                self.set_characters(characters);
                Vec::new()
            }
            Message::CharactersLoaded(Err(e)) => {
                warn!("Failed to load characters for {}: {}", self.user.id, e);
                self.error = Some(format!("Failed to load characters: {e}"));
                Vec::new()
            }
            Message::Failed(error) => {
                warn!("{}", error);
                self.error = Some(error);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let theme = Arc::clone(&self.theme);
        let mut lines = small_logo_lines(&theme);
        lines.push(Line::default());

        let who = match &self.user.email {
            Some(email) => format!("Logged in as: {email}"),
            None => "Logged in".to_string(),
        };
        lines.push(Line::from(Span::styled(who, theme.subtitle)));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Your Characters", theme.title)));
        lines.push(Line::default());
        lines.extend(self.list_lines());

        if self.confirm_delete
            && let Some(c) = self.selected_character()
        {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("Delete {}? This cannot be undone. (y/n)", c.name),
                theme.warning_text,
            )));
        }

        if let Some(error) = &self.error {
            lines.push(Line::default());
            lines.push(error_line(&theme, error));
        }

        lines.push(Line::default());
        lines.push(help_line(
            &theme,
            if self.confirm_delete {
                "y: confirm delete • n: cancel"
            } else {
                "↑/↓: navigate • enter: select • d: delete • l: logout • q: quit"
            },
        ));

        render_centered(frame, area, lines);
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }
}
