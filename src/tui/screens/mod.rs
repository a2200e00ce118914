//! # Screens
//!
//! The four top-level screens. Exactly one is active at a time, held by the
//! controller inside [`ScreenState`]; navigation replaces it wholesale,
//! everything else mutates it in place.
//!
//! ```text
//!   Welcome ──LoggedIn──► Home ──NavigateToCreate──► Create
//!      ▲                   │ ▲                         │
//!      └──────Logout───────┘ └──NavigateBack / Deleted─┤
//!                          │                           │
//!                          └──CharacterSelected──► Sheet ◄── CharacterCreated
//! ```
//!
//! Screens never touch the terminal or the controller. They receive
//! [`Message`]s and answer with [`Command`]s, and render into whatever
//! area they are given.

pub mod create;
pub mod home;
pub mod sheet;
pub mod welcome;

use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::core::auth::AuthService;
use crate::core::store::CharacterStore;
use crate::tui::message::{Command, Message};
use crate::tui::theme::Theme;

pub use create::CreateScreen;
pub use home::HomeScreen;
pub use sheet::SheetScreen;
pub use welcome::WelcomeScreen;

/// Collaborators every screen may need, cloned into each constructor.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn CharacterStore>,
    pub auth: Arc<dyn AuthService>,
    pub theme: Arc<Theme>,
}

/// One top-level screen.
pub trait Screen {
    /// Commands to run right after the screen becomes active.
    fn init(&mut self) -> Vec<Command> {
        Vec::new()
    }

    fn update(&mut self, msg: Message) -> Vec<Command>;

    fn render(&mut self, frame: &mut Frame, area: Rect);

    fn resize(&mut self, width: u16, height: u16);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Welcome,
    Home,
    Create,
    Sheet,
}

pub enum ScreenState {
    Welcome(WelcomeScreen),
    Home(HomeScreen),
    Create(CreateScreen),
    Sheet(Box<SheetScreen>),
}

impl ScreenState {
    pub fn kind(&self) -> ScreenKind {
        match self {
            ScreenState::Welcome(_) => ScreenKind::Welcome,
            ScreenState::Home(_) => ScreenKind::Home,
            ScreenState::Create(_) => ScreenKind::Create,
            ScreenState::Sheet(_) => ScreenKind::Sheet,
        }
    }

    pub fn screen_mut(&mut self) -> &mut dyn Screen {
        match self {
            ScreenState::Welcome(s) => s,
            ScreenState::Home(s) => s,
            ScreenState::Create(s) => s,
            ScreenState::Sheet(s) => s.as_mut(),
        }
    }
}

// ============================================================================
// Shared rendering
// ============================================================================

const SMALL_LOGO: [&str; 3] = [
    "╔═══════════════════════╗",
    "║   D&D Character App   ║",
    "╚═══════════════════════╝",
];

const LOGO: [&str; 5] = [
    r" ____  _   _ ____    ____  _                      _",
    r"|  _ \| \ | |  _ \  / ___|| |__   __ _ _ __ __ _ | |_ ___ _ __",
    r"| | | |  \| | | | | \___ \| '_ \ / _' | '__/ _' || __/ _ \ '__|",
    r"| |_| | |\  | |_| |  ___) | | | | (_| | | | (_| || ||  __/ |",
    r"|____/|_| \_|____/  |____/|_| |_|\__,_|_|  \__,_| \__\___|_|",
];

pub(crate) fn logo_lines(theme: &Theme) -> Vec<Line<'static>> {
    LOGO.iter().map(|l| Line::from(Span::styled(*l, theme.title))).collect()
}

pub(crate) fn small_logo_lines(theme: &Theme) -> Vec<Line<'static>> {
    SMALL_LOGO.iter().map(|l| Line::from(Span::styled(*l, theme.title))).collect()
}

/// Render `lines` as a left-aligned block centered in `area`, both ways.
pub(crate) fn render_centered(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let width = lines.iter().map(Line::width).max().unwrap_or(0) as u16;
    let height = lines.len() as u16;

    let [column] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(area);
    let [block] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(column);

    frame.render_widget(Paragraph::new(lines), block);
}

/// `"Error: msg"` in the error style.
pub(crate) fn error_line(theme: &Theme, message: &str) -> Line<'static> {
    Line::from(Span::styled(format!("Error: {message}"), theme.error_text))
}

pub(crate) fn help_line(theme: &Theme, text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), theme.help))
}
