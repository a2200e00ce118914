//! # Welcome Screen
//!
//! Login and registration, by email/password or by the identity key the
//! session arrived with.
//!
//! ```text
//!   Menu ──enter──► Login | Register          (email + password form)
//!        └─enter──► LoginKey | RegisterKey    (y/n confirm pane)
//! ```
//!
//! Auth calls run as [`Command`]s. Success arrives as `LoggedIn`, which the
//! controller intercepts; failure comes back here as `AuthFailed`.

use std::sync::Arc;

use log::debug;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};

use crate::core::auth::{AuthService, normalize_public_key};
use crate::tui::component::EventHandler;
use crate::tui::components::TextInput;
use crate::tui::event::Key;
use crate::tui::message::{Command, Message};
use crate::tui::screens::{Screen, error_line, help_line, logo_lines, render_centered};
use crate::tui::theme::Theme;

const LOGIN_KEY: &str = "Login with SSH Key";
const LOGIN_EMAIL: &str = "Login with Email";
const REGISTER_EMAIL: &str = "Register with Email";
const REGISTER_KEY: &str = "Register with SSH Key";

const KEY_PREVIEW_LEN: usize = 50;
const MIN_PASSWORD_LEN: usize = 6;
const INPUT_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WelcomeMode {
    Menu,
    Login,
    Register,
    LoginKey,
    RegisterKey,
}

pub struct WelcomeScreen {
    auth: Arc<dyn AuthService>,
    identity_key: Option<String>,
    theme: Arc<Theme>,

    mode: WelcomeMode,
    menu_index: usize,
    email: TextInput,
    password: TextInput,
    /// 0 = email, 1 = password, 2 = submit button
    focus: usize,
    error: Option<String>,
    width: u16,
    height: u16,
}

impl WelcomeScreen {
    pub fn new(auth: Arc<dyn AuthService>, identity_key: Option<String>, theme: Arc<Theme>) -> Self {
        let email = TextInput::new(Arc::clone(&theme))
            .with_placeholder("Email")
            .with_char_limit(255);
        let password = TextInput::new(Arc::clone(&theme))
            .with_placeholder("Password")
            .masked('*')
            .with_char_limit(100);
        Self {
            auth,
            identity_key,
            theme,
            mode: WelcomeMode::Menu,
            menu_index: 0,
            email,
            password,
            focus: 0,
            error: None,
            width: 80,
            height: 24,
        }
    }

    pub fn mode(&self) -> WelcomeMode {
        self.mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn menu_items(&self) -> &'static [&'static str] {
        if self.identity_key.is_some() {
            &[LOGIN_KEY, LOGIN_EMAIL, REGISTER_EMAIL, REGISTER_KEY]
        } else {
            &[LOGIN_EMAIL, REGISTER_EMAIL]
        }
    }

    fn handle_key(&mut self, key: Key) -> Vec<Command> {
        self.error = None;
        match self.mode {
            WelcomeMode::Menu => self.update_menu(key),
            WelcomeMode::Login | WelcomeMode::Register => self.update_form(key),
            WelcomeMode::LoginKey | WelcomeMode::RegisterKey => self.update_key_pane(key),
        }
    }

    fn update_menu(&mut self, key: Key) -> Vec<Command> {
        let items = self.menu_items();
        match key {
            Key::Up | Key::Char('k') => self.menu_index = self.menu_index.saturating_sub(1),
            Key::Down | Key::Char('j') => {
                if self.menu_index + 1 < items.len() {
                    self.menu_index += 1;
                }
            }
            Key::Enter => match items[self.menu_index] {
                LOGIN_KEY => self.mode = WelcomeMode::LoginKey,
                REGISTER_KEY => self.mode = WelcomeMode::RegisterKey,
                LOGIN_EMAIL => self.open_form(WelcomeMode::Login),
                _ => self.open_form(WelcomeMode::Register),
            },
            Key::Char('q') => return vec![Command::message(Message::Quit)],
            _ => {}
        }
        Vec::new()
    }

    fn open_form(&mut self, mode: WelcomeMode) {
        self.mode = mode;
        self.set_focus(0);
    }

    fn set_focus(&mut self, focus: usize) {
        self.focus = focus;
        self.email.blur();
        self.password.blur();
        match focus {
            0 => self.email.focus(),
            1 => self.password.focus(),
            _ => {}
        }
    }

    fn update_form(&mut self, key: Key) -> Vec<Command> {
        match key {
            Key::Tab | Key::Down => self.set_focus((self.focus + 1) % 3),
            Key::BackTab | Key::Up => self.set_focus((self.focus + 2) % 3),
            Key::Enter if self.focus == 2 => return self.submit(),
            Key::Enter => self.set_focus(self.focus + 1),
            Key::Esc => {
                self.mode = WelcomeMode::Menu;
                self.email.clear();
                self.password.clear();
                self.set_focus(0);
                self.email.blur();
            }
            _ => match self.focus {
                0 => {
                    self.email.handle_event(key);
                }
                1 => {
                    self.password.handle_event(key);
                }
                _ => {}
            },
        }
        Vec::new()
    }

    fn submit(&mut self) -> Vec<Command> {
        let email = self.email.value().trim().to_string();
        let password = self.password.value().to_string();

        if email.is_empty() {
            self.error = Some("Email is required".to_string());
            return Vec::new();
        }
        if password.is_empty() {
            self.error = Some("Password is required".to_string());
            return Vec::new();
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            self.error = Some("Password must be at least 6 characters".to_string());
            return Vec::new();
        }

        let auth = Arc::clone(&self.auth);
        if self.mode == WelcomeMode::Login {
            vec![Command::new("login with email", async move {
                match auth.login_with_email(&email, &password).await {
                    Ok(user) => Message::LoggedIn(user),
                    Err(e) => Message::AuthFailed(e),
                }
            })]
        } else {
            vec![Command::new("register with email", async move {
                match auth.register_with_email(&email, &password).await {
                    Ok(user) => Message::LoggedIn(user),
                    Err(e) => Message::AuthFailed(e),
                }
            })]
        }
    }

    fn update_key_pane(&mut self, key: Key) -> Vec<Command> {
        match key {
            Key::Enter | Key::Char('y') => {
                let Some(identity) = self.identity_key.clone() else {
                    self.error = Some("No SSH key detected".to_string());
                    return Vec::new();
                };
                let auth = Arc::clone(&self.auth);
                if self.mode == WelcomeMode::LoginKey {
                    vec![Command::new("login with key", async move {
                        match auth.login_with_public_key(&identity).await {
                            Ok(user) => Message::LoggedIn(user),
                            Err(e) => Message::AuthFailed(e),
                        }
                    })]
                } else {
                    vec![Command::new("register with key", async move {
                        match auth.register_with_public_key(&identity).await {
                            Ok(user) => Message::LoggedIn(user),
                            Err(e) => Message::AuthFailed(e),
                        }
                    })]
                }
            }
            Key::Esc | Key::Char('n') => {
                self.mode = WelcomeMode::Menu;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    // -- rendering --

    fn menu_lines(&self) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let mut lines = vec![
            Line::from(Span::styled("Welcome, Adventurer!", theme.title)),
            Line::default(),
        ];
        for (i, item) in self.menu_items().iter().enumerate() {
            let selected = i == self.menu_index;
            let cursor = if selected { "> " } else { "  " };
            let style = if selected { theme.selected } else { theme.text };
            lines.push(Line::from(vec![
                Span::styled(cursor, theme.cursor),
                Span::styled(*item, style),
            ]));
        }
        if self.identity_key.is_some() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("✓ SSH Key detected", theme.success_text)));
        }
        lines
    }

    fn form_lines(&self, title: &str) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let field = |label: &str, input: &TextInput, focused: bool| {
            let marker = if focused { theme.border_focused } else { theme.border };
            let mut spans = vec![Span::styled("│ ", marker)];
            spans.extend(input.line(INPUT_WIDTH).spans);
            vec![Line::from(label.to_string()), Line::from(spans), Line::default()]
        };

        let mut lines = vec![Line::from(Span::styled(title.to_string(), theme.title)), Line::default()];
        lines.extend(field("Email:", &self.email, self.focus == 0));
        lines.extend(field("Password:", &self.password, self.focus == 1));
        let button = if self.focus == 2 { theme.button_focused } else { theme.button };
        lines.push(Line::from(Span::styled(format!("[ {title} ]"), button)));
        lines
    }

    fn key_pane_lines(&self, login: bool) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let title = if login { LOGIN_KEY } else { REGISTER_KEY };
        let mut lines = vec![Line::from(Span::styled(title, theme.title)), Line::default()];

        match &self.identity_key {
            Some(key) => {
                let mut shown = normalize_public_key(key);
                if shown.chars().count() > KEY_PREVIEW_LEN {
                    shown = shown.chars().take(KEY_PREVIEW_LEN).collect::<String>() + "...";
                }
                let prompt = if login { "Login with this key? (y/n)" } else { "Register with this key? (y/n)" };
                lines.push(Line::from("Your SSH key:"));
                lines.push(Line::from(Span::styled(shown, theme.muted_text)));
                lines.push(Line::default());
                lines.push(Line::from(prompt));
            }
            None => {
                let hint = if login {
                    "Please connect with an SSH key or use email login."
                } else {
                    "Please connect with an SSH key or use email registration."
                };
                lines.push(Line::from(Span::styled("No SSH key detected.", theme.error_text)));
                lines.push(Line::from(hint));
            }
        }
        lines
    }
}

impl Screen for WelcomeScreen {
    fn update(&mut self, msg: Message) -> Vec<Command> {
        match msg {
            Message::Key(key) => self.handle_key(key),
            Message::AuthFailed(e) => {
                debug!("Auth failed in {:?}: {}", self.mode, e);
                self.error = Some(if self.mode == WelcomeMode::LoginKey {
                    "SSH key not registered. Please register first.".to_string()
                } else {
                    e.to_string()
                });
                Vec::new()
            }
            Message::Tick => {
                self.email.tick();
                self.password.tick();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let theme = Arc::clone(&self.theme);
        let mut lines = logo_lines(&theme);
        lines.push(Line::default());

        lines.extend(match self.mode {
            WelcomeMode::Menu => self.menu_lines(),
            WelcomeMode::Login => self.form_lines("Login"),
            WelcomeMode::Register => self.form_lines("Register"),
            WelcomeMode::LoginKey => self.key_pane_lines(true),
            WelcomeMode::RegisterKey => self.key_pane_lines(false),
        });

        if let Some(error) = &self.error {
            lines.push(Line::default());
            lines.push(error_line(&theme, error));
        }

        lines.push(Line::default());
        lines.push(help_line(
            &theme,
            if self.mode == WelcomeMode::Menu {
                "↑/↓: navigate • enter: select • q: quit"
            } else {
                "tab: next field • enter: submit • esc: back"
            },
        ));

        render_centered(frame, area, lines);
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::AuthError;
    use crate::core::memory::MemoryStore;
    use crate::tui::screens::testing::render_text;

    const KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIGx0ZXN0a2V5bWF0ZXJpYWxmb3J0ZXN0cw test@host";

    fn screen(key: Option<&str>) -> WelcomeScreen {
        WelcomeScreen::new(
            Arc::new(MemoryStore::new()),
            key.map(str::to_string),
            Arc::new(Theme::default()),
        )
    }

    fn press(s: &mut WelcomeScreen, key: Key) -> Vec<Command> {
        s.update(Message::Key(key))
    }

    fn type_str(s: &mut WelcomeScreen, text: &str) {
        for c in text.chars() {
            press(s, Key::Char(c));
        }
    }

    #[test]
    fn test_menu_items_depend_on_key() {
        assert_eq!(screen(None).menu_items(), &[LOGIN_EMAIL, REGISTER_EMAIL]);
        assert_eq!(screen(Some(KEY)).menu_items().len(), 4);
        assert_eq!(screen(Some(KEY)).menu_items()[0], LOGIN_KEY);
    }

    #[test]
    fn test_menu_navigation_is_clamped() {
        let mut s = screen(None);
        press(&mut s, Key::Up);
        assert_eq!(s.menu_index, 0);
        press(&mut s, Key::Char('j'));
        press(&mut s, Key::Down);
        assert_eq!(s.menu_index, 1);
        press(&mut s, Key::Enter);
        assert_eq!(s.mode(), WelcomeMode::Register);
        assert!(s.email.is_focused());
    }

    #[tokio::test]
    async fn test_q_quits_from_menu() {
        let mut s = screen(None);
        let cmds = press(&mut s, Key::Char('q'));
        assert_eq!(cmds.len(), 1);
        let msg = cmds.into_iter().next().unwrap().resolve().await;
        assert!(matches!(msg, Message::Quit));
    }

    #[test]
    fn test_form_validation_order() {
        let mut s = screen(None);
        press(&mut s, Key::Enter);
        assert_eq!(s.mode(), WelcomeMode::Login);

        s.set_focus(2);
        assert!(press(&mut s, Key::Enter).is_empty());
        assert_eq!(s.error(), Some("Email is required"));

        s.set_focus(0);
        type_str(&mut s, "  bard@example.com ");
        s.set_focus(2);
        press(&mut s, Key::Enter);
        assert_eq!(s.error(), Some("Password is required"));

        s.set_focus(1);
        type_str(&mut s, "lute");
        s.set_focus(2);
        press(&mut s, Key::Enter);
        assert_eq!(s.error(), Some("Password must be at least 6 characters"));
    }

    #[test]
    fn test_enter_advances_focus_and_tab_wraps() {
        let mut s = screen(None);
        press(&mut s, Key::Enter);
        press(&mut s, Key::Enter);
        assert_eq!(s.focus, 1);
        assert!(s.password.is_focused());
        press(&mut s, Key::Tab);
        press(&mut s, Key::Tab);
        assert_eq!(s.focus, 0);
        press(&mut s, Key::BackTab);
        assert_eq!(s.focus, 2);
    }

    #[test]
    fn test_any_key_clears_error_and_esc_resets_form() {
        let mut s = screen(None);
        press(&mut s, Key::Enter);
        type_str(&mut s, "who@where");
        s.set_focus(2);
        press(&mut s, Key::Enter);
        assert!(s.error().is_some());
        press(&mut s, Key::Esc);
        assert_eq!(s.error(), None);
        assert_eq!(s.mode(), WelcomeMode::Menu);
        assert_eq!(s.email.value(), "");
    }

    #[tokio::test]
    async fn test_register_submits_command_that_logs_in() {
        let mut s = screen(None);
        press(&mut s, Key::Down);
        press(&mut s, Key::Enter);
        type_str(&mut s, "cleric@example.com");
        press(&mut s, Key::Tab);
        type_str(&mut s, "sanctuary");
        press(&mut s, Key::Tab);
        let cmds = press(&mut s, Key::Enter);
        assert_eq!(cmds.len(), 1);
        match cmds.into_iter().next().unwrap().resolve().await {
            Message::LoggedIn(user) => assert_eq!(user.email.as_deref(), Some("cleric@example.com")),
            other => panic!("expected LoggedIn, got {other:?}"),
        }
    }

    #[test]
    fn test_key_login_failure_message() {
        let mut s = screen(Some(KEY));
        press(&mut s, Key::Enter);
        assert_eq!(s.mode(), WelcomeMode::LoginKey);
        s.update(Message::AuthFailed(AuthError::UserNotFound));
        assert_eq!(s.error(), Some("SSH key not registered. Please register first."));
    }

    #[test]
    fn test_email_login_failure_shows_error_text() {
        let mut s = screen(None);
        press(&mut s, Key::Enter);
        s.update(Message::AuthFailed(AuthError::InvalidCredentials));
        assert_eq!(s.error(), Some("invalid email or password"));
    }

    #[test]
    fn test_key_pane_back_to_menu() {
        let mut s = screen(Some(KEY));
        press(&mut s, Key::Up);
        for _ in 0..3 {
            press(&mut s, Key::Down);
        }
        press(&mut s, Key::Enter);
        assert_eq!(s.mode(), WelcomeMode::RegisterKey);
        press(&mut s, Key::Char('n'));
        assert_eq!(s.mode(), WelcomeMode::Menu);
    }

    #[test]
    fn test_render_menu_and_key_indicator() {
        let mut s = screen(Some(KEY));
        let text = render_text(&mut s, 90, 30);
        assert!(text.contains("Welcome, Adventurer!"));
        assert!(text.contains("> Login with SSH Key"));
        assert!(text.contains("✓ SSH Key detected"));
        assert!(text.contains("↑/↓: navigate • enter: select • q: quit"));
    }

    #[test]
    fn test_render_key_pane_truncates_key() {
        let mut s = screen(Some(KEY));
        press(&mut s, Key::Enter);
        let text = render_text(&mut s, 90, 30);
        assert!(text.contains("Your SSH key:"));
        assert!(text.contains("..."));
        assert!(!text.contains("test@host"));
        assert!(text.contains("Login with this key? (y/n)"));
    }

    #[test]
    fn test_render_form_masks_password() {
        let mut s = screen(None);
        press(&mut s, Key::Enter);
        press(&mut s, Key::Tab);
        type_str(&mut s, "secret1");
        let text = render_text(&mut s, 90, 30);
        assert!(text.contains("*******"));
        assert!(!text.contains("secret1"));
        assert!(text.contains("[ Login ]"));
    }
}
