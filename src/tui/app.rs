//! # Controller
//!
//! Owns the session (current user, identity key) and the one active
//! [`ScreenState`]. Every event passes through [`Controller::handle`]:
//! cross-screen transitions are decided here, everything else is forwarded
//! to the active screen untouched.
//!
//! ```text
//!   Message ──► handle() ──► transition?  ──► new ScreenState + init()
//!                        └─► forward      ──► screen.update()
//!                                              │
//!                                      Vec<Command> ──► run loop
//! ```
//!
//! Resize is applied uniformly here and never routed through a screen's
//! key handling. Results tagged for a character other than the open sheet
//! are dropped.

use std::sync::Arc;

use log::{debug, info, warn};
use ratatui::Frame;

use crate::core::model::User;
use crate::tui::event::Key;
use crate::tui::message::{Command, Message};
use crate::tui::screens::{
    CreateScreen, HomeScreen, Screen, ScreenKind, ScreenState, Services, SheetScreen,
    WelcomeScreen,
};

pub struct Controller {
    services: Services,
    identity_key: Option<String>,
    user: Option<User>,
    screen: ScreenState,
    width: u16,
    height: u16,
    quit: bool,
}

impl Controller {
    /// Start at Welcome. With an identity key, also return the silent login
    /// command; success lands on Home, failure stays on Welcome.
    pub fn new(
        services: Services,
        identity_key: Option<String>,
        width: u16,
        height: u16,
    ) -> (Self, Vec<Command>) {
        let mut welcome = WelcomeScreen::new(
            Arc::clone(&services.auth),
            identity_key.clone(),
            Arc::clone(&services.theme),
        );
        welcome.resize(width, height);

        let mut commands = Vec::new();
        if let Some(key) = identity_key.clone() {
            let auth = Arc::clone(&services.auth);
            commands.push(Command::new("identity key login", async move {
                match auth.login_with_public_key(&key).await {
                    Ok(user) => Message::LoggedIn(user),
                    Err(e) => Message::KeyLoginFailed(e),
                }
            }));
        }

        let controller = Self {
            services,
            identity_key,
            user: None,
            screen: ScreenState::Welcome(welcome),
            width,
            height,
            quit: false,
        };
        (controller, commands)
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn screen(&self) -> &ScreenState {
        &self.screen
    }

    pub fn kind(&self) -> ScreenKind {
        self.screen.kind()
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        self.screen.screen_mut().render(frame, area);
    }

    pub fn handle(&mut self, msg: Message) -> Vec<Command> {
        let commands = self.transition(msg);
        for cmd in &commands {
            debug!("Command issued: {}", cmd.label());
        }
        commands
    }

    fn transition(&mut self, msg: Message) -> Vec<Command> {
        match msg {
            Message::Quit | Message::Key(Key::Ctrl('c')) => {
                info!("Quit requested from {:?}", self.kind());
                self.quit = true;
                Vec::new()
            }
            Message::Resize { width, height } => {
                self.width = width;
                self.height = height;
                self.screen.screen_mut().resize(width, height);
                Vec::new()
            }
            Message::LoggedIn(user) => {
                info!("Logged in as {}", user.id);
                self.user = Some(user);
                self.go_home()
            }
            Message::KeyLoginFailed(e) => {
                info!("Identity key login failed, staying on welcome: {}", e);
                Vec::new()
            }
            Message::Logout => {
                if let Some(user) = self.user.take() {
                    info!("Logged out {}", user.id);
                }
                let welcome = WelcomeScreen::new(
                    Arc::clone(&self.services.auth),
                    self.identity_key.clone(),
                    Arc::clone(&self.services.theme),
                );
                self.enter(ScreenState::Welcome(welcome))
            }
            Message::NavigateToCreate => match self.user.clone() {
                Some(user) => {
                    let create = CreateScreen::new(
                        Arc::clone(&self.services.store),
                        user,
                        Arc::clone(&self.services.theme),
                    );
                    self.enter(ScreenState::Create(create))
                }
                None => {
                    warn!("Create requested without a logged-in user");
                    Vec::new()
                }
            },
            Message::CharacterSelected(character) | Message::CharacterCreated(character) => {
                debug!("Opening sheet for {} ({})", character.name, character.id);
                let sheet = SheetScreen::new(
                    Arc::clone(&self.services.store),
                    character,
                    Arc::clone(&self.services.theme),
                );
                self.enter(ScreenState::Sheet(Box::new(sheet)))
            }
            Message::CharacterDeleted(id) => {
                debug!("Character {} deleted, reloading list", id);
                self.go_home()
            }
            Message::NavigateBack => self.go_home(),
            Message::CharacterUpdated(character) => match &mut self.screen {
                ScreenState::Sheet(sheet) if sheet.character_id() == character.id => {
                    sheet.update(Message::CharacterUpdated(character))
                }
                _ => {
                    debug!("Dropping update for {}: no open sheet", character.id);
                    Vec::new()
                }
            },
            Message::Sheet { character_id, update } => match &mut self.screen {
                ScreenState::Sheet(sheet) if sheet.character_id() == character_id => {
                    sheet.update(Message::Sheet { character_id, update })
                }
                _ => {
                    debug!("Discarding stale result for {}: {:?}", character_id, update);
                    Vec::new()
                }
            },
            other => self.screen.screen_mut().update(other),
        }
    }

    fn go_home(&mut self) -> Vec<Command> {
        let Some(user) = self.user.clone() else {
            warn!("Home requested without a logged-in user");
            return Vec::new();
        };
        let home = HomeScreen::new(
            Arc::clone(&self.services.store),
            user,
            Arc::clone(&self.services.theme),
        );
        self.enter(ScreenState::Home(home))
    }

    /// Replace the active screen, size it, and run its `init`.
    fn enter(&mut self, state: ScreenState) -> Vec<Command> {
        debug!("Screen {:?} -> {:?}", self.kind(), state.kind());
        self.screen = state;
        let screen = self.screen.screen_mut();
        screen.resize(self.width, self.height);
        screen.init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::AuthService;
    use crate::core::store::CharacterStore;
    use crate::test_support::{KEY, drive, seeded, services};
    use crate::tui::message::{SheetUpdate, Status};
    use uuid::Uuid;

    fn controller(fixture_services: Services, key: Option<&str>) -> (Controller, Vec<Command>) {
        Controller::new(fixture_services, key.map(str::to_string), 100, 40)
    }

    #[tokio::test]
    async fn test_starts_on_welcome_without_key() {
        let fixture = seeded().await;
        let (c, cmds) = controller(services(&fixture.store), None);
        assert_eq!(c.kind(), ScreenKind::Welcome);
        assert!(cmds.is_empty());
        assert!(c.user().is_none());
    }

    #[tokio::test]
    async fn test_registered_key_logs_in_silently() {
        let fixture = seeded().await;
        fixture.store.register_with_public_key(KEY).await.unwrap();
        let (mut c, cmds) = controller(services(&fixture.store), Some(KEY));
        drive(&mut c, cmds).await;
        assert_eq!(c.kind(), ScreenKind::Home);
        match c.screen() {
            ScreenState::Home(home) => assert!(home.characters().is_empty()),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_unknown_key_falls_back_to_welcome_without_error() {
        let fixture = seeded().await;
        let (mut c, cmds) = controller(services(&fixture.store), Some(KEY));
        drive(&mut c, cmds).await;
        assert_eq!(c.kind(), ScreenKind::Welcome);
        match c.screen() {
            ScreenState::Welcome(w) => assert_eq!(w.error(), None),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_email_failure_shows_while_key_login_pending() {
        let fixture = seeded().await;
        let (mut c, startup) = controller(services(&fixture.store), Some(KEY));

        // Menu with a key: Login with SSH Key, Login with Email, ...
        c.handle(Message::Key(Key::Down));
        c.handle(Message::Key(Key::Enter));
        for ch in "fighter@example.com".chars() {
            c.handle(Message::Key(Key::Char(ch)));
        }
        c.handle(Message::Key(Key::Tab));
        for ch in "wrongpass".chars() {
            c.handle(Message::Key(Key::Char(ch)));
        }
        c.handle(Message::Key(Key::Tab));
        let submit = c.handle(Message::Key(Key::Enter));
        assert_eq!(submit.len(), 1);
        drive(&mut c, submit).await;

        let shown = match c.screen() {
            ScreenState::Welcome(w) => w.error().map(str::to_string),
            _ => unreachable!(),
        };
        assert_eq!(shown.as_deref(), Some("invalid email or password"));

        drive(&mut c, startup).await;
        assert_eq!(c.kind(), ScreenKind::Welcome);
        match c.screen() {
            ScreenState::Welcome(w) => assert_eq!(w.error(), shown.as_deref()),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_login_loads_characters() {
        let fixture = seeded().await;
        let (mut c, _) = controller(services(&fixture.store), None);
        let cmds = c.handle(Message::LoggedIn(fixture.user.clone()));
        assert_eq!(c.kind(), ScreenKind::Home);
        assert_eq!(cmds.len(), 1);
        drive(&mut c, cmds).await;
        match c.screen() {
            ScreenState::Home(home) => assert_eq!(home.characters().len(), 1),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_resize_reaches_every_screen() {
        let fixture = seeded().await;
        let (mut c, _) = controller(services(&fixture.store), None);
        c.handle(Message::Resize { width: 120, height: 50 });
        assert_eq!(c.size(), (120, 50));
        c.handle(Message::LoggedIn(fixture.user.clone()));
        c.handle(Message::Resize { width: 90, height: 30 });
        assert_eq!(c.size(), (90, 30));
        assert_eq!(c.kind(), ScreenKind::Home);
    }

    #[tokio::test]
    async fn test_select_then_back_returns_home() {
        let fixture = seeded().await;
        let (mut c, _) = controller(services(&fixture.store), None);
        c.handle(Message::LoggedIn(fixture.user.clone()));
        let cmds = c.handle(Message::CharacterSelected(fixture.character.clone()));
        assert_eq!(c.kind(), ScreenKind::Sheet);
        assert!(!cmds.is_empty());
        drive(&mut c, cmds).await;

        let cmds = c.handle(Message::Key(Key::Esc));
        drive(&mut c, cmds).await;
        assert_eq!(c.kind(), ScreenKind::Home);
    }

    #[tokio::test]
    async fn test_create_requires_user() {
        let fixture = seeded().await;
        let (mut c, _) = controller(services(&fixture.store), None);
        assert!(c.handle(Message::NavigateToCreate).is_empty());
        assert_eq!(c.kind(), ScreenKind::Welcome);

        c.handle(Message::LoggedIn(fixture.user.clone()));
        c.handle(Message::NavigateToCreate);
        assert_eq!(c.kind(), ScreenKind::Create);
        c.handle(Message::NavigateBack);
        assert_eq!(c.kind(), ScreenKind::Home);
    }

    #[tokio::test]
    async fn test_stale_sheet_result_is_discarded() {
        let fixture = seeded().await;
        let (mut c, _) = controller(services(&fixture.store), None);
        c.handle(Message::LoggedIn(fixture.user.clone()));
        c.handle(Message::CharacterSelected(fixture.character.clone()));

        let cmds = c.handle(Message::Sheet {
            character_id: Uuid::new_v4(),
            update: SheetUpdate::Status(Status::error("from another sheet")),
        });
        assert!(cmds.is_empty());
        match c.screen() {
            ScreenState::Sheet(sheet) => assert_eq!(sheet.status(), None),
            _ => unreachable!(),
        }

        let cmds = c.handle(Message::Sheet {
            character_id: fixture.character.id,
            update: SheetUpdate::Status(Status::ok("kept")),
        });
        assert_eq!(cmds.len(), 1);
        match c.screen() {
            ScreenState::Sheet(sheet) => {
                assert_eq!(sheet.status().map(|s| s.text.as_str()), Some("kept"))
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_delete_reloads_home_and_logout_returns_to_welcome() {
        let fixture = seeded().await;
        let (mut c, _) = controller(services(&fixture.store), None);
        c.handle(Message::LoggedIn(fixture.user.clone()));
        fixture.store.delete_character(fixture.character.id).await.unwrap();

        let cmds = c.handle(Message::CharacterDeleted(fixture.character.id));
        drive(&mut c, cmds).await;
        match c.screen() {
            ScreenState::Home(home) => assert!(home.characters().is_empty()),
            _ => unreachable!(),
        }

        c.handle(Message::Logout);
        assert_eq!(c.kind(), ScreenKind::Welcome);
        assert!(c.user().is_none());
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_anywhere() {
        let fixture = seeded().await;
        let (mut c, _) = controller(services(&fixture.store), None);
        c.handle(Message::LoggedIn(fixture.user.clone()));
        c.handle(Message::CharacterSelected(fixture.character.clone()));
        assert!(!c.should_quit());
        c.handle(Message::Key(Key::Ctrl('c')));
        assert!(c.should_quit());
    }
}
