use std::sync::Arc;

use charsheet::core::auth::AuthService;
use charsheet::core::memory::MemoryStore;
use charsheet::core::model::NewCharacter;
use charsheet::core::store::CharacterStore;
use charsheet::tui::app::Controller;
use charsheet::tui::event::Key;
use charsheet::tui::message::{Command, Message};
use charsheet::tui::screens::{ScreenKind, ScreenState, Services};
use charsheet::tui::theme::Theme;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use tokio_test::assert_ok;

// ============================================================================
// Helper Functions
// ============================================================================

fn services(store: &Arc<MemoryStore>) -> Services {
    Services {
        store: Arc::clone(store) as Arc<dyn CharacterStore>,
        auth: Arc::clone(store) as Arc<dyn AuthService>,
        theme: Arc::new(Theme::default()),
    }
}

/// Resolve immediate commands round by round, feeding results back in.
async fn drive(controller: &mut Controller, mut commands: Vec<Command>) {
    while !commands.is_empty() {
        let mut next = Vec::new();
        for cmd in commands {
            if cmd.delay().is_some() {
                continue;
            }
            let msg = cmd.resolve().await;
            next.extend(controller.handle(msg));
        }
        commands = next;
    }
}

async fn press(controller: &mut Controller, key: Key) {
    let commands = controller.handle(Message::Key(key));
    drive(controller, commands).await;
}

async fn type_str(controller: &mut Controller, text: &str) {
    for c in text.chars() {
        press(controller, Key::Char(c)).await;
    }
}

fn screen_text(controller: &mut Controller) -> String {
    let (width, height) = controller.size();
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|f| controller.render(f)).unwrap();
    terminal
        .backend()
        .buffer()
        .content()
        .chunks(usize::from(width))
        .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Flows
// ============================================================================

#[tokio::test]
async fn test_register_lands_on_empty_home() {
    let store = Arc::new(MemoryStore::new());
    let (mut controller, startup) = Controller::new(services(&store), None, 100, 40);
    assert!(startup.is_empty());
    assert_eq!(controller.kind(), ScreenKind::Welcome);

    // Menu without a key: Login with Email, Register with Email
    press(&mut controller, Key::Down).await;
    press(&mut controller, Key::Enter).await;
    type_str(&mut controller, "wizard@example.com").await;
    press(&mut controller, Key::Tab).await;
    type_str(&mut controller, "fireball").await;
    press(&mut controller, Key::Tab).await;

    let commands = controller.handle(Message::Key(Key::Enter));
    assert_eq!(commands.len(), 1);
    let logged_in = commands.into_iter().next().unwrap().resolve().await;
    assert!(matches!(logged_in, Message::LoggedIn(_)));

    let load = controller.handle(logged_in);
    assert_eq!(controller.kind(), ScreenKind::Home);
    assert_eq!(load.len(), 1);
    assert_eq!(load[0].label(), "load characters");
    drive(&mut controller, load).await;

    match controller.screen() {
        ScreenState::Home(home) => {
            assert!(home.characters().is_empty());
            assert_eq!(home.selected(), home.characters().len());
        }
        _ => panic!("expected Home"),
    }
    let text = screen_text(&mut controller);
    assert!(text.contains("Logged in as: wizard@example.com"));
    assert!(text.contains("> + Create New Character"));
}

#[tokio::test]
async fn test_damage_on_sheet_round_trips_through_store() {
    let store = Arc::new(MemoryStore::new());
    let user = assert_ok!(store.register_with_email("fighter@example.com", "longsword").await);
    let character = assert_ok!(
        store
            .create_character(NewCharacter::level_one(
                user.id,
                "Aria",
                "Human",
                "Fighter",
                "Soldier",
                "Lawful Good",
                [16, 14, 13, 12, 10, 8],
                vec!["Athletics".to_string()],
            ))
            .await
    );
    let max = character.max_hit_points;

    let (mut controller, _) = Controller::new(services(&store), None, 100, 40);
    let commands = controller.handle(Message::LoggedIn(user));
    drive(&mut controller, commands).await;

    // Character row is first; Enter opens its sheet
    press(&mut controller, Key::Enter).await;
    assert_eq!(controller.kind(), ScreenKind::Sheet);

    press(&mut controller, Key::Tab).await;
    press(&mut controller, Key::Char('-')).await;
    type_str(&mut controller, "3").await;
    press(&mut controller, Key::Enter).await;

    let stored = assert_ok!(store.get_character(character.id).await);
    assert_eq!(stored.current_hit_points, max - 3);
    match controller.screen() {
        ScreenState::Sheet(sheet) => assert_eq!(sheet.character().current_hit_points, max - 3),
        _ => panic!("expected Sheet"),
    }

    press(&mut controller, Key::Esc).await;
    assert_eq!(controller.kind(), ScreenKind::Home);
    assert!(!controller.should_quit());
    press(&mut controller, Key::Char('q')).await;
    assert!(controller.should_quit());
}
