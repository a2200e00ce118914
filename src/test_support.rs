//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;

use crate::core::auth::AuthService;
use crate::core::memory::MemoryStore;
use crate::core::model::{Character, NewCharacter, User};
use crate::core::store::CharacterStore;
use crate::tui::app::Controller;
use crate::tui::message::Command;
use crate::tui::screens::Services;
use crate::tui::theme::Theme;

/// A well-formed ed25519 public key, comment included.
pub const KEY: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIGx0ZXN0a2V5bWF0ZXJpYWxmb3J0ZXN0cw test@host";

/// Upper bound on command rounds in [`drive`], so a feedback loop fails fast.
const MAX_ROUNDS: usize = 32;

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub user: User,
    pub character: Character,
}

/// An in-memory store holding one email user who owns one fighter.
pub async fn seeded() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let user = store
        .register_with_email("fighter@example.com", "longsword")
        .await
        .unwrap();
    let character = store
        .create_character(NewCharacter::level_one(
            user.id,
            "Aria",
            "Human",
            "Fighter",
            "Soldier",
            "Lawful Good",
            [16, 14, 13, 12, 10, 8],
            vec!["Athletics".to_string(), "Perception".to_string()],
        ))
        .await
        .unwrap();
    Fixture { store, user, character }
}

/// The store doubles as the auth service.
pub fn services(store: &Arc<MemoryStore>) -> Services {
    Services {
        store: Arc::clone(store) as Arc<dyn CharacterStore>,
        auth: Arc::clone(store) as Arc<dyn AuthService>,
        theme: Arc::new(Theme::default()),
    }
}

/// Resolve commands and feed their messages back until nothing immediate is
/// left. Delayed commands (status timers) are skipped.
pub async fn drive(controller: &mut Controller, mut commands: Vec<Command>) {
    for _ in 0..MAX_ROUNDS {
        if commands.is_empty() {
            return;
        }
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
    panic!("commands still pending after {MAX_ROUNDS} rounds");
}
