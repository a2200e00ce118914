//! # Messages & Commands
//!
//! The controller is a pure `Message -> Vec<Command>` transition. A
//! [`Command`] is a deferred side effect (a boxed future) that resolves to
//! exactly one follow-up [`Message`], which the run loop feeds back in.
//!
//! ```text
//!   key ──► Message ──► Controller::handle ──► Vec<Command>
//!              ▲                                    │ tokio::spawn
//!              └────────── mpsc ◄── Message ◄───────┘
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::core::auth::AuthError;
use crate::core::model::{
    Action, Attack, Character, Currency, Details, Feature, InventoryItem, MagicItem, Spell,
    Spellcasting, User,
};
use crate::core::store::StoreError;
use crate::tui::event::Key;

/// Transient status line shown on the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

impl Status {
    pub fn ok(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: true }
    }
}

/// Everything that can happen to the application.
#[derive(Debug, Clone)]
pub enum Message {
    Key(Key),
    Resize { width: u16, height: u16 },
    /// Idle heartbeat from the run loop (cursor blink).
    Tick,
    Quit,

    LoggedIn(User),
    AuthFailed(AuthError),
    /// The start-up identity key login failed; never shown to the user.
    KeyLoginFailed(AuthError),
    Logout,

    CharactersLoaded(Result<Vec<Character>, StoreError>),
    NavigateToCreate,
    NavigateBack,
    CharacterSelected(Character),
    CharacterCreated(Character),
    CharacterUpdated(Character),
    CharacterDeleted(Uuid),
    /// Inline error for the active non-sheet screen.
    Failed(String),

    /// Result of a sheet-scoped command, tagged with the character it was
    /// issued for.
    Sheet { character_id: Uuid, update: SheetUpdate },
}

#[derive(Debug, Clone)]
pub enum SheetUpdate {
    Attacks(Result<Vec<Attack>, StoreError>),
    Actions(Result<Vec<Action>, StoreError>),
    Inventory(Result<Vec<InventoryItem>, StoreError>),
    MagicItems(Result<Vec<MagicItem>, StoreError>),
    Currency(Result<Option<Currency>, StoreError>),
    Spellcasting(Result<Option<Spellcasting>, StoreError>),
    Spells(Result<Vec<Spell>, StoreError>),
    Features(Result<Vec<Feature>, StoreError>),
    Details(Result<Option<Details>, StoreError>),

    /// A character-level save (HP, notes, features text, background) failed.
    SaveFailed(String),
    /// A sub-entity mutation finished; show `status`, then reload `refresh`.
    Mutated { status: Status, refresh: Refresh },
    BackgroundSaved(Result<(Details, Character), String>),

    Status(Status),
    ClearStatus,
}

/// Which sheet collection to re-query after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Attacks,
    Actions,
    Inventory,
    MagicItems,
    Currency,
    Spellcasting,
    Spells,
    Features,
}

/// A deferred side effect producing one follow-up message.
pub struct Command {
    label: String,
    delay: Option<Duration>,
    future: BoxFuture<'static, Message>,
}

impl Command {
    pub fn new<F>(label: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = Message> + Send + 'static,
    {
        Self {
            label: label.into(),
            delay: None,
            future: Box::pin(future),
        }
    }

    /// A command that yields `msg` on the next loop iteration.
    pub fn message(msg: Message) -> Self {
        Self::new("message", async move { msg })
    }

    /// A command that yields `msg` after `delay`.
    pub fn after(delay: Duration, msg: Message) -> Self {
        Self {
            label: "timer".to_string(),
            delay: Some(delay),
            future: Box::pin(async move { msg }),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// Wait out the delay (if any) and produce the message.
    pub async fn run(self) -> Message {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.future.await
    }

    /// Produce the message immediately, ignoring any delay.
    pub async fn resolve(self) -> Message {
        self.future.await
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("label", &self.label)
            .field("delay", &self.delay)
            .finish()
    }
}
