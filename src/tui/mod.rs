//! # TUI Adapter
//!
//! The ratatui-specific layer. Owns the terminal, translates crossterm
//! events into [`Message`]s, feeds them to the [`Controller`], and runs the
//! [`Command`]s it returns on tokio.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! Frames are drawn only when something changed: an input event, a command
//! result, or a `Tick`. Ticks are emitted every 500ms while the user is idle
//! and only drive cursor blink in text inputs. Command results are picked up
//! between short input polls so they land promptly.

pub mod app;
pub mod component;
pub mod components;
pub mod event;
pub mod message;
pub mod screens;
pub mod theme;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::auth::AuthService;
use crate::core::config::ResolvedConfig;
use crate::core::memory::MemoryStore;
use crate::core::store::CharacterStore;
use crate::tui::app::Controller;
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};
use crate::tui::message::{Command, Message};
use crate::tui::screens::Services;
use crate::tui::theme::Theme;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const TICK_INTERVAL: Duration = Duration::from_millis(500);

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Release/repeat reports are filtered out in event::translate
        execute!(
            stdout(),
            Hide,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (hidden cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags, Show);
    }
}

fn to_message(event: TuiEvent) -> Message {
    match event {
        TuiEvent::Key(key) => Message::Key(key),
        TuiEvent::Resize(width, height) => Message::Resize { width, height },
    }
}

/// Run each command on tokio; its message comes back over `tx`.
fn spawn_commands(commands: Vec<Command>, tx: &mpsc::Sender<Message>) {
    for cmd in commands {
        debug!("Spawning command: {}", cmd.label());
        let tx = tx.clone();
        tokio::spawn(async move {
            let msg = cmd.run().await;
            // Receiver is gone once the loop has exited
            let _ = tx.send(msg);
        });
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let store = MemoryStore::open(&config.data_file)
        .map_err(|e| std::io::Error::other(format!("{}: {}", config.data_file.display(), e)))?;
    let store = Arc::new(store);
    let services = Services {
        store: Arc::clone(&store) as Arc<dyn CharacterStore>,
        auth: store as Arc<dyn AuthService>,
        theme: Arc::new(Theme::from_config(&config.theme)),
    };

    let mut terminal = ratatui::init();
    let terminal_mode_guard = TerminalModeGuard::new();
    if let Err(e) = &terminal_mode_guard {
        warn!("Could not enable terminal modes: {}", e);
    }

    let result = event_loop(&mut terminal, services, config.identity_key.clone());

    drop(terminal_mode_guard);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    services: Services,
    identity_key: Option<String>,
) -> std::io::Result<()> {
    let size = terminal.size()?;
    let (mut controller, startup) = Controller::new(services, identity_key, size.width, size.height);

    // Channel for messages from finished commands
    let (tx, rx) = mpsc::channel();
    spawn_commands(startup, &tx);

    let mut needs_redraw = true; // Force first frame
    let mut last_tick = Instant::now();

    loop {
        if needs_redraw {
            terminal.draw(|f| controller.render(f))?;
            needs_redraw = false;
        }

        let first_event = poll_event_timeout(POLL_INTERVAL)?;
        let mut commands = Vec::new();

        // Process first event + drain everything pending before the next draw
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(|| poll_event_immediate().ok().flatten()))
        {
            needs_redraw = true;
            last_tick = Instant::now();
            commands.extend(controller.handle(to_message(event)));
        }

        if last_tick.elapsed() >= TICK_INTERVAL {
            last_tick = Instant::now();
            needs_redraw = true;
            commands.extend(controller.handle(Message::Tick));
        }

        while let Ok(msg) = rx.try_recv() {
            needs_redraw = true;
            commands.extend(controller.handle(msg));
        }

        if controller.should_quit() {
            info!("Shutting down");
            return Ok(());
        }

        spawn_commands(commands, &tx);
    }
}
