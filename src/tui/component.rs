use ratatui::Frame;
use ratatui::layout::Rect;

use crate::tui::event::Key;

/// A reusable UI component.
///
/// Components hold their own presentation state (cursor, viewport, focus)
/// and render into a `Frame` within a given `Rect`.
///
/// # Mutability
///
/// `render` takes `&mut self` so a component can update caches (wrap
/// widths, scroll offsets) during the render pass, in the spirit of
/// ratatui's `StatefulWidget`.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that handles key presses.
///
/// Intents are returned directly to the owning screen rather than routed
/// through the controller, so the screen reacts in the same update.
pub trait EventHandler {
    /// The type of high-level event this component emits.
    type Event;

    /// Handle a key and optionally return a high-level event.
    fn handle_event(&mut self, key: Key) -> Option<Self::Event>;
}
