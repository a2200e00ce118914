//! # TUI Components
//!
//! Reusable building blocks the screens are assembled from.
//!
//! ## Component Architecture
//!
//! ### Stateless helpers (props-based rendering)
//!
//! - `widgets`: centering, fixed-width cells, slot trackers, label rows
//!
//! ### Stateful components (event-driven)
//!
//! Each implements [`Component`](crate::tui::component::Component) and
//! [`EventHandler`](crate::tui::component::EventHandler), returning its own
//! intent type to the owning screen:
//!
//! - `ScrollableTable<T>`: cursor + viewport over typed rows
//! - `ModalForm`: overlay of typed fields with save / cancel
//! - `TextInput`: single-line input (masked and numeric variants)
//! - `TextArea`: multi-line editor with wrapping
//!
//! ## Co-location of Concerns
//!
//! Each component file contains its state, intent type, rendering, key
//! handling and tests. Read one file to understand one component.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs         (this file)
//! ├── widgets.rs     (layout + text helpers)
//! ├── table.rs       (ScrollableTable)
//! ├── modal.rs       (ModalForm, Field)
//! ├── text_input.rs  (TextInput)
//! └── text_area/     (TextArea, cursor + wrapping)
//! ```

pub mod modal;
pub mod table;
pub mod text_area;
pub mod text_input;
pub mod widgets;

pub use modal::{Field, FieldKind, ModalEvent, ModalForm};
pub use table::{ScrollableTable, TableColumn, TableEvent, TableRow};
pub use text_area::{TextArea, TextAreaEvent};
pub use text_input::{TextInput, TextInputEvent};
