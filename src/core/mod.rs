//! # Core Domain
//!
//! Everything the character sheet knows that isn't about the terminal.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • model (records)      │
//!                    │  • rules / dice         │
//!                    │  • store / auth traits  │
//!                    │                         │
//!                    │  No UI.                 │
//!                    └───────────┬─────────────┘
//!                                │ Arc<dyn CharacterStore>
//!                                │ Arc<dyn AuthService>
//!                                ▼
//!                         ┌────────────┐
//!                         │    TUI     │
//!                         │  Adapter   │
//!                         │ (ratatui)  │
//!                         └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`model`]: Users, characters and their sub-entities
//! - [`rules`]: Reference tables and derived-stat formulas
//! - [`dice`]: Ability-score generation and d20 rolls
//! - [`store`]: The `CharacterStore` trait and `StoreError`
//! - [`auth`]: The `AuthService` trait, hashing, key normalization
//! - [`memory`]: `MemoryStore`, implementing both traits
//! - [`config`]: Config file, env and CLI resolution

pub mod auth;
pub mod config;
pub mod dice;
pub mod memory;
pub mod model;
pub mod rules;
pub mod store;
