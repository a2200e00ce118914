//! # Character Store
//!
//! The persistence seam. Screens only ever talk to `dyn CharacterStore`;
//! [`MemoryStore`](crate::core::memory::MemoryStore) is the bundled
//! implementation.
//!
//! ```text
//! character ─┬─ attacks / actions          (many, ordered)
//!            ├─ inventory / magic items     (many)
//!            ├─ spells / features           (many, filterable)
//!            └─ currency / spellcasting / details   (zero or one)
//! ```

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::model::{
    Action, Attack, Character, Currency, Details, Feature, FeatureSource, InventoryItem,
    MagicItem, NewAction, NewAttack, NewCharacter, NewFeature, NewInventoryItem, NewMagicItem,
    NewSpell, Spell, Spellcasting,
};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound { entity: &'static str, id: Uuid },
    Io(String),
    Serialize(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { entity, id } => write!(f, "{} {} not found", entity, id),
            StoreError::Io(e) => write!(f, "storage I/O error: {}", e),
            StoreError::Serialize(e) => write!(f, "storage encoding error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialize(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Trait
// ============================================================================

#[async_trait]
pub trait CharacterStore: Send + Sync {
    // -- characters --

    /// Characters owned by `user_id`, oldest first.
    async fn list_characters(&self, user_id: Uuid) -> StoreResult<Vec<Character>>;
    async fn get_character(&self, id: Uuid) -> StoreResult<Character>;
    async fn create_character(&self, new: NewCharacter) -> StoreResult<Character>;
    /// Replace every mutable field; bumps `updated_at`.
    async fn update_character(&self, character: Character) -> StoreResult<Character>;
    /// Removes the character and everything hanging off it.
    async fn delete_character(&self, id: Uuid) -> StoreResult<()>;

    async fn update_hit_points(&self, id: Uuid, current: i32, temporary: i32) -> StoreResult<Character> {
        let mut character = self.get_character(id).await?;
        character.current_hit_points = current;
        character.temporary_hit_points = temporary;
        self.update_character(character).await
    }

    async fn update_notes(&self, id: Uuid, features_traits: String, notes: String) -> StoreResult<Character> {
        let mut character = self.get_character(id).await?;
        character.features_traits = features_traits;
        character.notes = notes;
        self.update_character(character).await
    }

    async fn update_alignment(&self, id: Uuid, alignment: String) -> StoreResult<Character> {
        let mut character = self.get_character(id).await?;
        character.alignment = Some(alignment);
        self.update_character(character).await
    }

    // -- attacks & actions --

    async fn list_attacks(&self, character_id: Uuid) -> StoreResult<Vec<Attack>>;
    async fn create_attack(&self, character_id: Uuid, new: NewAttack) -> StoreResult<Attack>;
    async fn update_attack(&self, attack: Attack) -> StoreResult<Attack>;
    async fn delete_attack(&self, id: Uuid) -> StoreResult<()>;

    async fn list_actions(&self, character_id: Uuid) -> StoreResult<Vec<Action>>;
    /// New actions start with `uses_current == uses_max`.
    async fn create_action(&self, character_id: Uuid, new: NewAction) -> StoreResult<Action>;
    async fn update_action(&self, action: Action) -> StoreResult<Action>;
    async fn delete_action(&self, id: Uuid) -> StoreResult<()>;

    // -- inventory --

    async fn list_inventory(&self, character_id: Uuid) -> StoreResult<Vec<InventoryItem>>;
    async fn create_inventory_item(&self, character_id: Uuid, new: NewInventoryItem) -> StoreResult<InventoryItem>;
    async fn update_inventory_item(&self, item: InventoryItem) -> StoreResult<InventoryItem>;
    async fn delete_inventory_item(&self, id: Uuid) -> StoreResult<()>;
    async fn toggle_equipped(&self, id: Uuid) -> StoreResult<InventoryItem>;

    async fn list_magic_items(&self, character_id: Uuid) -> StoreResult<Vec<MagicItem>>;
    async fn create_magic_item(&self, character_id: Uuid, new: NewMagicItem) -> StoreResult<MagicItem>;
    async fn update_magic_item(&self, item: MagicItem) -> StoreResult<MagicItem>;
    async fn delete_magic_item(&self, id: Uuid) -> StoreResult<()>;
    async fn toggle_attuned(&self, id: Uuid) -> StoreResult<MagicItem>;

    async fn get_currency(&self, character_id: Uuid) -> StoreResult<Option<Currency>>;
    /// Upsert.
    async fn update_currency(&self, currency: Currency) -> StoreResult<Currency>;

    // -- spells --

    async fn get_spellcasting(&self, character_id: Uuid) -> StoreResult<Option<Spellcasting>>;
    /// Upsert.
    async fn update_spellcasting(&self, spellcasting: Spellcasting) -> StoreResult<Spellcasting>;

    /// Spells by level then name; `level` narrows to one spell level.
    async fn list_spells(&self, character_id: Uuid, level: Option<i32>) -> StoreResult<Vec<Spell>>;
    async fn create_spell(&self, character_id: Uuid, new: NewSpell) -> StoreResult<Spell>;
    async fn update_spell(&self, spell: Spell) -> StoreResult<Spell>;
    async fn delete_spell(&self, id: Uuid) -> StoreResult<()>;
    async fn toggle_prepared(&self, id: Uuid) -> StoreResult<Spell>;

    // -- features --

    async fn list_features(&self, character_id: Uuid, source: Option<FeatureSource>) -> StoreResult<Vec<Feature>>;
    async fn create_feature(&self, character_id: Uuid, new: NewFeature) -> StoreResult<Feature>;
    async fn update_feature(&self, feature: Feature) -> StoreResult<Feature>;
    async fn delete_feature(&self, id: Uuid) -> StoreResult<()>;

    // -- details --

    async fn get_details(&self, character_id: Uuid) -> StoreResult<Option<Details>>;
    /// Creates an empty details record; returns the existing one if present.
    async fn create_details(&self, character_id: Uuid) -> StoreResult<Details>;
    async fn update_details(&self, details: Details) -> StoreResult<Details>;
}
