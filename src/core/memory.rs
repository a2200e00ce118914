//! # In-Memory Store
//!
//! `MemoryStore` implements both [`CharacterStore`] and [`AuthService`] over
//! a single set of tables behind a tokio `RwLock`.
//!
//! When opened with a path, every mutation rewrites a JSON snapshot using an
//! atomic rename (`.tmp` then `rename()`), so a crash never leaves a
//! half-written file. Without a path it is purely in-memory (tests).

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::auth::{self, AuthError, AuthService};
use crate::core::model::{
    Action, Attack, Character, Currency, Details, Feature, FeatureSource, InventoryItem,
    MagicItem, NewAction, NewAttack, NewCharacter, NewFeature, NewInventoryItem, NewMagicItem,
    NewSpell, Spell, Spellcasting, User,
};
use crate::core::store::{CharacterStore, StoreError, StoreResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    characters: Vec<Character>,
    #[serde(default)]
    attacks: Vec<Attack>,
    #[serde(default)]
    actions: Vec<Action>,
    #[serde(default)]
    inventory: Vec<InventoryItem>,
    #[serde(default)]
    magic_items: Vec<MagicItem>,
    #[serde(default)]
    currency: Vec<Currency>,
    #[serde(default)]
    spellcasting: Vec<Spellcasting>,
    #[serde(default)]
    spells: Vec<Spell>,
    #[serde(default)]
    features: Vec<Feature>,
    #[serde(default)]
    details: Vec<Details>,
}

impl Tables {
    fn character_exists(&self, id: Uuid) -> StoreResult<()> {
        if self.characters.iter().any(|c| c.id == id) {
            Ok(())
        } else {
            Err(not_found("character", id))
        }
    }
}

fn not_found(entity: &'static str, id: Uuid) -> StoreError {
    StoreError::NotFound { entity, id }
}

/// Position of the row with `id`, or `NotFound`.
fn position<T>(rows: &[T], id: Uuid, entity: &'static str, key: impl Fn(&T) -> Uuid) -> StoreResult<usize> {
    rows.iter()
        .position(|r| key(r) == id)
        .ok_or_else(|| not_found(entity, id))
}

fn next_sort_order<T>(rows: &[T], character_id: Uuid, key: impl Fn(&T) -> (Uuid, i32)) -> i32 {
    rows.iter()
        .map(&key)
        .filter(|(cid, _)| *cid == character_id)
        .map(|(_, order)| order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> StoreResult<()> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store, never written to disk.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            path: None,
        }
    }

    /// Load the snapshot at `path` (if present) and persist changes back to it.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let tables = if path.exists() {
            let json = fs::read_to_string(&path)?;
            let tables: Tables = serde_json::from_str(&json)?;
            info!(
                "Loaded snapshot {} ({} users, {} characters)",
                path.display(),
                tables.users.len(),
                tables.characters.len()
            );
            tables
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            debug!("No snapshot at {}, starting empty", path.display());
            Tables::default()
        };
        Ok(Self {
            tables: RwLock::new(tables),
            path: Some(path),
        })
    }

    fn persist(&self, tables: &Tables) -> StoreResult<()> {
        match &self.path {
            Some(path) => atomic_write_json(path, tables),
            None => Ok(()),
        }
    }

    async fn read<T>(&self, f: impl FnOnce(&Tables) -> StoreResult<T> + Send) -> StoreResult<T> {
        let tables = self.tables.read().await;
        f(&*tables)
    }

    /// Apply `f` to a copy under the write lock and persist it. The copy
    /// replaces the live tables only once the snapshot is written.
    async fn mutate<T>(&self, f: impl FnOnce(&mut Tables) -> StoreResult<T> + Send) -> StoreResult<T> {
        let mut tables = self.tables.write().await;
        let mut next = tables.clone();
        let out = f(&mut next)?;
        if let Err(e) = self.persist(&next) {
            warn!("Snapshot write failed, change discarded: {}", e);
            return Err(e);
        }
        *tables = next;
        Ok(out)
    }
}

// ============================================================================
// CharacterStore
// ============================================================================

#[async_trait]
impl CharacterStore for MemoryStore {
    async fn list_characters(&self, user_id: Uuid) -> StoreResult<Vec<Character>> {
        self.read(|t| {
            let mut rows: Vec<Character> = t
                .characters
                .iter()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect();
            rows.sort_by_key(|c| c.created_at);
            Ok(rows)
        })
        .await
    }

    async fn get_character(&self, id: Uuid) -> StoreResult<Character> {
        self.read(|t| {
            t.characters
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or_else(|| not_found("character", id))
        })
        .await
    }

    async fn create_character(&self, new: NewCharacter) -> StoreResult<Character> {
        self.mutate(|t| {
            let now = Utc::now();
            let [strength, dexterity, constitution, intelligence, wisdom, charisma] = new.scores;
            let character = Character {
                id: Uuid::new_v4(),
                user_id: new.user_id,
                name: new.name,
                class: new.class,
                level: new.level,
                race: new.race,
                background: new.background,
                alignment: new.alignment,
                experience_points: 0,
                strength,
                dexterity,
                constitution,
                intelligence,
                wisdom,
                charisma,
                max_hit_points: new.max_hit_points,
                current_hit_points: new.max_hit_points,
                temporary_hit_points: 0,
                armor_class: new.armor_class,
                speed: new.speed,
                saving_throw_proficiencies: new.saving_throw_proficiencies,
                skill_proficiencies: new.skill_proficiencies,
                equipment: Vec::new(),
                features_traits: String::new(),
                notes: String::new(),
                created_at: now,
                updated_at: now,
            };
            t.characters.push(character.clone());
            Ok(character)
        })
        .await
    }

    async fn update_character(&self, character: Character) -> StoreResult<Character> {
        self.mutate(|t| {
            let idx = position(&t.characters, character.id, "character", |c| c.id)?;
            let mut updated = character;
            updated.created_at = t.characters[idx].created_at;
            updated.user_id = t.characters[idx].user_id;
            updated.updated_at = Utc::now();
            t.characters[idx] = updated.clone();
            Ok(updated)
        })
        .await
    }

    async fn delete_character(&self, id: Uuid) -> StoreResult<()> {
        self.mutate(|t| {
            let idx = position(&t.characters, id, "character", |c| c.id)?;
            t.characters.remove(idx);
            t.attacks.retain(|r| r.character_id != id);
            t.actions.retain(|r| r.character_id != id);
            t.inventory.retain(|r| r.character_id != id);
            t.magic_items.retain(|r| r.character_id != id);
            t.currency.retain(|r| r.character_id != id);
            t.spellcasting.retain(|r| r.character_id != id);
            t.spells.retain(|r| r.character_id != id);
            t.features.retain(|r| r.character_id != id);
            t.details.retain(|r| r.character_id != id);
            Ok(())
        })
        .await
    }

    // -- attacks --

    async fn list_attacks(&self, character_id: Uuid) -> StoreResult<Vec<Attack>> {
        self.read(|t| {
            let mut rows: Vec<Attack> = t.attacks.iter().filter(|r| r.character_id == character_id).cloned().collect();
            rows.sort_by_key(|r| r.sort_order);
            Ok(rows)
        })
        .await
    }

    async fn create_attack(&self, character_id: Uuid, new: NewAttack) -> StoreResult<Attack> {
        self.mutate(|t| {
            t.character_exists(character_id)?;
            let attack = Attack {
                id: Uuid::new_v4(),
                character_id,
                sort_order: next_sort_order(&t.attacks, character_id, |r| (r.character_id, r.sort_order)),
                name: new.name,
                attack_bonus: new.attack_bonus,
                damage: new.damage,
                damage_type: new.damage_type,
                range: new.range,
                properties: new.properties,
                notes: new.notes,
            };
            t.attacks.push(attack.clone());
            Ok(attack)
        })
        .await
    }

    async fn update_attack(&self, attack: Attack) -> StoreResult<Attack> {
        self.mutate(|t| {
            let idx = position(&t.attacks, attack.id, "attack", |r| r.id)?;
            t.attacks[idx] = attack.clone();
            Ok(attack)
        })
        .await
    }

    async fn delete_attack(&self, id: Uuid) -> StoreResult<()> {
        self.mutate(|t| {
            let idx = position(&t.attacks, id, "attack", |r| r.id)?;
            t.attacks.remove(idx);
            Ok(())
        })
        .await
    }

    // -- actions --

    async fn list_actions(&self, character_id: Uuid) -> StoreResult<Vec<Action>> {
        self.read(|t| {
            let mut rows: Vec<Action> = t.actions.iter().filter(|r| r.character_id == character_id).cloned().collect();
            rows.sort_by_key(|r| r.sort_order);
            Ok(rows)
        })
        .await
    }

    async fn create_action(&self, character_id: Uuid, new: NewAction) -> StoreResult<Action> {
        self.mutate(|t| {
            t.character_exists(character_id)?;
            let action = Action {
                id: Uuid::new_v4(),
                character_id,
                sort_order: next_sort_order(&t.actions, character_id, |r| (r.character_id, r.sort_order)),
                name: new.name,
                action_type: new.action_type,
                source: new.source,
                description: new.description,
                uses_max: new.uses_max,
                uses_current: new.uses_max,
                uses_per: new.uses_per,
            };
            t.actions.push(action.clone());
            Ok(action)
        })
        .await
    }

    async fn update_action(&self, action: Action) -> StoreResult<Action> {
        self.mutate(|t| {
            let idx = position(&t.actions, action.id, "action", |r| r.id)?;
            t.actions[idx] = action.clone();
            Ok(action)
        })
        .await
    }

    async fn delete_action(&self, id: Uuid) -> StoreResult<()> {
        self.mutate(|t| {
            let idx = position(&t.actions, id, "action", |r| r.id)?;
            t.actions.remove(idx);
            Ok(())
        })
        .await
    }

    // -- inventory --

    async fn list_inventory(&self, character_id: Uuid) -> StoreResult<Vec<InventoryItem>> {
        self.read(|t| {
            let mut rows: Vec<InventoryItem> =
                t.inventory.iter().filter(|r| r.character_id == character_id).cloned().collect();
            rows.sort_by_key(|r| r.sort_order);
            Ok(rows)
        })
        .await
    }

    async fn create_inventory_item(&self, character_id: Uuid, new: NewInventoryItem) -> StoreResult<InventoryItem> {
        self.mutate(|t| {
            t.character_exists(character_id)?;
            let item = InventoryItem {
                id: Uuid::new_v4(),
                character_id,
                sort_order: next_sort_order(&t.inventory, character_id, |r| (r.character_id, r.sort_order)),
                name: new.name,
                quantity: new.quantity,
                weight: new.weight,
                location: new.location,
                is_equipped: new.is_equipped,
                notes: new.notes,
            };
            t.inventory.push(item.clone());
            Ok(item)
        })
        .await
    }

    async fn update_inventory_item(&self, item: InventoryItem) -> StoreResult<InventoryItem> {
        self.mutate(|t| {
            let idx = position(&t.inventory, item.id, "inventory item", |r| r.id)?;
            t.inventory[idx] = item.clone();
            Ok(item)
        })
        .await
    }

    async fn delete_inventory_item(&self, id: Uuid) -> StoreResult<()> {
        self.mutate(|t| {
            let idx = position(&t.inventory, id, "inventory item", |r| r.id)?;
            t.inventory.remove(idx);
            Ok(())
        })
        .await
    }

    async fn toggle_equipped(&self, id: Uuid) -> StoreResult<InventoryItem> {
        self.mutate(|t| {
            let idx = position(&t.inventory, id, "inventory item", |r| r.id)?;
            t.inventory[idx].is_equipped = !t.inventory[idx].is_equipped;
            Ok(t.inventory[idx].clone())
        })
        .await
    }

    // -- magic items --

    async fn list_magic_items(&self, character_id: Uuid) -> StoreResult<Vec<MagicItem>> {
        self.read(|t| {
            let mut rows: Vec<MagicItem> =
                t.magic_items.iter().filter(|r| r.character_id == character_id).cloned().collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(rows)
        })
        .await
    }

    async fn create_magic_item(&self, character_id: Uuid, new: NewMagicItem) -> StoreResult<MagicItem> {
        self.mutate(|t| {
            t.character_exists(character_id)?;
            let item = MagicItem {
                id: Uuid::new_v4(),
                character_id,
                name: new.name,
                rarity: new.rarity,
                weight: new.weight,
                attunement_required: new.attunement_required,
                is_attuned: false,
                description: new.description,
            };
            t.magic_items.push(item.clone());
            Ok(item)
        })
        .await
    }

    async fn update_magic_item(&self, item: MagicItem) -> StoreResult<MagicItem> {
        self.mutate(|t| {
            let idx = position(&t.magic_items, item.id, "magic item", |r| r.id)?;
            t.magic_items[idx] = item.clone();
            Ok(item)
        })
        .await
    }

    async fn delete_magic_item(&self, id: Uuid) -> StoreResult<()> {
        self.mutate(|t| {
            let idx = position(&t.magic_items, id, "magic item", |r| r.id)?;
            t.magic_items.remove(idx);
            Ok(())
        })
        .await
    }

    async fn toggle_attuned(&self, id: Uuid) -> StoreResult<MagicItem> {
        self.mutate(|t| {
            let idx = position(&t.magic_items, id, "magic item", |r| r.id)?;
            t.magic_items[idx].is_attuned = !t.magic_items[idx].is_attuned;
            Ok(t.magic_items[idx].clone())
        })
        .await
    }

    // -- currency & spellcasting --

    async fn get_currency(&self, character_id: Uuid) -> StoreResult<Option<Currency>> {
        self.read(|t| Ok(t.currency.iter().find(|r| r.character_id == character_id).cloned()))
            .await
    }

    async fn update_currency(&self, currency: Currency) -> StoreResult<Currency> {
        self.mutate(|t| {
            t.character_exists(currency.character_id)?;
            match t.currency.iter_mut().find(|r| r.character_id == currency.character_id) {
                Some(row) => *row = currency.clone(),
                None => t.currency.push(currency.clone()),
            }
            Ok(currency)
        })
        .await
    }

    async fn get_spellcasting(&self, character_id: Uuid) -> StoreResult<Option<Spellcasting>> {
        self.read(|t| Ok(t.spellcasting.iter().find(|r| r.character_id == character_id).cloned()))
            .await
    }

    async fn update_spellcasting(&self, spellcasting: Spellcasting) -> StoreResult<Spellcasting> {
        self.mutate(|t| {
            t.character_exists(spellcasting.character_id)?;
            match t
                .spellcasting
                .iter_mut()
                .find(|r| r.character_id == spellcasting.character_id)
            {
                Some(row) => *row = spellcasting.clone(),
                None => t.spellcasting.push(spellcasting.clone()),
            }
            Ok(spellcasting)
        })
        .await
    }

    // -- spells --

    async fn list_spells(&self, character_id: Uuid, level: Option<i32>) -> StoreResult<Vec<Spell>> {
        self.read(|t| {
            let mut rows: Vec<Spell> = t
                .spells
                .iter()
                .filter(|r| r.character_id == character_id)
                .filter(|r| level.is_none_or(|l| r.level == l))
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.name.cmp(&b.name)));
            Ok(rows)
        })
        .await
    }

    async fn create_spell(&self, character_id: Uuid, new: NewSpell) -> StoreResult<Spell> {
        self.mutate(|t| {
            t.character_exists(character_id)?;
            let spell = Spell {
                id: Uuid::new_v4(),
                character_id,
                name: new.name,
                level: new.level.clamp(0, 9),
                school: new.school,
                is_prepared: new.is_prepared,
                is_ritual: new.is_ritual,
                casting_time: new.casting_time,
                range: new.range,
                components: new.components,
                duration: new.duration,
                source: new.source,
                description: new.description,
            };
            t.spells.push(spell.clone());
            Ok(spell)
        })
        .await
    }

    async fn update_spell(&self, spell: Spell) -> StoreResult<Spell> {
        self.mutate(|t| {
            let idx = position(&t.spells, spell.id, "spell", |r| r.id)?;
            t.spells[idx] = spell.clone();
            Ok(spell)
        })
        .await
    }

    async fn delete_spell(&self, id: Uuid) -> StoreResult<()> {
        self.mutate(|t| {
            let idx = position(&t.spells, id, "spell", |r| r.id)?;
            t.spells.remove(idx);
            Ok(())
        })
        .await
    }

    async fn toggle_prepared(&self, id: Uuid) -> StoreResult<Spell> {
        self.mutate(|t| {
            let idx = position(&t.spells, id, "spell", |r| r.id)?;
            t.spells[idx].is_prepared = !t.spells[idx].is_prepared;
            Ok(t.spells[idx].clone())
        })
        .await
    }

    // -- features --

    async fn list_features(&self, character_id: Uuid, source: Option<FeatureSource>) -> StoreResult<Vec<Feature>> {
        self.read(|t| {
            let mut rows: Vec<Feature> = t
                .features
                .iter()
                .filter(|r| r.character_id == character_id)
                .filter(|r| source.is_none() || r.source_type == source)
                .cloned()
                .collect();
            rows.sort_by(|a, b| {
                let rank = |f: &Feature| f.source_type.map_or(FeatureSource::ALL.len(), |s| s as usize);
                rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name))
            });
            Ok(rows)
        })
        .await
    }

    async fn create_feature(&self, character_id: Uuid, new: NewFeature) -> StoreResult<Feature> {
        self.mutate(|t| {
            t.character_exists(character_id)?;
            let feature = Feature {
                id: Uuid::new_v4(),
                character_id,
                name: new.name,
                source: new.source,
                source_type: new.source_type,
                description: new.description,
            };
            t.features.push(feature.clone());
            Ok(feature)
        })
        .await
    }

    async fn update_feature(&self, feature: Feature) -> StoreResult<Feature> {
        self.mutate(|t| {
            let idx = position(&t.features, feature.id, "feature", |r| r.id)?;
            t.features[idx] = feature.clone();
            Ok(feature)
        })
        .await
    }

    async fn delete_feature(&self, id: Uuid) -> StoreResult<()> {
        self.mutate(|t| {
            let idx = position(&t.features, id, "feature", |r| r.id)?;
            t.features.remove(idx);
            Ok(())
        })
        .await
    }

    // -- details --

    async fn get_details(&self, character_id: Uuid) -> StoreResult<Option<Details>> {
        self.read(|t| Ok(t.details.iter().find(|r| r.character_id == character_id).cloned()))
            .await
    }

    async fn create_details(&self, character_id: Uuid) -> StoreResult<Details> {
        self.mutate(|t| {
            t.character_exists(character_id)?;
            if let Some(existing) = t.details.iter().find(|r| r.character_id == character_id) {
                return Ok(existing.clone());
            }
            let details = Details {
                character_id,
                ..Details::default()
            };
            t.details.push(details.clone());
            Ok(details)
        })
        .await
    }

    async fn update_details(&self, details: Details) -> StoreResult<Details> {
        self.mutate(|t| {
            let character_id = details.character_id;
            let idx = position(&t.details, character_id, "details", |r| r.character_id)?;
            t.details[idx] = details.clone();
            Ok(details)
        })
        .await
    }
}

// ============================================================================
// AuthService
// ============================================================================

#[async_trait]
impl AuthService for MemoryStore {
    async fn register_with_email(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = auth::normalize_email(email);
        let password_hash = auth::hash_password(password);
        let user = self
            .mutate(|t| {
                if t.users.iter().any(|u| u.email.as_deref() == Some(email.as_str())) {
                    return Ok(None);
                }
                let user = User {
                    id: Uuid::new_v4(),
                    email: Some(email),
                    password_hash: Some(password_hash),
                    public_key: None,
                    created_at: Utc::now(),
                };
                t.users.push(user.clone());
                Ok(Some(user))
            })
            .await?;
        user.ok_or(AuthError::EmailTaken)
    }

    async fn login_with_email(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = auth::normalize_email(email);
        let user = self
            .read(|t| Ok(t.users.iter().find(|u| u.email.as_deref() == Some(email.as_str())).cloned()))
            .await?
            .ok_or(AuthError::UserNotFound)?;
        match &user.password_hash {
            Some(stored) if auth::verify_password(password, stored) => Ok(user),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn register_with_public_key(&self, key: &str) -> Result<User, AuthError> {
        let key = auth::normalize_public_key(key);
        let user = self
            .mutate(|t| {
                if t.users.iter().any(|u| u.public_key.as_deref() == Some(key.as_str())) {
                    return Ok(None);
                }
                let user = User {
                    id: Uuid::new_v4(),
                    email: None,
                    password_hash: None,
                    public_key: Some(key),
                    created_at: Utc::now(),
                };
                t.users.push(user.clone());
                Ok(Some(user))
            })
            .await?;
        user.ok_or(AuthError::KeyTaken)
    }

    async fn login_with_public_key(&self, key: &str) -> Result<User, AuthError> {
        let key = auth::normalize_public_key(key);
        self.read(|t| Ok(t.users.iter().find(|u| u.public_key.as_deref() == Some(key.as_str())).cloned()))
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::NewCharacter;

    fn sample_character(user_id: Uuid) -> NewCharacter {
        NewCharacter::level_one(
            user_id,
            "Mira",
            "Elf",
            "Wizard",
            "Sage",
            "Neutral Good",
            [8, 14, 13, 15, 12, 10],
            vec!["Arcana".into(), "History".into()],
        )
    }

    #[tokio::test]
    async fn test_create_and_list_characters_by_owner() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.create_character(sample_character(alice)).await.unwrap();
        store.create_character(sample_character(bob)).await.unwrap();

        let mine = store.list_characters(alice).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].current_hit_points, mine[0].max_hit_points);
    }

    #[tokio::test]
    async fn test_update_hit_points_keeps_other_fields() {
        let store = MemoryStore::new();
        let c = store.create_character(sample_character(Uuid::new_v4())).await.unwrap();
        let updated = store.update_hit_points(c.id, 3, 5).await.unwrap();
        assert_eq!(updated.current_hit_points, 3);
        assert_eq!(updated.temporary_hit_points, 5);
        assert_eq!(updated.name, c.name);
        assert!(updated.updated_at >= c.updated_at);
    }

    #[tokio::test]
    async fn test_delete_character_cascades() {
        let store = MemoryStore::new();
        let c = store.create_character(sample_character(Uuid::new_v4())).await.unwrap();
        store
            .create_attack(c.id, NewAttack { name: "Dagger".into(), ..NewAttack::default() })
            .await
            .unwrap();
        store.create_details(c.id).await.unwrap();
        store.delete_character(c.id).await.unwrap();

        assert!(store.list_attacks(c.id).await.unwrap().is_empty());
        assert_eq!(store.get_details(c.id).await.unwrap(), None);
        assert!(matches!(
            store.get_character(c.id).await,
            Err(StoreError::NotFound { entity: "character", .. })
        ));
    }

    #[tokio::test]
    async fn test_new_action_starts_with_full_uses() {
        let store = MemoryStore::new();
        let c = store.create_character(sample_character(Uuid::new_v4())).await.unwrap();
        let action = store
            .create_action(
                c.id,
                NewAction {
                    name: "Second Wind".into(),
                    uses_max: Some(1),
                    uses_per: Some("short rest".into()),
                    ..NewAction::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(action.uses_current, Some(1));
    }

    #[tokio::test]
    async fn test_list_spells_filters_by_level_and_sorts() {
        let store = MemoryStore::new();
        let c = store.create_character(sample_character(Uuid::new_v4())).await.unwrap();
        for (name, level) in [("Shield", 1), ("Fire Bolt", 0), ("Magic Missile", 1)] {
            store
                .create_spell(c.id, NewSpell { name: name.into(), level, ..NewSpell::default() })
                .await
                .unwrap();
        }
        let all = store.list_spells(c.id, None).await.unwrap();
        let names: Vec<_> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Fire Bolt", "Magic Missile", "Shield"]);

        let first = store.list_spells(c.id, Some(1)).await.unwrap();
        assert_eq!(first.len(), 2);

        let toggled = store.toggle_prepared(first[0].id).await.unwrap();
        assert!(toggled.is_prepared);
    }

    #[tokio::test]
    async fn test_list_features_filters_by_source() {
        let store = MemoryStore::new();
        let c = store.create_character(sample_character(Uuid::new_v4())).await.unwrap();
        store
            .create_feature(c.id, NewFeature {
                name: "Darkvision".into(),
                source_type: Some(FeatureSource::Race),
                ..NewFeature::default()
            })
            .await
            .unwrap();
        store
            .create_feature(c.id, NewFeature {
                name: "Arcane Recovery".into(),
                source_type: Some(FeatureSource::Class),
                ..NewFeature::default()
            })
            .await
            .unwrap();

        let race = store.list_features(c.id, Some(FeatureSource::Race)).await.unwrap();
        assert_eq!(race.len(), 1);
        assert_eq!(race[0].name, "Darkvision");
        let all = store.list_features(c.id, None).await.unwrap();
        assert_eq!(all[0].name, "Arcane Recovery");
    }

    #[tokio::test]
    async fn test_create_details_is_idempotent() {
        let store = MemoryStore::new();
        let c = store.create_character(sample_character(Uuid::new_v4())).await.unwrap();
        let mut details = store.create_details(c.id).await.unwrap();
        details.eyes = Some("Green".into());
        store.update_details(details).await.unwrap();
        let again = store.create_details(c.id).await.unwrap();
        assert_eq!(again.eyes.as_deref(), Some("Green"));
    }

    #[tokio::test]
    async fn test_email_auth() {
        let store = MemoryStore::new();
        let user = store.register_with_email("Ann@Example.com ", "secret1").await.unwrap();
        assert_eq!(user.email.as_deref(), Some("ann@example.com"));

        assert_eq!(
            store.register_with_email("ann@example.com", "other1").await,
            Err(AuthError::EmailTaken)
        );
        assert_eq!(
            store.login_with_email("ann@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            store.login_with_email("nobody@example.com", "secret1").await,
            Err(AuthError::UserNotFound)
        );
        let logged_in = store.login_with_email("ann@example.com", "secret1").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_public_key_auth() {
        let store = MemoryStore::new();
        let key = "ssh-ed25519 AAAAkey laptop";
        assert_eq!(store.login_with_public_key(key).await, Err(AuthError::UserNotFound));
        let user = store.register_with_public_key(key).await.unwrap();
        assert_eq!(store.register_with_public_key("ssh-ed25519 AAAAkey").await, Err(AuthError::KeyTaken));
        assert_eq!(store.login_with_public_key("ssh-ed25519 AAAAkey desktop").await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("charsheet.json");

        let user_id = {
            let store = MemoryStore::open(&path).unwrap();
            let user = store.register_with_email("a@b.co", "secret1").await.unwrap();
            store.create_character(sample_character(user.id)).await.unwrap();
            user.id
        };

        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.list_characters(user_id).await.unwrap().len(), 1);
        assert!(reopened.login_with_email("a@b.co", "secret1").await.is_ok());
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_leaves_tables_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let store = MemoryStore::open(data_dir.join("charsheet.json")).unwrap();
        let user = store.register_with_email("a@b.co", "secret1").await.unwrap();
        let character = store.create_character(sample_character(user.id)).await.unwrap();

        std::fs::remove_dir_all(&data_dir).unwrap();
        let result = store
            .create_attack(
                character.id,
                NewAttack {
                    name: "Longsword".to_string(),
                    attack_bonus: Some(5),
                    damage: Some("1d8+3".to_string()),
                    damage_type: Some("slashing".to_string()),
                    range: None,
                    properties: None,
                    notes: None,
                },
            )
            .await;

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(store.list_attacks(character.id).await.unwrap().is_empty());
    }
}
