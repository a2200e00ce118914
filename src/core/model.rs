//! # Domain Records
//!
//! Plain serde records for users, characters and the per-character
//! sub-entities (attacks, actions, inventory, spells, features, details).
//!
//! `New*` structs carry the caller-supplied fields for creation; the store
//! assigns ids, ordering and timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::rules::{self, Ability};

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    /// Salted SHA-256 of the password, `salt$hexdigest`.
    #[serde(default)]
    pub password_hash: Option<String>,
    pub public_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Characters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub class: String,
    pub level: i32,
    pub race: String,
    pub background: Option<String>,
    pub alignment: Option<String>,
    pub experience_points: i32,

    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,

    pub max_hit_points: i32,
    pub current_hit_points: i32,
    pub temporary_hit_points: i32,
    pub armor_class: i32,
    pub speed: i32,

    pub saving_throw_proficiencies: Vec<String>,
    pub skill_proficiencies: Vec<String>,
    pub equipment: Vec<String>,
    pub features_traits: String,
    pub notes: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Character {
    pub fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        rules::ability_modifier(self.score(ability))
    }

    pub fn proficiency_bonus(&self) -> i32 {
        rules::proficiency_bonus(self.level)
    }

    pub fn has_save_proficiency(&self, ability: Ability) -> bool {
        self.saving_throw_proficiencies
            .iter()
            .any(|s| s.eq_ignore_ascii_case(ability.name()))
    }

    pub fn has_skill_proficiency(&self, skill: &str) -> bool {
        self.skill_proficiencies
            .iter()
            .any(|s| s.eq_ignore_ascii_case(skill))
    }

    pub fn saving_throw(&self, ability: Ability) -> i32 {
        rules::saving_throw(
            self.score(ability),
            self.level,
            self.has_save_proficiency(ability),
        )
    }

    pub fn skill_bonus(&self, skill: &rules::Skill) -> i32 {
        rules::skill_bonus(
            self.score(skill.ability),
            self.level,
            self.has_skill_proficiency(skill.name),
        )
    }

    pub fn initiative(&self) -> i32 {
        rules::initiative(self.dexterity)
    }

    pub fn passive_perception(&self) -> i32 {
        rules::passive_perception(self.wisdom, self.level, self.has_skill_proficiency("Perception"))
    }

    /// Hit dice text, e.g. `3d10`.
    pub fn hit_dice(&self) -> String {
        format!("{}d{}", self.level, rules::hit_die(&self.class))
    }
}

/// Fields for a new character. `level_one` fills in the derived values.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCharacter {
    pub user_id: Uuid,
    pub name: String,
    pub class: String,
    pub level: i32,
    pub race: String,
    pub background: Option<String>,
    pub alignment: Option<String>,
    pub scores: [i32; 6],
    pub max_hit_points: i32,
    pub armor_class: i32,
    pub speed: i32,
    pub saving_throw_proficiencies: Vec<String>,
    pub skill_proficiencies: Vec<String>,
}

impl NewCharacter {
    /// A level-one character: racial speed, class saves, max-die HP + CON,
    /// unarmored AC 10. Blank background/alignment get the defaults.
    #[allow(clippy::too_many_arguments)]
    pub fn level_one(
        user_id: Uuid,
        name: &str,
        race: &str,
        class: &str,
        background: &str,
        alignment: &str,
        scores: [i32; 6],
        skills: Vec<String>,
    ) -> Self {
        let saves = rules::class_info(class)
            .map(|c| c.saving_throws.iter().map(|a| a.name().to_string()).collect())
            .unwrap_or_default();
        let con = scores[Ability::Constitution.index()];
        let background = if background.trim().is_empty() { "Acolyte" } else { background };
        let alignment = if alignment.trim().is_empty() { "Lawful Good" } else { alignment };

        Self {
            user_id,
            name: name.trim().to_string(),
            class: class.to_string(),
            level: 1,
            race: race.to_string(),
            background: Some(background.to_string()),
            alignment: Some(alignment.to_string()),
            scores,
            max_hit_points: (rules::hit_die(class) + rules::ability_modifier(con)).max(1),
            armor_class: 10,
            speed: rules::race_speed(race),
            saving_throw_proficiencies: saves,
            skill_proficiencies: skills,
        }
    }
}

// ============================================================================
// Combat
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attack {
    pub id: Uuid,
    pub character_id: Uuid,
    pub sort_order: i32,
    pub name: String,
    pub attack_bonus: Option<i32>,
    pub damage: Option<String>,
    pub damage_type: Option<String>,
    pub range: Option<String>,
    pub properties: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAttack {
    pub name: String,
    pub attack_bonus: Option<i32>,
    pub damage: Option<String>,
    pub damage_type: Option<String>,
    pub range: Option<String>,
    pub properties: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,
    pub character_id: Uuid,
    pub sort_order: i32,
    pub name: String,
    pub action_type: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
    pub uses_max: Option<i32>,
    pub uses_current: Option<i32>,
    pub uses_per: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAction {
    pub name: String,
    pub action_type: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
    pub uses_max: Option<i32>,
    pub uses_per: Option<String>,
}

// ============================================================================
// Inventory
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub character_id: Uuid,
    pub sort_order: i32,
    pub name: String,
    pub quantity: i32,
    pub weight: Option<f64>,
    pub location: Option<String>,
    pub is_equipped: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewInventoryItem {
    pub name: String,
    pub quantity: i32,
    pub weight: Option<f64>,
    pub location: Option<String>,
    pub is_equipped: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagicItem {
    pub id: Uuid,
    pub character_id: Uuid,
    pub name: String,
    pub rarity: Option<String>,
    pub weight: Option<f64>,
    pub attunement_required: bool,
    pub is_attuned: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMagicItem {
    pub name: String,
    pub rarity: Option<String>,
    pub weight: Option<f64>,
    pub attunement_required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub character_id: Uuid,
    pub copper: i32,
    pub silver: i32,
    pub electrum: i32,
    pub gold: i32,
    pub platinum: i32,
}

// ============================================================================
// Spells
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlot {
    pub max: i32,
    pub used: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spellcasting {
    pub character_id: Uuid,
    pub spellcasting_class: Option<String>,
    pub spellcasting_ability: Option<String>,
    pub spell_save_dc: Option<i32>,
    pub spell_attack_bonus: Option<i32>,
    /// Slots for spell levels 1 through 9.
    pub slots: [SpellSlot; 9],
}

impl Spellcasting {
    pub fn has_slots(&self) -> bool {
        self.slots.iter().any(|s| s.max > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    pub id: Uuid,
    pub character_id: Uuid,
    pub name: String,
    /// 0 for cantrips.
    pub level: i32,
    pub school: Option<String>,
    pub is_prepared: bool,
    pub is_ritual: bool,
    pub casting_time: Option<String>,
    pub range: Option<String>,
    pub components: Option<String>,
    pub duration: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSpell {
    pub name: String,
    pub level: i32,
    pub school: Option<String>,
    pub is_prepared: bool,
    pub is_ritual: bool,
    pub casting_time: Option<String>,
    pub range: Option<String>,
    pub components: Option<String>,
    pub duration: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
}

// ============================================================================
// Features
// ============================================================================

/// Where a feature comes from; also the feature-tab filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSource {
    Class,
    Race,
    Background,
    Feat,
}

impl FeatureSource {
    pub const ALL: [FeatureSource; 4] = [
        FeatureSource::Class,
        FeatureSource::Race,
        FeatureSource::Background,
        FeatureSource::Feat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureSource::Class => "class",
            FeatureSource::Race => "race",
            FeatureSource::Background => "background",
            FeatureSource::Feat => "feat",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeatureSource::Class => "Class",
            FeatureSource::Race => "Race",
            FeatureSource::Background => "Background",
            FeatureSource::Feat => "Feat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        FeatureSource::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: Uuid,
    pub character_id: Uuid,
    pub name: String,
    pub source: Option<String>,
    pub source_type: Option<FeatureSource>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewFeature {
    pub name: String,
    pub source: Option<String>,
    pub source_type: Option<FeatureSource>,
    pub description: Option<String>,
}

// ============================================================================
// Details
// ============================================================================

/// Descriptive background text for a character. Zero or one per character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Details {
    pub character_id: Uuid,
    pub age: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub eyes: Option<String>,
    pub skin: Option<String>,
    pub hair: Option<String>,
    pub size: Option<String>,
    pub gender: Option<String>,
    pub faith: Option<String>,
    pub personality_traits: Option<String>,
    pub ideals: Option<String>,
    pub bonds: Option<String>,
    pub flaws: Option<String>,
    pub backstory: Option<String>,
    pub allies: Option<String>,
}

/// `None` for blank input, otherwise the trimmed text.
pub fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
