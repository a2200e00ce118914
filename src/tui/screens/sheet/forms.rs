//! Modal field lists for every sheet form, the parsing of their string
//! values back into records, and the commands that persist them.
//!
//! Forms open empty when adding and prefilled when editing an existing
//! row. Blank text becomes `None`, numbers accept a leading `+`, and
//! unparseable numbers count as absent.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use uuid::Uuid;

use crate::core::model::{
    Action, Attack, Character, Currency, Details, Feature, FeatureSource, InventoryItem,
    MagicItem, NewAction, NewAttack, NewFeature, NewInventoryItem, NewMagicItem, NewSpell, Spell,
    Spellcasting, non_blank,
};
use crate::core::rules::{self, Ability};
use crate::core::store::{CharacterStore, StoreResult};
use crate::tui::components::{Field, ModalForm};
use crate::tui::message::{Command, Message, Refresh, SheetUpdate, Status};
use crate::tui::screens::sheet::data::sheet_command;
use crate::tui::theme::Theme;

pub type Values = HashMap<String, String>;

const SIZES: [&str; 6] = ["Tiny", "Small", "Medium", "Large", "Huge", "Gargantuan"];

const DAMAGE_TYPES: [&str; 13] = [
    "Slashing", "Piercing", "Bludgeoning", "Fire", "Cold", "Lightning", "Acid", "Poison",
    "Necrotic", "Radiant", "Force", "Psychic", "Thunder",
];

const ACTION_TYPES: [&str; 6] = ["action", "bonus action", "reaction", "free", "movement", "other"];

const RECHARGE: [&str; 5] = ["", "short rest", "long rest", "dawn", "dusk"];

const SPELL_LEVELS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

const SCHOOLS: [&str; 8] = [
    "Abjuration", "Conjuration", "Divination", "Enchantment", "Evocation", "Illusion",
    "Necromancy", "Transmutation",
];

const RARITIES: [&str; 6] = ["Common", "Uncommon", "Rare", "Very Rare", "Legendary", "Artifact"];

// ============================================================================
// Value parsing
// ============================================================================

fn get<'a>(values: &'a Values, key: &str) -> &'a str {
    values.get(key).map(String::as_str).unwrap_or("")
}

fn opt(values: &Values, key: &str) -> Option<String> {
    non_blank(get(values, key))
}

fn flag(values: &Values, key: &str) -> bool {
    get(values, key) == "true"
}

/// Integer with an optional leading `+`.
pub fn parse_int(s: &str) -> Option<i32> {
    let s = s.trim();
    s.strip_prefix('+').unwrap_or(s).parse().ok()
}

fn int(values: &Values, key: &str) -> Option<i32> {
    parse_int(get(values, key))
}

fn float(values: &Values, key: &str) -> Option<f64> {
    get(values, key).trim().parse().ok()
}

fn show(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn show_num<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ============================================================================
// Background
// ============================================================================

pub fn background_form(details: Option<&Details>, alignment: Option<&str>, theme: &Arc<Theme>) -> ModalForm {
    let d = details.cloned().unwrap_or_default();
    let text = |key: &str, label: &str, value: &Option<String>, placeholder: &str| {
        Field::text(key, label).value(show(value)).placeholder(placeholder)
    };
    ModalForm::new(
        "Edit Background",
        vec![
            Field::select("size", "Size", &SIZES).value(d.size.as_deref().unwrap_or("Medium")),
            Field::select("alignment", "Alignment", rules::ALIGNMENTS).value(alignment.unwrap_or("")),
            text("gender", "Gender", &d.gender, "Gender"),
            text("height", "Height", &d.height, "5'10\""),
            text("weight", "Weight", &d.weight, "180 lbs"),
            text("age", "Age", &d.age, "25"),
            text("faith", "Faith/Deity", &d.faith, "Deity or faith"),
            text("hair", "Hair", &d.hair, "Hair color/style"),
            text("eyes", "Eyes", &d.eyes, "Eye color"),
            text("skin", "Skin", &d.skin, "Skin tone"),
            text("traits", "Personality", &d.personality_traits, "Personality traits"),
            text("ideals", "Ideals", &d.ideals, "Ideals"),
            text("bonds", "Bonds", &d.bonds, "Bonds"),
            text("flaws", "Flaws", &d.flaws, "Flaws"),
            text("backstory", "Backstory", &d.backstory, "Character backstory"),
            text("allies", "Allies", &d.allies, "Allies & organizations"),
        ],
        Arc::clone(theme),
    )
}

pub fn details_from_values(base: Details, values: &Values) -> Details {
    Details {
        age: opt(values, "age"),
        height: opt(values, "height"),
        weight: opt(values, "weight"),
        eyes: opt(values, "eyes"),
        skin: opt(values, "skin"),
        hair: opt(values, "hair"),
        size: opt(values, "size"),
        gender: opt(values, "gender"),
        faith: opt(values, "faith"),
        personality_traits: opt(values, "traits"),
        ideals: opt(values, "ideals"),
        bonds: opt(values, "bonds"),
        flaws: opt(values, "flaws"),
        backstory: opt(values, "backstory"),
        allies: opt(values, "allies"),
        ..base
    }
}

async fn persist_background(
    store: Arc<dyn CharacterStore>,
    character: Character,
    existing: Option<Details>,
    values: Values,
) -> Result<(Details, Character), String> {
    let id = character.id;
    let base = match existing {
        Some(details) => details,
        None => store
            .create_details(id)
            .await
            .map_err(|e| format!("Error creating details: {e}"))?,
    };
    let details = store
        .update_details(details_from_values(base, &values))
        .await
        .map_err(|e| format!("Error saving: {e}"))?;

    let character = match opt(&values, "alignment") {
        Some(alignment) => store
            .update_alignment(id, alignment)
            .await
            .map_err(|e| format!("Error saving alignment: {e}"))?,
        None => character,
    };
    Ok((details, character))
}

/// Create the details record if missing, write it, then the alignment.
pub fn save_background(
    store: &Arc<dyn CharacterStore>,
    character: &Character,
    existing: Option<Details>,
    values: Values,
) -> Command {
    let fut = persist_background(Arc::clone(store), character.clone(), existing, values);
    sheet_command("save background", character.id, async move {
        SheetUpdate::BackgroundSaved(fut.await)
    })
}

// ============================================================================
// Character-level saves
// ============================================================================

/// Persist current HP; success arrives as `CharacterUpdated`.
pub fn save_hit_points(store: &Arc<dyn CharacterStore>, character: &Character, current: i32) -> Command {
    let store = Arc::clone(store);
    let (id, temporary) = (character.id, character.temporary_hit_points);
    Command::new("update hit points", async move {
        match store.update_hit_points(id, current, temporary).await {
            Ok(updated) => Message::CharacterUpdated(updated),
            Err(e) => {
                log::warn!("Failed to update HP for {}: {}", id, e);
                Message::Sheet {
                    character_id: id,
                    update: SheetUpdate::SaveFailed("Failed to update HP".to_string()),
                }
            }
        }
    })
}

/// Persist the two free-text fields; `failure` is the status on error.
pub fn save_notes(
    store: &Arc<dyn CharacterStore>,
    character_id: Uuid,
    features_traits: String,
    notes: String,
    failure: &'static str,
) -> Command {
    let store = Arc::clone(store);
    Command::new("update notes", async move {
        match store.update_notes(character_id, features_traits, notes).await {
            Ok(updated) => Message::CharacterUpdated(updated),
            Err(e) => {
                log::warn!("{} for {}: {}", failure, character_id, e);
                Message::Sheet { character_id, update: SheetUpdate::SaveFailed(failure.to_string()) }
            }
        }
    })
}

/// A sub-entity write: `ok` builds the status from the result, and
/// `refresh` names the collection to re-query afterwards.
pub fn mutation<T, F>(
    label: &str,
    character_id: Uuid,
    future: F,
    refresh: Refresh,
    ok: impl FnOnce(T) -> String + Send + 'static,
    failure: &'static str,
) -> Command
where
    T: Send + 'static,
    F: Future<Output = StoreResult<T>> + Send + 'static,
{
    sheet_command(label, character_id, async move {
        match future.await {
            Ok(value) => SheetUpdate::Mutated { status: Status::ok(ok(value)), refresh },
            Err(e) => SheetUpdate::Status(Status::error(format!("{failure}: {e}"))),
        }
    })
}

// ============================================================================
// Attacks & actions
// ============================================================================

pub fn attack_form(existing: Option<&Attack>, theme: &Arc<Theme>) -> ModalForm {
    let title = if existing.is_some() { "Edit Attack" } else { "Add Attack" };
    let mut fields = vec![
        Field::text("name", "Weapon Name").required().placeholder("Longsword"),
        Field::number("attack_bonus", "Attack Bonus").placeholder("+5"),
        Field::text("damage", "Damage").placeholder("1d8+3"),
        Field::select("damage_type", "Damage Type", &DAMAGE_TYPES),
        Field::text("range", "Range").placeholder("5 ft or 20/60 ft"),
        Field::text("properties", "Properties").placeholder("Versatile, Finesse"),
        Field::text("notes", "Notes").placeholder("Additional notes"),
    ];
    if let Some(a) = existing {
        let values = [
            a.name.clone(),
            a.attack_bonus.map(rules::format_modifier).unwrap_or_default(),
            show(&a.damage),
            show(&a.damage_type),
            show(&a.range),
            show(&a.properties),
            show(&a.notes),
        ];
        prefill(&mut fields, values);
    }
    ModalForm::new(title, fields, Arc::clone(theme))
}

pub fn new_attack(values: &Values) -> NewAttack {
    NewAttack {
        name: get(values, "name").trim().to_string(),
        attack_bonus: int(values, "attack_bonus"),
        damage: opt(values, "damage"),
        damage_type: opt(values, "damage_type"),
        range: opt(values, "range"),
        properties: opt(values, "properties"),
        notes: opt(values, "notes"),
    }
}

pub fn edited_attack(attack: Attack, values: &Values) -> Attack {
    let n = new_attack(values);
    Attack {
        name: n.name,
        attack_bonus: n.attack_bonus,
        damage: n.damage,
        damage_type: n.damage_type,
        range: n.range,
        properties: n.properties,
        notes: n.notes,
        ..attack
    }
}

pub fn action_form(existing: Option<&Action>, theme: &Arc<Theme>) -> ModalForm {
    let title = if existing.is_some() { "Edit Action" } else { "Add Action" };
    let mut fields = vec![
        Field::text("name", "Action Name").required().placeholder("Second Wind"),
        Field::select("action_type", "Type", &ACTION_TYPES),
        Field::text("source", "Source").placeholder("Fighter 1"),
        Field::number("uses_max", "Max Uses").placeholder("1"),
        Field::select("uses_per", "Recharge", &RECHARGE),
        Field::text("description", "Description").placeholder("Regain 1d10 + level HP"),
    ];
    if let Some(a) = existing {
        let values = [
            a.name.clone(),
            a.action_type.clone().unwrap_or_else(|| "action".to_string()),
            show(&a.source),
            show_num(a.uses_max),
            show(&a.uses_per),
            show(&a.description),
        ];
        prefill(&mut fields, values);
    }
    ModalForm::new(title, fields, Arc::clone(theme))
}

pub fn new_action(values: &Values) -> NewAction {
    NewAction {
        name: get(values, "name").trim().to_string(),
        action_type: opt(values, "action_type"),
        source: opt(values, "source"),
        description: opt(values, "description"),
        uses_max: int(values, "uses_max"),
        uses_per: opt(values, "uses_per"),
    }
}

/// Apply an edit; remaining uses are kept but never exceed the new maximum.
pub fn edited_action(action: Action, values: &Values) -> Action {
    let n = new_action(values);
    let uses_current = match (n.uses_max, action.uses_current) {
        (Some(max), Some(current)) => Some(current.min(max)),
        (Some(max), None) => Some(max),
        (None, _) => None,
    };
    Action {
        name: n.name,
        action_type: n.action_type,
        source: n.source,
        description: n.description,
        uses_max: n.uses_max,
        uses_current,
        uses_per: n.uses_per,
        ..action
    }
}

// ============================================================================
// Spells
// ============================================================================

pub fn spell_form(existing: Option<&Spell>, default_level: i32, theme: &Arc<Theme>) -> ModalForm {
    let title = if existing.is_some() { "Edit Spell" } else { "Add Spell" };
    let mut fields = vec![
        Field::text("name", "Spell Name").required().placeholder("Fireball"),
        Field::select("level", "Level", &SPELL_LEVELS).value(default_level.to_string()),
        Field::select("school", "School", &SCHOOLS),
        Field::text("casting_time", "Casting Time").placeholder("1 action"),
        Field::text("range", "Range").placeholder("150 feet"),
        Field::text("components", "Components").placeholder("V, S, M"),
        Field::text("duration", "Duration").placeholder("Instantaneous"),
        Field::checkbox("is_ritual", "Ritual"),
        Field::checkbox("is_prepared", "Prepared"),
        Field::text("source", "Source").placeholder("PHB"),
    ];
    if let Some(s) = existing {
        let values = [
            s.name.clone(),
            s.level.to_string(),
            show(&s.school),
            show(&s.casting_time),
            show(&s.range),
            show(&s.components),
            show(&s.duration),
            s.is_ritual.to_string(),
            s.is_prepared.to_string(),
            show(&s.source),
        ];
        prefill(&mut fields, values);
    }
    ModalForm::new(title, fields, Arc::clone(theme))
}

pub fn new_spell(values: &Values) -> NewSpell {
    NewSpell {
        name: get(values, "name").trim().to_string(),
        level: int(values, "level").unwrap_or(0).clamp(0, 9),
        school: opt(values, "school"),
        is_prepared: flag(values, "is_prepared"),
        is_ritual: flag(values, "is_ritual"),
        casting_time: opt(values, "casting_time"),
        range: opt(values, "range"),
        components: opt(values, "components"),
        duration: opt(values, "duration"),
        source: opt(values, "source"),
        description: None,
    }
}

pub fn edited_spell(spell: Spell, values: &Values) -> Spell {
    let n = new_spell(values);
    Spell {
        name: n.name,
        level: n.level,
        school: n.school,
        is_prepared: n.is_prepared,
        is_ritual: n.is_ritual,
        casting_time: n.casting_time,
        range: n.range,
        components: n.components,
        duration: n.duration,
        source: n.source,
        ..spell
    }
}

pub fn spellcasting_form(current: Option<&Spellcasting>, theme: &Arc<Theme>) -> ModalForm {
    let sc = current.cloned().unwrap_or_default();
    let abilities: Vec<&str> = std::iter::once("").chain(Ability::ALL.iter().map(|a| a.name())).collect();

    let mut fields = vec![
        Field::text("class", "Class").value(show(&sc.spellcasting_class)).placeholder("Wizard"),
        Field::select("ability", "Ability", abilities.as_slice()).value(show(&sc.spellcasting_ability)),
        Field::number("save_dc", "Save DC").value(show_num(sc.spell_save_dc)).placeholder("13"),
        Field::number("attack_bonus", "Attack Bonus")
            .value(sc.spell_attack_bonus.map(rules::format_modifier).unwrap_or_default())
            .placeholder("+5"),
    ];
    for (i, slot) in sc.slots.iter().enumerate() {
        let level = i + 1;
        fields.push(
            Field::number(&format!("slots_{level}"), &format!("Level {level} Slots"))
                .value(if slot.max > 0 { slot.max.to_string() } else { String::new() })
                .placeholder("0"),
        );
    }
    ModalForm::new("Edit Spellcasting", fields, Arc::clone(theme))
}

/// New slot maxima keep what was spent, clamped to the new maximum.
pub fn edited_spellcasting(character_id: Uuid, current: Option<Spellcasting>, values: &Values) -> Spellcasting {
    let mut sc = current.unwrap_or_else(|| Spellcasting { character_id, ..Default::default() });
    sc.spellcasting_class = opt(values, "class");
    sc.spellcasting_ability = opt(values, "ability");
    sc.spell_save_dc = int(values, "save_dc");
    sc.spell_attack_bonus = int(values, "attack_bonus");
    for (i, slot) in sc.slots.iter_mut().enumerate() {
        slot.max = int(values, &format!("slots_{}", i + 1)).unwrap_or(0).max(0);
        slot.used = slot.used.clamp(0, slot.max);
    }
    sc
}

// ============================================================================
// Inventory
// ============================================================================

pub fn item_form(existing: Option<&InventoryItem>, theme: &Arc<Theme>) -> ModalForm {
    let title = if existing.is_some() { "Edit Item" } else { "Add Item" };
    let mut fields = vec![
        Field::text("name", "Item Name").required().placeholder("Rope, hempen (50 feet)"),
        Field::number("quantity", "Quantity").value("1"),
        Field::number("weight", "Weight").placeholder("10"),
        Field::text("location", "Location").placeholder("Backpack"),
        Field::checkbox("is_equipped", "Equipped"),
        Field::text("notes", "Notes").placeholder("Additional notes"),
    ];
    if let Some(item) = existing {
        let values = [
            item.name.clone(),
            item.quantity.to_string(),
            show_num(item.weight),
            show(&item.location),
            item.is_equipped.to_string(),
            show(&item.notes),
        ];
        prefill(&mut fields, values);
    }
    ModalForm::new(title, fields, Arc::clone(theme))
}

pub fn new_item(values: &Values) -> NewInventoryItem {
    NewInventoryItem {
        name: get(values, "name").trim().to_string(),
        quantity: int(values, "quantity").unwrap_or(1).max(0),
        weight: float(values, "weight"),
        location: opt(values, "location"),
        is_equipped: flag(values, "is_equipped"),
        notes: opt(values, "notes"),
    }
}

pub fn edited_item(item: InventoryItem, values: &Values) -> InventoryItem {
    let n = new_item(values);
    InventoryItem {
        name: n.name,
        quantity: n.quantity,
        weight: n.weight,
        location: n.location,
        is_equipped: n.is_equipped,
        notes: n.notes,
        ..item
    }
}

pub fn magic_item_form(existing: Option<&MagicItem>, theme: &Arc<Theme>) -> ModalForm {
    let title = if existing.is_some() { "Edit Magic Item" } else { "Add Magic Item" };
    let mut fields = vec![
        Field::text("name", "Item Name").required().placeholder("Cloak of Protection"),
        Field::select("rarity", "Rarity", &RARITIES),
        Field::number("weight", "Weight").placeholder("1"),
        Field::checkbox("attunement_required", "Attunement"),
        Field::text("description", "Description").placeholder("+1 to AC and saving throws"),
    ];
    if let Some(item) = existing {
        let values = [
            item.name.clone(),
            show(&item.rarity),
            show_num(item.weight),
            item.attunement_required.to_string(),
            show(&item.description),
        ];
        prefill(&mut fields, values);
    }
    ModalForm::new(title, fields, Arc::clone(theme))
}

pub fn new_magic_item(values: &Values) -> NewMagicItem {
    NewMagicItem {
        name: get(values, "name").trim().to_string(),
        rarity: opt(values, "rarity"),
        weight: float(values, "weight"),
        attunement_required: flag(values, "attunement_required"),
        description: opt(values, "description"),
    }
}

/// Dropping the attunement requirement also ends any attunement.
pub fn edited_magic_item(item: MagicItem, values: &Values) -> MagicItem {
    let n = new_magic_item(values);
    MagicItem {
        name: n.name,
        rarity: n.rarity,
        weight: n.weight,
        is_attuned: item.is_attuned && n.attunement_required,
        attunement_required: n.attunement_required,
        description: n.description,
        ..item
    }
}

pub fn currency_form(current: Option<&Currency>, theme: &Arc<Theme>) -> ModalForm {
    let c = current.cloned().unwrap_or_default();
    let coin = |key: &str, label: &str, value: i32| Field::number(key, label).value(value.to_string());
    ModalForm::new(
        "Edit Currency",
        vec![
            coin("copper", "Copper (CP)", c.copper),
            coin("silver", "Silver (SP)", c.silver),
            coin("electrum", "Electrum (EP)", c.electrum),
            coin("gold", "Gold (GP)", c.gold),
            coin("platinum", "Platinum (PP)", c.platinum),
        ],
        Arc::clone(theme),
    )
}

pub fn currency_from_values(character_id: Uuid, values: &Values) -> Currency {
    let coins = |key: &str| int(values, key).unwrap_or(0).max(0);
    Currency {
        character_id,
        copper: coins("copper"),
        silver: coins("silver"),
        electrum: coins("electrum"),
        gold: coins("gold"),
        platinum: coins("platinum"),
    }
}

// ============================================================================
// Features
// ============================================================================

pub fn feature_form(existing: Option<&Feature>, default_source: Option<FeatureSource>, theme: &Arc<Theme>) -> ModalForm {
    let title = if existing.is_some() { "Edit Feature" } else { "Add Feature" };
    let sources: Vec<&str> = FeatureSource::ALL.iter().map(|s| s.as_str()).collect();
    let source_type = existing
        .and_then(|f| f.source_type)
        .or(default_source)
        .unwrap_or(FeatureSource::Class);

    let mut fields = vec![
        Field::text("name", "Feature Name").required().placeholder("Second Wind"),
        Field::text("source", "Source").placeholder("Fighter 1"),
        Field::select("source_type", "Type", sources.as_slice()).value(source_type.as_str()),
        Field::text("description", "Description").placeholder("What it does"),
    ];
    if let Some(f) = existing {
        let values = [
            f.name.clone(),
            show(&f.source),
            source_type.as_str().to_string(),
            show(&f.description),
        ];
        prefill(&mut fields, values);
    }
    ModalForm::new(title, fields, Arc::clone(theme))
}

pub fn new_feature(values: &Values) -> NewFeature {
    NewFeature {
        name: get(values, "name").trim().to_string(),
        source: opt(values, "source"),
        source_type: FeatureSource::parse(get(values, "source_type")),
        description: opt(values, "description"),
    }
}

pub fn edited_feature(feature: Feature, values: &Values) -> Feature {
    let n = new_feature(values);
    Feature {
        name: n.name,
        source: n.source,
        source_type: n.source_type,
        description: n.description,
        ..feature
    }
}

fn prefill<const N: usize>(fields: &mut [Field], values: [String; N]) {
    for (field, value) in fields.iter_mut().zip(values) {
        field.value = value;
    }
}
