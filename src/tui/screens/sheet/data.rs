//! Table construction, row formatting and the load commands for the
//! sheet's cached collections.
//!
//! Every command built here answers with `Message::Sheet` tagged with the
//! character it was issued for, so the controller can drop results that
//! arrive after the user has moved to another character.

use std::future::Future;
use std::sync::Arc;

use uuid::Uuid;

use crate::core::model::{
    Action, Attack, Character, Feature, FeatureSource, InventoryItem, MagicItem, Spell,
};
use crate::core::rules::{self, SKILLS, Skill};
use crate::core::store::CharacterStore;
use crate::tui::components::{ScrollableTable, TableColumn, TableRow};
use crate::tui::message::{Command, Message, Refresh, SheetUpdate};
use crate::tui::theme::Theme;

/// Wrap a store call as a sheet-scoped command.
pub(super) fn sheet_command<F>(label: &str, character_id: Uuid, future: F) -> Command
where
    F: Future<Output = SheetUpdate> + Send + 'static,
{
    Command::new(label, async move {
        Message::Sheet { character_id, update: future.await }
    })
}

/// Re-query one cached collection with the active filters.
pub fn reload(
    store: &Arc<dyn CharacterStore>,
    character_id: Uuid,
    refresh: Refresh,
    spell_filter: Option<i32>,
    feature_filter: Option<FeatureSource>,
) -> Command {
    let store = Arc::clone(store);
    let id = character_id;
    match refresh {
        Refresh::Attacks => sheet_command("load attacks", id, async move {
            SheetUpdate::Attacks(store.list_attacks(id).await)
        }),
        Refresh::Actions => sheet_command("load actions", id, async move {
            SheetUpdate::Actions(store.list_actions(id).await)
        }),
        Refresh::Inventory => sheet_command("load inventory", id, async move {
            SheetUpdate::Inventory(store.list_inventory(id).await)
        }),
        Refresh::MagicItems => sheet_command("load magic items", id, async move {
            SheetUpdate::MagicItems(store.list_magic_items(id).await)
        }),
        Refresh::Currency => sheet_command("load currency", id, async move {
            SheetUpdate::Currency(store.get_currency(id).await)
        }),
        Refresh::Spellcasting => sheet_command("load spellcasting", id, async move {
            SheetUpdate::Spellcasting(store.get_spellcasting(id).await)
        }),
        Refresh::Spells => sheet_command("load spells", id, async move {
            SheetUpdate::Spells(store.list_spells(id, spell_filter).await)
        }),
        Refresh::Features => sheet_command("load features", id, async move {
            SheetUpdate::Features(store.list_features(id, feature_filter).await)
        }),
    }
}

/// Every collection the sheet shows, unfiltered, plus the details record.
pub fn load_all(store: &Arc<dyn CharacterStore>, character_id: Uuid) -> Vec<Command> {
    const ALL: [Refresh; 8] = [
        Refresh::Attacks,
        Refresh::Actions,
        Refresh::Inventory,
        Refresh::MagicItems,
        Refresh::Currency,
        Refresh::Spellcasting,
        Refresh::Spells,
        Refresh::Features,
    ];
    let mut commands: Vec<Command> = ALL
        .into_iter()
        .map(|r| reload(store, character_id, r, None, None))
        .collect();

    let store = Arc::clone(store);
    commands.push(sheet_command("load details", character_id, async move {
        SheetUpdate::Details(store.get_details(character_id).await)
    }));
    commands
}

// ============================================================================
// Tables
// ============================================================================

fn table<T: Clone>(
    columns: &[(&str, u16)],
    visible: usize,
    empty: &str,
    theme: &Arc<Theme>,
) -> ScrollableTable<T> {
    let columns = columns.iter().map(|(title, w)| TableColumn::fixed(*title, *w)).collect();
    let mut t = ScrollableTable::new(columns, Arc::clone(theme)).with_empty_message(empty);
    t.set_visible_rows(visible);
    t
}

pub fn skills_table(theme: &Arc<Theme>) -> ScrollableTable<&'static Skill> {
    table(
        &[("Prof", 4), ("Skill", 18), ("Mod", 5), ("Ability", 7)],
        12,
        "No skills available",
        theme,
    )
}

pub fn attacks_table(theme: &Arc<Theme>) -> ScrollableTable<Attack> {
    table(
        &[("Weapon", 15), ("Atk", 5), ("Damage", 12), ("Type", 10), ("Range", 8)],
        5,
        "No attacks - press 'a' to add",
        theme,
    )
}

pub fn actions_table(theme: &Arc<Theme>) -> ScrollableTable<Action> {
    table(
        &[("Action", 18), ("Type", 8), ("Uses", 8), ("Source", 12)],
        5,
        "No actions - press 'a' to add",
        theme,
    )
}

pub fn inventory_table(theme: &Arc<Theme>) -> ScrollableTable<InventoryItem> {
    table(
        &[("Item", 20), ("Qty", 4), ("Wt", 6), ("Location", 12), ("Eq", 3)],
        8,
        "No items - press 'a' to add",
        theme,
    )
}

pub fn magic_items_table(theme: &Arc<Theme>) -> ScrollableTable<MagicItem> {
    table(
        &[("Item", 22), ("Rarity", 10), ("Att", 4)],
        5,
        "No magic items - press 'a' to add",
        theme,
    )
}

pub fn spells_table(theme: &Arc<Theme>) -> ScrollableTable<Spell> {
    table(
        &[("P", 2), ("Spell", 20), ("School", 10), ("Time", 8), ("Range", 8)],
        10,
        "No spells known",
        theme,
    )
}

pub fn features_table(theme: &Arc<Theme>) -> ScrollableTable<Feature> {
    table(
        &[("Feature", 25), ("Source", 15), ("Type", 12)],
        12,
        "No features",
        theme,
    )
}

// ============================================================================
// Rows
// ============================================================================

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

pub fn skill_rows(character: &Character) -> Vec<TableRow<&'static Skill>> {
    SKILLS
        .iter()
        .map(|skill| {
            let prof = if character.has_skill_proficiency(skill.name) { "●" } else { "  " };
            TableRow::new(
                skill.name,
                vec![
                    prof.to_string(),
                    skill.name.to_string(),
                    rules::format_modifier(character.skill_bonus(skill)),
                    skill.ability.abbr().to_string(),
                ],
                skill,
            )
        })
        .collect()
}

pub fn attack_row(attack: &Attack) -> TableRow<Attack> {
    TableRow::new(
        attack.id.to_string(),
        vec![
            attack.name.clone(),
            attack.attack_bonus.map(rules::format_modifier).unwrap_or_default(),
            text(&attack.damage),
            text(&attack.damage_type),
            text(&attack.range),
        ],
        attack.clone(),
    )
}

/// `"current/max per"` when the action has limited uses.
pub fn action_uses(action: &Action) -> String {
    match action.uses_max {
        Some(max) if max > 0 => format!(
            "{}/{} {}",
            action.uses_current.unwrap_or(0),
            max,
            action.uses_per.as_deref().unwrap_or("")
        ),
        _ => String::new(),
    }
}

pub fn action_row(action: &Action) -> TableRow<Action> {
    TableRow::new(
        action.id.to_string(),
        vec![
            action.name.clone(),
            action.action_type.clone().unwrap_or_else(|| "action".to_string()),
            action_uses(action),
            text(&action.source),
        ],
        action.clone(),
    )
}

pub fn inventory_row(item: &InventoryItem) -> TableRow<InventoryItem> {
    TableRow::new(
        item.id.to_string(),
        vec![
            item.name.clone(),
            item.quantity.to_string(),
            item.weight.map(|w| w.to_string()).unwrap_or_default(),
            text(&item.location),
            if item.is_equipped { "●" } else { " " }.to_string(),
        ],
        item.clone(),
    )
}

pub fn magic_item_row(item: &MagicItem) -> TableRow<MagicItem> {
    let attuned = if item.is_attuned {
        "●"
    } else if item.attunement_required {
        "○"
    } else {
        " "
    };
    TableRow::new(
        item.id.to_string(),
        vec![item.name.clone(), text(&item.rarity), attuned.to_string()],
        item.clone(),
    )
}

pub fn spell_row(spell: &Spell) -> TableRow<Spell> {
    TableRow::new(
        spell.id.to_string(),
        vec![
            if spell.is_prepared { "●" } else { " " }.to_string(),
            spell.name.clone(),
            text(&spell.school),
            text(&spell.casting_time),
            text(&spell.range),
        ],
        spell.clone(),
    )
}

pub fn feature_row(feature: &Feature) -> TableRow<Feature> {
    TableRow::new(
        feature.id.to_string(),
        vec![
            feature.name.clone(),
            text(&feature.source),
            feature.source_type.map(|s| s.as_str().to_string()).unwrap_or_default(),
        ],
        feature.clone(),
    )
}

/// Carried weight: equipment weight times quantity plus magic item weight.
pub fn total_weight(inventory: &[InventoryItem], magic_items: &[MagicItem]) -> f64 {
    let carried: f64 = inventory
        .iter()
        .filter_map(|i| i.weight.map(|w| w * f64::from(i.quantity)))
        .sum();
    let magic: f64 = magic_items.iter().filter_map(|m| m.weight).sum();
    carried + magic
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemoryStore;
    use crate::core::model::{NewAttack, NewCharacter};

    fn fighter() -> NewCharacter {
        NewCharacter::level_one(
            Uuid::new_v4(),
            "Aria",
            "Human",
            "Fighter",
            "",
            "",
            [16, 14, 13, 12, 10, 8],
            vec!["Athletics".to_string()],
        )
    }

    fn item(name: &str, qty: i32, weight: Option<f64>) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            character_id: Uuid::nil(),
            sort_order: 0,
            name: name.to_string(),
            quantity: qty,
            weight,
            location: None,
            is_equipped: false,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_skill_rows_mark_proficiency() {
        let store = MemoryStore::new();
        let c = store.create_character(fighter()).await.unwrap();
        let rows = skill_rows(&c);
        assert_eq!(rows.len(), 18);

        let athletics = rows.iter().find(|r| r.id == "Athletics").unwrap();
        // STR 16 (+3) + proficiency 2
        assert_eq!(athletics.cells, vec!["●", "Athletics", "+5", "STR"]);
        let arcana = rows.iter().find(|r| r.id == "Arcana").unwrap();
        assert_eq!(arcana.cells[0], "  ");
        assert_eq!(arcana.cells[2], "+1");
    }

    #[test]
    fn test_action_uses_format() {
        let mut action = Action {
            id: Uuid::new_v4(),
            character_id: Uuid::nil(),
            sort_order: 0,
            name: "Second Wind".into(),
            action_type: None,
            source: None,
            description: None,
            uses_max: Some(1),
            uses_current: Some(1),
            uses_per: Some("short rest".into()),
        };
        assert_eq!(action_uses(&action), "1/1 short rest");
        let row = action_row(&action);
        assert_eq!(row.cells[1], "action");

        action.uses_max = Some(0);
        assert_eq!(action_uses(&action), "");
    }

    #[test]
    fn test_total_weight_counts_quantity() {
        let inventory = vec![item("Rope", 1, Some(10.0)), item("Torch", 5, Some(1.0)), item("Note", 3, None)];
        let magic = vec![MagicItem {
            id: Uuid::new_v4(),
            character_id: Uuid::nil(),
            name: "Cloak".into(),
            rarity: None,
            weight: Some(1.5),
            attunement_required: true,
            is_attuned: false,
            description: None,
        }];
        assert_eq!(total_weight(&inventory, &magic), 16.5);
        assert_eq!(magic_item_row(&magic[0]).cells[2], "○");
    }

    #[tokio::test]
    async fn test_reload_tags_results_with_character() {
        let store: Arc<dyn CharacterStore> = Arc::new(MemoryStore::new());
        let c = store.create_character(fighter()).await.unwrap();
        store
            .create_attack(c.id, NewAttack { name: "Longsword".into(), attack_bonus: Some(5), ..Default::default() })
            .await
            .unwrap();

        let cmd = reload(&store, c.id, Refresh::Attacks, None, None);
        assert_eq!(cmd.label(), "load attacks");
        match cmd.resolve().await {
            Message::Sheet { character_id, update: SheetUpdate::Attacks(Ok(attacks)) } => {
                assert_eq!(character_id, c.id);
                assert_eq!(attack_row(&attacks[0]).cells[..2], ["Longsword".to_string(), "+5".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_all_covers_every_collection() {
        let store: Arc<dyn CharacterStore> = Arc::new(MemoryStore::new());
        let commands = load_all(&store, Uuid::new_v4());
        assert_eq!(commands.len(), 9);
        assert_eq!(commands.last().unwrap().label(), "load details");
    }
}
