//! # Character Sheet
//!
//! Seven tabs over one character plus the collections hanging off it.
//! Input is owned by exactly one [`Mode`] at a time: in `View` the tab
//! keys and per-tab keys are live, every other mode (numeric HP edits,
//! text areas, modal forms, the help overlay) swallows all keys until it
//! returns to `View`.
//!
//! ```text
//!   View ──e/-/+──► EditHp/Damage/Heal ──result──► View
//!     │  ──e/f────► EditNotes/Features ──saved────► View
//!     │  ──a/enter► Add*/Edit* (modal) ──save/esc─► View
//!     └──?────────► Help ──?/esc/q/enter/space────► View
//! ```
//!
//! Store results arrive as `Message::Sheet` tagged with the character id;
//! a mismatching tag is dropped here as well as in the controller.

pub mod data;
pub mod forms;
mod view;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use ratatui::Frame;
use ratatui::layout::Rect;
use uuid::Uuid;

use crate::core::dice;
use crate::core::model::{
    Action, Attack, Character, Currency, Details, Feature, FeatureSource, InventoryItem,
    MagicItem, Spell, Spellcasting,
};
use crate::core::rules::{SKILLS, Skill};
use crate::core::store::{CharacterStore, StoreError};
use crate::tui::component::EventHandler;
use crate::tui::components::{
    ModalEvent, ModalForm, ScrollableTable, TableEvent, TextArea, TextInput,
};
use crate::tui::event::Key;
use crate::tui::message::{Command, Message, Refresh, SheetUpdate, Status};
use crate::tui::screens::Screen;
use crate::tui::theme::Theme;

use data::reload;
use forms::{Values, mutation};

/// How long a status message stays up.
pub const STATUS_DURATION: Duration = Duration::from_secs(3);

/// Rows taken by everything around a tab's main table.
const TAB_CHROME: u16 = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Core,
    Combat,
    Spells,
    Inventory,
    Features,
    Background,
    Notes,
}

impl Tab {
    pub const ALL: [Tab; 7] = [
        Tab::Core,
        Tab::Combat,
        Tab::Spells,
        Tab::Inventory,
        Tab::Features,
        Tab::Background,
        Tab::Notes,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Core => "Core",
            Tab::Combat => "Combat",
            Tab::Spells => "Spells",
            Tab::Inventory => "Inventory",
            Tab::Features => "Features",
            Tab::Background => "Background",
            Tab::Notes => "Notes",
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Which input owns the keyboard. Modal modes carry the id of the row
/// being edited, `None` when adding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    EditHp,
    EditDamage,
    EditHeal,
    EditNotes,
    EditFeatures,
    EditBackground,
    AddAttack { editing: Option<Uuid> },
    AddAction { editing: Option<Uuid> },
    AddSpell { editing: Option<Uuid> },
    AddItem { editing: Option<Uuid> },
    AddMagicItem { editing: Option<Uuid> },
    AddFeature { editing: Option<Uuid> },
    EditCurrency,
    EditSpellcasting,
    Help,
}

impl Mode {
    fn is_numeric(self) -> bool {
        matches!(self, Mode::EditHp | Mode::EditDamage | Mode::EditHeal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatFocus {
    Attacks,
    Actions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryFocus {
    Equipment,
    MagicItems,
}

/// New current HP after a numeric edit. Set clamps to `[0, max]`, damage
/// floors at 0, heal caps at `max`; negative amounts count as 0.
pub fn resolve_hp(mode: Mode, current: i32, max: i32, amount: i32) -> i32 {
    match mode {
        Mode::EditDamage => (current - amount.max(0)).max(0),
        Mode::EditHeal => (current + amount.max(0)).min(max),
        _ => amount.clamp(0, max.max(0)),
    }
}

fn is_navigation(key: Key) -> bool {
    matches!(
        key,
        Key::Up
            | Key::Down
            | Key::PageUp
            | Key::PageDown
            | Key::Home
            | Key::End
            | Key::Char('j' | 'k' | 'g' | 'G')
    )
}

fn find<T: Clone>(table: &ScrollableTable<T>, id: Uuid) -> Option<T> {
    let id = id.to_string();
    table.rows().iter().find(|r| r.id == id).map(|r| r.data.clone())
}

pub struct SheetScreen {
    store: Arc<dyn CharacterStore>,
    theme: Arc<Theme>,
    character: Character,

    tab: Tab,
    mode: Mode,
    combat_focus: CombatFocus,
    inventory_focus: InventoryFocus,
    spell_filter: Option<i32>,
    feature_filter: Option<FeatureSource>,

    inventory: Vec<InventoryItem>,
    magic_items: Vec<MagicItem>,
    currency: Option<Currency>,
    spellcasting: Option<Spellcasting>,
    details: Option<Details>,

    skills_table: ScrollableTable<&'static Skill>,
    attacks_table: ScrollableTable<Attack>,
    actions_table: ScrollableTable<Action>,
    inventory_table: ScrollableTable<InventoryItem>,
    magic_items_table: ScrollableTable<MagicItem>,
    spells_table: ScrollableTable<Spell>,
    features_table: ScrollableTable<Feature>,

    hp_input: TextInput,
    /// An HP save is in flight; further Enters are ignored until it lands.
    hp_saving: bool,
    notes_input: TextArea,
    features_input: TextArea,
    modal: Option<ModalForm>,
    status: Option<Status>,
}

impl SheetScreen {
    pub fn new(store: Arc<dyn CharacterStore>, character: Character, theme: Arc<Theme>) -> Self {
        let mut skills_table = data::skills_table(&theme);
        skills_table.set_rows(data::skill_rows(&character));

        let mut screen = Self {
            attacks_table: data::attacks_table(&theme),
            actions_table: data::actions_table(&theme),
            inventory_table: data::inventory_table(&theme),
            magic_items_table: data::magic_items_table(&theme),
            spells_table: data::spells_table(&theme),
            features_table: data::features_table(&theme),
            skills_table,
            hp_input: TextInput::new(Arc::clone(&theme)).numeric().with_char_limit(5),
            hp_saving: false,
            notes_input: TextArea::new("Notes", Arc::clone(&theme)).with_placeholder("Write your notes..."),
            features_input: TextArea::new("Features & Traits", Arc::clone(&theme))
                .with_placeholder("Class features, racial traits, feats..."),
            store,
            theme,
            character,
            tab: Tab::Core,
            mode: Mode::View,
            combat_focus: CombatFocus::Attacks,
            inventory_focus: InventoryFocus::Equipment,
            spell_filter: None,
            feature_filter: None,
            inventory: Vec::new(),
            magic_items: Vec::new(),
            currency: None,
            spellcasting: None,
            details: None,
            modal: None,
            status: None,
        };
        screen.update_table_focus();
        screen
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn character_id(&self) -> Uuid {
        self.character.id
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn spell_filter(&self) -> Option<i32> {
        self.spell_filter
    }

    pub fn feature_filter(&self) -> Option<FeatureSource> {
        self.feature_filter
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn modal(&self) -> Option<&ModalForm> {
        self.modal.as_ref()
    }

    pub fn spells_table(&self) -> &ScrollableTable<Spell> {
        &self.spells_table
    }

    pub fn attacks_table(&self) -> &ScrollableTable<Attack> {
        &self.attacks_table
    }

    pub fn features_table(&self) -> &ScrollableTable<Feature> {
        &self.features_table
    }

    /// Replace the cached character, e.g. after a save elsewhere.
    pub fn set_character(&mut self, character: Character) {
        self.skills_table.set_rows(data::skill_rows(&character));
        self.character = character;
    }

    /// Only the table under the visible tab and sub-focus takes keys.
    fn update_table_focus(&mut self) {
        let tab = self.tab;
        self.skills_table.set_focused(tab == Tab::Core);
        self.attacks_table
            .set_focused(tab == Tab::Combat && self.combat_focus == CombatFocus::Attacks);
        self.actions_table
            .set_focused(tab == Tab::Combat && self.combat_focus == CombatFocus::Actions);
        self.spells_table.set_focused(tab == Tab::Spells);
        self.inventory_table
            .set_focused(tab == Tab::Inventory && self.inventory_focus == InventoryFocus::Equipment);
        self.magic_items_table
            .set_focused(tab == Tab::Inventory && self.inventory_focus == InventoryFocus::MagicItems);
        self.features_table.set_focused(tab == Tab::Features);
    }

    fn show_status(&mut self, status: Status) -> Vec<Command> {
        self.status = Some(status);
        vec![Command::after(
            STATUS_DURATION,
            Message::Sheet { character_id: self.character.id, update: SheetUpdate::ClearStatus },
        )]
    }

    fn reload(&self, refresh: Refresh) -> Vec<Command> {
        vec![reload(&self.store, self.character.id, refresh, self.spell_filter, self.feature_filter)]
    }

    fn open_modal(&mut self, mode: Mode, form: ModalForm) -> Vec<Command> {
        self.modal = Some(form);
        self.mode = mode;
        Vec::new()
    }

    // ------------------------------------------------------------------
    // Key handling
    // ------------------------------------------------------------------

    fn handle_key(&mut self, key: Key) -> Vec<Command> {
        match self.mode {
            Mode::View => self.key_view(key),
            Mode::EditHp | Mode::EditDamage | Mode::EditHeal => self.key_numeric(key),
            Mode::EditNotes | Mode::EditFeatures => self.key_text(key),
            Mode::Help => {
                if matches!(key, Key::Char('?' | 'q' | ' ') | Key::Esc | Key::Enter) {
                    self.mode = Mode::View;
                }
                Vec::new()
            }
            _ => self.key_modal(key),
        }
    }

    fn key_view(&mut self, key: Key) -> Vec<Command> {
        let to_table = is_navigation(key)
            || matches!(key, Key::Enter | Key::Char('d') | Key::Delete)
            || (key == Key::Char('e') && self.tab == Tab::Inventory);
        if to_table && let Some(cmds) = self.key_table(key) {
            return cmds;
        }

        let handled = match self.tab {
            Tab::Combat => self.key_combat(key),
            Tab::Spells => self.key_spells(key),
            Tab::Inventory => self.key_inventory(key),
            Tab::Features => self.key_features(key),
            Tab::Background => self.key_background(key),
            Tab::Notes => self.key_notes(key),
            Tab::Core => None,
        };
        if let Some(cmds) = handled {
            return cmds;
        }

        match key {
            Key::Tab | Key::Right | Key::Char('l') => {
                self.tab = self.tab.next();
                self.update_table_focus();
            }
            Key::BackTab | Key::Left | Key::Char('h') => {
                self.tab = self.tab.prev();
                self.update_table_focus();
            }
            Key::Char('r') => {
                let roll = dice::roll_d20_rand();
                debug!("{} rolled a d20: {}", self.character.name, roll);
                return self.show_status(Status::ok(format!("Rolled d20: {roll}")));
            }
            Key::Char('?') => self.mode = Mode::Help,
            Key::Esc | Key::Char('q') => return vec![Command::message(Message::NavigateBack)],
            _ => {}
        }
        Vec::new()
    }

    /// Feed the visible table; `None` when the tab has no table.
    fn key_table(&mut self, key: Key) -> Option<Vec<Command>> {
        let cmds = match self.tab {
            Tab::Core => {
                self.skills_table.handle_event(key);
                Vec::new()
            }
            Tab::Combat => match self.combat_focus {
                CombatFocus::Attacks => match self.attacks_table.handle_event(key) {
                    Some(TableEvent::Select(row) | TableEvent::Edit(row)) => {
                        let form = forms::attack_form(Some(&row.data), &self.theme);
                        self.open_modal(Mode::AddAttack { editing: Some(row.data.id) }, form)
                    }
                    Some(TableEvent::Delete(row)) => self.delete_attack(row.data),
                    None => Vec::new(),
                },
                CombatFocus::Actions => match self.actions_table.handle_event(key) {
                    Some(TableEvent::Select(row) | TableEvent::Edit(row)) => {
                        let form = forms::action_form(Some(&row.data), &self.theme);
                        self.open_modal(Mode::AddAction { editing: Some(row.data.id) }, form)
                    }
                    Some(TableEvent::Delete(row)) => self.delete_action(row.data),
                    None => Vec::new(),
                },
            },
            Tab::Spells => match self.spells_table.handle_event(key) {
                Some(TableEvent::Select(row) | TableEvent::Edit(row)) => {
                    let form = forms::spell_form(Some(&row.data), row.data.level, &self.theme);
                    self.open_modal(Mode::AddSpell { editing: Some(row.data.id) }, form)
                }
                Some(TableEvent::Delete(row)) => self.delete_spell(row.data),
                None => Vec::new(),
            },
            Tab::Inventory => match self.inventory_focus {
                InventoryFocus::Equipment => match self.inventory_table.handle_event(key) {
                    Some(TableEvent::Select(row)) => {
                        let form = forms::item_form(Some(&row.data), &self.theme);
                        self.open_modal(Mode::AddItem { editing: Some(row.data.id) }, form)
                    }
                    Some(TableEvent::Edit(row)) => self.toggle_equipped(row.data.id),
                    Some(TableEvent::Delete(row)) => self.delete_item(row.data),
                    None => Vec::new(),
                },
                InventoryFocus::MagicItems => match self.magic_items_table.handle_event(key) {
                    Some(TableEvent::Select(row)) => {
                        let form = forms::magic_item_form(Some(&row.data), &self.theme);
                        self.open_modal(Mode::AddMagicItem { editing: Some(row.data.id) }, form)
                    }
                    Some(TableEvent::Edit(row)) => self.toggle_attuned(row.data),
                    Some(TableEvent::Delete(row)) => self.delete_magic_item(row.data),
                    None => Vec::new(),
                },
            },
            Tab::Features => match self.features_table.handle_event(key) {
                Some(TableEvent::Select(row) | TableEvent::Edit(row)) => {
                    let form = forms::feature_form(Some(&row.data), self.feature_filter, &self.theme);
                    self.open_modal(Mode::AddFeature { editing: Some(row.data.id) }, form)
                }
                Some(TableEvent::Delete(row)) => self.delete_feature(row.data),
                None => Vec::new(),
            },
            Tab::Background | Tab::Notes => return None,
        };
        Some(cmds)
    }

    fn key_combat(&mut self, key: Key) -> Option<Vec<Command>> {
        match key {
            Key::Char('1') => self.combat_focus = CombatFocus::Attacks,
            Key::Char('2') => self.combat_focus = CombatFocus::Actions,
            Key::Char('a') => {
                return Some(match self.combat_focus {
                    CombatFocus::Attacks => {
                        let form = forms::attack_form(None, &self.theme);
                        self.open_modal(Mode::AddAttack { editing: None }, form)
                    }
                    CombatFocus::Actions => {
                        let form = forms::action_form(None, &self.theme);
                        self.open_modal(Mode::AddAction { editing: None }, form)
                    }
                });
            }
            Key::Char('e') => self.start_numeric(Mode::EditHp),
            Key::Char('-') => self.start_numeric(Mode::EditDamage),
            Key::Char('+' | '=') => self.start_numeric(Mode::EditHeal),
            _ => return None,
        }
        self.update_table_focus();
        Some(Vec::new())
    }

    fn start_numeric(&mut self, mode: Mode) {
        let initial = match mode {
            Mode::EditHp => self.character.current_hit_points.to_string(),
            _ => String::new(),
        };
        self.hp_input.set_value(initial);
        self.hp_input.focus();
        self.hp_saving = false;
        self.mode = mode;
    }

    fn key_spells(&mut self, key: Key) -> Option<Vec<Command>> {
        let cmds = match key {
            Key::Char(c @ '0'..='9') => {
                let level = c as i32 - '0' as i32;
                self.spell_filter = if self.spell_filter == Some(level) { None } else { Some(level) };
                self.reload(Refresh::Spells)
            }
            Key::Char('a') => {
                let form = forms::spell_form(None, self.spell_filter.unwrap_or(0), &self.theme);
                self.open_modal(Mode::AddSpell { editing: None }, form)
            }
            Key::Char('x') => match self.spells_table.selected_row() {
                Some(row) => {
                    let spell = row.data.clone();
                    self.delete_spell(spell)
                }
                None => Vec::new(),
            },
            Key::Char('p' | ' ') => match self.spells_table.selected_row() {
                Some(row) => {
                    let id = row.data.id;
                    self.toggle_prepared(id)
                }
                None => Vec::new(),
            },
            Key::Char('u') => self.spend_slot(),
            Key::Char('U') => self.restore_slots(),
            Key::Char('s') => {
                let form = forms::spellcasting_form(self.spellcasting.as_ref(), &self.theme);
                self.open_modal(Mode::EditSpellcasting, form)
            }
            _ => return None,
        };
        Some(cmds)
    }

    fn key_inventory(&mut self, key: Key) -> Option<Vec<Command>> {
        let cmds = match key {
            Key::Char('1') => {
                self.inventory_focus = InventoryFocus::Equipment;
                self.update_table_focus();
                Vec::new()
            }
            Key::Char('2') => {
                self.inventory_focus = InventoryFocus::MagicItems;
                self.update_table_focus();
                Vec::new()
            }
            Key::Char('a') => match self.inventory_focus {
                InventoryFocus::Equipment => {
                    let form = forms::item_form(None, &self.theme);
                    self.open_modal(Mode::AddItem { editing: None }, form)
                }
                InventoryFocus::MagicItems => {
                    let form = forms::magic_item_form(None, &self.theme);
                    self.open_modal(Mode::AddMagicItem { editing: None }, form)
                }
            },
            Key::Char('c') => {
                let form = forms::currency_form(self.currency.as_ref(), &self.theme);
                self.open_modal(Mode::EditCurrency, form)
            }
            _ => return None,
        };
        Some(cmds)
    }

    fn key_features(&mut self, key: Key) -> Option<Vec<Command>> {
        let cmds = match key {
            Key::Char(c @ '1'..='4') => {
                let source = FeatureSource::ALL[c as usize - '1' as usize];
                self.feature_filter = if self.feature_filter == Some(source) { None } else { Some(source) };
                self.reload(Refresh::Features)
            }
            Key::Char('a') => {
                let form = forms::feature_form(None, self.feature_filter, &self.theme);
                self.open_modal(Mode::AddFeature { editing: None }, form)
            }
            _ => return None,
        };
        Some(cmds)
    }

    fn key_background(&mut self, key: Key) -> Option<Vec<Command>> {
        if key != Key::Char('e') {
            return None;
        }
        let form = forms::background_form(
            self.details.as_ref(),
            self.character.alignment.as_deref(),
            &self.theme,
        );
        Some(self.open_modal(Mode::EditBackground, form))
    }

    fn key_notes(&mut self, key: Key) -> Option<Vec<Command>> {
        match key {
            Key::Char('e') => {
                self.notes_input.set_value(self.character.notes.clone());
                self.notes_input.focus();
                self.mode = Mode::EditNotes;
            }
            Key::Char('f') => {
                self.features_input.set_value(self.character.features_traits.clone());
                self.features_input.focus();
                self.mode = Mode::EditFeatures;
            }
            _ => return None,
        }
        Some(Vec::new())
    }

    /// Stays in the edit mode until the save result arrives.
    fn key_numeric(&mut self, key: Key) -> Vec<Command> {
        match key {
            Key::Enter if self.hp_saving => {
                debug!("HP save already pending for {}", self.character.id);
                Vec::new()
            }
            Key::Enter => {
                self.hp_saving = true;
                let amount = forms::parse_int(self.hp_input.value()).unwrap_or(0);
                let c = &self.character;
                let hp = resolve_hp(self.mode, c.current_hit_points, c.max_hit_points, amount);
                vec![forms::save_hit_points(&self.store, c, hp)]
            }
            Key::Esc => {
                self.hp_input.blur();
                self.hp_saving = false;
                self.mode = Mode::View;
                Vec::new()
            }
            _ => {
                self.hp_input.handle_event(key);
                Vec::new()
            }
        }
    }

    fn key_text(&mut self, key: Key) -> Vec<Command> {
        let editing_notes = self.mode == Mode::EditNotes;
        match key {
            Key::Ctrl('s') => {
                let c = &self.character;
                let cmd = if editing_notes {
                    let notes = self.notes_input.value().to_string();
                    forms::save_notes(&self.store, c.id, c.features_traits.clone(), notes, "Failed to save notes")
                } else {
                    let features = self.features_input.value().to_string();
                    forms::save_notes(&self.store, c.id, features, c.notes.clone(), "Failed to save features")
                };
                vec![cmd]
            }
            Key::Esc => {
                self.notes_input.blur();
                self.features_input.blur();
                self.mode = Mode::View;
                Vec::new()
            }
            _ => {
                if editing_notes {
                    self.notes_input.handle_event(key);
                } else {
                    self.features_input.handle_event(key);
                }
                Vec::new()
            }
        }
    }

    fn key_modal(&mut self, key: Key) -> Vec<Command> {
        let Some(modal) = self.modal.as_mut() else {
            self.mode = Mode::View;
            return Vec::new();
        };
        match modal.handle_event(key) {
            Some(ModalEvent::Save(values)) => {
                let mode = std::mem::replace(&mut self.mode, Mode::View);
                self.modal = None;
                self.save_modal(mode, values)
            }
            Some(ModalEvent::Cancel) => {
                self.mode = Mode::View;
                self.modal = None;
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    fn save_modal(&mut self, mode: Mode, values: Values) -> Vec<Command> {
        let store = Arc::clone(&self.store);
        let id = self.character.id;
        let cmd = match mode {
            Mode::EditBackground => {
                forms::save_background(&self.store, &self.character, self.details.clone(), values)
            }
            Mode::AddAttack { editing: None } => {
                let new = forms::new_attack(&values);
                mutation(
                    "create attack",
                    id,
                    async move { store.create_attack(id, new).await },
                    Refresh::Attacks,
                    |_| "Attack added".to_string(),
                    "Error adding attack",
                )
            }
            Mode::AddAttack { editing: Some(row) } => {
                let Some(attack) = find(&self.attacks_table, row) else {
                    return Vec::new();
                };
                let attack = forms::edited_attack(attack, &values);
                mutation(
                    "update attack",
                    id,
                    async move { store.update_attack(attack).await },
                    Refresh::Attacks,
                    |_| "Attack updated".to_string(),
                    "Error updating attack",
                )
            }
            Mode::AddAction { editing: None } => {
                let new = forms::new_action(&values);
                mutation(
                    "create action",
                    id,
                    async move { store.create_action(id, new).await },
                    Refresh::Actions,
                    |_| "Action added".to_string(),
                    "Error adding action",
                )
            }
            Mode::AddAction { editing: Some(row) } => {
                let Some(action) = find(&self.actions_table, row) else {
                    return Vec::new();
                };
                let action = forms::edited_action(action, &values);
                mutation(
                    "update action",
                    id,
                    async move { store.update_action(action).await },
                    Refresh::Actions,
                    |_| "Action updated".to_string(),
                    "Error updating action",
                )
            }
            Mode::AddSpell { editing: None } => {
                let new = forms::new_spell(&values);
                mutation(
                    "create spell",
                    id,
                    async move { store.create_spell(id, new).await },
                    Refresh::Spells,
                    |_| "Spell added".to_string(),
                    "Error adding spell",
                )
            }
            Mode::AddSpell { editing: Some(row) } => {
                let Some(spell) = find(&self.spells_table, row) else {
                    return Vec::new();
                };
                let spell = forms::edited_spell(spell, &values);
                mutation(
                    "update spell",
                    id,
                    async move { store.update_spell(spell).await },
                    Refresh::Spells,
                    |_| "Spell updated".to_string(),
                    "Error updating spell",
                )
            }
            Mode::AddItem { editing: None } => {
                let new = forms::new_item(&values);
                mutation(
                    "create item",
                    id,
                    async move { store.create_inventory_item(id, new).await },
                    Refresh::Inventory,
                    |_| "Item added".to_string(),
                    "Error adding item",
                )
            }
            Mode::AddItem { editing: Some(row) } => {
                let Some(item) = find(&self.inventory_table, row) else {
                    return Vec::new();
                };
                let item = forms::edited_item(item, &values);
                mutation(
                    "update item",
                    id,
                    async move { store.update_inventory_item(item).await },
                    Refresh::Inventory,
                    |_| "Item updated".to_string(),
                    "Error updating item",
                )
            }
            Mode::AddMagicItem { editing: None } => {
                let new = forms::new_magic_item(&values);
                mutation(
                    "create magic item",
                    id,
                    async move { store.create_magic_item(id, new).await },
                    Refresh::MagicItems,
                    |_| "Magic item added".to_string(),
                    "Error adding magic item",
                )
            }
            Mode::AddMagicItem { editing: Some(row) } => {
                let Some(item) = find(&self.magic_items_table, row) else {
                    return Vec::new();
                };
                let item = forms::edited_magic_item(item, &values);
                mutation(
                    "update magic item",
                    id,
                    async move { store.update_magic_item(item).await },
                    Refresh::MagicItems,
                    |_| "Magic item updated".to_string(),
                    "Error updating magic item",
                )
            }
            Mode::AddFeature { editing: None } => {
                let new = forms::new_feature(&values);
                mutation(
                    "create feature",
                    id,
                    async move { store.create_feature(id, new).await },
                    Refresh::Features,
                    |_| "Feature added".to_string(),
                    "Error adding feature",
                )
            }
            Mode::AddFeature { editing: Some(row) } => {
                let Some(feature) = find(&self.features_table, row) else {
                    return Vec::new();
                };
                let feature = forms::edited_feature(feature, &values);
                mutation(
                    "update feature",
                    id,
                    async move { store.update_feature(feature).await },
                    Refresh::Features,
                    |_| "Feature updated".to_string(),
                    "Error updating feature",
                )
            }
            Mode::EditCurrency => {
                let currency = forms::currency_from_values(id, &values);
                mutation(
                    "update currency",
                    id,
                    async move { store.update_currency(currency).await },
                    Refresh::Currency,
                    |_| "Currency updated".to_string(),
                    "Error saving currency",
                )
            }
            Mode::EditSpellcasting => {
                let sc = forms::edited_spellcasting(id, self.spellcasting.clone(), &values);
                mutation(
                    "update spellcasting",
                    id,
                    async move { store.update_spellcasting(sc).await },
                    Refresh::Spellcasting,
                    |_| "Spellcasting updated".to_string(),
                    "Error saving spellcasting",
                )
            }
            Mode::View
            | Mode::EditHp
            | Mode::EditDamage
            | Mode::EditHeal
            | Mode::EditNotes
            | Mode::EditFeatures
            | Mode::Help => return Vec::new(),
        };
        vec![cmd]
    }

    fn delete_attack(&self, attack: Attack) -> Vec<Command> {
        let store = Arc::clone(&self.store);
        vec![mutation(
            "delete attack",
            self.character.id,
            async move { store.delete_attack(attack.id).await },
            Refresh::Attacks,
            |_| "Attack deleted".to_string(),
            "Error deleting attack",
        )]
    }

    fn delete_action(&self, action: Action) -> Vec<Command> {
        let store = Arc::clone(&self.store);
        vec![mutation(
            "delete action",
            self.character.id,
            async move { store.delete_action(action.id).await },
            Refresh::Actions,
            |_| "Action deleted".to_string(),
            "Error deleting action",
        )]
    }

    fn delete_spell(&self, spell: Spell) -> Vec<Command> {
        let store = Arc::clone(&self.store);
        vec![mutation(
            "delete spell",
            self.character.id,
            async move { store.delete_spell(spell.id).await },
            Refresh::Spells,
            |_| "Spell deleted".to_string(),
            "Error deleting spell",
        )]
    }

    fn delete_item(&self, item: InventoryItem) -> Vec<Command> {
        let store = Arc::clone(&self.store);
        vec![mutation(
            "delete item",
            self.character.id,
            async move { store.delete_inventory_item(item.id).await },
            Refresh::Inventory,
            |_| "Item deleted".to_string(),
            "Error deleting item",
        )]
    }

    fn delete_magic_item(&self, item: MagicItem) -> Vec<Command> {
        let store = Arc::clone(&self.store);
        vec![mutation(
            "delete magic item",
            self.character.id,
            async move { store.delete_magic_item(item.id).await },
            Refresh::MagicItems,
            |_| "Magic item deleted".to_string(),
            "Error deleting magic item",
        )]
    }

    fn delete_feature(&self, feature: Feature) -> Vec<Command> {
        let store = Arc::clone(&self.store);
        vec![mutation(
            "delete feature",
            self.character.id,
            async move { store.delete_feature(feature.id).await },
            Refresh::Features,
            |_| "Feature deleted".to_string(),
            "Error deleting feature",
        )]
    }

    fn toggle_prepared(&self, spell_id: Uuid) -> Vec<Command> {
        let store = Arc::clone(&self.store);
        vec![mutation(
            "toggle prepared",
            self.character.id,
            async move { store.toggle_prepared(spell_id).await },
            Refresh::Spells,
            |spell: Spell| {
                let state = if spell.is_prepared { "prepared" } else { "unprepared" };
                format!("{} {}", spell.name, state)
            },
            "Error updating spell",
        )]
    }

    fn toggle_equipped(&self, item_id: Uuid) -> Vec<Command> {
        let store = Arc::clone(&self.store);
        vec![mutation(
            "toggle equipped",
            self.character.id,
            async move { store.toggle_equipped(item_id).await },
            Refresh::Inventory,
            |item: InventoryItem| {
                let state = if item.is_equipped { "equipped" } else { "unequipped" };
                format!("{} {}", item.name, state)
            },
            "Error updating item",
        )]
    }

    fn toggle_attuned(&mut self, item: MagicItem) -> Vec<Command> {
        if !item.attunement_required && !item.is_attuned {
            return self.show_status(Status::error(format!("{} does not require attunement", item.name)));
        }
        let store = Arc::clone(&self.store);
        vec![mutation(
            "toggle attuned",
            self.character.id,
            async move { store.toggle_attuned(item.id).await },
            Refresh::MagicItems,
            |item: MagicItem| {
                let state = if item.is_attuned { "attuned" } else { "no longer attuned" };
                format!("{} {}", item.name, state)
            },
            "Error updating magic item",
        )]
    }

    /// Spend one slot of the selected spell's level. Cantrips are free.
    fn spend_slot(&mut self) -> Vec<Command> {
        let Some(level) = self.spells_table.selected_row().map(|r| r.data.level) else {
            return Vec::new();
        };
        if level < 1 {
            return Vec::new();
        }
        let idx = (level - 1) as usize;
        let mut sc = self.spellcasting.clone().unwrap_or_default();
        let Some(slot) = sc.slots.get_mut(idx).filter(|s| s.used < s.max) else {
            return self.show_status(Status::error(format!("No level {level} slots left")));
        };
        slot.used += 1;

        let store = Arc::clone(&self.store);
        vec![mutation(
            "spend spell slot",
            self.character.id,
            async move { store.update_spellcasting(sc).await },
            Refresh::Spellcasting,
            move |_| format!("Used a level {level} slot"),
            "Error saving spellcasting",
        )]
    }

    fn restore_slots(&mut self) -> Vec<Command> {
        let Some(mut sc) = self.spellcasting.clone() else {
            return Vec::new();
        };
        for slot in sc.slots.iter_mut() {
            slot.used = 0;
        }
        let store = Arc::clone(&self.store);
        vec![mutation(
            "restore spell slots",
            self.character.id,
            async move { store.update_spellcasting(sc).await },
            Refresh::Spellcasting,
            |_| "Spell slots restored".to_string(),
            "Error saving spellcasting",
        )]
    }

    // ------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------

    fn load_failed(&mut self, what: &str, error: StoreError) -> Vec<Command> {
        warn!("Failed to load {} for {}: {}", what, self.character.id, error);
        self.show_status(Status::error(format!("Failed to load {what}")))
    }

    fn apply(&mut self, update: SheetUpdate) -> Vec<Command> {
        match update {
            SheetUpdate::Attacks(Ok(rows)) => {
                self.attacks_table.set_rows(rows.iter().map(data::attack_row).collect());
            }
            SheetUpdate::Actions(Ok(rows)) => {
                self.actions_table.set_rows(rows.iter().map(data::action_row).collect());
            }
            SheetUpdate::Inventory(Ok(rows)) => {
                self.inventory_table.set_rows(rows.iter().map(data::inventory_row).collect());
                self.inventory = rows;
            }
            SheetUpdate::MagicItems(Ok(rows)) => {
                self.magic_items_table.set_rows(rows.iter().map(data::magic_item_row).collect());
                self.magic_items = rows;
            }
            SheetUpdate::Spells(Ok(rows)) => {
                self.spells_table.set_rows(rows.iter().map(data::spell_row).collect());
            }
            SheetUpdate::Features(Ok(rows)) => {
                self.features_table.set_rows(rows.iter().map(data::feature_row).collect());
            }
            SheetUpdate::Currency(Ok(currency)) => self.currency = currency,
            SheetUpdate::Spellcasting(Ok(sc)) => self.spellcasting = sc,
            SheetUpdate::Details(Ok(details)) => self.details = details,

            SheetUpdate::Attacks(Err(e)) => {
                self.attacks_table.set_rows(Vec::new());
                return self.load_failed("attacks", e);
            }
            SheetUpdate::Actions(Err(e)) => {
                self.actions_table.set_rows(Vec::new());
                return self.load_failed("actions", e);
            }
            SheetUpdate::Inventory(Err(e)) => {
                self.inventory.clear();
                self.inventory_table.set_rows(Vec::new());
                return self.load_failed("inventory", e);
            }
            SheetUpdate::MagicItems(Err(e)) => {
                self.magic_items.clear();
                self.magic_items_table.set_rows(Vec::new());
                return self.load_failed("magic items", e);
            }
            SheetUpdate::Spells(Err(e)) => {
                self.spells_table.set_rows(Vec::new());
                return self.load_failed("spells", e);
            }
            SheetUpdate::Features(Err(e)) => {
                self.features_table.set_rows(Vec::new());
                return self.load_failed("features", e);
            }
            SheetUpdate::Currency(Err(e)) => {
                self.currency = None;
                return self.load_failed("currency", e);
            }
            SheetUpdate::Spellcasting(Err(e)) => {
                self.spellcasting = None;
                return self.load_failed("spellcasting", e);
            }
            SheetUpdate::Details(Err(e)) => {
                self.details = None;
                return self.load_failed("details", e);
            }

            SheetUpdate::SaveFailed(text) => {
                if self.mode.is_numeric() {
                    self.hp_input.blur();
                    self.mode = Mode::View;
                }
                self.hp_saving = false;
                return self.show_status(Status::error(text));
            }
            SheetUpdate::Mutated { status, refresh } => {
                let mut cmds = self.show_status(status);
                cmds.extend(self.reload(refresh));
                return cmds;
            }
            SheetUpdate::BackgroundSaved(Ok((details, character))) => {
                self.details = Some(details);
                self.set_character(character);
                return self.show_status(Status::ok("Background saved"));
            }
            SheetUpdate::BackgroundSaved(Err(e)) => {
                warn!("Background save failed for {}: {}", self.character.id, e);
                return self.show_status(Status::error(e));
            }
            SheetUpdate::Status(status) => return self.show_status(status),
            SheetUpdate::ClearStatus => self.status = None,
        }
        Vec::new()
    }
}

impl Screen for SheetScreen {
    fn init(&mut self) -> Vec<Command> {
        data::load_all(&self.store, self.character.id)
    }

    fn update(&mut self, msg: Message) -> Vec<Command> {
        match msg {
            Message::Key(key) => self.handle_key(key),
            Message::Tick => {
                self.hp_input.tick();
                if let Some(modal) = self.modal.as_mut() {
                    modal.tick();
                }
                Vec::new()
            }
            Message::CharacterUpdated(character) if character.id == self.character.id => {
                self.set_character(character);
                self.hp_saving = false;
                if self.mode.is_numeric() || matches!(self.mode, Mode::EditNotes | Mode::EditFeatures) {
                    self.hp_input.blur();
                    self.notes_input.blur();
                    self.features_input.blur();
                    self.mode = Mode::View;
                }
                Vec::new()
            }
            Message::Sheet { character_id, update } => {
                if character_id != self.character.id {
                    debug!("Dropping sheet result for {} while showing {}", character_id, self.character.id);
                    return Vec::new();
                }
                self.apply(update)
            }
            _ => Vec::new(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.render_sheet(frame, area);
    }

    /// The long single-table tabs grow with the terminal.
    fn resize(&mut self, _width: u16, height: u16) {
        let rows = usize::from(height.saturating_sub(TAB_CHROME)).clamp(5, 20);
        self.skills_table.set_visible_rows(rows.min(SKILLS.len()));
        self.spells_table.set_visible_rows(rows);
        self.features_table.set_visible_rows(rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemoryStore;
    use crate::core::model::{NewAttack, NewCharacter, NewSpell, SpellSlot};
    use crate::tui::screens::testing::render_text;

    async fn sheet_with(current: i32, max: i32) -> (Arc<MemoryStore>, SheetScreen) {
        let store = Arc::new(MemoryStore::new());
        let mut character = store
            .create_character(NewCharacter::level_one(
                Uuid::new_v4(),
                "Aria",
                "Human",
                "Fighter",
                "Soldier",
                "Lawful Good",
                [16, 14, 13, 12, 10, 8],
                vec!["Athletics".to_string(), "Perception".to_string()],
            ))
            .await
            .unwrap();
        character.current_hit_points = current;
        character.max_hit_points = max;
        let character = store.update_character(character).await.unwrap();
        let sheet = SheetScreen::new(store.clone(), character, Arc::new(Theme::default()));
        (store, sheet)
    }

    /// Run every command and feed the results back, one round.
    async fn settle(sheet: &mut SheetScreen, cmds: Vec<Command>) -> Vec<Command> {
        let mut next = Vec::new();
        for cmd in cmds {
            if cmd.delay().is_some() {
                continue;
            }
            let msg = cmd.resolve().await;
            next.extend(sheet.update(msg));
        }
        next
    }

    fn press(sheet: &mut SheetScreen, key: Key) -> Vec<Command> {
        sheet.update(Message::Key(key))
    }

    fn type_str(sheet: &mut SheetScreen, s: &str) {
        for c in s.chars() {
            press(sheet, Key::Char(c));
        }
    }

    fn go_to(sheet: &mut SheetScreen, tab: Tab) {
        while sheet.tab() != tab {
            press(sheet, Key::Tab);
        }
    }

    #[test]
    fn test_tab_cycling_wraps() {
        assert_eq!(Tab::Notes.next(), Tab::Core);
        assert_eq!(Tab::Core.prev(), Tab::Notes);
        assert_eq!(Tab::Spells.next(), Tab::Inventory);
    }

    #[tokio::test]
    async fn test_tab_keys_wrap_both_ways() {
        let (_, mut sheet) = sheet_with(10, 10).await;
        go_to(&mut sheet, Tab::Notes);
        press(&mut sheet, Key::Right);
        assert_eq!(sheet.tab(), Tab::Core);
        press(&mut sheet, Key::BackTab);
        assert_eq!(sheet.tab(), Tab::Notes);
    }

    #[test]
    fn test_resolve_hp_clamps() {
        assert_eq!(resolve_hp(Mode::EditDamage, 5, 20, 100), 0);
        assert_eq!(resolve_hp(Mode::EditHeal, 18, 20, 10), 20);
        assert_eq!(resolve_hp(Mode::EditHp, 5, 20, 99), 20);
        assert_eq!(resolve_hp(Mode::EditHp, 5, 20, -4), 0);
        assert_eq!(resolve_hp(Mode::EditDamage, 5, 20, -3), 5);
    }

    #[tokio::test]
    async fn test_damage_floors_at_zero() {
        let (_, mut sheet) = sheet_with(5, 20).await;
        go_to(&mut sheet, Tab::Combat);
        press(&mut sheet, Key::Char('-'));
        assert_eq!(sheet.mode(), Mode::EditDamage);
        type_str(&mut sheet, "100");
        let cmds = press(&mut sheet, Key::Enter);
        assert_eq!(sheet.mode(), Mode::EditDamage);
        settle(&mut sheet, cmds).await;
        assert_eq!(sheet.character().current_hit_points, 0);
        assert_eq!(sheet.mode(), Mode::View);
    }

    #[tokio::test]
    async fn test_repeated_enter_issues_one_hp_save() {
        let (_, mut sheet) = sheet_with(10, 20).await;
        go_to(&mut sheet, Tab::Combat);
        press(&mut sheet, Key::Char('-'));
        type_str(&mut sheet, "4");
        let cmds = press(&mut sheet, Key::Enter);
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].label(), "update hit points");
        assert!(press(&mut sheet, Key::Enter).is_empty());
        assert_eq!(sheet.mode(), Mode::EditDamage);

        settle(&mut sheet, cmds).await;
        assert_eq!(sheet.character().current_hit_points, 6);
        assert_eq!(sheet.mode(), Mode::View);

        press(&mut sheet, Key::Char('-'));
        type_str(&mut sheet, "1");
        assert_eq!(press(&mut sheet, Key::Enter).len(), 1);
    }

    #[tokio::test]
    async fn test_heal_caps_at_max() {
        let (_, mut sheet) = sheet_with(18, 20).await;
        go_to(&mut sheet, Tab::Combat);
        press(&mut sheet, Key::Char('='));
        type_str(&mut sheet, "10");
        let cmds = press(&mut sheet, Key::Enter);
        settle(&mut sheet, cmds).await;
        assert_eq!(sheet.character().current_hit_points, 20);
    }

    #[tokio::test]
    async fn test_unparseable_hp_counts_as_zero() {
        let (_, mut sheet) = sheet_with(7, 20).await;
        go_to(&mut sheet, Tab::Combat);
        press(&mut sheet, Key::Char('e'));
        assert_eq!(sheet.mode(), Mode::EditHp);
        // "7" is prefilled; clear it
        press(&mut sheet, Key::Backspace);
        let cmds = press(&mut sheet, Key::Enter);
        settle(&mut sheet, cmds).await;
        assert_eq!(sheet.character().current_hit_points, 0);
    }

    #[tokio::test]
    async fn test_hp_save_failure_returns_to_view() {
        let (_, mut sheet) = sheet_with(7, 20).await;
        go_to(&mut sheet, Tab::Combat);
        press(&mut sheet, Key::Char('-'));
        let id = sheet.character_id();
        let cmds = sheet.update(Message::Sheet {
            character_id: id,
            update: SheetUpdate::SaveFailed("Failed to update HP".into()),
        });
        assert_eq!(sheet.mode(), Mode::View);
        assert_eq!(sheet.status(), Some(&Status::error("Failed to update HP")));
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].delay(), Some(STATUS_DURATION));
    }

    #[tokio::test]
    async fn test_spell_filter_toggles_back_to_all() {
        let (store, mut sheet) = sheet_with(10, 10).await;
        let id = sheet.character_id();
        for (name, level) in [("Fire Bolt", 0), ("Fireball", 3), ("Counterspell", 3), ("Shield", 1)] {
            store
                .create_spell(id, NewSpell { name: name.into(), level, ..Default::default() })
                .await
                .unwrap();
        }
        let cmds = sheet.init();
        settle(&mut sheet, cmds).await;
        assert_eq!(sheet.spells_table().row_count(), 4);

        go_to(&mut sheet, Tab::Spells);
        let cmds = press(&mut sheet, Key::Char('3'));
        assert_eq!(sheet.spell_filter(), Some(3));
        settle(&mut sheet, cmds).await;
        assert_eq!(sheet.spells_table().row_count(), 2);

        let cmds = press(&mut sheet, Key::Char('3'));
        assert_eq!(sheet.spell_filter(), None);
        settle(&mut sheet, cmds).await;
        assert_eq!(sheet.spells_table().row_count(), 4);
    }

    #[tokio::test]
    async fn test_feature_filter_toggles() {
        let (_, mut sheet) = sheet_with(10, 10).await;
        go_to(&mut sheet, Tab::Features);
        press(&mut sheet, Key::Char('2'));
        assert_eq!(sheet.feature_filter(), Some(FeatureSource::Race));
        press(&mut sheet, Key::Char('4'));
        assert_eq!(sheet.feature_filter(), Some(FeatureSource::Feat));
        press(&mut sheet, Key::Char('4'));
        assert_eq!(sheet.feature_filter(), None);
    }

    #[tokio::test]
    async fn test_add_attack_through_modal() {
        let (_, mut sheet) = sheet_with(10, 10).await;
        go_to(&mut sheet, Tab::Combat);
        press(&mut sheet, Key::Char('a'));
        assert_eq!(sheet.mode(), Mode::AddAttack { editing: None });

        // required name blocks the save
        assert!(press(&mut sheet, Key::Ctrl('s')).is_empty());
        type_str(&mut sheet, "Longsword");
        press(&mut sheet, Key::Tab);
        type_str(&mut sheet, "+5");
        let cmds = press(&mut sheet, Key::Ctrl('s'));
        assert_eq!(sheet.mode(), Mode::View);
        assert!(sheet.modal().is_none());

        let reloads = settle(&mut sheet, cmds).await;
        assert_eq!(sheet.status(), Some(&Status::ok("Attack added")));
        settle(&mut sheet, reloads).await;
        let row = sheet.attacks_table().selected_row().unwrap();
        assert_eq!(row.data.name, "Longsword");
        assert_eq!(row.data.attack_bonus, Some(5));
    }

    #[tokio::test]
    async fn test_enter_edits_and_d_deletes_attack() {
        let (store, mut sheet) = sheet_with(10, 10).await;
        let id = sheet.character_id();
        store
            .create_attack(id, NewAttack { name: "Dagger".into(), ..Default::default() })
            .await
            .unwrap();
        let cmds = sheet.init();
        settle(&mut sheet, cmds).await;
        go_to(&mut sheet, Tab::Combat);

        press(&mut sheet, Key::Enter);
        assert!(matches!(sheet.mode(), Mode::AddAttack { editing: Some(_) }));
        assert_eq!(sheet.modal().map(|m| m.title()), Some("Edit Attack"));
        type_str(&mut sheet, "!");
        let cmds = press(&mut sheet, Key::Ctrl('s'));
        let reloads = settle(&mut sheet, cmds).await;
        settle(&mut sheet, reloads).await;
        assert_eq!(sheet.status().map(|s| s.text.as_str()), Some("Attack updated"));
        assert_eq!(sheet.attacks_table().rows()[0].data.name, "Dagger!");

        let cmds = press(&mut sheet, Key::Char('d'));
        let reloads = settle(&mut sheet, cmds).await;
        settle(&mut sheet, reloads).await;
        assert_eq!(sheet.attacks_table().row_count(), 0);
        assert!(store.list_attacks(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_spend_slot_until_exhausted() {
        let (store, mut sheet) = sheet_with(10, 10).await;
        let id = sheet.character_id();
        let mut sc = Spellcasting { character_id: id, ..Default::default() };
        sc.slots[0] = SpellSlot { max: 1, used: 0 };
        store.update_spellcasting(sc).await.unwrap();
        store
            .create_spell(id, NewSpell { name: "Shield".into(), level: 1, ..Default::default() })
            .await
            .unwrap();
        let cmds = sheet.init();
        settle(&mut sheet, cmds).await;
        go_to(&mut sheet, Tab::Spells);

        let cmds = press(&mut sheet, Key::Char('u'));
        let reloads = settle(&mut sheet, cmds).await;
        settle(&mut sheet, reloads).await;
        assert_eq!(sheet.status().map(|s| s.text.as_str()), Some("Used a level 1 slot"));

        press(&mut sheet, Key::Char('u'));
        assert_eq!(sheet.status(), Some(&Status::error("No level 1 slots left")));

        let cmds = press(&mut sheet, Key::Char('U'));
        let reloads = settle(&mut sheet, cmds).await;
        settle(&mut sheet, reloads).await;
        let stored = store.get_spellcasting(id).await.unwrap().unwrap();
        assert_eq!(stored.slots[0].used, 0);
    }

    #[tokio::test]
    async fn test_stale_results_are_dropped() {
        let (_, mut sheet) = sheet_with(10, 10).await;
        let cmds = sheet.update(Message::Sheet {
            character_id: Uuid::new_v4(),
            update: SheetUpdate::Status(Status::ok("elsewhere")),
        });
        assert!(cmds.is_empty());
        assert!(sheet.status().is_none());
    }

    #[tokio::test]
    async fn test_status_clears_on_timer_message() {
        let (_, mut sheet) = sheet_with(10, 10).await;
        let cmds = press(&mut sheet, Key::Char('r'));
        assert!(sheet.status().unwrap().text.starts_with("Rolled d20: "));
        let clear = cmds.into_iter().next().unwrap();
        assert_eq!(clear.label(), "timer");
        let msg = clear.resolve().await;
        sheet.update(msg);
        assert!(sheet.status().is_none());
    }

    #[tokio::test]
    async fn test_earlier_clear_erases_newer_status() {
        let (_, mut sheet) = sheet_with(10, 10).await;
        let id = sheet.character_id();
        let show = |text: &str| Message::Sheet {
            character_id: id,
            update: SheetUpdate::Status(Status::ok(text)),
        };

        let first = sheet.update(show("Attack added"));
        let second = sheet.update(show("Spell added"));
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].delay(), Some(STATUS_DURATION));
        assert_eq!(sheet.status().map(|s| s.text.as_str()), Some("Spell added"));

        let clear = first.into_iter().next().unwrap().resolve().await;
        sheet.update(clear);
        assert!(sheet.status().is_none());
    }

    #[tokio::test]
    async fn test_notes_edit_saves_text() {
        let (_, mut sheet) = sheet_with(10, 10).await;
        go_to(&mut sheet, Tab::Notes);
        press(&mut sheet, Key::Char('e'));
        assert_eq!(sheet.mode(), Mode::EditNotes);
        type_str(&mut sheet, "Owes the guild 5 gp");
        // tab keys belong to the editor while editing
        press(&mut sheet, Key::Tab);
        assert_eq!(sheet.tab(), Tab::Notes);

        let cmds = press(&mut sheet, Key::Ctrl('s'));
        settle(&mut sheet, cmds).await;
        assert_eq!(sheet.mode(), Mode::View);
        assert_eq!(sheet.character().notes, "Owes the guild 5 gp    ");
    }

    #[tokio::test]
    async fn test_background_modal_saves_details() {
        let (store, mut sheet) = sheet_with(10, 10).await;
        go_to(&mut sheet, Tab::Background);
        press(&mut sheet, Key::Char('e'));
        assert_eq!(sheet.mode(), Mode::EditBackground);
        let cmds = press(&mut sheet, Key::Ctrl('s'));
        settle(&mut sheet, cmds).await;
        assert_eq!(sheet.status(), Some(&Status::ok("Background saved")));
        let details = store.get_details(sheet.character_id()).await.unwrap().unwrap();
        assert_eq!(details.size.as_deref(), Some("Medium"));
    }

    #[tokio::test]
    async fn test_help_overlay_opens_and_closes() {
        let (_, mut sheet) = sheet_with(10, 10).await;
        press(&mut sheet, Key::Char('?'));
        assert_eq!(sheet.mode(), Mode::Help);
        let text = render_text(&mut sheet, 100, 40);
        assert!(text.contains("Keyboard Shortcuts"));
        assert!(text.contains("Press ? or Esc to close"));
        press(&mut sheet, Key::Char(' '));
        assert_eq!(sheet.mode(), Mode::View);
    }

    #[tokio::test]
    async fn test_render_core_and_combat() {
        let (_, mut sheet) = sheet_with(5, 20).await;
        let text = render_text(&mut sheet, 120, 50);
        assert!(text.contains("Aria - Level 1 Human Fighter"));
        assert!(text.contains(" Core  Combat  Spells "));
        assert!(text.contains("STR 16   +3"));
        assert!(text.contains("● STR  +5"));
        assert!(text.contains("Proficiency Bonus: +2"));

        go_to(&mut sheet, Tab::Combat);
        let text = render_text(&mut sheet, 120, 50);
        assert!(text.contains("HP: 5/20  |  AC: 10  |  Init: +2  |  Speed: 30 ft  |  HD: 1d10"));
        assert!(text.contains("[1:Attacks]  2:Actions "));
        assert!(text.contains("No attacks - press 'a' to add"));
    }

    #[tokio::test]
    async fn test_render_spells_without_spellcasting() {
        let (_, mut sheet) = sheet_with(10, 10).await;
        go_to(&mut sheet, Tab::Spells);
        let text = render_text(&mut sheet, 120, 50);
        assert!(text.contains("No spellcasting ability"));
        assert!(text.contains(" [All]"));
        assert!(text.contains("All Spells"));
        press(&mut sheet, Key::Char('0'));
        let text = render_text(&mut sheet, 120, 50);
        assert!(text.contains("[C]"));
        assert!(text.contains("Cantrips"));
    }
}
