//! Rendering for the sheet: one `Vec<Line>` per tab, framed by the
//! header, tab bar, status and help, centered in the frame. The notes
//! editors and the overlays are the only parts drawn as widgets.

use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph};

use crate::core::model::FeatureSource;
use crate::core::rules::{self, Ability, format_modifier};
use crate::tui::component::Component;
use crate::tui::components::TextArea;
use crate::tui::components::widgets::{centered_fixed, fit_width, key_value, slot_tracker};
use crate::tui::screens::render_centered;
use crate::tui::screens::sheet::data::total_weight;
use crate::tui::screens::sheet::{CombatFocus, InventoryFocus, Mode, SheetScreen, Tab};
use crate::tui::theme::Theme;

const COLUMN_WIDTH: usize = 18;
const LABEL_WIDTH: usize = 12;
const EDITOR_HEIGHT: u16 = 10;
const EDITOR_WIDTH: u16 = 72;
const HELP_WIDTH: u16 = 50;

const FEATURE_FILTERS: [(FeatureSource, &str); 4] = [
    (FeatureSource::Class, "Class"),
    (FeatureSource::Race, "Race"),
    (FeatureSource::Background, "Background"),
    (FeatureSource::Feat, "Feats"),
];

const HELP_OVERLAY: &[(&str, &[&str])] = &[
    (
        "Global",
        &[
            "  tab / ← →     Switch tabs",
            "  q / esc       Back to character list",
            "  r             Roll a d20",
            "  ?             Show this help",
        ],
    ),
    (
        "Navigation",
        &[
            "  j / ↓         Move down in list",
            "  k / ↑         Move up in list",
            "  g / Home      Go to first item",
            "  G / End       Go to last item",
            "  PgUp/PgDn     Page up/down",
            "  enter         Edit selected row",
        ],
    ),
    (
        "Tab-Specific",
        &[
            "  Combat:     -: damage, +: heal, e: set HP, 1/2: tabs, a: add",
            "  Spells:     0-9: filter, a: add, d: delete, p: prepared",
            "              u/U: use/restore slot, s: spellcasting",
            "  Inventory:  1/2: switch tables, a: add, c: currency",
            "              e: equip / attune",
            "  Features:   1-4: filter by type, a: add",
            "  Background: e: edit details",
            "  Notes:      e: edit notes, f: edit features",
        ],
    ),
    (
        "Editing",
        &["  Ctrl+S        Save changes", "  Esc           Cancel editing"],
    ),
];

fn header(theme: &Theme, text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), theme.header))
}

fn muted(theme: &Theme, text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), theme.muted_text))
}

/// `"  Label: value"` with the label right-aligned.
fn field(theme: &Theme, label: &str, value: impl Into<String>) -> Line<'static> {
    let mut line = key_value(label, value, LABEL_WIDTH, theme);
    line.spans.insert(0, Span::raw("  "));
    line
}

fn ordinal(n: usize) -> String {
    let suffix = match n {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Text split on newlines, one line each.
fn paragraph(theme: &Theme, text: &str) -> Vec<Line<'static>> {
    text.lines().map(|l| Line::from(Span::styled(l.to_string(), theme.text))).collect()
}

impl SheetScreen {
    pub(super) fn render_sheet(&mut self, frame: &mut Frame, area: Rect) {
        let theme = Arc::clone(&self.theme);
        let head = self.head_lines(&theme);
        let foot = self.foot_lines(&theme);

        let editing = match self.mode {
            Mode::EditFeatures => Some(true),
            Mode::EditNotes => Some(false),
            _ => None,
        };
        match editing {
            Some(features) if self.tab == Tab::Notes => self.render_editor(frame, area, head, foot, features),
            _ => {
                let mut lines = head;
                lines.extend(self.tab_lines(&theme));
                lines.extend(foot);
                render_centered(frame, area, lines);
            }
        }

        if self.mode == Mode::Help {
            render_help(frame, area, &theme);
        }
        if let Some(modal) = self.modal.as_mut() {
            modal.render(frame, area);
        }
    }

    fn head_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let c = &self.character;
        let tabs: Vec<Span<'static>> = Tab::ALL
            .iter()
            .map(|&t| {
                let style = if t == self.tab { theme.button_focused } else { theme.button };
                Span::styled(format!(" {} ", t.title()), style)
            })
            .collect();
        vec![
            Line::from(Span::styled(
                format!("{} - Level {} {} {}", c.name, c.level, c.race, c.class),
                theme.title,
            )),
            Line::default(),
            Line::from(tabs),
            Line::default(),
        ]
    }

    fn foot_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        if let Some(status) = &self.status {
            lines.push(Line::default());
            lines.push(if status.is_error {
                Line::from(Span::styled(format!("✗ {}", status.text), theme.error_text))
            } else {
                Line::from(Span::styled(format!("✓ {}", status.text), theme.success_text))
            });
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(self.help_text(), theme.help)));
        lines
    }

    fn tab_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        match self.tab {
            Tab::Core => self.core_lines(theme),
            Tab::Combat => self.combat_lines(theme),
            Tab::Spells => self.spells_lines(theme),
            Tab::Inventory => self.inventory_lines(theme),
            Tab::Features => self.features_lines(theme),
            Tab::Background => self.background_lines(theme),
            Tab::Notes => {
                let mut lines = self.features_text_lines(theme);
                lines.push(Line::default());
                lines.extend(self.notes_text_lines(theme));
                lines
            }
        }
    }

    fn core_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let c = &self.character;
        let mut lines = vec![
            Line::from(vec![
                Span::styled(fit_width("Ability Scores", COLUMN_WIDTH), theme.header),
                Span::styled("Saving Throws", theme.header),
            ]),
            Line::default(),
        ];
        for ability in Ability::ALL {
            let score = format!(
                "  {:<3} {:>2}  {:>3}",
                ability.abbr(),
                c.score(ability),
                format_modifier(c.modifier(ability))
            );
            let (mark, mark_style) = if c.has_save_proficiency(ability) {
                ("●", theme.proficient)
            } else {
                ("○", theme.muted_text)
            };
            lines.push(Line::from(vec![
                Span::styled(fit_width(&score, COLUMN_WIDTH), theme.stat_value),
                Span::raw("  "),
                Span::styled(mark, mark_style),
                Span::styled(
                    format!(" {:<3} {:>3}", ability.abbr(), format_modifier(c.saving_throw(ability))),
                    theme.text,
                ),
            ]));
        }
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("Proficiency Bonus: ", theme.text),
            Span::styled(format_modifier(c.proficiency_bonus()), theme.stat_value),
        ]));
        lines.push(Line::default());
        lines.push(header(theme, "Skills"));
        lines.push(Line::default());
        lines.extend(self.skills_table.lines());
        lines
    }

    fn combat_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let c = &self.character;
        let hp_style = theme.hp_style(c.current_hit_points, c.max_hit_points);

        let mut hp: Vec<Span<'static>> = vec![Span::raw("  HP: ")];
        if self.mode == Mode::EditHp {
            hp.extend(self.hp_input.line(6).spans);
            hp.push(Span::raw(format!("/{}", c.max_hit_points)));
        } else {
            hp.push(Span::styled(c.current_hit_points.to_string(), hp_style));
            hp.push(Span::raw(format!("/{}", c.max_hit_points)));
            if c.temporary_hit_points > 0 {
                hp.push(Span::styled(format!("+{}", c.temporary_hit_points), theme.stat_mod));
            }
            match self.mode {
                Mode::EditDamage => {
                    hp.push(Span::styled(" -", theme.error_text));
                    hp.extend(self.hp_input.line(6).spans);
                }
                Mode::EditHeal => {
                    hp.push(Span::styled(" +", theme.success_text));
                    hp.extend(self.hp_input.line(6).spans);
                }
                _ => {}
            }
        }
        hp.push(Span::raw(format!(
            "  |  AC: {}  |  Init: {}  |  Speed: {} ft  |  HD: {}",
            c.armor_class,
            format_modifier(c.initiative()),
            c.speed,
            c.hit_dice()
        )));

        let attacks = self.combat_focus == CombatFocus::Attacks;
        let sub_tabs = Line::from(vec![
            if attacks {
                Span::styled("[1:Attacks]", theme.button_focused)
            } else {
                Span::styled(" 1:Attacks ", theme.button)
            },
            Span::raw(" "),
            if attacks {
                Span::styled(" 2:Actions ", theme.button)
            } else {
                Span::styled("[2:Actions]", theme.button_focused)
            },
        ]);

        let mut lines = vec![header(theme, "Combat Stats"), Line::default(), Line::from(hp), Line::default(), sub_tabs, Line::default()];
        lines.extend(if attacks { self.attacks_table.lines() } else { self.actions_table.lines() });
        lines
    }

    fn spells_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        match &self.spellcasting {
            Some(sc) => {
                let dash = || "—".to_string();
                let class = sc.spellcasting_class.clone().unwrap_or_else(|| "Unknown".to_string());
                let ability = sc
                    .spellcasting_ability
                    .as_deref()
                    .map(|a| a.chars().take(3).collect::<String>().to_uppercase())
                    .unwrap_or_else(dash);
                let dc = sc.spell_save_dc.map(|d| d.to_string()).unwrap_or_else(dash);
                let attack = sc.spell_attack_bonus.map(format_modifier).unwrap_or_else(dash);
                lines.push(Line::from(vec![
                    Span::styled(class, theme.stat_value),
                    Span::raw(" | "),
                    Span::styled(ability, theme.muted_text),
                    Span::raw(" | Save DC: "),
                    Span::styled(dc, theme.stat_value),
                    Span::raw(" | Attack: "),
                    Span::styled(attack, theme.stat_value),
                ]));
                lines.push(Line::default());
                lines.push(header(theme, "Spell Slots"));
                lines.push(Line::default());
                if !sc.has_slots() {
                    lines.push(muted(theme, "  No spell slots"));
                }
                for (i, slot) in sc.slots.iter().enumerate().filter(|(_, s)| s.max > 0) {
                    lines.push(Line::from(vec![
                        Span::raw(format!("  {}: ", ordinal(i + 1))),
                        Span::styled(slot_tracker(slot.used, slot.max), theme.stat_value),
                    ]));
                }
            }
            None => lines.push(muted(theme, "No spellcasting ability")),
        }

        lines.push(Line::default());
        let mut filters: Vec<Span<'static>> = (0..10)
            .map(|level: i32| {
                let name = if level == 0 { "C".to_string() } else { level.to_string() };
                match self.spell_filter {
                    Some(f) if f == level => Span::styled(format!("[{name}]"), theme.button_focused),
                    None => Span::styled(format!(" {name} "), theme.button),
                    Some(_) => Span::styled(format!(" {name} "), theme.muted_text),
                }
            })
            .collect();
        if self.spell_filter.is_none() {
            filters.push(Span::raw(" "));
            filters.push(Span::styled("[All]", theme.button_focused));
        }
        lines.push(Line::from(filters));
        lines.push(Line::default());

        let label = match self.spell_filter {
            None => "All Spells".to_string(),
            Some(0) => "Cantrips".to_string(),
            Some(level) => format!("Level {level} Spells"),
        };
        lines.push(header(theme, label));
        lines.push(Line::default());
        lines.extend(self.spells_table.lines());
        lines
    }

    fn inventory_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let coins = self.currency.clone().unwrap_or_default();
        let mut currency = vec![Span::raw("  ")];
        for (i, (abbr, amount)) in [
            ("CP", coins.copper),
            ("SP", coins.silver),
            ("EP", coins.electrum),
            ("GP", coins.gold),
            ("PP", coins.platinum),
        ]
        .into_iter()
        .enumerate()
        {
            if i > 0 {
                currency.push(Span::raw("  "));
            }
            currency.push(Span::raw(format!("{abbr}: ")));
            currency.push(Span::styled(amount.to_string(), theme.stat_value));
        }

        let weight = total_weight(&self.inventory, &self.magic_items);
        let equipment = self.inventory_focus == InventoryFocus::Equipment;

        let mut lines = vec![
            header(theme, "Currency"),
            Line::default(),
            Line::from(currency),
            Line::from(vec![
                Span::raw("  Total Weight: "),
                Span::styled(format!("{weight:.1}"), theme.stat_value),
                Span::raw(" lbs"),
            ]),
            Line::default(),
            header(theme, if equipment { "▶ Equipment" } else { "Equipment" }),
            Line::default(),
        ];
        lines.extend(self.inventory_table.lines());
        lines.push(Line::default());
        lines.push(header(theme, if equipment { "Magic Items" } else { "▶ Magic Items" }));
        lines.push(Line::default());
        lines.extend(self.magic_items_table.lines());
        lines
    }

    fn features_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let button = |label: String, active: bool| {
            if active {
                Span::styled(format!("[{label}]"), theme.button_focused)
            } else {
                Span::styled(format!(" {label} "), theme.button)
            }
        };
        let mut filters = vec![button("All".to_string(), self.feature_filter.is_none())];
        for (i, (source, label)) in FEATURE_FILTERS.iter().enumerate() {
            filters.push(button(format!("{}:{}", i + 1, label), self.feature_filter == Some(*source)));
        }

        let mut lines = vec![
            Line::from(filters),
            Line::default(),
            header(theme, "Features & Traits"),
            Line::default(),
        ];
        lines.extend(self.features_table.lines());
        lines
    }

    fn background_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let c = &self.character;
        let next_level_xp = rules::xp_for_level((c.level + 1).min(20));

        let mut lines = vec![
            header(theme, "Character Info"),
            Line::default(),
            field(theme, "Name", c.name.clone()),
            field(theme, "Race", c.race.clone()),
            field(theme, "Class", c.class.clone()),
            field(theme, "Level", c.level.to_string()),
            field(theme, "Experience", format!("{} / {}", c.experience_points, next_level_xp)),
        ];
        if let Some(background) = &c.background {
            lines.push(field(theme, "Background", background.clone()));
        }
        if let Some(alignment) = &c.alignment {
            lines.push(field(theme, "Alignment", alignment.clone()));
        }

        let Some(d) = &self.details else {
            lines.push(Line::default());
            lines.push(muted(theme, "No detailed background information available"));
            return lines;
        };

        lines.push(Line::default());
        lines.push(header(theme, "Physical Traits"));
        lines.push(Line::default());
        let physical = [
            ("Size", &d.size),
            ("Gender", &d.gender),
            ("Age", &d.age),
            ("Height", &d.height),
            ("Weight", &d.weight),
            ("Eyes", &d.eyes),
            ("Hair", &d.hair),
            ("Skin", &d.skin),
            ("Faith/Deity", &d.faith),
        ];
        for (label, value) in physical {
            if let Some(value) = value {
                lines.push(field(theme, label, value.clone()));
            }
        }

        lines.push(Line::default());
        lines.push(header(theme, "Personality"));
        lines.push(Line::default());
        let personality = [
            ("Traits", &d.personality_traits),
            ("Ideals", &d.ideals),
            ("Bonds", &d.bonds),
            ("Flaws", &d.flaws),
        ];
        for (label, value) in personality {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {label}: "), theme.muted_text),
                    Span::styled(value.to_string(), theme.text),
                ]));
            }
        }

        for (title, value) in [("Backstory", &d.backstory), ("Allies & Organizations", &d.allies)] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                lines.push(Line::default());
                lines.push(header(theme, title));
                lines.push(Line::default());
                lines.extend(paragraph(theme, value).into_iter().map(|mut l| {
                    l.spans.insert(0, Span::raw("  "));
                    l
                }));
            }
        }
        lines
    }

    fn features_text_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let mut lines = vec![header(theme, "Features & Traits"), Line::default()];
        if self.character.features_traits.is_empty() {
            lines.push(muted(theme, "No features or traits recorded."));
        } else {
            lines.extend(paragraph(theme, &self.character.features_traits));
        }
        lines
    }

    fn notes_text_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let mut lines = vec![header(theme, "Notes"), Line::default()];
        if self.character.notes.is_empty() {
            lines.push(muted(theme, "No notes recorded."));
        } else {
            lines.extend(paragraph(theme, &self.character.notes));
        }
        lines
    }

    /// Notes tab with one of its two texts replaced by a live editor.
    fn render_editor(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        head: Vec<Line<'static>>,
        foot: Vec<Line<'static>>,
        features: bool,
    ) {
        let theme = Arc::clone(&self.theme);
        let mut before = head;
        let mut after = Vec::new();
        if features {
            before.push(header(&theme, "Features & Traits"));
            before.push(Line::default());
            after.push(Line::default());
            after.extend(self.notes_text_lines(&theme));
        } else {
            before.extend(self.features_text_lines(&theme));
            before.push(Line::default());
            before.push(header(&theme, "Notes"));
            before.push(Line::default());
        }
        after.extend(foot);

        let text_width = before.iter().chain(&after).map(Line::width).max().unwrap_or(0) as u16;
        let width = text_width.max(EDITOR_WIDTH).min(area.width);
        let height = (before.len() + after.len()) as u16 + EDITOR_HEIGHT;
        let block = centered_fixed(width, height.min(area.height), area);

        let [top, editor, bottom] = Layout::vertical([
            Constraint::Length(before.len() as u16),
            Constraint::Length(EDITOR_HEIGHT),
            Constraint::Min(0),
        ])
        .areas(block);

        frame.render_widget(Paragraph::new(before), top);
        let input: &mut TextArea = if features { &mut self.features_input } else { &mut self.notes_input };
        input.render(frame, editor);
        frame.render_widget(Paragraph::new(after), bottom);
    }

    pub(super) fn help_text(&self) -> String {
        match self.mode {
            Mode::EditHp => "enter: save • esc: cancel".to_string(),
            Mode::EditDamage => "enter: apply damage • esc: cancel".to_string(),
            Mode::EditHeal => "enter: apply healing • esc: cancel".to_string(),
            Mode::EditNotes | Mode::EditFeatures => "ctrl+s: save • esc: cancel".to_string(),
            Mode::Help => "?/esc: close help".to_string(),
            Mode::View => {
                let tab = match self.tab {
                    Tab::Core => " • j/k: navigate skills",
                    Tab::Combat => " • -: damage • +: heal • e: set HP • 1: attacks • 2: actions • a: add",
                    Tab::Spells => " • 0-9: filter • a: add • d: delete • p: toggle prepared • u: use slot",
                    Tab::Inventory => " • 1: equipment • 2: magic items • a: add • c: currency • j/k: navigate",
                    Tab::Features => " • 1-4: filter type • a: add • j/k: navigate",
                    Tab::Background => " • e: edit details",
                    Tab::Notes => " • e: edit notes • f: edit features",
                };
                format!("tab/←→: switch tabs • q/esc: back{tab} • ?: help")
            }
            _ => "tab: next field • ctrl+s: save • esc: cancel".to_string(),
        }
    }
}

fn render_help(frame: &mut Frame, area: Rect, theme: &Theme) {
    let mut lines = vec![Line::from(Span::styled("Keyboard Shortcuts", theme.title)), Line::default()];
    for (title, rows) in HELP_OVERLAY {
        lines.push(header(theme, *title));
        lines.extend(rows.iter().map(|r| Line::from(Span::styled(*r, theme.text))));
        lines.push(Line::default());
    }
    lines.push(Line::default());
    lines.push(muted(theme, "Press ? or Esc to close"));

    // borders 2 + vertical padding 2
    let height = (lines.len() as u16 + 4).min(area.height);
    let width = HELP_WIDTH.max(lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 6);
    let overlay = centered_fixed(width.min(area.width), height, area);

    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(theme.border_focused)
        .padding(Padding::new(2, 2, 1, 1));
    frame.render_widget(Clear, overlay);
    frame.render_widget(Paragraph::new(lines).block(block), overlay);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_suffixes() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(9), "9th");
    }

    #[test]
    fn test_field_right_aligns_label() {
        let theme = Theme::default();
        let line = field(&theme, "Name", "Aria");
        assert_eq!(line.to_string(), "         Name: Aria");
    }
}
