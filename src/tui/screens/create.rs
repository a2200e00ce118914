//! # Create Screen
//!
//! The new-character wizard:
//!
//! ```text
//!   Info → Race → Class → Method ─┬─ Roll ────┐
//!                                 ├─ Array ───┼─→ Skills → Review
//!                                 └─ PointBuy ┘
//! ```
//!
//! Esc always steps back one stage (the three ability stages all return to
//! Method, and so does Skills); from Info it leaves the wizard. Review
//! issues the "create character" command, which answers with
//! `CharacterCreated` on success or `Failed` with an inline error.

use std::sync::Arc;

use log::{debug, warn};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};

use crate::core::dice::{self, PointBuy};
use crate::core::model::{NewCharacter, User};
use crate::core::rules::{self, Ability};
use crate::core::store::CharacterStore;
use crate::tui::component::EventHandler;
use crate::tui::components::TextInput;
use crate::tui::event::Key;
use crate::tui::message::{Command, Message};
use crate::tui::screens::{Screen, error_line, help_line, render_centered};
use crate::tui::theme::Theme;

const PROGRESS: [&str; 6] = ["Info", "Race", "Class", "Abilities", "Skills", "Review"];
const NAME_LIMIT: usize = 100;
const NAME_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Info,
    Race,
    Class,
    Method,
    Roll,
    Array,
    PointBuy,
    Skills,
    Review,
}

impl Step {
    fn progress_index(self) -> usize {
        match self {
            Step::Info => 0,
            Step::Race => 1,
            Step::Class => 2,
            Step::Method | Step::Roll | Step::Array | Step::PointBuy => 3,
            Step::Skills => 4,
            Step::Review => 5,
        }
    }

    fn help(self) -> &'static str {
        match self {
            Step::Info => "↑/↓: field • ←/→: change • enter: continue • esc: back",
            Step::Race | Step::Class | Step::Method => "↑/↓: select • enter: confirm • esc: back",
            Step::Roll => {
                "↑/↓: select ability • 1-6: assign score • r: re-roll • enter: confirm • esc: back"
            }
            Step::Array => "↑/↓: select ability • 1-6: assign score • enter: confirm • esc: back",
            Step::PointBuy => "↑/↓: select • ←/→: adjust • enter: confirm • esc: back",
            Step::Skills => "↑/↓: navigate • space: toggle • enter: confirm • esc: back",
            Step::Review => "y: create • n: start over • esc: back",
        }
    }
}

/// How the six ability scores are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityMethod {
    Roll,
    StandardArray,
    PointBuy,
}

impl AbilityMethod {
    pub const ALL: [AbilityMethod; 3] = [
        AbilityMethod::Roll,
        AbilityMethod::StandardArray,
        AbilityMethod::PointBuy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AbilityMethod::Roll => "Roll 4d6 (drop lowest)",
            AbilityMethod::StandardArray => "Standard Array",
            AbilityMethod::PointBuy => "Point Buy",
        }
    }

    fn description(self) -> &'static str {
        match self {
            AbilityMethod::Roll => "Roll 4d6, drop the lowest, 6 times",
            AbilityMethod::StandardArray => "Use 15, 14, 13, 12, 10, 8",
            AbilityMethod::PointBuy => "27 points to spend (scores 8-15)",
        }
    }
}

/// Info-step field with keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfoField {
    Name,
    Background,
    Alignment,
}

pub struct CreateScreen {
    store: Arc<dyn CharacterStore>,
    user: User,
    theme: Arc<Theme>,

    step: Step,
    name: TextInput,
    info_field: InfoField,
    background: usize,
    alignment: usize,
    race: usize,
    class: usize,

    method_cursor: usize,
    method: Option<AbilityMethod>,
    /// Scores to hand out in Roll / Array mode.
    pool: Vec<i32>,
    /// Pool index assigned to each ability, in sheet order.
    assigned: [Option<usize>; 6],
    point_buy: PointBuy,
    ability_cursor: usize,

    skill_options: Vec<&'static str>,
    skill_count: usize,
    chosen_skills: Vec<&'static str>,
    skill_cursor: usize,

    creating: bool,
    error: Option<String>,
    width: u16,
    height: u16,
}

impl CreateScreen {
    pub fn new(store: Arc<dyn CharacterStore>, user: User, theme: Arc<Theme>) -> Self {
        let mut name = TextInput::new(Arc::clone(&theme))
            .with_placeholder("Character Name")
            .with_char_limit(NAME_LIMIT);
        name.focus();

        Self {
            store,
            user,
            theme,
            step: Step::Info,
            name,
            info_field: InfoField::Name,
            background: 0,
            alignment: 0,
            race: 0,
            class: 0,
            method_cursor: 0,
            method: None,
            pool: Vec::new(),
            assigned: [None; 6],
            point_buy: PointBuy::new(),
            ability_cursor: 0,
            skill_options: Vec::new(),
            skill_count: 0,
            chosen_skills: Vec::new(),
            skill_cursor: 0,
            creating: false,
            error: None,
            width: 80,
            height: 24,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pool(&self) -> &[i32] {
        &self.pool
    }

    pub fn chosen_skills(&self) -> &[&'static str] {
        &self.chosen_skills
    }

    fn race_name(&self) -> &'static str {
        rules::RACES[self.race].name
    }

    fn class_info(&self) -> &'static rules::ClassInfo {
        &rules::CLASSES[self.class]
    }

    /// Final scores in sheet order; unassigned slots count as 0.
    pub fn scores(&self) -> [i32; 6] {
        match self.method {
            Some(AbilityMethod::PointBuy) => self.point_buy.scores(),
            Some(_) => {
                let mut scores = [0; 6];
                for (score, slot) in scores.iter_mut().zip(self.assigned) {
                    if let Some(i) = slot {
                        *score = self.pool.get(i).copied().unwrap_or(0);
                    }
                }
                scores
            }
            None => [0; 6],
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn go_back(&mut self) -> Vec<Command> {
        self.step = match self.step {
            Step::Info => return vec![Command::message(Message::NavigateBack)],
            Step::Race => {
                self.info_field = InfoField::Name;
                self.name.focus();
                Step::Info
            }
            Step::Class => Step::Race,
            Step::Method => Step::Class,
            Step::Roll | Step::Array | Step::PointBuy | Step::Skills => Step::Method,
            Step::Review => Step::Skills,
        };
        Vec::new()
    }

    fn start_method(&mut self, method: AbilityMethod) {
        self.method = Some(method);
        self.assigned = [None; 6];
        self.ability_cursor = 0;
        self.step = match method {
            AbilityMethod::Roll => {
                self.reroll();
                Step::Roll
            }
            AbilityMethod::StandardArray => {
                self.pool = dice::STANDARD_ARRAY.to_vec();
                Step::Array
            }
            AbilityMethod::PointBuy => {
                self.point_buy = PointBuy::new();
                Step::PointBuy
            }
        };
    }

    fn reroll(&mut self) {
        self.pool = dice::roll_ability_scores_rand().iter().map(|r| r.total).collect();
        self.assigned = [None; 6];
        debug!("Rolled ability scores {:?}", self.pool);
    }

    fn start_skills(&mut self) {
        let class = self.class_info();
        self.skill_options = class.skill_options.to_vec();
        self.skill_count = class.skill_count;
        self.chosen_skills.clear();
        self.skill_cursor = 0;
        self.step = Step::Skills;
    }

    fn create(&mut self) -> Vec<Command> {
        if self.creating {
            return Vec::new();
        }
        self.creating = true;

        let new = NewCharacter::level_one(
            self.user.id,
            self.name.value(),
            self.race_name(),
            self.class_info().name,
            rules::BACKGROUNDS[self.background],
            rules::ALIGNMENTS[self.alignment],
            self.scores(),
            self.chosen_skills.iter().map(|s| s.to_string()).collect(),
        );
        let store = Arc::clone(&self.store);
        vec![Command::new("create character", async move {
            match store.create_character(new).await {
                Ok(character) => Message::CharacterCreated(character),
                Err(e) => Message::Failed(format!("Failed to create character: {e}")),
            }
        })]
    }

    // ------------------------------------------------------------------------
    // Key handling per step
    // ------------------------------------------------------------------------

    fn handle_key(&mut self, key: Key) -> Vec<Command> {
        if key == Key::Esc {
            return self.go_back();
        }
        match self.step {
            Step::Info => self.key_info(key),
            Step::Race => {
                match key {
                    Key::Up | Key::Char('k') => self.race = self.race.saturating_sub(1),
                    Key::Down | Key::Char('j') => self.race = (self.race + 1).min(rules::RACES.len() - 1),
                    Key::Enter => self.step = Step::Class,
                    _ => {}
                }
                Vec::new()
            }
            Step::Class => {
                match key {
                    Key::Up | Key::Char('k') => self.class = self.class.saturating_sub(1),
                    Key::Down | Key::Char('j') => {
                        self.class = (self.class + 1).min(rules::CLASSES.len() - 1)
                    }
                    Key::Enter => self.step = Step::Method,
                    _ => {}
                }
                Vec::new()
            }
            Step::Method => {
                match key {
                    Key::Up | Key::Char('k') => self.method_cursor = self.method_cursor.saturating_sub(1),
                    Key::Down | Key::Char('j') => {
                        self.method_cursor = (self.method_cursor + 1).min(AbilityMethod::ALL.len() - 1)
                    }
                    Key::Enter => self.start_method(AbilityMethod::ALL[self.method_cursor]),
                    _ => {}
                }
                Vec::new()
            }
            Step::Roll | Step::Array => {
                self.key_assign(key);
                Vec::new()
            }
            Step::PointBuy => {
                self.key_point_buy(key);
                Vec::new()
            }
            Step::Skills => {
                self.key_skills(key);
                Vec::new()
            }
            Step::Review => match key {
                Key::Enter | Key::Char('y' | 'Y') => self.create(),
                Key::Char('n' | 'N') => {
                    self.step = Step::Info;
                    self.info_field = InfoField::Name;
                    self.name.focus();
                    Vec::new()
                }
                _ => Vec::new(),
            },
        }
    }

    fn key_info(&mut self, key: Key) -> Vec<Command> {
        match key {
            Key::Enter | Key::Tab => {
                if self.name.value().trim().is_empty() {
                    self.error = Some("Name is required".to_string());
                } else {
                    self.name.blur();
                    self.step = Step::Race;
                }
            }
            Key::Up | Key::Down => {
                self.info_field = match (self.info_field, key) {
                    (InfoField::Name, Key::Down) => InfoField::Background,
                    (InfoField::Background, Key::Down) => InfoField::Alignment,
                    (InfoField::Background, Key::Up) => InfoField::Name,
                    (InfoField::Alignment, Key::Up) => InfoField::Background,
                    (field, _) => field,
                };
                if self.info_field == InfoField::Name {
                    self.name.focus();
                } else {
                    self.name.blur();
                }
            }
            Key::Left | Key::Right if self.info_field != InfoField::Name => {
                let forward = key == Key::Right;
                let (index, len) = match self.info_field {
                    InfoField::Background => (&mut self.background, rules::BACKGROUNDS.len()),
                    _ => (&mut self.alignment, rules::ALIGNMENTS.len()),
                };
                *index = if forward { (*index + 1) % len } else { (*index + len - 1) % len };
            }
            _ if self.info_field == InfoField::Name => {
                self.name.handle_event(key);
            }
            _ => {}
        }
        Vec::new()
    }

    fn key_assign(&mut self, key: Key) {
        match key {
            Key::Up | Key::Char('k') => self.ability_cursor = self.ability_cursor.saturating_sub(1),
            Key::Down | Key::Char('j') => self.ability_cursor = (self.ability_cursor + 1).min(5),
            Key::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                if index < self.pool.len() {
                    for slot in self.assigned.iter_mut() {
                        if *slot == Some(index) {
                            *slot = None;
                        }
                    }
                    self.assigned[self.ability_cursor] = Some(index);
                }
            }
            Key::Char('r') if self.step == Step::Roll => self.reroll(),
            Key::Enter => {
                if self.assigned.iter().all(Option::is_some) {
                    self.start_skills();
                } else {
                    self.error = Some("Please assign all 6 ability scores".to_string());
                }
            }
            _ => {}
        }
    }

    fn key_point_buy(&mut self, key: Key) {
        match key {
            Key::Up | Key::Char('k') => self.ability_cursor = self.ability_cursor.saturating_sub(1),
            Key::Down | Key::Char('j') => self.ability_cursor = (self.ability_cursor + 1).min(5),
            Key::Right | Key::Char('l' | '+' | '=') => {
                self.point_buy.increase(self.ability_cursor);
            }
            Key::Left | Key::Char('h' | '-') => {
                self.point_buy.decrease(self.ability_cursor);
            }
            Key::Enter => self.start_skills(),
            _ => {}
        }
    }

    fn key_skills(&mut self, key: Key) {
        match key {
            Key::Up | Key::Char('k') => self.skill_cursor = self.skill_cursor.saturating_sub(1),
            Key::Down | Key::Char('j') => {
                self.skill_cursor = (self.skill_cursor + 1).min(self.skill_options.len().saturating_sub(1))
            }
            Key::Char(' ' | 'x') => {
                let Some(&skill) = self.skill_options.get(self.skill_cursor) else {
                    return;
                };
                if let Some(pos) = self.chosen_skills.iter().position(|s| *s == skill) {
                    self.chosen_skills.remove(pos);
                } else if self.chosen_skills.len() < self.skill_count {
                    self.chosen_skills.push(skill);
                }
            }
            Key::Enter => {
                if self.chosen_skills.len() == self.skill_count {
                    self.step = Step::Review;
                } else {
                    self.error = Some(format!("Please select {} skills", self.skill_count));
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    fn cursor_row(&self, selected: bool, text: String) -> Line<'static> {
        let theme = &self.theme;
        Line::from(vec![
            Span::styled(if selected { "> " } else { "  " }, theme.cursor),
            Span::styled(text, if selected { theme.selected } else { theme.text }),
        ])
    }

    fn progress_line(&self) -> Line<'static> {
        let theme = &self.theme;
        let current = self.step.progress_index();
        let mut spans = Vec::new();
        for (i, label) in PROGRESS.iter().enumerate() {
            spans.push(match i.cmp(&current) {
                std::cmp::Ordering::Equal => Span::styled(format!("[{label}]"), theme.selected),
                std::cmp::Ordering::Less => Span::styled(format!("✓{label}"), theme.success_text),
                std::cmp::Ordering::Greater => Span::styled(format!(" {label} "), theme.muted_text),
            });
            if i + 1 < PROGRESS.len() {
                spans.push(Span::styled(" → ", theme.text));
            }
        }
        Line::from(spans)
    }

    fn title(&self, text: impl Into<String>) -> Line<'static> {
        Line::from(Span::styled(text.into(), self.theme.title))
    }

    fn info_lines(&self) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let choice = |label: &str, value: &str, focused: bool| {
            let style = if focused { theme.selected } else { theme.text };
            Line::from(vec![
                Span::styled(if focused { "> " } else { "  " }, theme.cursor),
                Span::styled(format!("{label:<12}"), theme.stat_label),
                Span::styled(if focused { "◀ " } else { "  " }, theme.muted_text),
                Span::styled(value.to_string(), style),
                Span::styled(if focused { " ▶" } else { "" }, theme.muted_text),
            ])
        };

        let mut name_line = vec![Span::styled(
            if self.info_field == InfoField::Name { "> " } else { "  " },
            theme.cursor,
        )];
        name_line.extend(self.name.line(NAME_WIDTH).spans);

        vec![
            self.title("Create Your Character"),
            Line::default(),
            Line::from(Span::styled("Name:", theme.stat_label)),
            Line::from(name_line),
            Line::default(),
            choice(
                "Background:",
                rules::BACKGROUNDS[self.background],
                self.info_field == InfoField::Background,
            ),
            choice(
                "Alignment:",
                rules::ALIGNMENTS[self.alignment],
                self.info_field == InfoField::Alignment,
            ),
        ]
    }

    fn race_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![self.title("Choose Your Race"), Line::default()];
        for (i, race) in rules::RACES.iter().enumerate() {
            lines.push(self.cursor_row(i == self.race, format!("{:<12} (Speed: {})", race.name, race.speed)));
        }
        lines
    }

    fn class_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![self.title("Choose Your Class"), Line::default()];
        for (i, class) in rules::CLASSES.iter().enumerate() {
            lines.push(self.cursor_row(
                i == self.class,
                format!("{:<12} (Hit Die: d{})", class.name, class.hit_die),
            ));
        }
        lines
    }

    fn method_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![self.title("Choose Ability Score Method"), Line::default()];
        for (i, method) in AbilityMethod::ALL.iter().enumerate() {
            lines.push(self.cursor_row(i == self.method_cursor, method.name().to_string()));
            lines.push(Line::from(Span::styled(
                format!("    {}", method.description()),
                self.theme.muted_text,
            )));
        }
        lines
    }

    fn assign_lines(&self) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let title = if self.step == Step::Roll {
            "Assign Your Rolled Scores"
        } else {
            "Assign Your Ability Scores"
        };
        let mut lines = vec![self.title(title), Line::default()];

        let mut available = vec![Span::styled("Available scores: ", theme.text)];
        for (i, score) in self.pool.iter().enumerate() {
            let used = self.assigned.contains(&Some(i));
            available.push(Span::styled(
                format!("[{}]={} ", i + 1, score),
                if used { theme.muted_text } else { theme.success_text },
            ));
        }
        lines.push(Line::from(available));
        lines.push(Line::default());

        for (i, ability) in Ability::ALL.iter().enumerate() {
            let value = match self.assigned[i].and_then(|p| self.pool.get(p)) {
                Some(&score) => format!(
                    "{score:2} ({})",
                    rules::format_modifier(rules::ability_modifier(score))
                ),
                None => "___".to_string(),
            };
            lines.push(self.cursor_row(i == self.ability_cursor, format!("{:<14}: {value}", ability.name())));
        }
        lines
    }

    fn point_buy_lines(&self) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let mut lines = vec![
            self.title("Point Buy"),
            Line::default(),
            Line::from(vec![
                Span::styled("Points remaining: ", theme.text),
                Span::styled(self.point_buy.remaining().to_string(), theme.stat_value),
            ]),
            Line::default(),
        ];

        let scores = self.point_buy.scores();
        for (i, ability) in Ability::ALL.iter().enumerate() {
            let score = scores[i];
            let mut arrows = String::from(if self.point_buy.can_decrease(i) { "◀ " } else { "  " });
            if self.point_buy.can_increase(i) {
                arrows.push_str(" ▶");
            }
            lines.push(self.cursor_row(
                i == self.ability_cursor,
                format!(
                    "{:<14}: {score:2} ({}) cost:{} {arrows}",
                    ability.name(),
                    rules::format_modifier(rules::ability_modifier(score)),
                    dice::point_buy_cost(score),
                ),
            ));
        }
        lines
    }

    fn skill_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            self.title(format!("Choose {} Skills ({})", self.skill_count, self.class_info().name)),
            Line::default(),
            Line::from(format!("Selected: {}/{}", self.chosen_skills.len(), self.skill_count)),
            Line::default(),
        ];
        for (i, skill) in self.skill_options.iter().enumerate() {
            let mark = if self.chosen_skills.contains(skill) { "[x]" } else { "[ ]" };
            lines.push(self.cursor_row(i == self.skill_cursor, format!("{mark} {skill}")));
        }
        lines
    }

    fn review_lines(&self) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let header = |text: &str| Line::from(Span::styled(text.to_string(), theme.header));
        let mut lines = vec![
            self.title("Review Your Character"),
            Line::default(),
            header("Basic Info"),
            Line::from(format!("Name:       {}", self.name.value().trim())),
            Line::from(format!("Race:       {}", self.race_name())),
            Line::from(format!("Class:      {}", self.class_info().name)),
            Line::from(format!("Background: {}", rules::BACKGROUNDS[self.background])),
            Line::from(format!("Alignment:  {}", rules::ALIGNMENTS[self.alignment])),
            Line::default(),
            header("Ability Scores"),
        ];

        for (ability, score) in Ability::ALL.iter().zip(self.scores()) {
            lines.push(Line::from(format!(
                "{:<14}: {score:2} ({})",
                ability.name(),
                rules::format_modifier(rules::ability_modifier(score))
            )));
        }
        lines.push(Line::default());
        lines.push(header("Skill Proficiencies"));
        for skill in &self.chosen_skills {
            lines.push(Line::from(format!("  • {skill}")));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Create this character? (y/n)", theme.success_text)));
        lines
    }
}

impl Screen for CreateScreen {
    fn update(&mut self, msg: Message) -> Vec<Command> {
        match msg {
            Message::Key(key) => {
                self.error = None;
                self.handle_key(key)
            }
            Message::Tick => {
                self.name.tick();
                Vec::new()
            }
            Message::Failed(error) => {
                warn!("{}", error);
                self.creating = false;
                self.error = Some(error);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![self.progress_line(), Line::default()];
        lines.extend(match self.step {
            Step::Info => self.info_lines(),
            Step::Race => self.race_lines(),
            Step::Class => self.class_lines(),
            Step::Method => self.method_lines(),
            Step::Roll | Step::Array => self.assign_lines(),
            Step::PointBuy => self.point_buy_lines(),
            Step::Skills => self.skill_lines(),
            Step::Review => self.review_lines(),
        });

        if let Some(error) = &self.error {
            lines.push(Line::default());
            lines.push(error_line(&self.theme, error));
        }
        lines.push(Line::default());
        lines.push(help_line(&self.theme, self.step.help()));

        render_centered(frame, area, lines);
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::AuthService;
    use crate::core::memory::MemoryStore;
    use crate::tui::screens::testing::render_text;

    async fn wizard() -> (Arc<MemoryStore>, CreateScreen) {
        let store = Arc::new(MemoryStore::new());
        let user = store.register_with_email("dm@example.com", "dungeon").await.unwrap();
        let screen = CreateScreen::new(store.clone(), user, Arc::new(Theme::default()));
        (store, screen)
    }

    fn press(c: &mut CreateScreen, key: Key) -> Vec<Command> {
        c.update(Message::Key(key))
    }

    fn type_text(c: &mut CreateScreen, text: &str) {
        for ch in text.chars() {
            press(c, Key::Char(ch));
        }
    }

    /// Name "Aria", Dwarf, Barbarian, standard array assigned in order.
    fn through_array(c: &mut CreateScreen) {
        type_text(c, "Aria");
        press(c, Key::Enter);
        press(c, Key::Down);
        press(c, Key::Enter);
        press(c, Key::Enter);
        press(c, Key::Down);
        press(c, Key::Enter);
        assert_eq!(c.step(), Step::Array);
        for digit in ['1', '2', '3', '4', '5', '6'] {
            press(c, Key::Char(digit));
            press(c, Key::Down);
        }
        press(c, Key::Enter);
    }

    #[tokio::test]
    async fn test_name_is_required() {
        let (_, mut c) = wizard().await;
        press(&mut c, Key::Enter);
        assert_eq!(c.step(), Step::Info);
        assert_eq!(c.error(), Some("Name is required"));

        type_text(&mut c, "   ");
        press(&mut c, Key::Tab);
        assert_eq!(c.step(), Step::Info);
    }

    #[tokio::test]
    async fn test_esc_from_info_navigates_back() {
        let (_, mut c) = wizard().await;
        let msg = press(&mut c, Key::Esc).into_iter().next().unwrap().resolve().await;
        assert!(matches!(msg, Message::NavigateBack));
    }

    #[tokio::test]
    async fn test_esc_steps_back_to_method() {
        let (_, mut c) = wizard().await;
        through_array(&mut c);
        assert_eq!(c.step(), Step::Skills);
        press(&mut c, Key::Esc);
        assert_eq!(c.step(), Step::Method);
        press(&mut c, Key::Esc);
        assert_eq!(c.step(), Step::Class);
    }

    #[tokio::test]
    async fn test_assigning_a_score_twice_moves_it() {
        let (_, mut c) = wizard().await;
        type_text(&mut c, "Aria");
        for _ in 0..3 {
            press(&mut c, Key::Enter);
        }
        press(&mut c, Key::Down);
        press(&mut c, Key::Enter);

        press(&mut c, Key::Char('1'));
        press(&mut c, Key::Down);
        press(&mut c, Key::Char('1'));
        assert_eq!(c.scores()[0], 0);
        assert_eq!(c.scores()[1], 15);

        press(&mut c, Key::Enter);
        assert_eq!(c.error(), Some("Please assign all 6 ability scores"));
        assert_eq!(c.step(), Step::Array);
    }

    #[tokio::test]
    async fn test_roll_produces_six_scores_and_rerolls() {
        let (_, mut c) = wizard().await;
        type_text(&mut c, "Aria");
        for _ in 0..4 {
            press(&mut c, Key::Enter);
        }
        assert_eq!(c.step(), Step::Roll);
        assert_eq!(c.pool().len(), 6);
        assert!(c.pool().iter().all(|s| (3..=18).contains(s)));

        press(&mut c, Key::Char('1'));
        press(&mut c, Key::Char('r'));
        assert_eq!(c.scores()[0], 0);
        assert_eq!(c.pool().len(), 6);
    }

    #[tokio::test]
    async fn test_point_buy_adjusts_within_budget() {
        let (_, mut c) = wizard().await;
        type_text(&mut c, "Aria");
        for _ in 0..3 {
            press(&mut c, Key::Enter);
        }
        press(&mut c, Key::Down);
        press(&mut c, Key::Down);
        press(&mut c, Key::Enter);
        assert_eq!(c.step(), Step::PointBuy);

        for _ in 0..10 {
            press(&mut c, Key::Right);
        }
        assert_eq!(c.scores()[0], 15);
        press(&mut c, Key::Char('-'));
        assert_eq!(c.scores()[0], 14);

        let text = render_text(&mut c, 100, 30);
        assert!(text.contains("Points remaining: 20"));
        assert!(text.contains("Strength      : 14 (+2) cost:7 ◀  ▶"));
    }

    #[tokio::test]
    async fn test_skill_count_is_enforced() {
        let (_, mut c) = wizard().await;
        through_array(&mut c);
        press(&mut c, Key::Enter);
        assert_eq!(c.error(), Some("Please select 2 skills"));

        press(&mut c, Key::Char(' '));
        press(&mut c, Key::Down);
        press(&mut c, Key::Char('x'));
        press(&mut c, Key::Down);
        press(&mut c, Key::Char(' '));
        assert_eq!(c.chosen_skills().len(), 2);

        press(&mut c, Key::Up);
        press(&mut c, Key::Char(' '));
        assert_eq!(c.chosen_skills().len(), 1);
    }

    #[tokio::test]
    async fn test_review_creates_character() {
        let (store, mut c) = wizard().await;
        press(&mut c, Key::Down);
        press(&mut c, Key::Right);
        press(&mut c, Key::Up);
        through_array(&mut c);
        press(&mut c, Key::Char(' '));
        press(&mut c, Key::Down);
        press(&mut c, Key::Char(' '));
        press(&mut c, Key::Enter);
        assert_eq!(c.step(), Step::Review);

        let text = render_text(&mut c, 100, 40);
        assert!(text.contains("Name:       Aria"));
        assert!(text.contains("Race:       Dwarf"));
        assert!(text.contains("Class:      Barbarian"));
        assert!(text.contains("Create this character? (y/n)"));

        let cmds = press(&mut c, Key::Char('y'));
        assert_eq!(cmds[0].label(), "create character");
        let msg = cmds.into_iter().next().unwrap().resolve().await;
        let Message::CharacterCreated(character) = msg else {
            panic!("expected CharacterCreated");
        };
        assert_eq!(character.name, "Aria");
        assert_eq!(character.race, "Dwarf");
        assert_eq!(character.speed, 25);
        assert_eq!(character.strength, 15);
        assert_eq!(character.charisma, 8);
        assert_eq!(character.background.as_deref(), Some(rules::BACKGROUNDS[1]));
        assert_eq!(character.skill_proficiencies.len(), 2);
        // d12 + CON 13 (+1)
        assert_eq!(character.max_hit_points, 13);

        let owned = store.list_characters(character.user_id).await.unwrap();
        assert_eq!(owned.len(), 1);
    }

    #[tokio::test]
    async fn test_review_n_starts_over() {
        let (_, mut c) = wizard().await;
        through_array(&mut c);
        press(&mut c, Key::Char(' '));
        press(&mut c, Key::Down);
        press(&mut c, Key::Char(' '));
        press(&mut c, Key::Enter);
        press(&mut c, Key::Char('n'));
        assert_eq!(c.step(), Step::Info);
    }

    #[tokio::test]
    async fn test_render_progress_and_race_list() {
        let (_, mut c) = wizard().await;
        type_text(&mut c, "Aria");
        press(&mut c, Key::Enter);
        let text = render_text(&mut c, 100, 30);
        assert!(text.contains("✓Info → [Race] →  Class"));
        assert!(text.contains("> Dragonborn   (Speed: 30)"));
        assert!(text.contains("  Dwarf        (Speed: 25)"));
        assert!(text.contains("↑/↓: select • enter: confirm • esc: back"));
    }

    #[tokio::test]
    async fn test_failed_create_shows_error_and_allows_retry() {
        let (_, mut c) = wizard().await;
        c.creating = true;
        c.update(Message::Failed("Failed to create character: boom".into()));
        assert!(!c.creating);
        let text = render_text(&mut c, 100, 30);
        assert!(text.contains("Error: Failed to create character: boom"));
    }
}
