//! # Rules Reference
//!
//! Fifth-edition reference tables and the small pure formulas the sheet
//! displays: modifiers, proficiency, saves, skills, XP thresholds.
//!
//! Everything here is `const`/`static` data or a pure function. Nothing
//! touches the store or the UI.

use serde::{Deserialize, Serialize};

// ============================================================================
// Abilities
// ============================================================================

/// The six ability scores, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    /// Three-letter uppercase abbreviation ("STR", "DEX", ...).
    pub fn abbr(self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    /// Case-insensitive lookup by full name.
    pub fn from_name(name: &str) -> Option<Ability> {
        Ability::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Position in [`Ability::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// Skills
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skill {
    pub name: &'static str,
    pub ability: Ability,
}

/// All eighteen skills in alphabetical (sheet) order.
pub static SKILLS: [Skill; 18] = [
    Skill { name: "Acrobatics", ability: Ability::Dexterity },
    Skill { name: "Animal Handling", ability: Ability::Wisdom },
    Skill { name: "Arcana", ability: Ability::Intelligence },
    Skill { name: "Athletics", ability: Ability::Strength },
    Skill { name: "Deception", ability: Ability::Charisma },
    Skill { name: "History", ability: Ability::Intelligence },
    Skill { name: "Insight", ability: Ability::Wisdom },
    Skill { name: "Intimidation", ability: Ability::Charisma },
    Skill { name: "Investigation", ability: Ability::Intelligence },
    Skill { name: "Medicine", ability: Ability::Wisdom },
    Skill { name: "Nature", ability: Ability::Intelligence },
    Skill { name: "Perception", ability: Ability::Wisdom },
    Skill { name: "Performance", ability: Ability::Charisma },
    Skill { name: "Persuasion", ability: Ability::Charisma },
    Skill { name: "Religion", ability: Ability::Intelligence },
    Skill { name: "Sleight of Hand", ability: Ability::Dexterity },
    Skill { name: "Stealth", ability: Ability::Dexterity },
    Skill { name: "Survival", ability: Ability::Wisdom },
];

pub fn skill(name: &str) -> Option<&'static Skill> {
    SKILLS.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

// ============================================================================
// Classes & Races
// ============================================================================

#[derive(Debug)]
pub struct ClassInfo {
    pub name: &'static str,
    pub hit_die: i32,
    pub saving_throws: [Ability; 2],
    pub skill_options: &'static [&'static str],
    pub skill_count: usize,
}

const ALL_SKILL_NAMES: &[&str] = &[
    "Acrobatics", "Animal Handling", "Arcana", "Athletics", "Deception", "History",
    "Insight", "Intimidation", "Investigation", "Medicine", "Nature", "Perception",
    "Performance", "Persuasion", "Religion", "Sleight of Hand", "Stealth", "Survival",
];

pub const CLASSES: &[ClassInfo] = &[
    ClassInfo {
        name: "Barbarian",
        hit_die: 12,
        saving_throws: [Ability::Strength, Ability::Constitution],
        skill_options: &["Animal Handling", "Athletics", "Intimidation", "Nature", "Perception", "Survival"],
        skill_count: 2,
    },
    ClassInfo {
        name: "Bard",
        hit_die: 8,
        saving_throws: [Ability::Dexterity, Ability::Charisma],
        skill_options: ALL_SKILL_NAMES,
        skill_count: 3,
    },
    ClassInfo {
        name: "Cleric",
        hit_die: 8,
        saving_throws: [Ability::Wisdom, Ability::Charisma],
        skill_options: &["History", "Insight", "Medicine", "Persuasion", "Religion"],
        skill_count: 2,
    },
    ClassInfo {
        name: "Druid",
        hit_die: 8,
        saving_throws: [Ability::Intelligence, Ability::Wisdom],
        skill_options: &["Arcana", "Animal Handling", "Insight", "Medicine", "Nature", "Perception", "Religion", "Survival"],
        skill_count: 2,
    },
    ClassInfo {
        name: "Fighter",
        hit_die: 10,
        saving_throws: [Ability::Strength, Ability::Constitution],
        skill_options: &["Acrobatics", "Animal Handling", "Athletics", "History", "Insight", "Intimidation", "Perception", "Survival"],
        skill_count: 2,
    },
    ClassInfo {
        name: "Monk",
        hit_die: 8,
        saving_throws: [Ability::Strength, Ability::Dexterity],
        skill_options: &["Acrobatics", "Athletics", "History", "Insight", "Religion", "Stealth"],
        skill_count: 2,
    },
    ClassInfo {
        name: "Paladin",
        hit_die: 10,
        saving_throws: [Ability::Wisdom, Ability::Charisma],
        skill_options: &["Athletics", "Insight", "Intimidation", "Medicine", "Persuasion", "Religion"],
        skill_count: 2,
    },
    ClassInfo {
        name: "Ranger",
        hit_die: 10,
        saving_throws: [Ability::Strength, Ability::Dexterity],
        skill_options: &["Animal Handling", "Athletics", "Insight", "Investigation", "Nature", "Perception", "Stealth", "Survival"],
        skill_count: 3,
    },
    ClassInfo {
        name: "Rogue",
        hit_die: 8,
        saving_throws: [Ability::Dexterity, Ability::Intelligence],
        skill_options: &[
            "Acrobatics", "Athletics", "Deception", "Insight", "Intimidation", "Investigation",
            "Perception", "Performance", "Persuasion", "Sleight of Hand", "Stealth",
        ],
        skill_count: 4,
    },
    ClassInfo {
        name: "Sorcerer",
        hit_die: 6,
        saving_throws: [Ability::Constitution, Ability::Charisma],
        skill_options: &["Arcana", "Deception", "Insight", "Intimidation", "Persuasion", "Religion"],
        skill_count: 2,
    },
    ClassInfo {
        name: "Warlock",
        hit_die: 8,
        saving_throws: [Ability::Wisdom, Ability::Charisma],
        skill_options: &["Arcana", "Deception", "History", "Intimidation", "Investigation", "Nature", "Religion"],
        skill_count: 2,
    },
    ClassInfo {
        name: "Wizard",
        hit_die: 6,
        saving_throws: [Ability::Intelligence, Ability::Wisdom],
        skill_options: &["Arcana", "History", "Insight", "Investigation", "Medicine", "Religion"],
        skill_count: 2,
    },
];

pub fn class_info(name: &str) -> Option<&'static ClassInfo> {
    CLASSES.iter().find(|c| c.name == name)
}

/// Hit die size for a class, falling back to a d8 for unknown classes.
pub fn hit_die(class: &str) -> i32 {
    class_info(class).map_or(8, |c| c.hit_die)
}

#[derive(Debug)]
pub struct RaceInfo {
    pub name: &'static str,
    pub speed: i32,
}

pub const RACES: &[RaceInfo] = &[
    RaceInfo { name: "Dragonborn", speed: 30 },
    RaceInfo { name: "Dwarf", speed: 25 },
    RaceInfo { name: "Elf", speed: 30 },
    RaceInfo { name: "Gnome", speed: 25 },
    RaceInfo { name: "Half-Elf", speed: 30 },
    RaceInfo { name: "Half-Orc", speed: 30 },
    RaceInfo { name: "Halfling", speed: 25 },
    RaceInfo { name: "Human", speed: 30 },
    RaceInfo { name: "Tiefling", speed: 30 },
];

/// Base walking speed for a race (30 ft when unknown).
pub fn race_speed(race: &str) -> i32 {
    RACES.iter().find(|r| r.name == race).map_or(30, |r| r.speed)
}

pub const BACKGROUNDS: &[&str] = &[
    "Acolyte", "Charlatan", "Criminal", "Entertainer", "Folk Hero", "Guild Artisan",
    "Hermit", "Noble", "Outlander", "Sage", "Sailor", "Soldier", "Urchin",
];

pub const ALIGNMENTS: &[&str] = &[
    "Lawful Good", "Neutral Good", "Chaotic Good",
    "Lawful Neutral", "True Neutral", "Chaotic Neutral",
    "Lawful Evil", "Neutral Evil", "Chaotic Evil",
];

// ============================================================================
// Formulas
// ============================================================================

/// Ability modifier: `floor((score - 10) / 2)`.
pub fn ability_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

pub fn proficiency_bonus(level: i32) -> i32 {
    if level < 1 {
        return 2;
    }
    (level - 1) / 4 + 2
}

pub fn saving_throw(score: i32, level: i32, proficient: bool) -> i32 {
    skill_bonus(score, level, proficient)
}

pub fn skill_bonus(score: i32, level: i32, proficient: bool) -> i32 {
    let mut bonus = ability_modifier(score);
    if proficient {
        bonus += proficiency_bonus(level);
    }
    bonus
}

pub fn initiative(dexterity: i32) -> i32 {
    ability_modifier(dexterity)
}

pub fn passive_perception(wisdom: i32, level: i32, proficient: bool) -> i32 {
    10 + skill_bonus(wisdom, level, proficient)
}

/// Signed modifier text: `+3`, `+0`, `-1`.
pub fn format_modifier(modifier: i32) -> String {
    if modifier >= 0 {
        format!("+{modifier}")
    } else {
        modifier.to_string()
    }
}

/// Minimum XP for each level, index 0 = level 1.
pub const XP_THRESHOLDS: [i32; 20] = [
    0, 300, 900, 2_700, 6_500, 14_000, 23_000, 34_000, 48_000, 64_000,
    85_000, 100_000, 120_000, 140_000, 165_000, 195_000, 225_000, 265_000, 305_000, 355_000,
];

/// XP required to reach `level` (clamped to 1..=20).
pub fn xp_for_level(level: i32) -> i32 {
    XP_THRESHOLDS[(level.clamp(1, 20) - 1) as usize]
}

pub fn level_from_xp(xp: i32) -> i32 {
    XP_THRESHOLDS
        .iter()
        .rposition(|&threshold| xp >= threshold)
        .map_or(1, |idx| idx as i32 + 1)
}

/// XP still needed for the next level; 0 at level 20.
pub fn xp_to_next_level(xp: i32) -> i32 {
    let level = level_from_xp(xp);
    if level >= 20 {
        return 0;
    }
    xp_for_level(level + 1) - xp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_modifier() {
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(15), 2);
        assert_eq!(ability_modifier(20), 5);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(9), -1);
        assert_eq!(ability_modifier(1), -5);
    }

    #[test]
    fn test_proficiency_bonus_by_level() {
        assert_eq!(proficiency_bonus(0), 2);
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(4), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(9), 4);
        assert_eq!(proficiency_bonus(17), 6);
        assert_eq!(proficiency_bonus(20), 6);
    }

    #[test]
    fn test_skill_bonus_adds_proficiency_only_when_proficient() {
        assert_eq!(skill_bonus(14, 1, false), 2);
        assert_eq!(skill_bonus(14, 1, true), 4);
        assert_eq!(passive_perception(12, 5, true), 14);
    }

    #[test]
    fn test_format_modifier() {
        assert_eq!(format_modifier(3), "+3");
        assert_eq!(format_modifier(0), "+0");
        assert_eq!(format_modifier(-2), "-2");
        assert_eq!(format_modifier(12), "+12");
    }

    #[test]
    fn test_level_from_xp() {
        assert_eq!(level_from_xp(0), 1);
        assert_eq!(level_from_xp(299), 1);
        assert_eq!(level_from_xp(300), 2);
        assert_eq!(level_from_xp(355_000), 20);
        assert_eq!(xp_to_next_level(250), 50);
        assert_eq!(xp_to_next_level(400_000), 0);
    }

    #[test]
    fn test_class_and_race_lookups() {
        assert_eq!(hit_die("Barbarian"), 12);
        assert_eq!(hit_die("Wizard"), 6);
        assert_eq!(hit_die("Artificer"), 8);
        assert_eq!(race_speed("Dwarf"), 25);
        assert_eq!(race_speed("Unknown"), 30);
        assert_eq!(class_info("Bard").map(|c| c.skill_options.len()), Some(18));
        assert_eq!(class_info("Rogue").map(|c| c.skill_count), Some(4));
    }

    #[test]
    fn test_ability_from_name_is_case_insensitive() {
        assert_eq!(Ability::from_name("wisdom"), Some(Ability::Wisdom));
        assert_eq!(Ability::from_name("CHARISMA"), Some(Ability::Charisma));
        assert_eq!(Ability::from_name("luck"), None);
        assert_eq!(skill("stealth").map(|s| s.ability), Some(Ability::Dexterity));
    }
}
