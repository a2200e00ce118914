//! # Dice
//!
//! Ability-score generation (4d6 drop lowest, standard array, point buy)
//! and the d20 rolls the sheet offers. Every roller takes an explicit
//! `Rng` so tests can seed it; the `*_rand` helpers use the thread RNG.

use rand::Rng;

/// Standard array, highest first.
pub const STANDARD_ARRAY: [i32; 6] = [15, 14, 13, 12, 10, 8];

/// Point-buy budget for a fresh character.
pub const POINT_BUY_BUDGET: i32 = 27;
const POINT_BUY_MIN: i32 = 8;
const POINT_BUY_MAX: i32 = 15;

pub fn roll_die<R: Rng + ?Sized>(rng: &mut R, sides: u32) -> u32 {
    rng.gen_range(1..=sides.max(1))
}

/// One 4d6-drop-lowest roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbilityRoll {
    pub dice: [u32; 4],
    /// Index into `dice` of the discarded die.
    pub dropped: usize,
    pub total: i32,
}

pub fn roll_4d6_drop_lowest<R: Rng + ?Sized>(rng: &mut R) -> AbilityRoll {
    let dice = [
        roll_die(rng, 6),
        roll_die(rng, 6),
        roll_die(rng, 6),
        roll_die(rng, 6),
    ];
    let mut dropped = 0;
    for (i, &d) in dice.iter().enumerate() {
        if d < dice[dropped] {
            dropped = i;
        }
    }
    let total = dice
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != dropped)
        .map(|(_, &d)| d as i32)
        .sum();
    AbilityRoll { dice, dropped, total }
}

/// Six 4d6-drop-lowest rolls, one per ability in sheet order.
pub fn roll_ability_scores<R: Rng + ?Sized>(rng: &mut R) -> Vec<AbilityRoll> {
    (0..6).map(|_| roll_4d6_drop_lowest(rng)).collect()
}

pub fn roll_ability_scores_rand() -> Vec<AbilityRoll> {
    roll_ability_scores(&mut rand::thread_rng())
}

pub fn roll_d20<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    roll_die(rng, 20)
}

pub fn roll_d20_rand() -> u32 {
    roll_d20(&mut rand::thread_rng())
}

/// Result of a two-d20 roll, `result` being the kept die.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct D20Pair {
    pub result: u32,
    pub first: u32,
    pub second: u32,
}

pub fn roll_with_advantage<R: Rng + ?Sized>(rng: &mut R) -> D20Pair {
    let (first, second) = (roll_d20(rng), roll_d20(rng));
    D20Pair { result: first.max(second), first, second }
}

pub fn roll_with_disadvantage<R: Rng + ?Sized>(rng: &mut R) -> D20Pair {
    let (first, second) = (roll_d20(rng), roll_d20(rng));
    D20Pair { result: first.min(second), first, second }
}

// ============================================================================
// Point Buy
// ============================================================================

/// Cost of raising a score from 8 to `score` under point buy.
pub fn point_buy_cost(score: i32) -> i32 {
    match score {
        ..=8 => 0,
        9..=13 => score - 8,
        14 => 7,
        _ => 9,
    }
}

/// Point-buy allocation, every score starting at 8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointBuy {
    scores: [i32; 6],
    remaining: i32,
}

impl Default for PointBuy {
    fn default() -> Self {
        Self {
            scores: [POINT_BUY_MIN; 6],
            remaining: POINT_BUY_BUDGET,
        }
    }
}

impl PointBuy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scores(&self) -> [i32; 6] {
        self.scores
    }

    pub fn remaining(&self) -> i32 {
        self.remaining
    }

    pub fn can_increase(&self, ability: usize) -> bool {
        let Some(&score) = self.scores.get(ability) else {
            return false;
        };
        if score >= POINT_BUY_MAX {
            return false;
        }
        point_buy_cost(score + 1) - point_buy_cost(score) <= self.remaining
    }

    pub fn can_decrease(&self, ability: usize) -> bool {
        self.scores.get(ability).is_some_and(|&s| s > POINT_BUY_MIN)
    }

    /// Raise one score by one point; returns false when not affordable.
    pub fn increase(&mut self, ability: usize) -> bool {
        if !self.can_increase(ability) {
            return false;
        }
        let score = self.scores[ability];
        self.remaining -= point_buy_cost(score + 1) - point_buy_cost(score);
        self.scores[ability] = score + 1;
        true
    }

    pub fn decrease(&mut self, ability: usize) -> bool {
        if !self.can_decrease(ability) {
            return false;
        }
        let score = self.scores[ability];
        self.remaining += point_buy_cost(score) - point_buy_cost(score - 1);
        self.scores[ability] = score - 1;
        true
    }
}
