use serde::Serialize;

use super::config::ComboConfig;
use super::types::{SkillCombo, SkillKind, Skills};

pub const MULTIPLIER_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillStack {
    pub strong_count: usize,
    pub broad_count: usize,
    pub multiplier: f64,
    pub combo: Option<SkillCombo>,
}

/// Income multiplier as a step function of the number of skills at or above 60.
pub fn stack_multiplier(strong_count: usize) -> f64 {
    match strong_count {
        0 | 1 => 1.00,
        2 => 1.10,
        3 => 1.25,
        4 => 1.45,
        5 | 6 => 1.70,
        _ => 2.00,
    }
}

fn count_at_least(skills: &Skills, threshold: f64) -> usize {
    skills.values().iter().filter(|v| **v >= threshold).count()
}

fn all_at_least(skills: &Skills, kinds: &[SkillKind], threshold: f64) -> bool {
    kinds.iter().all(|kind| skills.get(*kind) >= threshold)
}

const COMBO_RULES: [(SkillCombo, [SkillKind; 3]); 6] = [
    (
        SkillCombo::TechFounder,
        [
            SkillKind::Technical,
            SkillKind::Entrepreneurship,
            SkillKind::Marketing,
        ],
    ),
    (
        SkillCombo::Executive,
        [
            SkillKind::Leadership,
            SkillKind::Communication,
            SkillKind::Networking,
        ],
    ),
    (
        SkillCombo::Dealmaker,
        [
            SkillKind::Sales,
            SkillKind::Negotiation,
            SkillKind::Communication,
        ],
    ),
    (
        SkillCombo::Investor,
        [
            SkillKind::Finance,
            SkillKind::Negotiation,
            SkillKind::Technical,
        ],
    ),
    (
        SkillCombo::CreativeDirector,
        [
            SkillKind::Creativity,
            SkillKind::Marketing,
            SkillKind::Communication,
        ],
    ),
    (
        SkillCombo::Operator,
        [
            SkillKind::Operations,
            SkillKind::Leadership,
            SkillKind::Finance,
        ],
    ),
];

/// First matching rule wins; the broad fallback is checked last.
pub fn detect_combo(skills: &Skills, config: &ComboConfig) -> Option<SkillCombo> {
    COMBO_RULES
        .iter()
        .find(|(_, kinds)| all_at_least(skills, kinds, config.high_threshold))
        .map(|(combo, _)| *combo)
        .or_else(|| {
            (count_at_least(skills, config.broad_threshold) >= config.broad_count)
                .then_some(SkillCombo::Polymath)
        })
}

pub fn evaluate_stack(skills: &Skills, config: &ComboConfig) -> SkillStack {
    let strong_count = count_at_least(skills, MULTIPLIER_THRESHOLD);
    SkillStack {
        strong_count,
        broad_count: count_at_least(skills, config.broad_threshold),
        multiplier: stack_multiplier(strong_count),
        combo: detect_combo(skills, config),
    }
}

/// The combo to announce, if this month's combo differs from last month's.
pub fn newly_unlocked(previous: Option<SkillCombo>, current: Option<SkillCombo>) -> Option<SkillCombo> {
    match current {
        Some(combo) if previous != Some(combo) => Some(combo),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComboBonuses {
    pub venture_profit_multiplier: f64,
    pub income_multiplier: f64,
    pub flat_income: f64,
    pub market_share_bonus: f64,
}

impl ComboBonuses {
    pub const NONE: ComboBonuses = ComboBonuses {
        venture_profit_multiplier: 1.0,
        income_multiplier: 1.0,
        flat_income: 0.0,
        market_share_bonus: 0.0,
    };
}

pub fn combo_bonuses(combo: Option<SkillCombo>, config: &ComboConfig) -> ComboBonuses {
    let Some(combo) = combo else {
        return ComboBonuses::NONE;
    };
    let mut bonuses = ComboBonuses::NONE;
    match combo {
        SkillCombo::TechFounder => {
            bonuses.venture_profit_multiplier = config.tech_founder_venture_multiplier;
            bonuses.market_share_bonus = config.market_share_bonus;
        }
        SkillCombo::Executive => bonuses.income_multiplier = config.executive_income_multiplier,
        SkillCombo::Dealmaker => bonuses.income_multiplier = config.dealmaker_income_multiplier,
        SkillCombo::Investor => bonuses.flat_income = config.investor_flat_bonus,
        SkillCombo::CreativeDirector => {
            bonuses.flat_income = config.creative_flat_bonus;
            bonuses.market_share_bonus = config.market_share_bonus / 2.0;
        }
        SkillCombo::Operator => bonuses.flat_income = config.operator_flat_bonus,
        SkillCombo::Polymath => bonuses.flat_income = config.polymath_flat_bonus,
    }
    bonuses
}
