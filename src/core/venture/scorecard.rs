use serde::{Deserialize, Serialize};

use super::{VentureCategory, VentureMetrics};
use crate::core::config::VentureConfig;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum CreditRating {
    D,
    C,
    B,
    A,
    AA,
    AAA,
}

impl CreditRating {
    fn from_points(points: u32) -> Self {
        match points {
            0 => CreditRating::D,
            1 => CreditRating::C,
            2 => CreditRating::B,
            3 => CreditRating::A,
            4 => CreditRating::AA,
            _ => CreditRating::AAA,
        }
    }
}

/// Banded from cash runway in months and debt against annual income.
pub fn credit_rating(cash: f64, monthly_burn: f64, total_debt: f64, annual_income: f64) -> CreditRating {
    let runway = if monthly_burn <= 0.0 {
        f64::INFINITY
    } else {
        cash.max(0.0) / monthly_burn
    };
    let runway_points = match runway {
        r if r >= 12.0 => 3,
        r if r >= 6.0 => 2,
        r if r >= 3.0 => 1,
        _ => 0,
    };
    let debt_ratio = if annual_income <= 0.0 {
        if total_debt > 0.0 { f64::INFINITY } else { 0.0 }
    } else {
        total_debt / annual_income
    };
    let debt_points = match debt_ratio {
        d if d < 0.5 => 2,
        d if d < 1.5 => 1,
        _ => 0,
    };
    CreditRating::from_points(runway_points + debt_points)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateScore {
    Miss,
    Partial,
    Full,
}

impl GateScore {
    pub fn points(self) -> u32 {
        match self {
            GateScore::Miss => 0,
            GateScore::Partial => 1,
            GateScore::Full => 2,
        }
    }

    fn banded(value: f64, full: f64, partial: f64) -> Self {
        if value >= full {
            GateScore::Full
        } else if value >= partial {
            GateScore::Partial
        } else {
            GateScore::Miss
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub profit: GateScore,
    pub gross_margin: GateScore,
    pub growth: GateScore,
    pub brand: GateScore,
    pub credit: GateScore,
}

impl Scorecard {
    pub fn gates(&self) -> [GateScore; 5] {
        [self.profit, self.gross_margin, self.growth, self.brand, self.credit]
    }

    pub fn total_points(&self) -> u32 {
        self.gates().iter().map(|g| g.points()).sum()
    }

    /// Share of gates met in full, as a percentage.
    pub fn board_confidence(&self) -> f64 {
        let full = self.gates().iter().filter(|g| **g == GateScore::Full).count();
        full as f64 / 5.0 * 100.0
    }
}

pub fn industry_average_profit(category: VentureCategory, config: &VentureConfig) -> f64 {
    match category {
        VentureCategory::Goods => config.industry_profit_goods,
        VentureCategory::Subscription => config.industry_profit_subscription,
        VentureCategory::Services => config.industry_profit_services,
    }
}

pub fn evaluate_scorecard(
    metrics: &VentureMetrics,
    category: VentureCategory,
    config: &VentureConfig,
) -> Scorecard {
    let profit = if metrics.net_profit >= industry_average_profit(category, config) {
        GateScore::Full
    } else if metrics.net_profit > 0.0 {
        GateScore::Partial
    } else {
        GateScore::Miss
    };
    let credit = match metrics.credit_rating {
        r if r >= CreditRating::B => GateScore::Full,
        CreditRating::C => GateScore::Partial,
        _ => GateScore::Miss,
    };
    Scorecard {
        profit,
        gross_margin: GateScore::banded(metrics.gross_margin, 0.60, 0.40),
        growth: GateScore::banded(metrics.mom_growth, 0.10, 0.0),
        brand: GateScore::banded(metrics.brand, 65.0, 45.0),
        credit,
    }
}
