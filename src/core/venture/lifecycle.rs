use rand::Rng;
use tracing::info;

use super::{LifecycleStage, Venture};
use crate::core::config::VentureConfig;
use crate::core::rng::{noise, roll};
use crate::core::types::Skills;

const REVENUE_NOISE: f64 = 0.15;
const APTITUDE_WEIGHT: f64 = 0.35;

fn aptitude(skills: &Skills) -> f64 {
    (skills.entrepreneurship + skills.marketing + skills.sales + skills.operations) / 400.0
}

fn success_probability(skills: &Skills, config: &VentureConfig) -> f64 {
    (config.lifecycle_base_success + aptitude(skills) * APTITUDE_WEIGHT).clamp(0.0, 1.0)
}

fn failure_probability(skills: &Skills, config: &VentureConfig) -> f64 {
    (config.lifecycle_fail_chance * (1.5 - aptitude(skills))).clamp(0.0, 1.0)
}

/// Advances the unmanaged lifecycle by one month. A stage must be held for
/// its minimum number of months before it can move up or fail.
pub fn advance_lifecycle<R: Rng + ?Sized>(
    rng: &mut R,
    venture: &mut Venture,
    skills: &Skills,
    config: &VentureConfig,
) -> Option<LifecycleStage> {
    let current = venture.lifecycle;
    let next = current.next()?;
    venture.months_in_lifecycle += 1;
    if venture.months_in_lifecycle < config.lifecycle_min_months[current.index()] {
        return None;
    }
    let changed = if roll(rng, failure_probability(skills, config)) {
        LifecycleStage::Failed
    } else if roll(rng, success_probability(skills, config)) {
        next
    } else {
        return None;
    };
    venture.lifecycle = changed;
    venture.months_in_lifecycle = 0;
    info!(target: "sim.venture", venture = %venture.name, from = ?current, to = ?changed, "lifecycle moved");
    Some(changed)
}

/// Revenue and net profit of an unmanaged venture for the month, from the
/// lifecycle stage's typical revenue.
pub fn unmanaged_month<R: Rng + ?Sized>(
    rng: &mut R,
    venture: &mut Venture,
    config: &VentureConfig,
) -> f64 {
    let revenue = if venture.lifecycle == LifecycleStage::Failed {
        0.0
    } else {
        let base = config.lifecycle_revenue[venture.lifecycle.index()];
        (base * (1.0 + noise(rng, REVENUE_NOISE))).max(0.0)
    };
    let net = revenue * (1.0 - config.lifecycle_cost_fraction);
    venture.monthly_revenue = revenue;
    venture.last_net_profit = net;
    net
}
