use tracing::info;

use super::{AdChannel, Venture};
use crate::core::config::VentureConfig;
use crate::core::types::clamp_pct;

const MAX_CANDIDATES: f64 = 8.0;

/// Highest pricing premium the quality level can carry.
pub fn pricing_ceiling(quality_multiplier: f64, config: &VentureConfig) -> f64 {
    ((quality_multiplier - 1.0) * config.pricing_ceiling_factor).max(0.0)
}

pub fn ad_efficiency(channel: &AdChannel, pricing_premium: f64, config: &VentureConfig) -> f64 {
    let distance = if pricing_premium < channel.sweet_spot_min {
        channel.sweet_spot_min - pricing_premium
    } else if pricing_premium > channel.sweet_spot_max {
        pricing_premium - channel.sweet_spot_max
    } else {
        0.0
    };
    (1.0 - config.ad_efficiency_slope * distance).max(config.ad_efficiency_floor)
}

pub fn candidate_pool_size(wage_premium: f64, config: &VentureConfig) -> usize {
    (config.base_candidate_pool as f64 + wage_premium / 10.0)
        .round()
        .clamp(1.0, MAX_CANDIDATES) as usize
}

pub fn candidate_reliability_bonus(wage_premium: f64) -> f64 {
    (wage_premium / 200.0).clamp(-0.3, 0.3)
}

/// Monthly positioning check. Pricing beyond the ceiling plus tolerance
/// costs brand and nudges churn up for every month it persists. Returns
/// whether erosion applied.
pub fn apply_positioning(venture: &mut Venture, config: &VentureConfig) -> bool {
    let ceiling = pricing_ceiling(venture.positioning.quality_multiplier, config);
    if venture.positioning.pricing_premium <= ceiling + config.ceiling_tolerance {
        venture.positioning.months_over_ceiling = 0;
        return false;
    }
    venture.positioning.months_over_ceiling += 1;
    if let Some(metrics) = venture.metrics.as_mut() {
        metrics.brand = clamp_pct(metrics.brand - config.ceiling_brand_erosion);
        metrics.churn_rate = (metrics.churn_rate + config.ceiling_churn_nudge).clamp(0.0, 1.0);
    }
    info!(
        target: "sim.venture",
        venture = %venture.name,
        premium = venture.positioning.pricing_premium,
        ceiling,
        months = venture.positioning.months_over_ceiling,
        "priced over quality ceiling"
    );
    true
}
