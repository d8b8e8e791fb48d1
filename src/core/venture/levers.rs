use tracing::info;

use super::{Levers, RoadmapItem, Venture};
use crate::core::config::VentureConfig;
use crate::core::types::clamp_pct;

/// What the lever settings do to this month's funnel and cost base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeverEffects {
    pub conversion_factor: f64,
    pub margin_delta: f64,
    pub churn_delta: f64,
    pub brand_delta: f64,
    pub lead_multiplier: f64,
    pub expense: f64,
}

pub fn lever_effects(levers: &Levers, config: &VentureConfig) -> LeverEffects {
    let points_above_market = levers.price_index - 100.0;
    let tier = levers.quality_tier.index();
    let extra_variety = levers.product_variety.saturating_sub(1) as f64;
    LeverEffects {
        conversion_factor: (1.0 - points_above_market * config.conversion_per_price_point)
            .clamp(0.1, 2.0),
        margin_delta: (points_above_market * config.margin_per_price_point).clamp(-0.5, 0.5),
        churn_delta: config.quality_churn_delta[tier],
        brand_delta: config.quality_brand_delta[tier],
        lead_multiplier: 1.0 + config.variety_lead_bonus * extra_variety,
        expense: levers.ad_spend.max(0.0)
            + config.quality_surcharge[tier]
            + config.variety_expense * extra_variety
            + levers.rd_spend.max(0.0),
    }
}

pub fn default_roadmap() -> Vec<RoadmapItem> {
    [
        ("Self-serve onboarding", 6_000.0, 2.0, 0.01),
        ("Mobile app", 15_000.0, 4.0, 0.005),
        ("Partner integrations", 30_000.0, 6.0, 0.01),
    ]
    .into_iter()
    .map(|(name, cost, brand_reward, conversion_reward)| RoadmapItem {
        name: name.to_string(),
        cost,
        progress: 0.0,
        brand_reward,
        conversion_reward,
        completed: false,
    })
    .collect()
}

/// Puts this month's R&D spend toward the first unfinished roadmap item and
/// pays out its reward on completion. Returns the completed item's name.
pub fn advance_roadmap(venture: &mut Venture) -> Option<String> {
    let spend = venture.levers.rd_spend.max(0.0);
    if spend <= 0.0 {
        return None;
    }
    let item = venture.roadmap.iter_mut().find(|item| !item.completed)?;
    item.progress += spend;
    if item.progress < item.cost {
        return None;
    }
    item.progress = item.cost;
    item.completed = true;
    let (name, brand, conversion) = (item.name.clone(), item.brand_reward, item.conversion_reward);
    if let Some(metrics) = venture.metrics.as_mut() {
        metrics.brand = clamp_pct(metrics.brand + brand);
        metrics.conversion_rate = (metrics.conversion_rate + conversion).clamp(0.0, 1.0);
    }
    info!(target: "sim.venture", venture = %venture.name, item = %name, "roadmap item shipped");
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::venture::{QualityTier, VentureCategory};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn pricing_above_market_trades_conversion_for_margin() {
        let config = VentureConfig::default();
        let levers = Levers {
            price_index: 120.0,
            ..Levers::default()
        };
        let effects = lever_effects(&levers, &config);
        assert_approx(effects.conversion_factor, 0.9);
        assert_approx(effects.margin_delta, 0.08);
    }

    #[test]
    fn expense_is_sum_of_lever_costs() {
        let config = VentureConfig::default();
        let levers = Levers {
            price_index: 100.0,
            quality_tier: QualityTier::Premium,
            ad_spend: 1_000.0,
            product_variety: 3,
            rd_spend: 250.0,
        };
        let effects = lever_effects(&levers, &config);
        assert_approx(effects.expense, 1_000.0 + 1_200.0 + 2.0 * 500.0 + 250.0);
        assert_approx(effects.lead_multiplier, 1.2);
        assert!(effects.churn_delta < 0.0);
        assert!(effects.brand_delta > 0.0);
    }

    #[test]
    fn roadmap_completes_in_order() {
        let mut venture = Venture::new("Ledgerly", VentureCategory::Subscription, 0.0);
        venture.roadmap = default_roadmap();
        venture.levers.rd_spend = 3_000.0;
        assert_eq!(advance_roadmap(&mut venture), None);
        assert_eq!(
            advance_roadmap(&mut venture).as_deref(),
            Some("Self-serve onboarding")
        );
        assert!(venture.roadmap[0].completed);
        assert_approx(venture.roadmap[1].progress, 0.0);
        advance_roadmap(&mut venture);
        assert_approx(venture.roadmap[1].progress, 3_000.0);
    }
}
