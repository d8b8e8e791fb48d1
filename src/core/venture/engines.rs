use rand::Rng;

use super::competitors::paid_reach_share;
use super::levers::LeverEffects;
use super::market::ad_efficiency;
use super::{DepartmentKind, ServiceBook, Venture, VentureCategory, VentureMetrics};
use crate::core::config::VentureConfig;
use crate::core::rng::noise;

const DEMAND_NOISE: f64 = 0.10;
const SUBSCRIPTION_COST_FRACTION: f64 = 0.20;
const ORGANIC_LEADS_PER_BRAND_POINT: f64 = 0.5;
const TEAM_UPLIFT_PER_HEAD: f64 = 0.04;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineResult {
    pub revenue: f64,
    pub cogs: f64,
    pub customers: f64,
    pub leads: f64,
    pub new_customers: f64,
    pub lost_customers: f64,
}

/// One month of revenue for a managed venture, from the engine its category
/// selects. Reads the venture but does not change it.
pub fn run_engine<R: Rng + ?Sized>(
    rng: &mut R,
    venture: &Venture,
    metrics: &VentureMetrics,
    effects: &LeverEffects,
    marketing_skill: f64,
    config: &VentureConfig,
) -> EngineResult {
    let efficiency = ad_efficiency(&venture.ad_channel, venture.positioning.pricing_premium, config)
        * brand_weight(metrics.brand)
        * paid_reach_share(&venture.competitors);
    let sales_uplift = (1.0 + venture.department_uplift(DepartmentKind::Sales))
        * (1.0 + TEAM_UPLIFT_PER_HEAD * venture.staff_output());
    let mut result = match venture.category {
        VentureCategory::Goods => {
            goods_engine(rng, venture, metrics, effects, efficiency, sales_uplift, marketing_skill)
        }
        VentureCategory::Subscription => {
            subscription_engine(venture, metrics, effects, efficiency, sales_uplift, config)
        }
        VentureCategory::Services => services_engine(venture, config),
    };

    result.revenue *= 1.0 + venture.positioning.pricing_premium / 100.0;
    result.revenue = result.revenue.max(0.0);
    let cost_factor = (1.0 - effects.margin_delta)
        * (1.0 - venture.department_uplift(DepartmentKind::Operations))
        * venture.positioning.quality_multiplier.max(0.0);
    result.cogs = (result.cogs * cost_factor).max(0.0);
    result
}

/// Ads land better for a known brand: half strength at brand 0, 1.5× at 100.
fn brand_weight(brand: f64) -> f64 {
    0.5 + brand.clamp(0.0, 100.0) / 100.0
}

fn goods_engine<R: Rng + ?Sized>(
    rng: &mut R,
    venture: &Venture,
    metrics: &VentureMetrics,
    effects: &LeverEffects,
    efficiency: f64,
    sales_uplift: f64,
    marketing_skill: f64,
) -> EngineResult {
    let ad_factor = 1.0 + venture.levers.ad_spend.max(0.0) * efficiency / 1_000.0;
    let marketing_factor = 0.5 + marketing_skill / 100.0;
    let price_scale = venture.levers.price_index / 100.0;
    let mut result = EngineResult::default();
    let share_total: f64 = venture.channels.iter().map(|c| c.share).sum();

    for product in &venture.products {
        let price = product.price * price_scale;
        let competitiveness = (price / product.market_price.max(1.0)).max(0.1);
        let units = (product.base_demand * ad_factor / competitiveness
            * marketing_factor
            * effects.lead_multiplier
            * effects.conversion_factor
            * sales_uplift
            * (1.0 + noise(rng, DEMAND_NOISE)))
        .max(0.0);
        for channel in &venture.channels {
            let sold = if share_total > 0.0 {
                units * channel.share / share_total
            } else {
                0.0
            };
            let gross = sold * price;
            result.revenue += gross;
            result.cogs += gross * channel.fee_rate;
        }
        result.cogs += units * product.unit_cost;
        result.customers += units;
    }

    let bonus_units = metrics.bonus_leads.max(0.0) * metrics.conversion_rate;
    if bonus_units > 0.0 && result.customers > 0.0 {
        let average_price = result.revenue / result.customers;
        let average_cost = result.cogs / result.customers;
        result.revenue += bonus_units * average_price;
        result.cogs += bonus_units * average_cost;
        result.customers += bonus_units;
    }
    result.leads = result.customers;
    result.new_customers = result.customers;
    result
}

fn subscription_engine(
    venture: &Venture,
    metrics: &VentureMetrics,
    effects: &LeverEffects,
    efficiency: f64,
    sales_uplift: f64,
    config: &VentureConfig,
) -> EngineResult {
    let paid = if config.cost_per_lead > 0.0 {
        venture.levers.ad_spend.max(0.0) * efficiency / config.cost_per_lead
    } else {
        0.0
    };
    let organic = metrics.brand * ORGANIC_LEADS_PER_BRAND_POINT;
    let leads = (paid + organic) * effects.lead_multiplier * sales_uplift + metrics.bonus_leads.max(0.0);
    let conversion = (metrics.conversion_rate * effects.conversion_factor).clamp(0.0, 1.0);
    let churn = (metrics.churn_rate + effects.churn_delta).clamp(0.0, 1.0);

    let new_customers = leads * conversion;
    let lost_customers = metrics.customers * churn;
    let customers = (metrics.customers + new_customers - lost_customers).max(0.0);
    let revenue = customers * metrics.arpu * venture.levers.price_index / 100.0;
    EngineResult {
        revenue,
        cogs: revenue * SUBSCRIPTION_COST_FRACTION,
        customers,
        leads,
        new_customers,
        lost_customers,
    }
}

fn services_engine(venture: &Venture, config: &VentureConfig) -> EngineResult {
    let book = venture.services.clone().unwrap_or(ServiceBook {
        billable_rate: 85.0,
        utilization: 0.6,
        sub_services: 1,
    });
    let headcount = venture.staff_output() + 1.0;
    let sub_service_factor = 1.0 + config.sub_service_bonus * book.sub_services.saturating_sub(1) as f64;
    let hours = headcount * config.monthly_capacity_hours * book.utilization.clamp(0.0, 1.0) * sub_service_factor;
    let revenue = hours * book.billable_rate * venture.levers.price_index / 100.0;
    let delivery = config.delivery_cost_fraction[venture.levers.quality_tier.index()];
    EngineResult {
        revenue,
        cogs: revenue * delivery,
        customers: venture.employees.len() as f64 + 1.0,
        leads: 0.0,
        new_customers: 0.0,
        lost_customers: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::SimRng;
    use crate::core::venture::levers::lever_effects;
    use crate::core::venture::Employee;
    use crate::core::venture::stage::initial_metrics;
    use rand::SeedableRng;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn subscription_funnel_math() {
        let config = VentureConfig::default();
        let mut venture = Venture::new("Ledgerly", VentureCategory::Subscription, 0.0);
        venture.levers.ad_spend = 500.0;
        let mut metrics = initial_metrics(&venture, 4_000.0);
        metrics.customers = 100.0;
        metrics.brand = 30.0;
        metrics.conversion_rate = 0.05;
        metrics.churn_rate = 0.05;
        metrics.arpu = 40.0;
        let effects = lever_effects(&venture.levers, &config);
        let mut rng = SimRng::seed_from_u64(1);

        let result = run_engine(&mut rng, &venture, &metrics, &effects, 50.0, &config);
        // 100 paid leads at full brand weight, scaled to 0.8 by brand 30
        assert_approx(result.leads, 95.0);
        assert_approx(result.new_customers, 4.75);
        assert_approx(result.lost_customers, 5.0);
        assert_approx(result.customers, 99.75);
        assert_approx(result.revenue, 3_990.0);
        assert_approx(result.cogs, 798.0);
    }

    #[test]
    fn billable_hours_scale_with_headcount() {
        let config = VentureConfig::default();
        let mut venture = Venture::new("Studio", VentureCategory::Services, 0.0);
        let metrics = initial_metrics(&venture, 8_000.0);
        let effects = lever_effects(&venture.levers, &config);
        let mut rng = SimRng::seed_from_u64(1);

        let solo = run_engine(&mut rng, &venture, &metrics, &effects, 50.0, &config);
        assert_approx(solo.revenue, 8_160.0);
        assert_approx(solo.cogs, 8_160.0 * 0.35);

        venture.employees.push(hire(60.0, 0.9));
        let pair = run_engine(&mut rng, &venture, &metrics, &effects, 50.0, &config);
        assert_approx(pair.revenue, 8_160.0 * 1.99);
    }

    fn hire(skill: f64, reliability: f64) -> Employee {
        Employee {
            id: 1,
            name: "Kit".to_string(),
            role: "Generalist".to_string(),
            salary: 3_500.0,
            skill,
            reliability,
        }
    }

    #[test]
    fn billable_capacity_follows_staff_skill_and_reliability() {
        let config = VentureConfig::default();
        let mut strong = Venture::new("Studio", VentureCategory::Services, 0.0);
        let metrics = initial_metrics(&strong, 8_000.0);
        let effects = lever_effects(&strong.levers, &config);
        let mut flaky = strong.clone();
        strong.employees.push(hire(90.0, 1.0));
        flaky.employees.push(hire(90.0, 0.4));

        let strong = run_engine(&mut SimRng::seed_from_u64(1), &strong, &metrics, &effects, 50.0, &config);
        let flaky = run_engine(&mut SimRng::seed_from_u64(1), &flaky, &metrics, &effects, 50.0, &config);
        assert_approx(strong.revenue, 8_160.0 * 2.4);
        assert_approx(flaky.revenue, 8_160.0 * 1.56);
        assert_approx(strong.customers, 2.0);
    }

    #[test]
    fn brand_weights_goods_demand_and_paid_leads() {
        let config = VentureConfig::default();
        for category in [VentureCategory::Goods, VentureCategory::Subscription] {
            let mut venture = Venture::new("Brandable", category, 0.0);
            venture.levers.ad_spend = 2_000.0;
            let effects = lever_effects(&venture.levers, &config);
            let mut unknown = initial_metrics(&venture, 3_000.0);
            unknown.brand = 0.0;
            let mut famous = unknown.clone();
            famous.brand = 100.0;

            let low = run_engine(&mut SimRng::seed_from_u64(7), &venture, &unknown, &effects, 50.0, &config);
            let high = run_engine(&mut SimRng::seed_from_u64(7), &venture, &famous, &effects, 50.0, &config);
            assert!(high.leads > low.leads, "{category:?}: {} vs {}", high.leads, low.leads);
            assert!(high.revenue > low.revenue, "{category:?}");
        }
    }

    #[test]
    fn skilled_staff_lift_goods_and_subscription_sales() {
        let config = VentureConfig::default();
        for category in [VentureCategory::Goods, VentureCategory::Subscription] {
            let solo = Venture::new("Crew", category, 0.0);
            let mut staffed = solo.clone();
            staffed.employees.push(hire(95.0, 1.0));
            let metrics = initial_metrics(&solo, 3_000.0);
            let effects = lever_effects(&solo.levers, &config);

            let alone = run_engine(&mut SimRng::seed_from_u64(3), &solo, &metrics, &effects, 50.0, &config);
            let team = run_engine(&mut SimRng::seed_from_u64(3), &staffed, &metrics, &effects, 50.0, &config);
            assert!(team.revenue > alone.revenue, "{category:?}");
        }
    }

    #[test]
    fn rival_advertising_cuts_paid_leads() {
        let config = VentureConfig::default();
        let mut venture = Venture::new("Contested", VentureCategory::Subscription, 0.0);
        venture.levers.ad_spend = 1_000.0;
        let metrics = initial_metrics(&venture, 3_000.0);
        let effects = lever_effects(&venture.levers, &config);
        let open = run_engine(&mut SimRng::seed_from_u64(5), &venture, &metrics, &effects, 50.0, &config);
        venture.competitors = crate::core::venture::competitors::seed_competitors("Contested");
        let crowded = run_engine(&mut SimRng::seed_from_u64(5), &venture, &metrics, &effects, 50.0, &config);
        assert!(crowded.leads < open.leads);
    }

    #[test]
    fn higher_price_index_sells_fewer_goods() {
        let config = VentureConfig::default();
        let mut venture = Venture::new("Pantry", VentureCategory::Goods, 0.0);
        let metrics = initial_metrics(&venture, 3_000.0);
        let effects = lever_effects(&venture.levers, &config);
        let at_market = run_engine(
            &mut SimRng::seed_from_u64(4),
            &venture,
            &metrics,
            &effects,
            50.0,
            &config,
        );
        venture.levers.price_index = 130.0;
        let effects = lever_effects(&venture.levers, &config);
        let premium = run_engine(
            &mut SimRng::seed_from_u64(4),
            &venture,
            &metrics,
            &effects,
            50.0,
            &config,
        );
        assert!(premium.customers < at_market.customers);
        assert!(at_market.revenue > 0.0);
    }

    #[test]
    fn pricing_premium_scales_revenue() {
        let config = VentureConfig::default();
        let mut venture = Venture::new("Studio", VentureCategory::Services, 0.0);
        let metrics = initial_metrics(&venture, 8_000.0);
        let effects = lever_effects(&venture.levers, &config);
        venture.positioning.pricing_premium = 10.0;
        venture.positioning.quality_multiplier = 1.2;
        let result = run_engine(&mut SimRng::seed_from_u64(1), &venture, &metrics, &effects, 50.0, &config);
        assert_approx(result.revenue, 8_160.0 * 1.1);
        assert_approx(result.cogs, 8_160.0 * 0.35 * 1.2);
    }
}
