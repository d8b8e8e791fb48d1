use rand::Rng;
use tracing::debug;

use super::{Competitor, CompetitorArchetype, Venture};
use crate::core::rng::{noise, roll};
use crate::core::types::clamp_pct;

const MIN_SCORE: f64 = 1.0;
const PRICE_FLOOR: f64 = 50.0;
const COMPETITOR_AD_CAP: f64 = 20_000.0;
const AD_CONTEST_SCALE: f64 = 20_000.0;

impl CompetitorArchetype {
    fn action_chance(self) -> f64 {
        match self {
            CompetitorArchetype::Discounter => 0.30,
            CompetitorArchetype::QualityLeader => 0.25,
            CompetitorArchetype::GrowthHacker => 0.35,
        }
    }

    /// This month's move, if the competitor makes one.
    fn act<R: Rng + ?Sized>(self, rng: &mut R, competitor: &mut Competitor) -> Option<String> {
        if !roll(rng, self.action_chance()) {
            return None;
        }
        let summary = match self {
            CompetitorArchetype::Discounter => {
                let cut = 3.0 + rng.gen_range(0.0..4.0);
                competitor.price = (competitor.price - cut).max(PRICE_FLOOR);
                format!("{} cut prices by {cut:.1}%", competitor.name)
            }
            CompetitorArchetype::QualityLeader => {
                competitor.quality = clamp_pct(competitor.quality + 3.0);
                competitor.brand = clamp_pct(competitor.brand + 1.0);
                format!("{} invested in product quality", competitor.name)
            }
            CompetitorArchetype::GrowthHacker => {
                competitor.ad_spend = (competitor.ad_spend * (1.2 + noise(rng, 0.05))).min(COMPETITOR_AD_CAP);
                competitor.brand = clamp_pct(competitor.brand + 0.5);
                format!("{} ramped up advertising", competitor.name)
            }
        };
        Some(summary)
    }
}

pub fn seed_competitors(venture_name: &str) -> Vec<Competitor> {
    let seeds = [
        ("Bargain", CompetitorArchetype::Discounter, 85.0, 45.0, 40.0, 800.0),
        ("Crafted", CompetitorArchetype::QualityLeader, 115.0, 75.0, 55.0, 600.0),
        ("Rocket", CompetitorArchetype::GrowthHacker, 100.0, 55.0, 35.0, 1_500.0),
    ];
    let initial = seeds.len() as f64 + 1.0;
    seeds
        .into_iter()
        .map(|(prefix, archetype, price, quality, brand, ad_spend)| Competitor {
            name: format!("{prefix} {venture_name} Rival"),
            archetype,
            price,
            quality,
            brand,
            ad_spend,
            market_share: 100.0 / initial,
        })
        .collect()
}

/// Share of the player's paid reach left after rival advertising: 1.0 with
/// no rival spend, 0.5 once rivals spend `AD_CONTEST_SCALE` a month.
pub fn paid_reach_share(competitors: &[Competitor]) -> f64 {
    let rival_spend: f64 = competitors.iter().map(|c| c.ad_spend.max(0.0)).sum();
    1.0 / (1.0 + rival_spend / AD_CONTEST_SCALE)
}

pub fn run_competitor_turns<R: Rng + ?Sized>(
    rng: &mut R,
    competitors: &mut [Competitor],
) -> Vec<String> {
    competitors
        .iter_mut()
        .filter_map(|competitor| {
            let archetype = competitor.archetype;
            archetype.act(&mut *rng, competitor)
        })
        .collect()
}

fn share_score(quality: f64, price: f64, brand: f64, bonus: f64) -> f64 {
    (quality * 2.0 + (100.0 - price) + brand * 0.5 + bonus).max(MIN_SCORE)
}

/// Splits the market among the player and every competitor by score.
pub fn redistribute_market_share(venture: &mut Venture, combo_bonus: f64) {
    let Some(metrics) = venture.metrics.as_mut() else {
        return;
    };
    let player = share_score(
        metrics.quality_score,
        venture.levers.price_index,
        metrics.brand,
        combo_bonus,
    );
    let scores: Vec<f64> = venture
        .competitors
        .iter()
        .map(|c| share_score(c.quality, c.price, c.brand, 0.0))
        .collect();
    let total = player + scores.iter().sum::<f64>();
    metrics.market_share = player / total * 100.0;
    for (competitor, score) in venture.competitors.iter_mut().zip(&scores) {
        competitor.market_share = score / total * 100.0;
    }
    debug!(target: "sim.venture", share = metrics.market_share, "market share redistributed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::SimRng;
    use crate::core::venture::VentureCategory;
    use proptest::prelude::{prop_assert, proptest};
    use rand::SeedableRng;

    fn managed_venture() -> Venture {
        let mut venture = Venture::new("Loop", VentureCategory::Subscription, 0.0);
        venture.metrics = Some(crate::core::venture::stage::initial_metrics(&venture, 2_500.0));
        venture.competitors = seed_competitors("Loop");
        venture
    }

    #[test]
    fn archetypes_move_their_own_lever() {
        let mut rng = SimRng::seed_from_u64(9);
        let mut competitors = seed_competitors("Loop");
        let before = competitors.clone();
        for _ in 0..60 {
            run_competitor_turns(&mut rng, &mut competitors);
        }
        assert!(competitors[0].price < before[0].price);
        assert!(competitors[0].price >= PRICE_FLOOR);
        assert!(competitors[1].quality > before[1].quality);
        assert!(competitors[2].ad_spend > before[2].ad_spend);
        assert_eq!(competitors[1].price, before[1].price);
    }

    #[test]
    fn growth_hacker_spend_is_capped_and_crowds_out_paid_reach() {
        let mut rng = SimRng::seed_from_u64(2);
        let mut competitors = seed_competitors("Loop");
        let open = paid_reach_share(&[]);
        let seeded = paid_reach_share(&competitors);
        for _ in 0..400 {
            run_competitor_turns(&mut rng, &mut competitors);
        }
        assert_eq!(open, 1.0);
        assert!(seeded < open);
        assert!(competitors[2].ad_spend <= COMPETITOR_AD_CAP);
        assert!(paid_reach_share(&competitors) < seeded);
    }

    #[test]
    fn combo_bonus_raises_player_share() {
        let mut plain = managed_venture();
        let mut boosted = managed_venture();
        redistribute_market_share(&mut plain, 0.0);
        redistribute_market_share(&mut boosted, 10.0);
        let share = |v: &Venture| v.metrics.as_ref().map(|m| m.market_share).unwrap_or_default();
        assert!(share(&boosted) > share(&plain));
    }

    proptest! {
        #[test]
        fn prop_shares_sum_to_hundred(
            price in 50.0f64..200.0,
            brand in 0.0f64..100.0,
            bonus in 0.0f64..20.0
        ) {
            let mut venture = managed_venture();
            venture.levers.price_index = price;
            if let Some(metrics) = venture.metrics.as_mut() {
                metrics.brand = brand;
            }
            redistribute_market_share(&mut venture, bonus);
            let player = venture.metrics.as_ref().map(|m| m.market_share).unwrap_or_default();
            let total: f64 = player + venture.competitors.iter().map(|c| c.market_share).sum::<f64>();
            prop_assert!((total - 100.0).abs() < 1e-9);
            prop_assert!(player > 0.0);
        }
    }
}
