use rand::Rng;

use super::config::{BalanceConfig, MortalityConfig};
use super::rng::roll;
use super::types::LifeStatus;

pub fn monthly_death_probability(age: u32, health: f64, config: &MortalityConfig) -> f64 {
    if age < config.threshold_age {
        return 0.0;
    }
    let years_over = (age - config.threshold_age) as i32;
    let mut probability = config.base_monthly_hazard * config.yearly_growth.powi(years_over);
    if health < config.low_health_floor {
        probability += config.low_health_penalty;
    }
    probability.clamp(0.0, 1.0)
}

/// Terminal status for this month, if any. Death is rolled first; the fixed
/// terminal age only applies to a player who survived the roll.
pub fn check_terminal<R: Rng + ?Sized>(
    rng: &mut R,
    age: u32,
    health: f64,
    config: &BalanceConfig,
) -> Option<LifeStatus> {
    let probability = monthly_death_probability(age, health, &config.mortality);
    if roll(rng, probability) {
        return Some(LifeStatus::Deceased);
    }
    if age >= config.calendar.terminal_age {
        return Some(LifeStatus::Completed);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::SimRng;
    use rand::SeedableRng;

    const EPS: f64 = 1e-12;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn no_hazard_below_threshold() {
        let config = MortalityConfig::default();
        assert_eq!(monthly_death_probability(49, 5.0, &config), 0.0);
    }

    #[test]
    fn hazard_compounds_yearly_and_adds_low_health_penalty() {
        let config = MortalityConfig::default();
        assert_approx(monthly_death_probability(50, 80.0, &config), 0.0004);
        assert_approx(
            monthly_death_probability(60, 80.0, &config),
            0.0004 * 1.09_f64.powi(10),
        );
        assert_approx(
            monthly_death_probability(60, 10.0, &config),
            0.0004 * 1.09_f64.powi(10) + 0.01,
        );
    }

    #[test]
    fn terminal_age_completes_survivors() {
        let mut config = BalanceConfig::default();
        config.mortality.base_monthly_hazard = 0.0;
        config.mortality.low_health_penalty = 0.0;
        let mut rng = SimRng::seed_from_u64(5);
        assert_eq!(check_terminal(&mut rng, 74, 90.0, &config), None);
        assert_eq!(
            check_terminal(&mut rng, 75, 90.0, &config),
            Some(LifeStatus::Completed)
        );
    }

    #[test]
    fn certain_death_wins_over_terminal_age() {
        let mut config = BalanceConfig::default();
        config.mortality.base_monthly_hazard = 1.0;
        let mut rng = SimRng::seed_from_u64(5);
        assert_eq!(
            check_terminal(&mut rng, 75, 90.0, &config),
            Some(LifeStatus::Deceased)
        );
    }
}
