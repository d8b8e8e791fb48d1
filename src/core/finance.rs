use rand::Rng;
use serde::Serialize;

use super::config::{FinanceConfig, LifeConfig};
use super::rng::noise;
use super::skills::ComboBonuses;
use super::types::Finances;

/// Income adjustments contributed by time-boxed active effects this month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EffectIncome {
    pub pct: f64,
    pub replacement: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeBreakdown {
    pub salary: f64,
    pub venture: f64,
    pub flat_bonus: f64,
    pub replacement: f64,
    pub total: f64,
}

/// Salary scaled by the skill multiplier, venture profit scaled by the
/// venture combo bonus, then the total combo multiplier over both. Flat combo
/// bonuses and replacement income are added last and are never multiplied.
pub fn effective_income(
    finances: &Finances,
    skill_multiplier: f64,
    venture_profit: f64,
    effects: EffectIncome,
    bonuses: &ComboBonuses,
) -> IncomeBreakdown {
    let salary = finances.monthly_income * (1.0 + effects.pct / 100.0).max(0.0) * skill_multiplier;
    let venture = if venture_profit > 0.0 {
        venture_profit * bonuses.venture_profit_multiplier
    } else {
        venture_profit
    };
    let multiplied = (salary + venture) * bonuses.income_multiplier;
    IncomeBreakdown {
        salary,
        venture,
        flat_bonus: bonuses.flat_income,
        replacement: effects.replacement,
        total: multiplied + bonuses.flat_income + effects.replacement,
    }
}

pub fn monthly_outgoings(finances: &Finances, habit_cost: f64, config: &FinanceConfig) -> f64 {
    finances.monthly_expenses * finances.lifestyle_multiplier
        + habit_cost
        + finances.real_estate * config.housing_upkeep_rate
}

/// Moves the month's net into cash and returns it.
pub fn settle(finances: &mut Finances, income: f64, outgoings: f64) -> f64 {
    let net = income - outgoings;
    finances.cash += net;
    net
}

pub fn grow_assets<R: Rng + ?Sized>(rng: &mut R, finances: &mut Finances, config: &FinanceConfig) {
    let investment_rate = config.investment_monthly_rate + noise(rng, config.return_noise);
    let retirement_rate = config.retirement_monthly_rate + noise(rng, config.return_noise);
    finances.investments = (finances.investments * (1.0 + investment_rate)).max(0.0);
    finances.retirement = (finances.retirement * (1.0 + retirement_rate)).max(0.0);
    finances.real_estate = (finances.real_estate * (1.0 + config.real_estate_monthly_rate)).max(0.0);
}

pub fn accrue_lifetime_income(finances: &mut Finances, income: f64) {
    if income > 0.0 {
        finances.lifetime_income += income;
    }
}

pub fn compound_debts(finances: &mut Finances, config: &FinanceConfig) {
    let debts = &mut finances.debts;
    debts.credit_card *= 1.0 + config.credit_card_monthly_rate;
    debts.student_loan *= 1.0 + config.student_loan_monthly_rate;
    debts.mortgage *= 1.0 + config.mortgage_monthly_rate;
    debts.recompute_total();
}

/// Monthly health loss from ageing, growing with each decade past the onset age.
pub fn age_health_decay(age: u32, config: &LifeConfig) -> f64 {
    if age <= config.health_decay_start_age {
        return 0.0;
    }
    config.health_decay_per_decade * (age - config.health_decay_start_age) as f64 / 10.0
}

/// Happiness lost to money worries: negative cash, debt above a year of
/// income, and a month that ran a deficit each count once.
pub fn financial_stress_penalty(finances: &Finances, net: f64, config: &LifeConfig) -> f64 {
    let mut penalty = 0.0;
    if finances.cash < 0.0 {
        penalty += config.negative_cash_happiness_penalty;
    }
    let annual_income = finances.monthly_income * 12.0;
    let unsecured = finances.debts.credit_card + finances.debts.student_loan;
    if unsecured > 0.0 && unsecured > annual_income {
        penalty += config.heavy_debt_happiness_penalty;
    }
    if net < 0.0 {
        penalty += config.deficit_happiness_penalty;
    }
    penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{BalanceConfig, ComboConfig};
    use crate::core::rng::SimRng;
    use crate::core::skills::combo_bonuses;
    use crate::core::testutil::sample_record;
    use crate::core::types::SkillCombo;
    use proptest::prelude::{prop_assert, proptest};
    use rand::SeedableRng;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn income_layers_multipliers_in_order() {
        let record = sample_record();
        let combos = ComboConfig::default();
        let bonuses = combo_bonuses(Some(SkillCombo::Executive), &combos);
        let income = effective_income(
            &record.finances,
            1.25,
            1_000.0,
            EffectIncome::default(),
            &bonuses,
        );
        assert_approx(income.salary, 6_250.0);
        assert_approx(income.total, (6_250.0 + 1_000.0) * 1.20);

        let founder = combo_bonuses(Some(SkillCombo::TechFounder), &combos);
        let income = effective_income(&record.finances, 1.0, 1_000.0, EffectIncome::default(), &founder);
        assert_approx(income.venture, 1_250.0);
        assert_approx(income.total, 6_250.0);
    }

    #[test]
    fn venture_losses_are_not_boosted() {
        let record = sample_record();
        let founder = combo_bonuses(Some(SkillCombo::TechFounder), &ComboConfig::default());
        let income = effective_income(&record.finances, 1.0, -800.0, EffectIncome::default(), &founder);
        assert_approx(income.venture, -800.0);
        assert_approx(income.total, 4_200.0);
    }

    #[test]
    fn replacement_income_and_temp_pct_apply() {
        let mut record = sample_record();
        record.finances.monthly_income = 0.0;
        let income = effective_income(
            &record.finances,
            1.5,
            0.0,
            EffectIncome {
                pct: 10.0,
                replacement: 2_000.0,
            },
            &ComboBonuses::NONE,
        );
        assert_approx(income.total, 2_000.0);

        record.finances.monthly_income = 4_000.0;
        let income = effective_income(
            &record.finances,
            1.0,
            0.0,
            EffectIncome {
                pct: -25.0,
                replacement: 0.0,
            },
            &ComboBonuses::NONE,
        );
        assert_approx(income.total, 3_000.0);
    }

    #[test]
    fn outgoings_scale_with_lifestyle() {
        let config = FinanceConfig::default();
        let mut record = sample_record();
        record.finances.lifestyle_multiplier = 1.5;
        record.finances.real_estate = 200_000.0;
        assert_approx(
            monthly_outgoings(&record.finances, 400.0, &config),
            2_500.0 * 1.5 + 400.0 + 200.0,
        );
    }

    #[test]
    fn debts_compound_per_category() {
        let config = FinanceConfig::default();
        let mut record = sample_record();
        record.finances.debts.credit_card = 1_000.0;
        record.finances.debts.mortgage = 100_000.0;
        compound_debts(&mut record.finances, &config);
        assert_approx(record.finances.debts.credit_card, 1_018.3);
        assert_approx(record.finances.debts.mortgage, 100_540.0);
        assert_approx(record.finances.debts.total, 101_558.3);
    }

    #[test]
    fn real_estate_grows_without_noise() {
        let config = FinanceConfig::default();
        let mut record = sample_record();
        record.finances.real_estate = 100_000.0;
        grow_assets(&mut SimRng::seed_from_u64(1), &mut record.finances, &config);
        assert_approx(record.finances.real_estate, 100_300.0);
    }

    #[test]
    fn stress_penalties_stack() {
        let config = BalanceConfig::default();
        let mut record = sample_record();
        record.finances.cash = -100.0;
        record.finances.debts.credit_card = 70_000.0;
        let penalty = financial_stress_penalty(&record.finances, -50.0, &config.life);
        assert_approx(penalty, 3.0 + 2.0 + 1.0);
        assert_approx(age_health_decay(30, &config.life), 0.0);
        assert_approx(age_health_decay(50, &config.life), 0.1);
    }

    proptest! {
        #[test]
        fn prop_growth_stays_within_noise_band(
            balance in 0.0f64..1_000_000.0,
            seed in 0u64..1_000
        ) {
            let config = FinanceConfig::default();
            let mut record = sample_record();
            record.finances.investments = balance;
            grow_assets(&mut SimRng::seed_from_u64(seed), &mut record.finances, &config);
            let low = balance * (1.0 + config.investment_monthly_rate - config.return_noise);
            let high = balance * (1.0 + config.investment_monthly_rate + config.return_noise);
            prop_assert!(record.finances.investments >= low - 1e-6);
            prop_assert!(record.finances.investments <= high + 1e-6);
        }

        #[test]
        fn prop_net_worth_identity_after_ledger_phases(
            cash in -20_000.0f64..200_000.0,
            investments in 0.0f64..500_000.0,
            card in 0.0f64..30_000.0,
            seed in 0u64..1_000
        ) {
            let config = FinanceConfig::default();
            let mut record = sample_record();
            let finances = &mut record.finances;
            finances.cash = cash;
            finances.investments = investments;
            finances.debts.credit_card = card;
            let income = effective_income(finances, 1.1, 0.0, EffectIncome::default(), &ComboBonuses::NONE);
            let outgoings = monthly_outgoings(finances, 300.0, &config);
            settle(finances, income.total, outgoings);
            grow_assets(&mut SimRng::seed_from_u64(seed), finances, &config);
            compound_debts(finances, &config);
            finances.recompute_net_worth();
            let expected = finances.cash + finances.investments + finances.real_estate
                + finances.retirement - finances.debts.total;
            prop_assert!((finances.net_worth - expected).abs() < 1e-6);
        }
    }
}
