use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{DietQuality, ExerciseLevel, SleepQuality, StressManagement};

pub const BALANCE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read balance table {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid balance table JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported balance table version {found}, expected {}", BALANCE_VERSION)]
    Version { found: u32 },
    #[error("invalid balance value: {0}")]
    Invalid(String),
}

/// Every tuning constant the simulation reads. Game-balance changes are edits
/// to this table, never to the phase functions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalanceConfig {
    pub version: u32,
    pub calendar: CalendarConfig,
    pub habits: HabitTable,
    pub life: LifeConfig,
    pub combos: ComboConfig,
    pub finance: FinanceConfig,
    pub mortality: MortalityConfig,
    pub events: EventConfig,
    pub venture: VentureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalendarConfig {
    pub terminal_age: u32,
    pub min_start_age: u32,
    pub time_budget_hours: f64,
    pub overflow_happiness_per_hour: f64,
    pub overflow_health_per_hour: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitEffect {
    pub health: f64,
    pub happiness: f64,
    pub cost: f64,
}

const fn habit(health: f64, happiness: f64, cost: f64) -> HabitEffect {
    HabitEffect {
        health,
        happiness,
        cost,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HabitTable {
    pub exercise_sedentary: HabitEffect,
    pub exercise_light: HabitEffect,
    pub exercise_moderate: HabitEffect,
    pub exercise_athletic: HabitEffect,
    pub diet_poor: HabitEffect,
    pub diet_average: HabitEffect,
    pub diet_healthy: HabitEffect,
    pub sleep_deprived: HabitEffect,
    pub sleep_adequate: HabitEffect,
    pub sleep_optimal: HabitEffect,
    pub stress_neglected: HabitEffect,
    pub stress_occasional: HabitEffect,
    pub stress_dedicated: HabitEffect,
    pub poor_streak_grace_months: u32,
    pub poor_streak_health_penalty: f64,
    pub poor_streak_decay: u32,
}

impl HabitTable {
    pub fn exercise(&self, level: ExerciseLevel) -> HabitEffect {
        match level {
            ExerciseLevel::Sedentary => self.exercise_sedentary,
            ExerciseLevel::Light => self.exercise_light,
            ExerciseLevel::Moderate => self.exercise_moderate,
            ExerciseLevel::Athletic => self.exercise_athletic,
        }
    }

    pub fn diet(&self, quality: DietQuality) -> HabitEffect {
        match quality {
            DietQuality::Poor => self.diet_poor,
            DietQuality::Average => self.diet_average,
            DietQuality::Healthy => self.diet_healthy,
        }
    }

    pub fn sleep(&self, quality: SleepQuality) -> HabitEffect {
        match quality {
            SleepQuality::Deprived => self.sleep_deprived,
            SleepQuality::Adequate => self.sleep_adequate,
            SleepQuality::Optimal => self.sleep_optimal,
        }
    }

    pub fn stress(&self, level: StressManagement) -> HabitEffect {
        match level {
            StressManagement::Neglected => self.stress_neglected,
            StressManagement::Occasional => self.stress_occasional,
            StressManagement::Dedicated => self.stress_dedicated,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LifeConfig {
    pub baseline_life_expectancy: f64,
    pub life_expectancy_min: f64,
    pub life_expectancy_max: f64,
    pub health_decay_start_age: u32,
    pub health_decay_per_decade: f64,
    pub negative_cash_happiness_penalty: f64,
    pub heavy_debt_happiness_penalty: f64,
    pub deficit_happiness_penalty: f64,
    pub health_history_months: usize,
    pub long_streak_months: u32,
    pub wealth_longevity_threshold: f64,
    pub encounter_probability: f64,
    pub encounter_min_age: u32,
    pub encounter_max_age: u32,
    pub partner_happiness_per_month: f64,
    pub milestones: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComboConfig {
    pub high_threshold: f64,
    pub broad_threshold: f64,
    pub broad_count: usize,
    pub tech_founder_venture_multiplier: f64,
    pub executive_income_multiplier: f64,
    pub dealmaker_income_multiplier: f64,
    pub investor_flat_bonus: f64,
    pub creative_flat_bonus: f64,
    pub operator_flat_bonus: f64,
    pub polymath_flat_bonus: f64,
    pub market_share_bonus: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinanceConfig {
    pub investment_monthly_rate: f64,
    pub retirement_monthly_rate: f64,
    pub return_noise: f64,
    pub real_estate_monthly_rate: f64,
    pub credit_card_monthly_rate: f64,
    pub student_loan_monthly_rate: f64,
    pub mortgage_monthly_rate: f64,
    pub min_lifestyle_multiplier: f64,
    pub max_lifestyle_multiplier: f64,
    pub replacement_income_fraction: f64,
    pub replacement_income_months: u32,
    pub temp_income_months: u32,
    pub raise_cooldown_months: u32,
    pub raise_pct: f64,
    pub housing_upkeep_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MortalityConfig {
    pub threshold_age: u32,
    pub base_monthly_hazard: f64,
    pub yearly_growth: f64,
    pub low_health_floor: f64,
    pub low_health_penalty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventConfig {
    pub monthly_probability: f64,
    pub wedding_cost: f64,
    pub marriage_happiness: f64,
    pub marriage_expense_change: f64,
    pub baby_expense: f64,
    pub baby_happiness: f64,
    pub divorce_happiness: f64,
    pub divorce_cash_fraction: f64,
    pub divorce_expense_change: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VentureConfig {
    pub growth_revenue_threshold: f64,
    pub scale_revenue_threshold: f64,
    pub failure_loss_months: u32,
    pub lifecycle_min_months: [u32; 4],
    pub lifecycle_base_success: f64,
    pub lifecycle_fail_chance: f64,
    pub lifecycle_revenue: [f64; 5],
    pub lifecycle_cost_fraction: f64,
    pub conversion_per_price_point: f64,
    pub margin_per_price_point: f64,
    pub quality_surcharge: [f64; 3],
    pub quality_churn_delta: [f64; 3],
    pub quality_brand_delta: [f64; 3],
    pub cost_per_lead: f64,
    pub variety_lead_bonus: f64,
    pub variety_expense: f64,
    pub pricing_ceiling_factor: f64,
    pub ceiling_tolerance: f64,
    pub ceiling_brand_erosion: f64,
    pub ceiling_churn_nudge: f64,
    pub ad_efficiency_slope: f64,
    pub ad_efficiency_floor: f64,
    pub monthly_capacity_hours: f64,
    pub delivery_cost_fraction: [f64; 3],
    pub sub_service_bonus: f64,
    pub base_candidate_pool: usize,
    pub industry_profit_goods: f64,
    pub industry_profit_subscription: f64,
    pub industry_profit_services: f64,
    pub hire_hours: f64,
    pub fire_hours: f64,
    pub department_cost: f64,
    pub department_uplift: f64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            version: BALANCE_VERSION,
            calendar: CalendarConfig::default(),
            habits: HabitTable::default(),
            life: LifeConfig::default(),
            combos: ComboConfig::default(),
            finance: FinanceConfig::default(),
            mortality: MortalityConfig::default(),
            events: EventConfig::default(),
            venture: VentureConfig::default(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            terminal_age: 75,
            min_start_age: 18,
            time_budget_hours: 60.0,
            overflow_happiness_per_hour: 0.2,
            overflow_health_per_hour: 0.1,
        }
    }
}

impl Default for HabitTable {
    fn default() -> Self {
        Self {
            exercise_sedentary: habit(-0.3, -0.5, 0.0),
            exercise_light: habit(0.1, 0.3, 20.0),
            exercise_moderate: habit(0.3, 0.5, 50.0),
            exercise_athletic: habit(0.5, 0.5, 120.0),
            diet_poor: habit(-0.4, 0.3, 250.0),
            diet_average: habit(0.0, 0.0, 350.0),
            diet_healthy: habit(0.3, 0.2, 450.0),
            sleep_deprived: habit(-0.4, -0.8, 0.0),
            sleep_adequate: habit(0.0, 0.0, 0.0),
            sleep_optimal: habit(0.2, 0.5, 0.0),
            stress_neglected: habit(-0.2, -0.5, 0.0),
            stress_occasional: habit(0.1, 0.3, 30.0),
            stress_dedicated: habit(0.2, 0.6, 100.0),
            poor_streak_grace_months: 12,
            poor_streak_health_penalty: 0.5,
            poor_streak_decay: 2,
        }
    }
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            baseline_life_expectancy: 78.0,
            life_expectancy_min: 45.0,
            life_expectancy_max: 99.0,
            health_decay_start_age: 30,
            health_decay_per_decade: 0.05,
            negative_cash_happiness_penalty: 3.0,
            heavy_debt_happiness_penalty: 2.0,
            deficit_happiness_penalty: 1.0,
            health_history_months: 24,
            long_streak_months: 60,
            wealth_longevity_threshold: 1_000_000.0,
            encounter_probability: 0.025,
            encounter_min_age: 18,
            encounter_max_age: 60,
            partner_happiness_per_month: 0.2,
            milestones: vec![
                10_000.0,
                50_000.0,
                100_000.0,
                250_000.0,
                500_000.0,
                1_000_000.0,
                5_000_000.0,
                10_000_000.0,
            ],
        }
    }
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            high_threshold: 70.0,
            broad_threshold: 50.0,
            broad_count: 5,
            tech_founder_venture_multiplier: 1.25,
            executive_income_multiplier: 1.20,
            dealmaker_income_multiplier: 1.15,
            investor_flat_bonus: 400.0,
            creative_flat_bonus: 500.0,
            operator_flat_bonus: 300.0,
            polymath_flat_bonus: 200.0,
            market_share_bonus: 10.0,
        }
    }
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            investment_monthly_rate: 0.006,
            retirement_monthly_rate: 0.005,
            return_noise: 0.02,
            real_estate_monthly_rate: 0.003,
            credit_card_monthly_rate: 0.0183,
            student_loan_monthly_rate: 0.0045,
            mortgage_monthly_rate: 0.0054,
            min_lifestyle_multiplier: 0.5,
            max_lifestyle_multiplier: 3.0,
            replacement_income_fraction: 0.4,
            replacement_income_months: 6,
            temp_income_months: 12,
            raise_cooldown_months: 12,
            raise_pct: 10.0,
            housing_upkeep_rate: 0.001,
        }
    }
}

impl Default for MortalityConfig {
    fn default() -> Self {
        Self {
            threshold_age: 50,
            base_monthly_hazard: 0.0004,
            yearly_growth: 1.09,
            low_health_floor: 25.0,
            low_health_penalty: 0.01,
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            monthly_probability: 0.15,
            wedding_cost: 15_000.0,
            marriage_happiness: 15.0,
            marriage_expense_change: -300.0,
            baby_expense: 1_200.0,
            baby_happiness: 10.0,
            divorce_happiness: -20.0,
            divorce_cash_fraction: 0.5,
            divorce_expense_change: 600.0,
        }
    }
}

impl Default for VentureConfig {
    fn default() -> Self {
        Self {
            growth_revenue_threshold: 2_000.0,
            scale_revenue_threshold: 20_000.0,
            failure_loss_months: 6,
            lifecycle_min_months: [2, 4, 8, 18],
            lifecycle_base_success: 0.15,
            lifecycle_fail_chance: 0.04,
            lifecycle_revenue: [0.0, 300.0, 1_200.0, 2_500.0, 6_000.0],
            lifecycle_cost_fraction: 0.55,
            conversion_per_price_point: 0.005,
            margin_per_price_point: 0.004,
            quality_surcharge: [0.0, 400.0, 1_200.0],
            quality_churn_delta: [0.01, 0.0, -0.01],
            quality_brand_delta: [-0.5, 0.0, 0.8],
            cost_per_lead: 5.0,
            variety_lead_bonus: 0.10,
            variety_expense: 500.0,
            pricing_ceiling_factor: 50.0,
            ceiling_tolerance: 15.0,
            ceiling_brand_erosion: 3.0,
            ceiling_churn_nudge: 0.005,
            ad_efficiency_slope: 0.03,
            ad_efficiency_floor: 0.2,
            monthly_capacity_hours: 160.0,
            delivery_cost_fraction: [0.45, 0.35, 0.25],
            sub_service_bonus: 0.05,
            base_candidate_pool: 3,
            industry_profit_goods: 3_000.0,
            industry_profit_subscription: 5_000.0,
            industry_profit_services: 4_000.0,
            hire_hours: 10.0,
            fire_hours: 5.0,
            department_cost: 2_500.0,
            department_uplift: 0.05,
        }
    }
}

impl BalanceConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != BALANCE_VERSION {
            return Err(ConfigError::Version {
                found: self.version,
            });
        }
        if self.calendar.min_start_age >= self.calendar.terminal_age {
            return Err(ConfigError::Invalid(
                "calendar.minStartAge must be < calendar.terminalAge".to_string(),
            ));
        }
        if !self.calendar.time_budget_hours.is_finite() || self.calendar.time_budget_hours < 0.0 {
            return Err(ConfigError::Invalid(
                "calendar.timeBudgetHours must be >= 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.events.monthly_probability) {
            return Err(ConfigError::Invalid(
                "events.monthlyProbability must be between 0 and 1".to_string(),
            ));
        }
        if self.mortality.yearly_growth <= 1.0 {
            return Err(ConfigError::Invalid(
                "mortality.yearlyGrowth must be > 1".to_string(),
            ));
        }
        if self.venture.scale_revenue_threshold <= self.venture.growth_revenue_threshold {
            return Err(ConfigError::Invalid(
                "venture.scaleRevenueThreshold must be > venture.growthRevenueThreshold"
                    .to_string(),
            ));
        }
        if self.finance.min_lifestyle_multiplier > self.finance.max_lifestyle_multiplier {
            return Err(ConfigError::Invalid(
                "finance.minLifestyleMultiplier cannot exceed finance.maxLifestyleMultiplier"
                    .to_string(),
            ));
        }
        if self.life.life_expectancy_min > self.life.life_expectancy_max {
            return Err(ConfigError::Invalid(
                "life.lifeExpectancyMin cannot exceed life.lifeExpectancyMax".to_string(),
            ));
        }
        let rates = [
            self.finance.investment_monthly_rate,
            self.finance.retirement_monthly_rate,
            self.finance.return_noise,
            self.finance.real_estate_monthly_rate,
            self.finance.credit_card_monthly_rate,
            self.finance.student_loan_monthly_rate,
            self.finance.mortgage_monthly_rate,
        ];
        if rates.iter().any(|r| !r.is_finite()) {
            return Err(ConfigError::Invalid("finance rates must be finite".to_string()));
        }
        if self.life.milestones.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::Invalid(
                "life.milestones must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }
}
