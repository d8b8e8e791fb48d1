use serde::{Deserialize, Serialize};

use super::config::BalanceConfig;
use super::error::SimError;
use super::events::PendingEvent;
use super::habits::project_life_expectancy;
use super::ripple::PendingRipple;
use super::skills::evaluate_stack;
use super::venture::Venture;

pub const PCT_MIN: f64 = 0.0;
pub const PCT_MAX: f64 = 100.0;
/// Most recent event-log entries kept on a record.
pub const EVENT_LOG_CAP: usize = 240;

pub fn clamp_pct(value: f64) -> f64 {
    if value.is_nan() {
        return PCT_MIN;
    }
    value.clamp(PCT_MIN, PCT_MAX)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStatus {
    Active,
    Deceased,
    Completed,
}

impl LifeStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LifeStatus::Active)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseLevel {
    Sedentary,
    Light,
    Moderate,
    Athletic,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietQuality {
    Poor,
    Average,
    Healthy,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Deprived,
    Adequate,
    Optimal,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressManagement {
    Neglected,
    Occasional,
    Dedicated,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneticsTier {
    Poor,
    BelowAverage,
    Average,
    Good,
    Elite,
}

impl GeneticsTier {
    pub fn life_expectancy_years(self) -> f64 {
        match self {
            GeneticsTier::Poor => -5.0,
            GeneticsTier::BelowAverage => -2.0,
            GeneticsTier::Average => 0.0,
            GeneticsTier::Good => 2.0,
            GeneticsTier::Elite => 5.0,
        }
    }
}

/// The six lifestyle settings. The first four are the habit axes that move
/// health and happiness every month; `smoker` and `genetics` only feed life
/// expectancy.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitSettings {
    pub exercise: ExerciseLevel,
    pub diet: DietQuality,
    pub sleep: SleepQuality,
    pub stress: StressManagement,
    pub smoker: bool,
    pub genetics: GeneticsTier,
}

impl Default for HabitSettings {
    fn default() -> Self {
        Self {
            exercise: ExerciseLevel::Light,
            diet: DietQuality::Average,
            sleep: SleepQuality::Adequate,
            stress: StressManagement::Occasional,
            smoker: false,
            genetics: GeneticsTier::Average,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    Technical,
    Entrepreneurship,
    Marketing,
    Leadership,
    Communication,
    Networking,
    Sales,
    Finance,
    Creativity,
    Negotiation,
    Operations,
}

impl SkillKind {
    pub const ALL: [SkillKind; 11] = [
        SkillKind::Technical,
        SkillKind::Entrepreneurship,
        SkillKind::Marketing,
        SkillKind::Leadership,
        SkillKind::Communication,
        SkillKind::Networking,
        SkillKind::Sales,
        SkillKind::Finance,
        SkillKind::Creativity,
        SkillKind::Negotiation,
        SkillKind::Operations,
    ];
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Skills {
    pub technical: f64,
    pub entrepreneurship: f64,
    pub marketing: f64,
    pub leadership: f64,
    pub communication: f64,
    pub networking: f64,
    pub sales: f64,
    pub finance: f64,
    pub creativity: f64,
    pub negotiation: f64,
    pub operations: f64,
}

impl Default for Skills {
    fn default() -> Self {
        Self::uniform(20.0)
    }
}

impl Skills {
    pub fn uniform(value: f64) -> Self {
        let v = clamp_pct(value);
        Self {
            technical: v,
            entrepreneurship: v,
            marketing: v,
            leadership: v,
            communication: v,
            networking: v,
            sales: v,
            finance: v,
            creativity: v,
            negotiation: v,
            operations: v,
        }
    }

    pub fn get(&self, kind: SkillKind) -> f64 {
        match kind {
            SkillKind::Technical => self.technical,
            SkillKind::Entrepreneurship => self.entrepreneurship,
            SkillKind::Marketing => self.marketing,
            SkillKind::Leadership => self.leadership,
            SkillKind::Communication => self.communication,
            SkillKind::Networking => self.networking,
            SkillKind::Sales => self.sales,
            SkillKind::Finance => self.finance,
            SkillKind::Creativity => self.creativity,
            SkillKind::Negotiation => self.negotiation,
            SkillKind::Operations => self.operations,
        }
    }

    fn slot(&mut self, kind: SkillKind) -> &mut f64 {
        match kind {
            SkillKind::Technical => &mut self.technical,
            SkillKind::Entrepreneurship => &mut self.entrepreneurship,
            SkillKind::Marketing => &mut self.marketing,
            SkillKind::Leadership => &mut self.leadership,
            SkillKind::Communication => &mut self.communication,
            SkillKind::Networking => &mut self.networking,
            SkillKind::Sales => &mut self.sales,
            SkillKind::Finance => &mut self.finance,
            SkillKind::Creativity => &mut self.creativity,
            SkillKind::Negotiation => &mut self.negotiation,
            SkillKind::Operations => &mut self.operations,
        }
    }

    pub fn add(&mut self, kind: SkillKind, delta: f64) {
        let slot = self.slot(kind);
        *slot = clamp_pct(*slot + delta);
    }

    pub fn set(&mut self, kind: SkillKind, value: f64) {
        *self.slot(kind) = clamp_pct(value);
    }

    pub fn values(&self) -> [f64; 11] {
        SkillKind::ALL.map(|kind| self.get(kind))
    }

    pub fn average(&self) -> f64 {
        self.values().iter().sum::<f64>() / SkillKind::ALL.len() as f64
    }

    pub fn clamp_all(&mut self) {
        for kind in SkillKind::ALL {
            let slot = self.slot(kind);
            *slot = clamp_pct(*slot);
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCombo {
    TechFounder,
    Executive,
    Dealmaker,
    Investor,
    CreativeDirector,
    Operator,
    Polymath,
}

impl SkillCombo {
    pub fn label(self) -> &'static str {
        match self {
            SkillCombo::TechFounder => "Tech Founder",
            SkillCombo::Executive => "Executive Presence",
            SkillCombo::Dealmaker => "Dealmaker",
            SkillCombo::Investor => "Savvy Investor",
            SkillCombo::CreativeDirector => "Creative Director",
            SkillCombo::Operator => "Operator",
            SkillCombo::Polymath => "Polymath",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Single,
    Dating,
    Married,
    Divorced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub name: String,
    pub months_together: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtCategory {
    CreditCard,
    StudentLoan,
    Mortgage,
}

impl DebtCategory {
    pub fn label(self) -> &'static str {
        match self {
            DebtCategory::CreditCard => "credit card",
            DebtCategory::StudentLoan => "student loan",
            DebtCategory::Mortgage => "mortgage",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Debts {
    pub credit_card: f64,
    pub student_loan: f64,
    pub mortgage: f64,
    pub total: f64,
}

impl Debts {
    pub fn balance(&self, category: DebtCategory) -> f64 {
        match category {
            DebtCategory::CreditCard => self.credit_card,
            DebtCategory::StudentLoan => self.student_loan,
            DebtCategory::Mortgage => self.mortgage,
        }
    }

    pub fn balance_mut(&mut self, category: DebtCategory) -> &mut f64 {
        match category {
            DebtCategory::CreditCard => &mut self.credit_card,
            DebtCategory::StudentLoan => &mut self.student_loan,
            DebtCategory::Mortgage => &mut self.mortgage,
        }
    }

    pub fn recompute_total(&mut self) {
        self.credit_card = self.credit_card.max(0.0);
        self.student_loan = self.student_loan.max(0.0);
        self.mortgage = self.mortgage.max(0.0);
        self.total = self.credit_card + self.student_loan + self.mortgage;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finances {
    pub cash: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub lifestyle_multiplier: f64,
    pub investments: f64,
    pub real_estate: f64,
    pub retirement: f64,
    pub debts: Debts,
    pub lifetime_income: f64,
    pub net_worth: f64,
}

impl Finances {
    pub fn compute_net_worth(&self) -> f64 {
        self.cash + self.investments + self.real_estate + self.retirement - self.debts.total
    }

    pub fn recompute_net_worth(&mut self) {
        self.debts.recompute_total();
        self.net_worth = self.compute_net_worth();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    pub happiness: f64,
    pub health: f64,
    pub habits: HabitSettings,
    pub poor_habit_streak: u32,
    pub exercise_streak: u32,
    pub life_expectancy: f64,
    pub health_history: Vec<f64>,
    pub happiness_history: Vec<f64>,
    pub happiness_sum: f64,
    pub months_tracked: u32,
}

impl Vitals {
    pub fn add_happiness(&mut self, delta: f64) {
        self.happiness = clamp_pct(self.happiness + delta);
    }

    pub fn add_health(&mut self, delta: f64) {
        self.health = clamp_pct(self.health + delta);
    }

    pub fn average_happiness(&self) -> f64 {
        if self.months_tracked == 0 {
            return self.happiness;
        }
        self.happiness_sum / self.months_tracked as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub age: u32,
    pub month: u32,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActiveEffectKind {
    IncomePct { pct: f64 },
    ReplacementIncome { amount: f64 },
    Happiness { per_month: f64 },
    Health { per_month: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEffect {
    pub label: String,
    pub kind: ActiveEffectKind,
    pub months_remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBudget {
    pub hours: f64,
    pub used: f64,
}

impl TimeBudget {
    pub fn remaining(&self) -> f64 {
        (self.hours - self.used).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    pub player_name: String,
    pub job_title: String,
    pub career_level: u32,
    pub seed: u64,
    pub age: u32,
    pub month: u32,
    pub months_elapsed: u32,
    pub status: LifeStatus,
    pub finances: Finances,
    pub vitals: Vitals,
    pub skills: Skills,
    pub skill_stack_multiplier: f64,
    pub active_combo: Option<SkillCombo>,
    pub relationship: RelationshipStatus,
    pub partner: Option<Partner>,
    pub dependents: u32,
    pub event_log: Vec<LogEntry>,
    pub decision_log: Vec<LogEntry>,
    pub pending_event: Option<PendingEvent>,
    pub seen_events: Vec<String>,
    pub active_effects: Vec<ActiveEffect>,
    pub pending_ripples: Vec<PendingRipple>,
    pub next_ripple_id: u64,
    pub time_budget: TimeBudget,
    pub milestones_reached: Vec<f64>,
    pub last_raise_request: Option<u32>,
    pub venture: Option<Venture>,
}

/// Starting position handed over by whoever sets up a new life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewPlayer {
    pub name: String,
    pub age: u32,
    pub job_title: String,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub cash: f64,
    pub seed: u64,
    pub habits: HabitSettings,
    pub skills: Skills,
    pub debts: Debts,
}

impl Default for NewPlayer {
    fn default() -> Self {
        Self {
            name: "Player".to_string(),
            age: 22,
            job_title: "Junior Analyst".to_string(),
            monthly_income: 3_500.0,
            monthly_expenses: 2_000.0,
            cash: 2_000.0,
            seed: 0,
            habits: HabitSettings::default(),
            skills: Skills::default(),
            debts: Debts::default(),
        }
    }
}

impl GameRecord {
    pub fn new(id: impl Into<String>, player: NewPlayer, config: &BalanceConfig) -> Result<Self, SimError> {
        let calendar = &config.calendar;
        if player.age < calendar.min_start_age || player.age >= calendar.terminal_age {
            return Err(SimError::InvalidSetup(format!(
                "age must be between {} and {}",
                calendar.min_start_age,
                calendar.terminal_age - 1
            )));
        }
        if player.name.trim().is_empty() {
            return Err(SimError::InvalidSetup("name is required".to_string()));
        }
        let amounts = [player.cash, player.monthly_income, player.monthly_expenses];
        if amounts.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(SimError::InvalidSetup(
                "cash, income and expenses must be non-negative".to_string(),
            ));
        }

        let mut skills = player.skills;
        skills.clamp_all();
        let stack = evaluate_stack(&skills, &config.combos);
        let mut finances = Finances {
            cash: player.cash,
            monthly_income: player.monthly_income,
            monthly_expenses: player.monthly_expenses,
            lifestyle_multiplier: 1.0,
            investments: 0.0,
            real_estate: 0.0,
            retirement: 0.0,
            debts: player.debts,
            lifetime_income: 0.0,
            net_worth: 0.0,
        };
        finances.recompute_net_worth();
        let mut vitals = Vitals {
            happiness: 60.0,
            health: 80.0,
            habits: player.habits,
            poor_habit_streak: 0,
            exercise_streak: 0,
            life_expectancy: config.life.baseline_life_expectancy,
            health_history: Vec::new(),
            happiness_history: Vec::new(),
            happiness_sum: 0.0,
            months_tracked: 0,
        };
        vitals.life_expectancy = project_life_expectancy(&vitals, finances.net_worth, config);

        Ok(Self {
            id: id.into(),
            player_name: player.name.trim().to_string(),
            job_title: player.job_title,
            career_level: 1,
            seed: player.seed,
            age: player.age,
            month: 1,
            months_elapsed: 0,
            status: LifeStatus::Active,
            finances,
            vitals,
            skills,
            skill_stack_multiplier: stack.multiplier,
            active_combo: stack.combo,
            relationship: RelationshipStatus::Single,
            partner: None,
            dependents: 0,
            event_log: Vec::new(),
            decision_log: Vec::new(),
            pending_event: None,
            seen_events: Vec::new(),
            active_effects: Vec::new(),
            pending_ripples: Vec::new(),
            next_ripple_id: 1,
            time_budget: TimeBudget {
                hours: calendar.time_budget_hours,
                used: 0.0,
            },
            milestones_reached: Vec::new(),
            last_raise_request: None,
            venture: None,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn log_event(&mut self, title: impl Into<String>, detail: impl Into<String>) {
        let entry = LogEntry {
            age: self.age,
            month: self.month,
            title: title.into(),
            detail: detail.into(),
        };
        self.event_log.push(entry);
        if self.event_log.len() > EVENT_LOG_CAP {
            let excess = self.event_log.len() - EVENT_LOG_CAP;
            self.event_log.drain(..excess);
        }
    }

    pub fn log_decision(&mut self, title: impl Into<String>, detail: impl Into<String>) {
        let entry = LogEntry {
            age: self.age,
            month: self.month,
            title: title.into(),
            detail: detail.into(),
        };
        self.decision_log.push(entry);
    }

    /// Months since the player's 0th birthday, used to order calendar positions.
    pub fn calendar_index(&self) -> u32 {
        calendar_index(self.age, self.month)
    }
}

pub fn calendar_index(age: u32, month: u32) -> u32 {
    age * 12 + month.saturating_sub(1)
}

/// Calendar position `months` after (age, month).
pub fn calendar_after(age: u32, month: u32, months: u32) -> (u32, u32) {
    let index = calendar_index(age, month) + months;
    (index / 12, index % 12 + 1)
}
