use serde::{Deserialize, Serialize};
use tracing::info;

use super::config::BalanceConfig;
use super::error::{Rejection, SimError};
use super::habits::habits_improved;
use super::rng::{decision_rng, roll};
use super::types::{
    ActiveEffect, ActiveEffectKind, DebtCategory, GameRecord, HabitSettings, SkillKind,
};
use super::venture::{Venture, VentureCategory, VentureStage};

const JOB_APPLICATION_HOURS: f64 = 8.0;
const SIDE_HUSTLE_HOURS: f64 = 10.0;
const MIN_DOWN_PAYMENT: f64 = 0.10;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Applied,
    Rejected,
}

/// Result of a decision or event resolution. A rejected outcome carries the
/// record exactly as it was handed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub status: OutcomeStatus,
    pub message: String,
    pub record: GameRecord,
}

impl ActionOutcome {
    pub fn applied(record: GameRecord, message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Applied,
            message: message.into(),
            record,
        }
    }

    pub fn rejected(record: &GameRecord, rejection: Rejection) -> Self {
        info!(target: "sim.decision", id = %record.id, reason = %rejection, "rejected");
        Self {
            status: OutcomeStatus::Rejected,
            message: rejection.to_string(),
            record: record.clone(),
        }
    }
}

pub fn ensure_active(record: &GameRecord) -> Result<(), SimError> {
    if record.is_terminal() {
        return Err(SimError::Terminal {
            id: record.id.clone(),
            status: record.status,
        });
    }
    Ok(())
}

/// Checks the month's remaining hours and the player's cash.
pub fn require_resources(record: &GameRecord, hours: f64, cash: f64) -> Result<(), Rejection> {
    let available_hours = record.time_budget.remaining();
    if hours > available_hours {
        return Err(Rejection::InsufficientTime {
            required: hours,
            available: available_hours,
        });
    }
    if cash > record.finances.cash {
        return Err(Rejection::InsufficientFunds {
            required: cash,
            available: record.finances.cash,
        });
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationProgram {
    Certificate,
    Bootcamp,
    Degree,
    Mba,
}

struct ProgramTerms {
    name: &'static str,
    cost: f64,
    hours: f64,
    gains: &'static [(SkillKind, f64)],
}

impl EducationProgram {
    fn terms(self) -> ProgramTerms {
        match self {
            EducationProgram::Certificate => ProgramTerms {
                name: "professional certificate",
                cost: 2_000.0,
                hours: 10.0,
                gains: &[(SkillKind::Technical, 5.0), (SkillKind::Operations, 3.0)],
            },
            EducationProgram::Bootcamp => ProgramTerms {
                name: "coding bootcamp",
                cost: 12_000.0,
                hours: 30.0,
                gains: &[(SkillKind::Technical, 15.0), (SkillKind::Creativity, 5.0)],
            },
            EducationProgram::Degree => ProgramTerms {
                name: "degree",
                cost: 40_000.0,
                hours: 20.0,
                gains: &[
                    (SkillKind::Technical, 8.0),
                    (SkillKind::Communication, 8.0),
                    (SkillKind::Finance, 6.0),
                    (SkillKind::Creativity, 6.0),
                ],
            },
            EducationProgram::Mba => ProgramTerms {
                name: "MBA",
                cost: 90_000.0,
                hours: 25.0,
                gains: &[
                    (SkillKind::Leadership, 12.0),
                    (SkillKind::Finance, 12.0),
                    (SkillKind::Networking, 10.0),
                    (SkillKind::Entrepreneurship, 8.0),
                ],
            },
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentAccount {
    Stocks,
    Retirement,
}

/// Discrete choices the player makes between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Decision {
    RequestRaise,
    ApplyForJob { title: String, salary: f64 },
    StartSideHustle {
        name: String,
        category: VentureCategory,
        investment: f64,
    },
    EnrollEducation {
        program: EducationProgram,
        financed: bool,
    },
    BuyHousing { price: f64, down_payment: f64 },
    Invest {
        account: InvestmentAccount,
        amount: f64,
    },
    PayDebt { category: DebtCategory, amount: f64 },
    SetLifestyle { multiplier: f64 },
    ChangeHabits { habits: HabitSettings },
    ShutDownVenture,
}

impl Decision {
    pub fn title(&self) -> &'static str {
        match self {
            Decision::RequestRaise => "Raise request",
            Decision::ApplyForJob { .. } => "Job application",
            Decision::StartSideHustle { .. } => "Side hustle",
            Decision::EnrollEducation { .. } => "Education",
            Decision::BuyHousing { .. } => "Home purchase",
            Decision::Invest { .. } => "Investment",
            Decision::PayDebt { .. } => "Debt payment",
            Decision::SetLifestyle { .. } => "Lifestyle",
            Decision::ChangeHabits { .. } => "Habits",
            Decision::ShutDownVenture => "Venture shutdown",
        }
    }
}

fn positive_amount(amount: f64, what: &str) -> Result<f64, Rejection> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Rejection::Invalid(format!("{what} must be a positive amount")));
    }
    Ok(amount)
}

/// Applies one decision. Validation failures come back as a rejected
/// outcome with the record untouched; only a finished life is an error.
pub fn apply_decision(
    record: &GameRecord,
    decision: &Decision,
    config: &BalanceConfig,
) -> Result<ActionOutcome, SimError> {
    ensure_active(record)?;
    let mut next = record.clone();
    match apply_to(&mut next, decision, config) {
        Ok(message) => {
            next.finances.recompute_net_worth();
            next.log_decision(decision.title(), message.clone());
            info!(target: "sim.decision", id = %next.id, kind = decision.title(), %message, "decision applied");
            Ok(ActionOutcome::applied(next, message))
        }
        Err(rejection) => Ok(ActionOutcome::rejected(record, rejection)),
    }
}

fn apply_to(
    record: &mut GameRecord,
    decision: &Decision,
    config: &BalanceConfig,
) -> Result<String, Rejection> {
    match decision {
        Decision::RequestRaise => request_raise(record, config),
        Decision::ApplyForJob { title, salary } => apply_for_job(record, title, *salary),
        Decision::StartSideHustle {
            name,
            category,
            investment,
        } => start_side_hustle(record, name, *category, *investment),
        Decision::EnrollEducation { program, financed } => {
            enroll(record, *program, *financed, config)
        }
        Decision::BuyHousing {
            price,
            down_payment,
        } => buy_housing(record, *price, *down_payment),
        Decision::Invest { account, amount } => {
            let amount = positive_amount(*amount, "Investment")?;
            require_resources(record, 0.0, amount)?;
            record.finances.cash -= amount;
            match account {
                InvestmentAccount::Stocks => record.finances.investments += amount,
                InvestmentAccount::Retirement => record.finances.retirement += amount,
            }
            let label = match account {
                InvestmentAccount::Stocks => "stocks",
                InvestmentAccount::Retirement => "retirement",
            };
            Ok(format!("Moved ${amount:.0} into {label}"))
        }
        Decision::PayDebt { category, amount } => pay_debt(record, *category, *amount),
        Decision::SetLifestyle { multiplier } => {
            let finance = &config.finance;
            if !(finance.min_lifestyle_multiplier..=finance.max_lifestyle_multiplier)
                .contains(multiplier)
            {
                return Err(Rejection::Invalid(format!(
                    "Lifestyle multiplier must be between {} and {}",
                    finance.min_lifestyle_multiplier, finance.max_lifestyle_multiplier
                )));
            }
            record.finances.lifestyle_multiplier = *multiplier;
            Ok(format!("Lifestyle set to {multiplier:.2}x"))
        }
        Decision::ChangeHabits { habits } => {
            let improved = habits_improved(&record.vitals.habits, habits);
            if improved {
                record.vitals.poor_habit_streak = record
                    .vitals
                    .poor_habit_streak
                    .saturating_sub(config.habits.poor_streak_decay);
            }
            record.vitals.habits = *habits;
            Ok(if improved {
                "Committed to healthier habits".to_string()
            } else {
                "Updated daily habits".to_string()
            })
        }
        Decision::ShutDownVenture => {
            let venture = record.venture.as_mut().ok_or(Rejection::NoVenture)?;
            if venture.stage == VentureStage::Failed {
                return Err(Rejection::NoVenture);
            }
            venture.stage = VentureStage::Failed;
            venture.last_net_profit = 0.0;
            venture.pending_decisions.clear();
            venture.candidates.clear();
            Ok(format!("Shut down {}", venture.name))
        }
    }
}

fn request_raise(record: &mut GameRecord, config: &BalanceConfig) -> Result<String, Rejection> {
    let now = record.calendar_index();
    if let Some(last) = record.last_raise_request {
        let waited = now.saturating_sub(last);
        if waited < config.finance.raise_cooldown_months {
            return Err(Rejection::Cooldown {
                months: config.finance.raise_cooldown_months - waited,
            });
        }
    }
    if record.finances.monthly_income <= 0.0 {
        return Err(Rejection::Invalid("You need a job to ask for a raise".to_string()));
    }
    let mut rng = decision_rng(record);
    let chance = 0.35 + (record.skills.negotiation + record.skills.communication) / 400.0;
    record.last_raise_request = Some(now);
    if roll(&mut rng, chance) {
        record.finances.monthly_income *= 1.0 + config.finance.raise_pct / 100.0;
        record.vitals.add_happiness(3.0);
        Ok(format!(
            "Raise approved: income now ${:.0}/month",
            record.finances.monthly_income
        ))
    } else {
        record.vitals.add_happiness(-2.0);
        Ok("Raise declined this time".to_string())
    }
}

fn apply_for_job(record: &mut GameRecord, title: &str, salary: f64) -> Result<String, Rejection> {
    let salary = positive_amount(salary, "Salary")?;
    if title.trim().is_empty() {
        return Err(Rejection::Invalid("Job title is required".to_string()));
    }
    require_resources(record, JOB_APPLICATION_HOURS, 0.0)?;
    let mut rng = decision_rng(record);
    let fit = (record.skills.technical + record.skills.communication + record.skills.networking)
        / 300.0;
    let stretch = if salary > record.finances.monthly_income * 1.5 {
        0.6
    } else {
        1.0
    };
    record.time_budget.used += JOB_APPLICATION_HOURS;
    if roll(&mut rng, (0.25 + fit * 0.5) * stretch) {
        if salary > record.finances.monthly_income {
            record.career_level += 1;
        }
        record.job_title = title.trim().to_string();
        record.finances.monthly_income = salary;
        Ok(format!("Hired as {} at ${salary:.0}/month", record.job_title))
    } else {
        Ok(format!("The {} application did not work out", title.trim()))
    }
}

fn start_side_hustle(
    record: &mut GameRecord,
    name: &str,
    category: VentureCategory,
    investment: f64,
) -> Result<String, Rejection> {
    if record
        .venture
        .as_ref()
        .is_some_and(|v| v.stage != VentureStage::Failed)
    {
        return Err(Rejection::VentureExists);
    }
    if name.trim().is_empty() {
        return Err(Rejection::Invalid("Venture name is required".to_string()));
    }
    if !investment.is_finite() || investment < 0.0 {
        return Err(Rejection::Invalid("Investment cannot be negative".to_string()));
    }
    require_resources(record, SIDE_HUSTLE_HOURS, investment)?;
    record.finances.cash -= investment;
    record.time_budget.used += SIDE_HUSTLE_HOURS;
    record.venture = Some(Venture::new(name.trim(), category, investment));
    Ok(format!("Started {} with ${investment:.0}", name.trim()))
}

fn enroll(
    record: &mut GameRecord,
    program: EducationProgram,
    financed: bool,
    config: &BalanceConfig,
) -> Result<String, Rejection> {
    let terms = program.terms();
    let upfront = if financed { 0.0 } else { terms.cost };
    // Coursework runs over the cap rather than being refused; the tick
    // charges the overflow.
    require_resources(record, 0.0, upfront)?;
    if financed {
        record.finances.debts.student_loan += terms.cost;
        record.finances.debts.recompute_total();
    } else {
        record.finances.cash -= terms.cost;
    }
    record.time_budget.used += terms.hours;
    for (skill, gain) in terms.gains {
        record.skills.add(*skill, *gain);
    }
    record.active_effects.push(ActiveEffect {
        label: format!("Studying for a {}", terms.name),
        kind: ActiveEffectKind::Happiness { per_month: -0.5 },
        months_remaining: config.finance.temp_income_months,
    });
    Ok(format!(
        "Enrolled in a {} (${:.0}{})",
        terms.name,
        terms.cost,
        if financed { ", financed" } else { "" }
    ))
}

fn buy_housing(record: &mut GameRecord, price: f64, down_payment: f64) -> Result<String, Rejection> {
    let price = positive_amount(price, "Home price")?;
    if !down_payment.is_finite() || down_payment < price * MIN_DOWN_PAYMENT || down_payment > price {
        return Err(Rejection::Invalid(format!(
            "Down payment must be between ${:.0} and ${price:.0}",
            price * MIN_DOWN_PAYMENT
        )));
    }
    require_resources(record, 0.0, down_payment)?;
    record.finances.cash -= down_payment;
    record.finances.real_estate += price;
    record.finances.debts.mortgage += price - down_payment;
    record.finances.debts.recompute_total();
    record.vitals.add_happiness(5.0);
    Ok(format!("Bought a home for ${price:.0} with ${down_payment:.0} down"))
}

fn pay_debt(record: &mut GameRecord, category: DebtCategory, amount: f64) -> Result<String, Rejection> {
    let amount = positive_amount(amount, "Payment")?;
    require_resources(record, 0.0, amount)?;
    let balance = record.finances.debts.balance(category);
    if balance <= 0.0 {
        return Err(Rejection::Invalid(format!("No {} debt to pay", category.label())));
    }
    let paid = amount.min(balance);
    record.finances.cash -= paid;
    *record.finances.debts.balance_mut(category) -= paid;
    record.finances.debts.recompute_total();
    Ok(format!("Paid ${paid:.0} toward {} debt", category.label()))
}
