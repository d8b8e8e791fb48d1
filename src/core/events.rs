use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::config::{BalanceConfig, EventConfig};
use super::decisions::{ActionOutcome, ensure_active};
use super::error::{Rejection, SimError};
use super::rng::{roll, weighted_index};
use super::types::{
    ActiveEffect, ActiveEffectKind, GameRecord, Partner, RelationshipStatus, clamp_pct,
};

/// One entry of the event effect language. Templates are authored in the
/// compact `key:value,key:value` form and parsed into these variants once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", rename_all = "snake_case")]
pub enum Effect {
    Cash { value: f64 },
    CashPct { value: f64 },
    IncomePct { value: f64 },
    IncomePctTemp { value: f64 },
    IncomeZero { months: u32 },
    Happiness { value: f64 },
    Health { value: f64 },
    Expense { value: f64 },
    InvestmentPct { value: f64 },
    RealestatePct { value: f64 },
    Debt { value: f64 },
    Married,
    Baby,
    Divorced,
    Unrecognized { raw: String },
}

impl Effect {
    pub fn parse(token: &str) -> Option<Effect> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let (key, raw_value) = match token.split_once(':') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (token, ""),
        };
        let number = raw_value.parse::<f64>().ok().filter(|v| v.is_finite());
        let unrecognized = || Effect::Unrecognized {
            raw: token.to_string(),
        };
        let effect = match (key, number) {
            ("cash", Some(value)) => Effect::Cash { value },
            ("cash_pct", Some(value)) => Effect::CashPct { value },
            ("income_pct", Some(value)) => Effect::IncomePct { value },
            ("income_pct_temp", Some(value)) => Effect::IncomePctTemp { value },
            ("income_zero", value) => Effect::IncomeZero {
                months: value.map(|v| v.max(0.0) as u32).unwrap_or(0),
            },
            ("happiness", Some(value)) => Effect::Happiness { value },
            ("health", Some(value)) => Effect::Health { value },
            ("expense", Some(value)) => Effect::Expense { value },
            ("investment_pct", Some(value)) => Effect::InvestmentPct { value },
            ("realestate_pct", Some(value)) => Effect::RealestatePct { value },
            ("debt", Some(value)) => Effect::Debt { value },
            ("married", _) => Effect::Married,
            ("baby", _) => Effect::Baby,
            ("divorced", _) => Effect::Divorced,
            _ => unrecognized(),
        };
        Some(effect)
    }

    pub fn parse_list(raw: &str) -> Vec<Effect> {
        raw.split(',').filter_map(Effect::parse).collect()
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Cash { value } => write!(f, "cash:{value}"),
            Effect::CashPct { value } => write!(f, "cash_pct:{value}"),
            Effect::IncomePct { value } => write!(f, "income_pct:{value}"),
            Effect::IncomePctTemp { value } => write!(f, "income_pct_temp:{value}"),
            Effect::IncomeZero { months } => write!(f, "income_zero:{months}"),
            Effect::Happiness { value } => write!(f, "happiness:{value}"),
            Effect::Health { value } => write!(f, "health:{value}"),
            Effect::Expense { value } => write!(f, "expense:{value}"),
            Effect::InvestmentPct { value } => write!(f, "investment_pct:{value}"),
            Effect::RealestatePct { value } => write!(f, "realestate_pct:{value}"),
            Effect::Debt { value } => write!(f, "debt:{value}"),
            Effect::Married => write!(f, "married:1"),
            Effect::Baby => write!(f, "baby:1"),
            Effect::Divorced => write!(f, "divorced:1"),
            Effect::Unrecognized { raw } => write!(f, "{raw}"),
        }
    }
}

pub fn apply_effect(
    record: &mut GameRecord,
    effect: &Effect,
    config: &BalanceConfig,
) {
    match effect {
        Effect::Cash { value } => record.finances.cash += value,
        Effect::CashPct { value } => record.finances.cash *= 1.0 + value / 100.0,
        Effect::IncomePct { value } => {
            let income = record.finances.monthly_income * (1.0 + value / 100.0);
            record.finances.monthly_income = income.max(0.0);
        }
        Effect::IncomePctTemp { value } => record.active_effects.push(ActiveEffect {
            label: format!("Temporary income change {value:+}%"),
            kind: ActiveEffectKind::IncomePct { pct: *value },
            months_remaining: config.finance.temp_income_months,
        }),
        Effect::IncomeZero { months } => {
            let previous = record.finances.monthly_income;
            record.finances.monthly_income = 0.0;
            record.career_level = record.career_level.saturating_sub(1).max(1);
            record.job_title = "Between jobs".to_string();
            let months = if *months > 0 {
                *months
            } else {
                config.finance.replacement_income_months
            };
            record.active_effects.push(ActiveEffect {
                label: "Severance and unemployment benefits".to_string(),
                kind: ActiveEffectKind::ReplacementIncome {
                    amount: previous * config.finance.replacement_income_fraction,
                },
                months_remaining: months,
            });
        }
        Effect::Happiness { value } => record.vitals.add_happiness(*value),
        Effect::Health { value } => record.vitals.add_health(*value),
        Effect::Expense { value } => {
            let expenses = record.finances.monthly_expenses + value;
            record.finances.monthly_expenses = expenses.max(0.0);
        }
        Effect::InvestmentPct { value } => {
            let factor = 1.0 + value / 100.0;
            record.finances.investments = (record.finances.investments * factor).max(0.0);
            record.finances.retirement = (record.finances.retirement * factor).max(0.0);
        }
        Effect::RealestatePct { value } => {
            let factor = 1.0 + value / 100.0;
            record.finances.real_estate = (record.finances.real_estate * factor).max(0.0);
        }
        Effect::Debt { value } => {
            let balance = record.finances.debts.credit_card + value;
            record.finances.debts.credit_card = balance.max(0.0);
            record.finances.debts.recompute_total();
        }
        Effect::Married => apply_marriage(record, &config.events),
        Effect::Baby => {
            record.dependents += 1;
            record.finances.monthly_expenses += config.events.baby_expense;
            record.vitals.add_happiness(config.events.baby_happiness);
        }
        Effect::Divorced => {
            record.relationship = RelationshipStatus::Divorced;
            record.partner = None;
            if record.finances.cash > 0.0 {
                record.finances.cash *= 1.0 - config.events.divorce_cash_fraction;
            }
            record.finances.monthly_expenses =
                (record.finances.monthly_expenses + config.events.divorce_expense_change).max(0.0);
            record.vitals.add_happiness(config.events.divorce_happiness);
        }
        Effect::Unrecognized { raw } => {
            warn!(target: "sim.events", effect = %raw, "ignoring unrecognized effect");
        }
    }
    record.vitals.happiness = clamp_pct(record.vitals.happiness);
    record.vitals.health = clamp_pct(record.vitals.health);
    record.finances.recompute_net_worth();
}

fn apply_marriage(record: &mut GameRecord, config: &EventConfig) {
    record.relationship = RelationshipStatus::Married;
    let partner = record.partner.take().unwrap_or(Partner {
        name: "your partner".to_string(),
        months_together: 0,
    });
    record.partner = Some(partner);
    record.finances.cash -= config.wedding_cost;
    record.finances.monthly_expenses =
        (record.finances.monthly_expenses + config.marriage_expense_change).max(0.0);
    record.vitals.add_happiness(config.marriage_happiness);
}

pub fn apply_effects(record: &mut GameRecord, effects: &[Effect], config: &BalanceConfig) {
    for effect in effects {
        apply_effect(record, effect, config);
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Requirement {
    Anyone,
    Employed,
    Dating,
    Married,
    Investor,
    Homeowner,
}

struct ChoiceTemplate {
    prompt: &'static str,
    accept_text: &'static str,
    accept_effects: &'static str,
    accept_starts_smoking: bool,
    decline_text: &'static str,
    decline_effects: &'static str,
}

struct EventTemplate {
    id: &'static str,
    title: &'static str,
    body: &'static str,
    min_age: u32,
    max_age: u32,
    weight: f64,
    repeatable: bool,
    requires: Requirement,
    outcome_text: &'static str,
    effects: &'static str,
    choice: Option<ChoiceTemplate>,
}

const TEMPLATES: &[EventTemplate] = &[
    EventTemplate {
        id: "car_repair",
        title: "Car Trouble",
        body: "{name}'s car broke down on the way to work. The mechanic's quote is not pretty.",
        min_age: 18,
        max_age: 90,
        weight: 8.0,
        repeatable: true,
        requires: Requirement::Anyone,
        outcome_text: "You paid for the repair and moved on.",
        effects: "cash:-1800,happiness:-3",
        choice: None,
    },
    EventTemplate {
        id: "medical_bill",
        title: "Unexpected Medical Bill",
        body: "A trip to the emergency room at {age} left {name} with a hefty bill.",
        min_age: 18,
        max_age: 90,
        weight: 6.0,
        repeatable: true,
        requires: Requirement::Anyone,
        outcome_text: "The bill went on the credit card.",
        effects: "debt:3500,health:-5,happiness:-4",
        choice: None,
    },
    EventTemplate {
        id: "tax_refund",
        title: "Tax Refund",
        body: "The tax office owes {name} money for once.",
        min_age: 18,
        max_age: 90,
        weight: 7.0,
        repeatable: true,
        requires: Requirement::Employed,
        outcome_text: "The refund landed in your account.",
        effects: "cash:1200,happiness:2",
        choice: None,
    },
    EventTemplate {
        id: "promotion_offer",
        title: "Promotion on the Table",
        body: "Your manager wants you to step up from {job}. More pay, more hours.",
        min_age: 22,
        max_age: 64,
        weight: 5.0,
        repeatable: true,
        requires: Requirement::Employed,
        outcome_text: "",
        effects: "",
        choice: Some(ChoiceTemplate {
            prompt: "Take the promotion?",
            accept_text: "You took the promotion. The raise is real and so are the late nights.",
            accept_effects: "income_pct:15,happiness:-3,health:-2",
            accept_starts_smoking: false,
            decline_text: "You passed. Your evenings stay yours.",
            decline_effects: "happiness:2",
        }),
    },
    EventTemplate {
        id: "layoff",
        title: "Layoffs",
        body: "{name}'s employer announced a round of layoffs and your role as {job} was cut.",
        min_age: 22,
        max_age: 66,
        weight: 3.0,
        repeatable: true,
        requires: Requirement::Employed,
        outcome_text: "You packed your desk. Severance will carry you for a while.",
        effects: "income_zero:6,happiness:-15",
        choice: None,
    },
    EventTemplate {
        id: "market_crash",
        title: "Market Crash",
        body: "Markets fell hard this month. Every headline says sell.",
        min_age: 18,
        max_age: 90,
        weight: 2.0,
        repeatable: true,
        requires: Requirement::Investor,
        outcome_text: "",
        effects: "",
        choice: Some(ChoiceTemplate {
            prompt: "Hold your positions?",
            accept_text: "You held on through the drop.",
            accept_effects: "investment_pct:-20,happiness:-5",
            accept_starts_smoking: false,
            decline_text: "You sold near the bottom and locked in the loss.",
            decline_effects: "investment_pct:-28,happiness:-8",
        }),
    },
    EventTemplate {
        id: "bull_run",
        title: "Bull Market",
        body: "A strong quarter lifted every index fund {name} owns.",
        min_age: 18,
        max_age: 90,
        weight: 3.0,
        repeatable: true,
        requires: Requirement::Investor,
        outcome_text: "Your portfolio enjoyed the rally.",
        effects: "investment_pct:8,happiness:3",
        choice: None,
    },
    EventTemplate {
        id: "housing_boom",
        title: "Housing Boom",
        body: "Homes in your neighbourhood are selling well above asking.",
        min_age: 18,
        max_age: 90,
        weight: 2.0,
        repeatable: true,
        requires: Requirement::Homeowner,
        outcome_text: "Your home is worth more on paper.",
        effects: "realestate_pct:10",
        choice: None,
    },
    EventTemplate {
        id: "proposal",
        title: "The Big Question",
        body: "After all this time together, it feels like the moment to propose.",
        min_age: 20,
        max_age: 70,
        weight: 4.0,
        repeatable: true,
        requires: Requirement::Dating,
        outcome_text: "",
        effects: "",
        choice: Some(ChoiceTemplate {
            prompt: "Propose?",
            accept_text: "They said yes. The wedding was beautiful and expensive.",
            accept_effects: "married:1",
            accept_starts_smoking: false,
            decline_text: "You decided to wait.",
            decline_effects: "happiness:-2",
        }),
    },
    EventTemplate {
        id: "new_baby",
        title: "A New Arrival",
        body: "{name} and their partner are expecting a baby.",
        min_age: 20,
        max_age: 50,
        weight: 3.0,
        repeatable: true,
        requires: Requirement::Married,
        outcome_text: "Welcome to parenthood.",
        effects: "baby:1",
        choice: None,
    },
    EventTemplate {
        id: "divorce",
        title: "Separation",
        body: "The arguments have piled up. Your partner wants a divorce.",
        min_age: 22,
        max_age: 90,
        weight: 1.0,
        repeatable: true,
        requires: Requirement::Married,
        outcome_text: "The divorce was finalized and the assets were split.",
        effects: "divorced:1",
        choice: None,
    },
    EventTemplate {
        id: "smoking",
        title: "Old Habits",
        body: "Stressful weeks at work have {name} reaching for cigarettes.",
        min_age: 18,
        max_age: 60,
        weight: 1.0,
        repeatable: false,
        requires: Requirement::Anyone,
        outcome_text: "",
        effects: "",
        choice: Some(ChoiceTemplate {
            prompt: "Start smoking?",
            accept_text: "It helps with the stress, for now.",
            accept_effects: "happiness:3,health:-5,expense:150",
            accept_starts_smoking: true,
            decline_text: "You went for a walk instead.",
            decline_effects: "health:1",
        }),
    },
    EventTemplate {
        id: "inheritance",
        title: "Inheritance",
        body: "A distant relative left {name} something in their will.",
        min_age: 25,
        max_age: 90,
        weight: 1.5,
        repeatable: false,
        requires: Requirement::Anyone,
        outcome_text: "You received the inheritance.",
        effects: "cash:25000,happiness:-2",
        choice: None,
    },
    EventTemplate {
        id: "side_contract",
        title: "Freelance Gig",
        body: "A former colleague offers {name} a short freelance contract on the side.",
        min_age: 20,
        max_age: 70,
        weight: 4.0,
        repeatable: true,
        requires: Requirement::Anyone,
        outcome_text: "",
        effects: "",
        choice: Some(ChoiceTemplate {
            prompt: "Take the contract?",
            accept_text: "The extra income is welcome, the extra hours less so.",
            accept_effects: "income_pct_temp:20,happiness:-2",
            accept_starts_smoking: false,
            decline_text: "You turned it down politely.",
            decline_effects: "",
        }),
    },
    EventTemplate {
        id: "lifestyle_creep",
        title: "Keeping Up",
        body: "Friends at {age} are upgrading cars and houses. The pressure is on.",
        min_age: 25,
        max_age: 55,
        weight: 3.0,
        repeatable: true,
        requires: Requirement::Employed,
        outcome_text: "",
        effects: "",
        choice: Some(ChoiceTemplate {
            prompt: "Upgrade your lifestyle?",
            accept_text: "Nicer things, bigger bills.",
            accept_effects: "expense:400,happiness:5",
            accept_starts_smoking: false,
            decline_text: "You kept your budget where it was.",
            decline_effects: "happiness:-1",
        }),
    },
    EventTemplate {
        id: "health_scare",
        title: "Health Scare",
        body: "A routine checkup at {age} turned up something the doctor wants to watch.",
        min_age: 40,
        max_age: 90,
        weight: 3.0,
        repeatable: true,
        requires: Requirement::Anyone,
        outcome_text: "Treatment went well, but it was a wake-up call.",
        effects: "health:-10,cash:-2500,happiness:-5",
        choice: None,
    },
    EventTemplate {
        id: "lottery_win",
        title: "Scratch Card",
        body: "{name} bought a scratch card on a whim.",
        min_age: 18,
        max_age: 90,
        weight: 0.5,
        repeatable: false,
        requires: Requirement::Anyone,
        outcome_text: "A small win. Enough for a nice dinner.",
        effects: "cash_pct:2,cash:500,happiness:4",
        choice: None,
    },
];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventChoice {
    Accept,
    Decline,
    None,
}

impl EventChoice {
    fn label(self) -> &'static str {
        match self {
            EventChoice::Accept => "accept",
            EventChoice::Decline => "decline",
            EventChoice::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOutcome {
    pub text: String,
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub starts_smoking: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChoice {
    pub prompt: String,
    pub accept: EventOutcome,
    pub decline: EventOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEvent {
    pub template_id: String,
    pub title: String,
    pub body: String,
    pub choice: Option<PendingChoice>,
    pub outcome: Option<EventOutcome>,
}

impl PendingEvent {
    /// A choice-free event carrying the given outcome, for callers that
    /// assemble events outside the template table.
    pub fn simple(title: &str, text: &str, effects: &str) -> Self {
        Self {
            template_id: "custom".to_string(),
            title: title.to_string(),
            body: text.to_string(),
            choice: None,
            outcome: Some(EventOutcome {
                text: text.to_string(),
                effects: Effect::parse_list(effects),
                starts_smoking: false,
            }),
        }
    }
}

pub fn fill_placeholders(text: &str, record: &GameRecord) -> String {
    text.replace("{name}", &record.player_name)
        .replace("{age}", &record.age.to_string())
        .replace("{job}", &record.job_title)
}

fn requirement_met(requires: Requirement, record: &GameRecord) -> bool {
    match requires {
        Requirement::Anyone => true,
        Requirement::Employed => record.finances.monthly_income > 0.0,
        Requirement::Dating => record.relationship == RelationshipStatus::Dating,
        Requirement::Married => record.relationship == RelationshipStatus::Married,
        Requirement::Investor => record.finances.investments + record.finances.retirement > 0.0,
        Requirement::Homeowner => record.finances.real_estate > 0.0,
    }
}

fn is_eligible(template: &EventTemplate, record: &GameRecord) -> bool {
    (template.min_age..=template.max_age).contains(&record.age)
        && (template.repeatable || !record.seen_events.iter().any(|id| id == template.id))
        && requirement_met(template.requires, record)
}

fn instantiate(template: &EventTemplate, record: &GameRecord) -> PendingEvent {
    let choice = template.choice.as_ref().map(|c| PendingChoice {
        prompt: c.prompt.to_string(),
        accept: EventOutcome {
            text: fill_placeholders(c.accept_text, record),
            effects: Effect::parse_list(c.accept_effects),
            starts_smoking: c.accept_starts_smoking,
        },
        decline: EventOutcome {
            text: fill_placeholders(c.decline_text, record),
            effects: Effect::parse_list(c.decline_effects),
            starts_smoking: false,
        },
    });
    let outcome = choice.is_none().then(|| EventOutcome {
        text: fill_placeholders(template.outcome_text, record),
        effects: Effect::parse_list(template.effects),
        starts_smoking: false,
    });
    PendingEvent {
        template_id: template.id.to_string(),
        title: template.title.to_string(),
        body: fill_placeholders(template.body, record),
        choice,
        outcome,
    }
}

/// Rolls this month's life event. At most one event is drawn, weighted
/// among the eligible templates; nothing is drawn while one is unresolved.
pub fn roll_event<R: Rng + ?Sized>(
    rng: &mut R,
    record: &GameRecord,
    config: &BalanceConfig,
) -> Option<PendingEvent> {
    if record.pending_event.is_some() {
        return None;
    }
    if !roll(rng, config.events.monthly_probability) {
        return None;
    }
    let eligible: Vec<&EventTemplate> = TEMPLATES
        .iter()
        .filter(|t| is_eligible(t, record))
        .collect();
    let weights: Vec<f64> = eligible.iter().map(|t| t.weight).collect();
    let picked = eligible[weighted_index(rng, &weights)?];
    info!(target: "sim.events", id = picked.id, age = record.age, "event drawn");
    Some(instantiate(picked, record))
}

/// Applies the pending event's outcome for `choice` and clears it.
pub fn resolve_event(
    record: &GameRecord,
    choice: EventChoice,
    config: &BalanceConfig,
) -> Result<ActionOutcome, SimError> {
    ensure_active(record)?;
    let Some(pending) = record.pending_event.as_ref() else {
        return Ok(ActionOutcome::rejected(record, Rejection::NoPendingEvent));
    };
    let outcome = match (&pending.choice, &pending.outcome, choice) {
        (Some(c), _, EventChoice::Accept) => &c.accept,
        (Some(c), _, EventChoice::Decline) => &c.decline,
        (Some(_), _, EventChoice::None) => {
            return Ok(ActionOutcome::rejected(
                record,
                Rejection::ChoiceMismatch {
                    expected: "accept or decline",
                    given: choice.label(),
                },
            ));
        }
        (None, Some(outcome), EventChoice::None) => outcome,
        (None, _, given) => {
            return Ok(ActionOutcome::rejected(
                record,
                Rejection::ChoiceMismatch {
                    expected: "none",
                    given: given.label(),
                },
            ));
        }
    };

    let mut next = record.clone();
    let title = pending.title.clone();
    let text = outcome.text.clone();
    apply_effects(&mut next, &outcome.effects, config);
    if outcome.starts_smoking {
        next.vitals.habits.smoker = true;
    }
    next.finances.debts.recompute_total();
    next.finances.recompute_net_worth();
    next.pending_event = None;
    next.log_event(title, text.clone());
    Ok(ActionOutcome::applied(next, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decisions::OutcomeStatus;
    use crate::core::rng::SimRng;
    use crate::core::testutil::sample_record;
    use rand::SeedableRng;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn parse_recognizes_vocabulary_and_keeps_unknown_keys() {
        let effects = Effect::parse_list("cash:-5000, happiness:-10,bogus:3,,married:1,income_zero:4");
        assert_eq!(
            effects,
            vec![
                Effect::Cash { value: -5000.0 },
                Effect::Happiness { value: -10.0 },
                Effect::Unrecognized {
                    raw: "bogus:3".to_string()
                },
                Effect::Married,
                Effect::IncomeZero { months: 4 },
            ]
        );
    }

    #[test]
    fn non_numeric_value_is_unrecognized() {
        assert_eq!(
            Effect::parse("cash:lots"),
            Some(Effect::Unrecognized {
                raw: "cash:lots".to_string()
            })
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        for token in ["cash:-5000", "investment_pct:-20", "married:1", "income_zero:6"] {
            let effect = Effect::parse(token).expect("token parses");
            assert_eq!(effect.to_string(), token);
        }
    }

    #[test]
    fn resolve_cash_and_happiness_event() {
        let config = BalanceConfig::default();
        let mut record = sample_record();
        record.finances.cash = 10_000.0;
        record.vitals.happiness = 50.0;
        record.pending_event = Some(PendingEvent::simple(
            "Fender bender",
            "You paid the other driver.",
            "cash:-5000,happiness:-10",
        ));

        let outcome = resolve_event(&record, EventChoice::None, &config).expect("active record");
        assert_eq!(outcome.status, OutcomeStatus::Applied);
        assert_approx(outcome.record.finances.cash, 5_000.0);
        assert_approx(outcome.record.vitals.happiness, 40.0);
        assert!(outcome.record.pending_event.is_none());
        assert_approx(
            outcome.record.finances.net_worth,
            outcome.record.finances.compute_net_worth(),
        );
    }

    #[test]
    fn resolve_without_pending_event_is_rejected_unchanged() {
        let config = BalanceConfig::default();
        let record = sample_record();
        let outcome = resolve_event(&record, EventChoice::Accept, &config).expect("active record");
        assert_eq!(outcome.status, OutcomeStatus::Rejected);
        assert_eq!(outcome.record, record);
    }

    #[test]
    fn choice_must_match_event_shape() {
        let config = BalanceConfig::default();
        let mut record = sample_record();
        record.pending_event = Some(instantiate(
            TEMPLATES.iter().find(|t| t.id == "promotion_offer").expect("template"),
            &record,
        ));
        let rejected = resolve_event(&record, EventChoice::None, &config).expect("active");
        assert_eq!(rejected.status, OutcomeStatus::Rejected);
        assert!(rejected.record.pending_event.is_some());

        let accepted = resolve_event(&record, EventChoice::Accept, &config).expect("active");
        assert_eq!(accepted.status, OutcomeStatus::Applied);
        assert_approx(
            accepted.record.finances.monthly_income,
            record.finances.monthly_income * 1.15,
        );
    }

    #[test]
    fn income_zero_demotes_and_schedules_replacement_income() {
        let config = BalanceConfig::default();
        let mut record = sample_record();
        record.finances.monthly_income = 5_000.0;
        record.career_level = 2;
        apply_effect(&mut record, &Effect::IncomeZero { months: 0 }, &config);
        assert_eq!(record.finances.monthly_income, 0.0);
        assert_eq!(record.career_level, 1);
        let effect = record.active_effects.last().expect("replacement scheduled");
        assert_eq!(effect.months_remaining, 6);
        match effect.kind {
            ActiveEffectKind::ReplacementIncome { amount } => assert_approx(amount, 2_000.0),
            ref other => panic!("unexpected effect {other:?}"),
        }

        apply_effect(&mut record, &Effect::IncomeZero { months: 3 }, &config);
        apply_effect(&mut record, &Effect::IncomeZero { months: 3 }, &config);
        assert_eq!(record.career_level, 1);
    }

    #[test]
    fn investment_pct_hits_both_accounts_and_debt_updates_total() {
        let config = BalanceConfig::default();
        let mut record = sample_record();
        record.finances.investments = 10_000.0;
        record.finances.retirement = 20_000.0;
        apply_effects(
            &mut record,
            &Effect::parse_list("investment_pct:-10,debt:500"),
            &config,
        );
        assert_approx(record.finances.investments, 9_000.0);
        assert_approx(record.finances.retirement, 18_000.0);
        assert_approx(record.finances.debts.credit_card, 500.0);
        assert_approx(record.finances.debts.total, 500.0);
    }

    #[test]
    fn relationship_transitions() {
        let config = BalanceConfig::default();
        let mut record = sample_record();
        record.finances.cash = 40_000.0;
        record.vitals.happiness = 50.0;
        apply_effect(&mut record, &Effect::Married, &config);
        assert_eq!(record.relationship, RelationshipStatus::Married);
        assert_approx(record.finances.cash, 25_000.0);
        assert_approx(record.vitals.happiness, 65.0);

        apply_effect(&mut record, &Effect::Baby, &config);
        assert_eq!(record.dependents, 1);

        apply_effect(&mut record, &Effect::Divorced, &config);
        assert_eq!(record.relationship, RelationshipStatus::Divorced);
        assert!(record.partner.is_none());
        assert_approx(record.finances.cash, 12_500.0);
    }

    #[test]
    fn unknown_keys_change_nothing() {
        let config = BalanceConfig::default();
        let record = sample_record();
        let mut next = record.clone();
        apply_effects(&mut next, &Effect::parse_list("teleport:5"), &config);
        assert_eq!(next, record);
    }

    #[test]
    fn placeholders_are_filled() {
        let record = sample_record();
        let text = fill_placeholders("{name} ({age}) works as {job}", &record);
        assert_eq!(
            text,
            format!("{} ({}) works as {}", record.player_name, record.age, record.job_title)
        );
    }

    #[test]
    fn roll_respects_eligibility_and_pending_event() {
        let mut config = BalanceConfig::default();
        config.events.monthly_probability = 1.0;
        let mut record = sample_record();
        record.relationship = RelationshipStatus::Single;
        let mut rng = SimRng::seed_from_u64(11);
        for _ in 0..200 {
            let event = roll_event(&mut rng, &record, &config).expect("always rolls");
            assert_ne!(event.template_id, "proposal");
            assert_ne!(event.template_id, "divorce");
            assert_ne!(event.template_id, "new_baby");
        }
        record.pending_event = Some(PendingEvent::simple("x", "y", ""));
        assert!(roll_event(&mut rng, &record, &config).is_none());
    }

    #[test]
    fn smoking_choice_sets_flag() {
        let config = BalanceConfig::default();
        let mut record = sample_record();
        record.pending_event = Some(instantiate(
            TEMPLATES.iter().find(|t| t.id == "smoking").expect("template"),
            &record,
        ));
        let declined = resolve_event(&record, EventChoice::Decline, &config).expect("active");
        assert!(!declined.record.vitals.habits.smoker);
        let outcome = resolve_event(&record, EventChoice::Accept, &config).expect("active");
        assert!(outcome.record.vitals.habits.smoker);
    }

    #[test]
    fn smoker_is_not_an_effect_key() {
        assert_eq!(
            Effect::parse_list("smoker:1"),
            vec![Effect::Unrecognized {
                raw: "smoker:1".to_string()
            }]
        );
    }
}
