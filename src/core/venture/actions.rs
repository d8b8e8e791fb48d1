use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::market::{candidate_pool_size, candidate_reliability_bonus};
use super::{AdChannel, AdChannelKind, Candidate, Employee, Levers, Venture, VentureCategory};
use crate::core::config::{BalanceConfig, VentureConfig};
use crate::core::decisions::{ActionOutcome, ensure_active, require_resources};
use crate::core::error::{Rejection, SimError};
use crate::core::ripple::{RippleEffect, apply_ripple_effect, schedule_ripple};
use crate::core::types::{GameRecord, clamp_pct};

const BASE_SALARY: f64 = 3_500.0;
const FIRST_NAMES: [&str; 12] = [
    "Avery", "Jordan", "Priya", "Mateo", "Hana", "Kofi", "Lena", "Ravi", "Sofia", "Tariq",
    "Yuki", "Noah",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledRipple {
    pub delay_months: u32,
    pub effect: RippleEffect,
}

/// A strategic option offered for the current month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VentureDecision {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub hours: f64,
    pub cash_cost: f64,
    pub immediate: Vec<RippleEffect>,
    pub ripples: Vec<ScheduledRipple>,
}

fn later(delay_months: u32, effect: RippleEffect) -> ScheduledRipple {
    ScheduledRipple {
        delay_months,
        effect,
    }
}

fn narrative(text: &str) -> RippleEffect {
    RippleEffect::Narrative {
        text: text.to_string(),
    }
}

fn decision_templates() -> Vec<VentureDecision> {
    let template = |title: &str,
                    description: &str,
                    hours: f64,
                    cash_cost: f64,
                    immediate: Vec<RippleEffect>,
                    ripples: Vec<ScheduledRipple>| VentureDecision {
        id: 0,
        title: title.to_string(),
        description: description.to_string(),
        hours,
        cash_cost,
        immediate,
        ripples,
    };
    vec![
        template(
            "Launch campaign",
            "A short, loud push across your ad channel.",
            12.0,
            1_500.0,
            vec![RippleEffect::Leads { amount: 150.0 }],
            vec![later(2, RippleEffect::Brand { amount: 3.0 })],
        ),
        template(
            "Trade show booth",
            "Two days on the floor shaking hands.",
            16.0,
            2_500.0,
            Vec::new(),
            vec![
                later(1, RippleEffect::Leads { amount: 300.0 }),
                later(3, RippleEffect::Customers { amount: 15.0 }),
            ],
        ),
        template(
            "Revamp onboarding",
            "Rewrite the first-run experience for new customers.",
            10.0,
            500.0,
            vec![RippleEffect::ConversionRate { delta: 0.01 }],
            vec![later(2, RippleEffect::ChurnRate { delta: -0.005 })],
        ),
        template(
            "Influencer partnership",
            "Pay a creator to feature the product.",
            6.0,
            3_000.0,
            Vec::new(),
            vec![
                later(1, RippleEffect::Brand { amount: 5.0 }),
                later(4, narrative("The influencer's audience is still talking about you.")),
            ],
        ),
        template(
            "Customer success sprint",
            "Call every account that went quiet this quarter.",
            14.0,
            0.0,
            vec![RippleEffect::ChurnRate { delta: -0.01 }],
            vec![later(3, RippleEffect::Customers { amount: 10.0 })],
        ),
        template(
            "Press interview",
            "Talk to a trade journalist about where the market is going.",
            4.0,
            0.0,
            Vec::new(),
            vec![
                later(1, RippleEffect::Brand { amount: 2.0 }),
                later(6, narrative("A trade journal cites your interview.")),
            ],
        ),
        template(
            "Founder retreat",
            "Take a long weekend away from the business.",
            0.0,
            800.0,
            vec![
                RippleEffect::Happiness { amount: 5.0 },
                RippleEffect::Health { amount: 3.0 },
            ],
            vec![later(1, narrative("You came back with a clearer head."))],
        ),
    ]
}

/// Replaces the offered decisions with two or three fresh ones.
pub fn generate_decisions<R: Rng + ?Sized>(rng: &mut R, venture: &mut Venture) {
    let templates = decision_templates();
    let count = rng.gen_range(2..=3usize).min(templates.len());
    let picks = index::sample(rng, templates.len(), count);
    let mut offered = Vec::with_capacity(count);
    for i in picks.into_iter() {
        let mut decision = templates[i].clone();
        decision.id = venture.allocate_id();
        offered.push(decision);
    }
    venture.pending_decisions = offered;
}

fn roles(category: VentureCategory) -> [&'static str; 3] {
    match category {
        VentureCategory::Goods => ["Operations associate", "Sales rep", "Product designer"],
        VentureCategory::Subscription => ["Engineer", "Support specialist", "Growth marketer"],
        VentureCategory::Services => ["Consultant", "Account manager", "Analyst"],
    }
}

/// Refreshes the hiring pool. Wage premium buys a bigger, more reliable pool.
pub fn generate_candidates<R: Rng + ?Sized>(
    rng: &mut R,
    venture: &mut Venture,
    config: &VentureConfig,
) {
    let wage_premium = venture.positioning.wage_premium;
    let pool = candidate_pool_size(wage_premium, config);
    let role_pool = roles(venture.category);
    let mut candidates = Vec::with_capacity(pool);
    for _ in 0..pool {
        let id = venture.allocate_id();
        let name = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
        let role = role_pool[rng.gen_range(0..role_pool.len())];
        candidates.push(Candidate {
            id,
            name: name.to_string(),
            role: role.to_string(),
            salary: (BASE_SALARY * (1.0 + wage_premium / 100.0) * rng.gen_range(0.9..1.2))
                .round(),
            skill: clamp_pct(40.0 + rng.gen_range(0.0..40.0) + wage_premium / 5.0),
            reliability: (0.6 + rng.gen_range(0.0..0.3) + candidate_reliability_bonus(wage_premium))
                .clamp(0.1, 1.0),
        });
    }
    venture.candidates = candidates;
}

fn managed_venture(record: &GameRecord) -> Result<&Venture, Rejection> {
    let venture = record.venture.as_ref().ok_or(Rejection::NoVenture)?;
    if !venture.is_managed() {
        return Err(Rejection::NotManaged);
    }
    Ok(venture)
}

pub fn apply_venture_decision(
    record: &GameRecord,
    decision_id: u64,
) -> Result<ActionOutcome, SimError> {
    ensure_active(record)?;
    let decision = match managed_venture(record).and_then(|venture| {
        venture
            .pending_decisions
            .iter()
            .find(|d| d.id == decision_id)
            .cloned()
            .ok_or(Rejection::UnknownTarget {
                kind: "decision",
                id: decision_id,
            })
    }) {
        Ok(decision) => decision,
        Err(rejection) => return Ok(ActionOutcome::rejected(record, rejection)),
    };
    if let Err(rejection) = require_resources(record, decision.hours, decision.cash_cost) {
        return Ok(ActionOutcome::rejected(record, rejection));
    }

    let mut next = record.clone();
    next.finances.cash -= decision.cash_cost;
    next.time_budget.used += decision.hours;
    let mut details = Vec::new();
    for effect in &decision.immediate {
        details.push(apply_ripple_effect(&mut next, effect));
    }
    for ripple in &decision.ripples {
        schedule_ripple(&mut next, &decision.title, ripple.delay_months, ripple.effect.clone());
    }
    if let Some(venture) = next.venture.as_mut() {
        venture.pending_decisions.retain(|d| d.id != decision_id);
    }
    next.finances.recompute_net_worth();

    let message = if details.is_empty() {
        format!("{}: effects will unfold over the coming months", decision.title)
    } else {
        format!("{}: {}", decision.title, details.join(", "))
    };
    next.log_decision(decision.title.clone(), message.clone());
    info!(target: "sim.decision", id = decision_id, title = %decision.title, "venture decision applied");
    Ok(ActionOutcome::applied(next, message))
}

pub fn hire_candidate(
    record: &GameRecord,
    candidate_id: u64,
    config: &BalanceConfig,
) -> Result<ActionOutcome, SimError> {
    ensure_active(record)?;
    let candidate = match managed_venture(record).and_then(|venture| {
        venture
            .candidates
            .iter()
            .find(|c| c.id == candidate_id)
            .cloned()
            .ok_or(Rejection::UnknownTarget {
                kind: "candidate",
                id: candidate_id,
            })
    }) {
        Ok(candidate) => candidate,
        Err(rejection) => return Ok(ActionOutcome::rejected(record, rejection)),
    };
    let signing = candidate.salary;
    if let Err(rejection) = require_resources(record, config.venture.hire_hours, signing) {
        return Ok(ActionOutcome::rejected(record, rejection));
    }

    let mut next = record.clone();
    next.finances.cash -= signing;
    next.time_budget.used += config.venture.hire_hours;
    next.finances.recompute_net_worth();
    if let Some(venture) = next.venture.as_mut() {
        venture.candidates.retain(|c| c.id != candidate_id);
        venture.employees.push(Employee {
            id: candidate.id,
            name: candidate.name.clone(),
            role: candidate.role.clone(),
            salary: candidate.salary,
            skill: candidate.skill,
            reliability: candidate.reliability,
        });
    }
    let message = format!(
        "Hired {} as {} at ${:.0}/month",
        candidate.name, candidate.role, candidate.salary
    );
    next.log_decision("Hire", message.clone());
    info!(target: "sim.decision", id = candidate_id, role = %candidate.role, "candidate hired");
    Ok(ActionOutcome::applied(next, message))
}

pub fn fire_employee(
    record: &GameRecord,
    employee_id: u64,
    config: &BalanceConfig,
) -> Result<ActionOutcome, SimError> {
    ensure_active(record)?;
    let employee = match managed_venture(record).and_then(|venture| {
        venture
            .employees
            .iter()
            .find(|e| e.id == employee_id)
            .cloned()
            .ok_or(Rejection::UnknownTarget {
                kind: "employee",
                id: employee_id,
            })
    }) {
        Ok(employee) => employee,
        Err(rejection) => return Ok(ActionOutcome::rejected(record, rejection)),
    };
    let severance = employee.salary;
    if let Err(rejection) = require_resources(record, config.venture.fire_hours, severance) {
        return Ok(ActionOutcome::rejected(record, rejection));
    }

    let mut next = record.clone();
    next.finances.cash -= severance;
    next.time_budget.used += config.venture.fire_hours;
    next.finances.recompute_net_worth();
    if let Some(venture) = next.venture.as_mut() {
        venture.employees.retain(|e| e.id != employee_id);
    }
    let message = format!(
        "Let {} go with ${severance:.0} severance",
        employee.name
    );
    next.log_decision("Fire", message.clone());
    info!(target: "sim.decision", id = employee_id, "employee let go");
    Ok(ActionOutcome::applied(next, message))
}

/// Lever and positioning changes. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VentureSettings {
    pub levers: Option<Levers>,
    pub pricing_premium: Option<f64>,
    pub wage_premium: Option<f64>,
    pub quality_multiplier: Option<f64>,
    pub ad_channel: Option<AdChannelKind>,
}

fn in_range(value: f64, min: f64, max: f64, what: &str) -> Result<(), Rejection> {
    if !value.is_finite() || value < min || value > max {
        return Err(Rejection::Invalid(format!("{what} must be between {min} and {max}")));
    }
    Ok(())
}

fn validate_settings(settings: &VentureSettings) -> Result<(), Rejection> {
    if let Some(levers) = &settings.levers {
        in_range(levers.price_index, 50.0, 200.0, "Price index")?;
        in_range(levers.ad_spend, 0.0, 100_000.0, "Ad spend")?;
        in_range(levers.rd_spend, 0.0, 100_000.0, "R&D spend")?;
        if !(1..=10).contains(&levers.product_variety) {
            return Err(Rejection::Invalid("Product variety must be between 1 and 10".to_string()));
        }
    }
    if let Some(premium) = settings.pricing_premium {
        in_range(premium, -50.0, 100.0, "Pricing premium")?;
    }
    if let Some(premium) = settings.wage_premium {
        in_range(premium, -20.0, 100.0, "Wage premium")?;
    }
    if let Some(multiplier) = settings.quality_multiplier {
        in_range(multiplier, 0.5, 3.0, "Quality multiplier")?;
    }
    Ok(())
}

pub fn adjust_venture(
    record: &GameRecord,
    settings: &VentureSettings,
) -> Result<ActionOutcome, SimError> {
    ensure_active(record)?;
    if let Err(rejection) = managed_venture(record).and_then(|_| validate_settings(settings)) {
        return Ok(ActionOutcome::rejected(record, rejection));
    }
    let mut next = record.clone();
    let mut changed = Vec::new();
    if let Some(venture) = next.venture.as_mut() {
        if let Some(levers) = &settings.levers {
            venture.levers = levers.clone();
            changed.push("levers");
        }
        let positioning = &mut venture.positioning;
        if let Some(premium) = settings.pricing_premium {
            positioning.pricing_premium = premium;
            changed.push("pricing premium");
        }
        if let Some(premium) = settings.wage_premium {
            positioning.wage_premium = premium;
            changed.push("wage premium");
        }
        if let Some(multiplier) = settings.quality_multiplier {
            positioning.quality_multiplier = multiplier;
            changed.push("quality multiplier");
        }
        if let Some(kind) = settings.ad_channel {
            venture.ad_channel = AdChannel::for_kind(kind);
            changed.push("ad channel");
        }
    }
    let message = if changed.is_empty() {
        "No venture settings changed".to_string()
    } else {
        format!("Updated {}", changed.join(", "))
    };
    next.log_decision("Venture settings", message.clone());
    Ok(ActionOutcome::applied(next, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decisions::OutcomeStatus;
    use crate::core::rng::SimRng;
    use crate::core::testutil::sample_record;
    use crate::core::venture::update_stage;
    use rand::SeedableRng;

    fn managed_record() -> GameRecord {
        let mut record = sample_record();
        record.finances.cash = 20_000.0;
        record.finances.recompute_net_worth();
        let mut venture = Venture::new("Northwind", VentureCategory::Subscription, 5_000.0);
        venture.monthly_revenue = 2_500.0;
        update_stage(&mut venture, 0.0, &VentureConfig::default());
        let mut rng = SimRng::seed_from_u64(3);
        generate_decisions(&mut rng, &mut venture);
        generate_candidates(&mut rng, &mut venture, &VentureConfig::default());
        record.venture = Some(venture);
        record
    }

    fn first_decision(record: &GameRecord) -> VentureDecision {
        record
            .venture
            .as_ref()
            .and_then(|v| v.pending_decisions.first().cloned())
            .expect("decision offered")
    }

    #[test]
    fn decision_spends_time_and_cash_and_schedules_ripples() {
        let record = managed_record();
        let decision = first_decision(&record);
        let outcome = apply_venture_decision(&record, decision.id).expect("active");
        assert_eq!(outcome.status, OutcomeStatus::Applied);
        let next = &outcome.record;
        assert_eq!(next.time_budget.used, decision.hours);
        assert_eq!(next.pending_ripples.len(), decision.ripples.len());
        assert!(
            next.venture
                .as_ref()
                .map(|v| v.pending_decisions.iter().all(|d| d.id != decision.id))
                .unwrap_or(false)
        );
        assert_eq!(next.decision_log.len(), record.decision_log.len() + 1);
    }

    #[test]
    fn decision_over_time_budget_is_rejected_unchanged() {
        let mut record = managed_record();
        if let Some(venture) = record.venture.as_mut() {
            venture.pending_decisions[0].hours = 61.0;
        }
        let decision = first_decision(&record);
        let outcome = apply_venture_decision(&record, decision.id).expect("active");
        assert_eq!(outcome.status, OutcomeStatus::Rejected);
        assert_eq!(outcome.record, record);
    }

    #[test]
    fn unknown_decision_is_rejected() {
        let record = managed_record();
        let outcome = apply_venture_decision(&record, 9_999).expect("active");
        assert_eq!(outcome.status, OutcomeStatus::Rejected);
        assert!(outcome.message.contains("decision 9999"));
    }

    #[test]
    fn unmanaged_venture_cannot_hire() {
        let config = BalanceConfig::default();
        let mut record = sample_record();
        record.venture = Some(Venture::new("Side gig", VentureCategory::Services, 0.0));
        let outcome = hire_candidate(&record, 1, &config).expect("active");
        assert_eq!(outcome.status, OutcomeStatus::Rejected);
        assert_eq!(outcome.message, Rejection::NotManaged.to_string());
    }

    #[test]
    fn hire_then_fire_round_trip_costs_two_salaries() {
        let config = BalanceConfig::default();
        let record = managed_record();
        let candidate = record
            .venture
            .as_ref()
            .and_then(|v| v.candidates.first().cloned())
            .expect("candidate");
        let hired = hire_candidate(&record, candidate.id, &config).expect("active");
        assert_eq!(hired.status, OutcomeStatus::Applied);
        let fired = fire_employee(&hired.record, candidate.id, &config).expect("active");
        assert_eq!(fired.status, OutcomeStatus::Applied);
        let next = &fired.record;
        assert!(next.venture.as_ref().map(|v| v.employees.is_empty()).unwrap_or(false));
        assert!((next.finances.cash - (20_000.0 - 2.0 * candidate.salary)).abs() < 1e-6);
        assert_eq!(next.time_budget.used, 15.0);
    }

    #[test]
    fn hire_without_cash_is_rejected() {
        let config = BalanceConfig::default();
        let mut record = managed_record();
        record.finances.cash = 10.0;
        let candidate_id = record
            .venture
            .as_ref()
            .and_then(|v| v.candidates.first().map(|c| c.id))
            .expect("candidate");
        let outcome = hire_candidate(&record, candidate_id, &config).expect("active");
        assert_eq!(outcome.status, OutcomeStatus::Rejected);
        assert!(outcome.message.starts_with("Insufficient funds"));
    }

    #[test]
    fn settings_update_levers_and_reject_out_of_range() {
        let record = managed_record();
        let settings = VentureSettings {
            levers: Some(Levers {
                price_index: 120.0,
                ..Levers::default()
            }),
            quality_multiplier: Some(1.5),
            ad_channel: Some(AdChannelKind::Print),
            ..VentureSettings::default()
        };
        let outcome = adjust_venture(&record, &settings).expect("active");
        assert_eq!(outcome.status, OutcomeStatus::Applied);
        let venture = outcome.record.venture.as_ref().expect("venture");
        assert_eq!(venture.levers.price_index, 120.0);
        assert_eq!(venture.positioning.quality_multiplier, 1.5);
        assert_eq!(venture.ad_channel.kind, AdChannelKind::Print);

        let bad = VentureSettings {
            pricing_premium: Some(500.0),
            ..VentureSettings::default()
        };
        let outcome = adjust_venture(&record, &bad).expect("active");
        assert_eq!(outcome.status, OutcomeStatus::Rejected);
        assert_eq!(outcome.record, record);
    }

    #[test]
    fn wage_premium_grows_the_pool() {
        let config = VentureConfig::default();
        let mut venture = Venture::new("Northwind", VentureCategory::Services, 0.0);
        let mut rng = SimRng::seed_from_u64(5);
        generate_candidates(&mut rng, &mut venture, &config);
        let base = venture.candidates.len();
        venture.positioning.wage_premium = 30.0;
        generate_candidates(&mut rng, &mut venture, &config);
        assert!(venture.candidates.len() > base);
    }
}
