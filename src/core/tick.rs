use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use super::config::BalanceConfig;
use super::decisions::ensure_active;
use super::error::SimError;
use super::events::roll_event;
use super::finance::{
    EffectIncome, IncomeBreakdown, accrue_lifetime_income, age_health_decay, compound_debts,
    effective_income, financial_stress_penalty, grow_assets, monthly_outgoings, settle,
};
use super::habits::{apply_habit_delta, monthly_habit_delta, project_life_expectancy};
use super::mortality::check_terminal;
use super::ripple::{apply_ripple, take_due};
use super::rng::{roll, tick_rng};
use super::skills::{combo_bonuses, evaluate_stack, newly_unlocked};
use super::types::{
    ActiveEffectKind, GameRecord, LifeStatus, Partner, RelationshipStatus, SkillCombo,
};
use super::venture::{StageChange, VentureStage, run_venture_month};

const HISTORY_CAP: usize = 240;
const ENCOUNTER_HAPPINESS: f64 = 5.0;
const PARTNER_NAMES: [&str; 8] = [
    "Jordan", "Riley", "Morgan", "Casey", "Taylor", "Quinn", "Rowan", "Sage",
];

/// User-facing flags for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSummary {
    pub age: u32,
    pub month: u32,
    pub status: LifeStatus,
    pub event_pending: bool,
    pub milestone: Option<f64>,
    pub venture_stage_change: Option<StageChange>,
    pub combo_unlocked: Option<SkillCombo>,
    pub encounter: bool,
    pub board_report_ready: bool,
    pub income: IncomeBreakdown,
    pub outgoings: f64,
    pub net_worth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickOutcome {
    pub record: GameRecord,
    pub summary: TickSummary,
}

/// Runs one simulated month. The input record is never touched: the phases
/// work on a copy and the finished copy is returned with its summary, so a
/// rejected tick leaves nothing behind.
pub fn advance_month(record: &GameRecord, config: &BalanceConfig) -> Result<TickOutcome, SimError> {
    ensure_active(record)?;
    let mut rng = tick_rng(record);
    let mut next = record.clone();
    let summary = run_phases(&mut rng, &mut next, config);
    info!(
        target: "sim.tick",
        id = %next.id,
        age = next.age,
        month = next.month,
        net_worth = next.finances.net_worth,
        status = ?next.status,
        "month advanced"
    );
    Ok(TickOutcome {
        record: next,
        summary,
    })
}

fn run_phases<R: Rng + ?Sized>(rng: &mut R, record: &mut GameRecord, config: &BalanceConfig) -> TickSummary {
    let effect_income = apply_active_effects(record);

    let habit = monthly_habit_delta(
        &config.habits,
        &record.vitals.habits,
        record.vitals.poor_habit_streak,
        record.vitals.exercise_streak,
    );
    apply_habit_delta(&mut record.vitals, &habit);

    let stack = evaluate_stack(&record.skills, &config.combos);
    let combo_unlocked = newly_unlocked(record.active_combo, stack.combo);
    record.skill_stack_multiplier = stack.multiplier;
    record.active_combo = stack.combo;
    if let Some(combo) = combo_unlocked {
        info!(target: "sim.tick", id = %record.id, combo = combo.label(), "combo unlocked");
        record.log_event("Skill combo unlocked", combo.label());
    }
    let bonuses = combo_bonuses(stack.combo, &config.combos);

    let venture_profit = record
        .venture
        .as_ref()
        .filter(|v| v.stage != VentureStage::Failed)
        .map(|v| v.last_net_profit)
        .unwrap_or(0.0);
    let income = effective_income(
        &record.finances,
        stack.multiplier,
        venture_profit,
        effect_income,
        &bonuses,
    );
    let outgoings = monthly_outgoings(&record.finances, habit.cost, &config.finance);
    let net = settle(&mut record.finances, income.total, outgoings);
    debug!(target: "sim.tick", income = income.total, outgoings, net, "settled");

    grow_assets(rng, &mut record.finances, &config.finance);
    accrue_lifetime_income(&mut record.finances, income.total);
    compound_debts(&mut record.finances, &config.finance);

    let decay = age_health_decay(record.age, &config.life);
    let stress = financial_stress_penalty(&record.finances, net, &config.life);
    record.vitals.add_health(-decay);
    record.vitals.add_happiness(-stress);
    debug!(target: "sim.tick", decay, stress, "vitals adjusted");

    if let Some(partner) = record.partner.as_mut() {
        partner.months_together += 1;
        record.vitals.add_happiness(config.life.partner_happiness_per_month);
    }

    record.finances.recompute_net_worth();
    record.vitals.life_expectancy =
        project_life_expectancy(&record.vitals, record.finances.net_worth, config);

    advance_calendar(record);

    if let Some(status) = check_terminal(rng, record.age, record.vitals.health, config) {
        record.status = status;
        let detail = match status {
            LifeStatus::Deceased => format!("{} passed away at {}", record.player_name, record.age),
            _ => format!("{} reached {} and retired from the game", record.player_name, record.age),
        };
        info!(target: "sim.tick", id = %record.id, age = record.age, ?status, "life ended");
        record.log_event("Life complete", detail);
    }
    let alive = !record.is_terminal();

    let encounter = alive && roll_encounter(rng, record, config);

    snapshot_history(record);
    record.finances.recompute_net_worth();

    if alive {
        if let Some(event) = roll_event(rng, record, config) {
            if !record.seen_events.contains(&event.template_id) {
                record.seen_events.push(event.template_id.clone());
            }
            record.log_event("Event", event.title.clone());
            record.pending_event = Some(event);
        }
    }

    let milestone = check_milestones(record, &config.life.milestones);

    let (due, rest) = take_due(std::mem::take(&mut record.pending_ripples), record.age, record.month);
    record.pending_ripples = rest;
    for ripple in &due {
        apply_ripple(record, ripple);
    }

    let mut venture_stage_change = None;
    let mut board_report_ready = false;
    let venture_month = if alive {
        run_venture_month(rng, record, config, &bonuses)
    } else {
        None
    };
    if let Some(month) = venture_month {
        venture_stage_change = month.stage_change;
        board_report_ready = month.board_report_ready;
        for note in &month.notes {
            info!(target: "sim.venture", id = %record.id, %note);
            record.log_event("Venture", note.clone());
        }
        if let Some(change) = month.stage_change {
            record.log_event(
                "Venture stage",
                format!("{:?} -> {:?}", change.from, change.to),
            );
        }
    }

    settle_time_budget(record, config);
    record.finances.recompute_net_worth();

    TickSummary {
        age: record.age,
        month: record.month,
        status: record.status,
        event_pending: record.pending_event.is_some(),
        milestone,
        venture_stage_change,
        combo_unlocked,
        encounter,
        board_report_ready,
        income,
        outgoings,
        net_worth: record.finances.net_worth,
    }
}

/// Applies this month's share of every active effect and drops the ones
/// that run out. Income effects are returned for the ledger rather than
/// written to the base salary.
fn apply_active_effects(record: &mut GameRecord) -> EffectIncome {
    let mut income = EffectIncome::default();
    for effect in record.active_effects.iter_mut() {
        if effect.months_remaining == 0 {
            continue;
        }
        match effect.kind {
            ActiveEffectKind::IncomePct { pct } => income.pct += pct,
            ActiveEffectKind::ReplacementIncome { amount } => income.replacement += amount,
            ActiveEffectKind::Happiness { per_month } => record.vitals.add_happiness(per_month),
            ActiveEffectKind::Health { per_month } => record.vitals.add_health(per_month),
        }
        effect.months_remaining -= 1;
    }
    let (expired, active): (Vec<_>, Vec<_>) = std::mem::take(&mut record.active_effects)
        .into_iter()
        .partition(|e| e.months_remaining == 0);
    record.active_effects = active;
    for effect in expired {
        debug!(target: "sim.tick", label = %effect.label, "effect expired");
        record.log_event("Effect ended", effect.label);
    }
    income
}

fn advance_calendar(record: &mut GameRecord) {
    record.months_elapsed += 1;
    if record.month >= 12 {
        record.month = 1;
        record.age += 1;
    } else {
        record.month += 1;
    }
}

fn roll_encounter<R: Rng + ?Sized>(rng: &mut R, record: &mut GameRecord, config: &BalanceConfig) -> bool {
    let life = &config.life;
    let open = matches!(
        record.relationship,
        RelationshipStatus::Single | RelationshipStatus::Divorced
    );
    if !open || record.age < life.encounter_min_age || record.age > life.encounter_max_age {
        return false;
    }
    if !roll(rng, life.encounter_probability) {
        return false;
    }
    let name = PARTNER_NAMES[rng.gen_range(0..PARTNER_NAMES.len())];
    record.relationship = RelationshipStatus::Dating;
    record.partner = Some(Partner {
        name: name.to_string(),
        months_together: 0,
    });
    record.vitals.add_happiness(ENCOUNTER_HAPPINESS);
    info!(target: "sim.tick", id = %record.id, partner = name, "met someone");
    record.log_event("Met someone", format!("You started seeing {name}"));
    true
}

fn snapshot_history(record: &mut GameRecord) {
    let vitals = &mut record.vitals;
    vitals.health_history.push(vitals.health);
    vitals.happiness_history.push(vitals.happiness);
    for history in [&mut vitals.health_history, &mut vitals.happiness_history] {
        if history.len() > HISTORY_CAP {
            let excess = history.len() - HISTORY_CAP;
            history.drain(..excess);
        }
    }
    vitals.happiness_sum += vitals.happiness;
    vitals.months_tracked += 1;
}

/// Records every threshold newly at or below net worth; returns the highest.
fn check_milestones(record: &mut GameRecord, milestones: &[f64]) -> Option<f64> {
    let net_worth = record.finances.net_worth;
    let mut crossed = None;
    for threshold in milestones {
        if net_worth >= *threshold && !record.milestones_reached.contains(threshold) {
            record.milestones_reached.push(*threshold);
            record.log_event("Milestone", format!("Net worth passed ${threshold:.0}"));
            info!(target: "sim.tick", id = %record.id, threshold, "milestone reached");
            crossed = Some(*threshold);
        }
    }
    crossed
}

fn settle_time_budget(record: &mut GameRecord, config: &BalanceConfig) {
    let calendar = &config.calendar;
    let over = record.time_budget.used - record.time_budget.hours;
    if over > 0.0 {
        record.vitals.add_happiness(-over * calendar.overflow_happiness_per_hour);
        record.vitals.add_health(-over * calendar.overflow_health_per_hour);
        record.log_event("Overworked", format!("{over:.0} hours past the monthly budget"));
    }
    record.time_budget.used = 0.0;
    record.time_budget.hours = calendar.time_budget_hours;
}
