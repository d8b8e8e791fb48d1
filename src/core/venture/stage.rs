use rand::Rng;
use serde::Serialize;
use tracing::info;

use super::actions::{generate_candidates, generate_decisions};
use super::competitors::{redistribute_market_share, run_competitor_turns, seed_competitors};
use super::engines::run_engine;
use super::levers::{advance_roadmap, default_roadmap, lever_effects};
use super::lifecycle::{advance_lifecycle, unmanaged_month};
use super::market::apply_positioning;
use super::scorecard::{CreditRating, credit_rating, evaluate_scorecard};
use super::{
    Department, DepartmentKind, FinancialReport, LifecycleStage, Venture, VentureMetrics,
    VentureStage, starting_arpu,
};
use crate::core::config::{BalanceConfig, VentureConfig};
use crate::core::skills::ComboBonuses;
use crate::core::types::{GameRecord, clamp_pct};

const QUALITY_BASE: [f64; 3] = [40.0, 60.0, 80.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageChange {
    pub from: VentureStage,
    pub to: VentureStage,
}

/// What happened to the venture this month, for the tick summary and log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VentureMonth {
    pub stage_change: Option<StageChange>,
    pub lifecycle_change: Option<LifecycleStage>,
    pub board_report_ready: bool,
    pub net_profit: f64,
    pub notes: Vec<String>,
}

pub(crate) fn initial_metrics(venture: &Venture, revenue: f64) -> VentureMetrics {
    let arpu = starting_arpu(venture.category);
    VentureMetrics {
        revenue,
        cogs: 0.0,
        expenses: 0.0,
        net_profit: 0.0,
        gross_margin: 0.0,
        customers: (revenue / arpu).round(),
        leads: 0.0,
        bonus_leads: 0.0,
        conversion_rate: 0.05,
        churn_rate: 0.05,
        arpu,
        brand: 30.0,
        market_share: 0.0,
        quality_score: QUALITY_BASE[venture.levers.quality_tier.index()],
        mom_growth: 0.0,
        board_confidence: 0.0,
        credit_rating: CreditRating::C,
        scorecard: None,
    }
}

fn initial_departments(config: &VentureConfig) -> Vec<Department> {
    [DepartmentKind::Sales, DepartmentKind::Product, DepartmentKind::Operations]
        .into_iter()
        .map(|kind| Department {
            kind,
            monthly_cost: config.department_cost,
            uplift: config.department_uplift,
        })
        .collect()
}

/// Moves the revenue-threshold stage forward on last month's revenue. Each
/// upward crossing initializes its sub-state only if it is not there yet.
/// The only way back is `Failed`.
pub fn update_stage(
    venture: &mut Venture,
    player_cash: f64,
    config: &VentureConfig,
) -> Option<StageChange> {
    let from = venture.stage;
    if from == VentureStage::Failed {
        return None;
    }
    let failed_unmanaged = venture.lifecycle == LifecycleStage::Failed && !venture.is_managed();
    let failed_managed = venture.is_managed()
        && venture.loss_streak >= config.failure_loss_months
        && player_cash < 0.0;
    if failed_unmanaged || failed_managed {
        venture.stage = VentureStage::Failed;
    } else {
        if venture.stage == VentureStage::Startup
            && venture.monthly_revenue >= config.growth_revenue_threshold
        {
            venture.stage = VentureStage::Growth;
            if venture.metrics.is_none() {
                venture.metrics = Some(initial_metrics(venture, venture.monthly_revenue));
            }
            if venture.competitors.is_empty() {
                venture.competitors = seed_competitors(&venture.name);
            }
            if venture.roadmap.is_empty() {
                venture.roadmap = default_roadmap();
            }
        }
        if venture.stage == VentureStage::Growth
            && venture.monthly_revenue >= config.scale_revenue_threshold
        {
            venture.stage = VentureStage::Scale;
            if venture.departments.is_empty() {
                venture.departments = initial_departments(config);
            }
        }
    }
    if venture.stage == from {
        return None;
    }
    info!(target: "sim.venture", venture = %venture.name, ?from, to = ?venture.stage, "stage changed");
    Some(StageChange {
        from,
        to: venture.stage,
    })
}

fn track_loss(venture: &mut Venture, net: f64) {
    venture.last_net_profit = net;
    if net < 0.0 {
        venture.loss_streak += 1;
    } else {
        venture.loss_streak = 0;
    }
}

/// The venture's share of the monthly tick: stage update, revenue engine,
/// levers, positioning, competitors, scorecard, report, then next month's
/// decisions and candidates. `None` when there is no live venture.
pub fn run_venture_month<R: Rng + ?Sized>(
    rng: &mut R,
    record: &mut GameRecord,
    config: &BalanceConfig,
    bonuses: &ComboBonuses,
) -> Option<VentureMonth> {
    let vcfg = &config.venture;
    let venture = record.venture.as_mut()?;
    if venture.stage == VentureStage::Failed {
        return None;
    }
    venture.months_active += 1;
    let mut month = VentureMonth {
        stage_change: update_stage(venture, record.finances.cash, vcfg),
        ..VentureMonth::default()
    };
    if venture.stage == VentureStage::Failed {
        venture.last_net_profit = 0.0;
        venture.pending_decisions.clear();
        venture.candidates.clear();
        month.notes.push(format!("{} has failed and closed its doors", venture.name));
        return Some(month);
    }

    if !venture.is_managed() {
        month.lifecycle_change = advance_lifecycle(rng, venture, &record.skills, vcfg);
        if venture.lifecycle == LifecycleStage::Failed {
            let from = venture.stage;
            venture.stage = VentureStage::Failed;
            venture.last_net_profit = 0.0;
            month.stage_change = Some(StageChange {
                from,
                to: VentureStage::Failed,
            });
            month.notes.push(format!("{} fizzled out before it found customers", venture.name));
            return Some(month);
        }
        let net = unmanaged_month(rng, venture, vcfg);
        track_loss(venture, net);
        month.net_profit = net;
        if let Some(stage) = month.lifecycle_change {
            month.notes.push(format!("{} moved to the {stage:?} stage", venture.name));
        }
        return Some(month);
    }

    let mut metrics = venture.metrics.clone()?;
    let effects = lever_effects(&venture.levers, vcfg);
    let result = run_engine(rng, venture, &metrics, &effects, record.skills.marketing, vcfg);
    let department_costs: f64 = venture.departments.iter().map(|d| d.monthly_cost).sum();
    let expenses = effects.expense + venture.payroll() + department_costs;
    let net = result.revenue - result.cogs - expenses;

    metrics.mom_growth = if metrics.revenue > 0.0 {
        (result.revenue - metrics.revenue) / metrics.revenue
    } else {
        0.0
    };
    metrics.revenue = result.revenue;
    metrics.cogs = result.cogs;
    metrics.expenses = expenses;
    metrics.net_profit = net;
    metrics.gross_margin = if result.revenue > 0.0 {
        (result.revenue - result.cogs) / result.revenue
    } else {
        0.0
    };
    metrics.customers = result.customers;
    metrics.leads = result.leads;
    metrics.bonus_leads = 0.0;
    metrics.brand = clamp_pct(metrics.brand + effects.brand_delta);
    metrics.quality_score = clamp_pct(
        QUALITY_BASE[venture.levers.quality_tier.index()] * venture.positioning.quality_multiplier
            + venture.department_uplift(DepartmentKind::Product) * 100.0,
    );
    venture.metrics = Some(metrics);
    venture.monthly_revenue = result.revenue;
    track_loss(venture, net);
    month.net_profit = net;

    if let Some(item) = advance_roadmap(venture) {
        month.notes.push(format!("{} shipped {item}", venture.name));
    }
    if apply_positioning(venture, vcfg) {
        month
            .notes
            .push(format!("{} is priced beyond what its quality supports", venture.name));
    }
    month.notes.extend(run_competitor_turns(rng, &mut venture.competitors));
    redistribute_market_share(venture, bonuses.market_share_bonus);

    let finances = &record.finances;
    let rating = credit_rating(
        finances.cash,
        finances.monthly_expenses + expenses,
        finances.debts.total,
        (finances.monthly_income + result.revenue) * 12.0,
    );
    if let Some(metrics) = venture.metrics.as_mut() {
        metrics.credit_rating = rating;
        let card = evaluate_scorecard(metrics, venture.category, vcfg);
        metrics.board_confidence = card.board_confidence();
        metrics.scorecard = Some(card);
        venture.financial_history.push(FinancialReport {
            age: record.age,
            month: record.month,
            revenue: metrics.revenue,
            cogs: metrics.cogs,
            expenses: metrics.expenses,
            net_profit: metrics.net_profit,
            customers: metrics.customers,
            brand: metrics.brand,
            market_share: metrics.market_share,
            board_confidence: metrics.board_confidence,
            credit_rating: metrics.credit_rating,
        });
    }
    month.board_report_ready = record.month % 3 == 0;

    generate_decisions(rng, venture);
    generate_candidates(rng, venture, vcfg);
    Some(month)
}
