use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::types::{GameRecord, calendar_after, calendar_index, clamp_pct};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RippleEffect {
    Cash { amount: f64 },
    Happiness { amount: f64 },
    Health { amount: f64 },
    Brand { amount: f64 },
    ChurnRate { delta: f64 },
    ConversionRate { delta: f64 },
    Leads { amount: f64 },
    Customers { amount: f64 },
    Narrative { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRipple {
    pub id: u64,
    pub source: String,
    pub due_age: u32,
    pub due_month: u32,
    pub effect: RippleEffect,
}

impl PendingRipple {
    pub fn is_due(&self, age: u32, month: u32) -> bool {
        calendar_index(self.due_age, self.due_month) <= calendar_index(age, month)
    }
}

pub fn schedule_ripple(
    record: &mut GameRecord,
    source: &str,
    delay_months: u32,
    effect: RippleEffect,
) -> u64 {
    let (due_age, due_month) = calendar_after(record.age, record.month, delay_months.max(1));
    let id = record.next_ripple_id;
    record.next_ripple_id += 1;
    debug!(target: "sim.ripple", id, source, due_age, due_month, "ripple scheduled");
    record.pending_ripples.push(PendingRipple {
        id,
        source: source.to_string(),
        due_age,
        due_month,
        effect,
    });
    id
}

/// Splits the pending set into ripples due at (age, month) and the rest.
/// A ripple handed back as due is gone from the pending set for good.
pub fn take_due(
    pending: Vec<PendingRipple>,
    age: u32,
    month: u32,
) -> (Vec<PendingRipple>, Vec<PendingRipple>) {
    pending.into_iter().partition(|r| r.is_due(age, month))
}

/// Applies one effect and describes what it did. Narrative effects change no
/// numbers; venture effects are dropped once the venture has no metrics.
pub fn apply_ripple_effect(record: &mut GameRecord, effect: &RippleEffect) -> String {
    match effect {
        RippleEffect::Cash { amount } => {
            record.finances.cash += amount;
            record.finances.recompute_net_worth();
            format!("cash {amount:+.0}")
        }
        RippleEffect::Happiness { amount } => {
            record.vitals.add_happiness(*amount);
            format!("happiness {amount:+.1}")
        }
        RippleEffect::Health { amount } => {
            record.vitals.add_health(*amount);
            format!("health {amount:+.1}")
        }
        RippleEffect::Narrative { text } => text.clone(),
        venture_effect => match record
            .venture
            .as_mut()
            .and_then(|v| v.metrics.as_mut())
        {
            Some(metrics) => match venture_effect {
                RippleEffect::Brand { amount } => {
                    metrics.brand = clamp_pct(metrics.brand + amount);
                    format!("brand {amount:+.1}")
                }
                RippleEffect::ChurnRate { delta } => {
                    metrics.churn_rate = (metrics.churn_rate + delta).clamp(0.0, 1.0);
                    format!("churn {delta:+.3}")
                }
                RippleEffect::ConversionRate { delta } => {
                    metrics.conversion_rate = (metrics.conversion_rate + delta).clamp(0.0, 1.0);
                    format!("conversion {delta:+.3}")
                }
                RippleEffect::Leads { amount } => {
                    metrics.bonus_leads += amount;
                    format!("leads {amount:+.0}")
                }
                RippleEffect::Customers { amount } => {
                    metrics.customers = (metrics.customers + amount).max(0.0);
                    format!("customers {amount:+.0}")
                }
                _ => String::new(),
            },
            None => "no active venture; no effect".to_string(),
        },
    }
}

/// Applies one resolved ripple and logs it, narrative-only ones included.
pub fn apply_ripple(record: &mut GameRecord, ripple: &PendingRipple) {
    let detail = apply_ripple_effect(record, &ripple.effect);
    info!(target: "sim.ripple", id = ripple.id, source = %ripple.source, %detail, "ripple resolved");
    record.log_event(format!("Ripple: {}", ripple.source), detail);
}
