use serde::Serialize;
use thiserror::Error;

use super::types::{GameRecord, RelationshipStatus};

const RECENT_EVENTS: usize = 3;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NarrativeError {
    #[error("narrative service is not configured")]
    Unavailable,
    #[error("narrative service timed out")]
    Timeout,
    #[error("narrative service failed: {0}")]
    Failed(String),
}

/// Flattened view of a record handed to whatever writes the story text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeSnapshot {
    pub name: String,
    pub age: u32,
    pub month: u32,
    pub job_title: String,
    pub net_worth: f64,
    pub cash: f64,
    pub monthly_income: f64,
    pub happiness: f64,
    pub health: f64,
    pub relationship: RelationshipStatus,
    pub venture: Option<String>,
    pub recent_events: Vec<String>,
}

impl NarrativeSnapshot {
    pub fn from_record(record: &GameRecord) -> Self {
        let recent_events = record
            .event_log
            .iter()
            .rev()
            .take(RECENT_EVENTS)
            .map(|entry| entry.title.clone())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        Self {
            name: record.player_name.clone(),
            age: record.age,
            month: record.month,
            job_title: record.job_title.clone(),
            net_worth: record.finances.net_worth,
            cash: record.finances.cash,
            monthly_income: record.finances.monthly_income,
            happiness: record.vitals.happiness,
            health: record.vitals.health,
            relationship: record.relationship,
            venture: record.venture.as_ref().map(|v| v.name.clone()),
            recent_events,
        }
    }
}

/// Something that turns a snapshot into prose. Implementations may be slow
/// or down; callers always have [`fallback_narrative`] to fall back on.
pub trait Narrator: Send + Sync {
    fn narrate(&self, snapshot: &NarrativeSnapshot) -> Result<String, NarrativeError>;
}

/// Used when no text service is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNarrator;

impl Narrator for OfflineNarrator {
    fn narrate(&self, _snapshot: &NarrativeSnapshot) -> Result<String, NarrativeError> {
        Err(NarrativeError::Unavailable)
    }
}

pub fn fallback_narrative(snapshot: &NarrativeSnapshot) -> String {
    let recent = if snapshot.recent_events.is_empty() {
        "nothing notable".to_string()
    } else {
        snapshot.recent_events.join("; ")
    };
    format!(
        "{}, age {}: net worth ${:.0}, happiness {:.0}, health {:.0}. Recent: {}.",
        snapshot.name, snapshot.age, snapshot.net_worth, snapshot.happiness, snapshot.health, recent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testutil::sample_record;

    struct Scripted(&'static str);

    impl Narrator for Scripted {
        fn narrate(&self, snapshot: &NarrativeSnapshot) -> Result<String, NarrativeError> {
            Ok(format!("{} {}", snapshot.name, self.0))
        }
    }

    #[test]
    fn snapshot_keeps_last_three_titles_in_order() {
        let mut record = sample_record();
        for title in ["one", "two", "three", "four"] {
            record.log_event(title, "");
        }
        let snapshot = NarrativeSnapshot::from_record(&record);
        assert_eq!(snapshot.recent_events, vec!["two", "three", "four"]);
    }

    #[test]
    fn fallback_template_shape() {
        let mut record = sample_record();
        record.log_event("Promotion", "");
        record.log_event("Car repair", "");
        let snapshot = NarrativeSnapshot::from_record(&record);
        assert_eq!(
            fallback_narrative(&snapshot),
            "Avery, age 30: net worth $10000, happiness 60, health 80. Recent: Promotion; Car repair."
        );
    }

    #[test]
    fn offline_narrator_reports_unavailable() {
        let snapshot = NarrativeSnapshot::from_record(&sample_record());
        assert_eq!(OfflineNarrator.narrate(&snapshot), Err(NarrativeError::Unavailable));
        assert_eq!(
            Scripted("thrives").narrate(&snapshot),
            Ok("Avery thrives".to_string())
        );
    }
}
