use serde::{Deserialize, Serialize};

use super::types::{GameRecord, LifeStatus};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn for_score(score: f64) -> Self {
        match score {
            s if s >= 3_000.0 => Grade::S,
            s if s >= 1_500.0 => Grade::A,
            s if s >= 800.0 => Grade::B,
            s if s >= 400.0 => Grade::C,
            s if s >= 150.0 => Grade::D,
            _ => Grade::F,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub status: LifeStatus,
    pub final_age: u32,
    pub score: f64,
    pub grade: Grade,
    pub net_worth: f64,
    pub lifetime_income: f64,
    pub average_happiness: f64,
    pub final_health: f64,
}

pub fn life_score(net_worth: f64, lifetime_income: f64, average_happiness: f64, final_health: f64) -> f64 {
    net_worth / 1_000.0 + lifetime_income / 10_000.0 + average_happiness * 10.0 + final_health * 5.0
}

/// Summary row for a finished life. `None` while the record is still active.
pub fn leaderboard_entry(record: &GameRecord) -> Option<LeaderboardEntry> {
    if !record.is_terminal() {
        return None;
    }
    let finances = &record.finances;
    let average_happiness = record.vitals.average_happiness();
    let score = life_score(
        finances.net_worth,
        finances.lifetime_income,
        average_happiness,
        record.vitals.health,
    );
    Some(LeaderboardEntry {
        id: record.id.clone(),
        name: record.player_name.clone(),
        status: record.status,
        final_age: record.age,
        score,
        grade: Grade::for_score(score),
        net_worth: finances.net_worth,
        lifetime_income: finances.lifetime_income,
        average_happiness,
        final_health: record.vitals.health,
    })
}

/// Where finished lives are posted.
pub trait Leaderboard: Send + Sync {
    fn submit(&self, entry: LeaderboardEntry);
    fn top(&self, limit: usize) -> Vec<LeaderboardEntry>;
}

/// Highest score first; a resubmitted id replaces its earlier row.
pub fn insert_ranked(entries: &mut Vec<LeaderboardEntry>, entry: LeaderboardEntry) {
    entries.retain(|e| e.id != entry.id);
    let at = entries
        .iter()
        .position(|e| e.score < entry.score)
        .unwrap_or(entries.len());
    entries.insert(at, entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testutil::sample_record;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn score_weights() {
        assert_approx(life_score(500_000.0, 2_000_000.0, 60.0, 70.0), 500.0 + 200.0 + 600.0 + 350.0);
    }

    #[test]
    fn grade_bands() {
        assert_eq!(Grade::for_score(3_000.0), Grade::S);
        assert_eq!(Grade::for_score(2_999.0), Grade::A);
        assert_eq!(Grade::for_score(800.0), Grade::B);
        assert_eq!(Grade::for_score(400.0), Grade::C);
        assert_eq!(Grade::for_score(150.0), Grade::D);
        assert_eq!(Grade::for_score(-20.0), Grade::F);
    }

    #[test]
    fn active_record_has_no_entry() {
        let mut record = sample_record();
        assert!(leaderboard_entry(&record).is_none());
        record.status = LifeStatus::Completed;
        let entry = leaderboard_entry(&record).expect("terminal");
        assert_eq!(entry.final_health, record.vitals.health);
        assert_eq!(entry.grade, Grade::for_score(entry.score));
    }

    #[test]
    fn ranking_orders_and_replaces() {
        let mut record = sample_record();
        record.status = LifeStatus::Completed;
        let base = leaderboard_entry(&record).expect("terminal");
        let mut entries = Vec::new();
        for (id, score) in [("a", 10.0), ("b", 30.0), ("c", 20.0), ("a", 40.0)] {
            insert_ranked(
                &mut entries,
                LeaderboardEntry {
                    id: id.to_string(),
                    score,
                    ..base.clone()
                },
            );
        }
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
