use super::config::BalanceConfig;
use super::types::{GameRecord, NewPlayer, Skills};

/// A 30-year-old salaried single with no debt and no venture.
pub fn sample_record() -> GameRecord {
    let player = NewPlayer {
        name: "Avery".to_string(),
        age: 30,
        job_title: "Analyst".to_string(),
        monthly_income: 5_000.0,
        monthly_expenses: 2_500.0,
        cash: 10_000.0,
        seed: 42,
        skills: Skills::uniform(40.0),
        ..NewPlayer::default()
    };
    match GameRecord::new("test-record", player, &BalanceConfig::default()) {
        Ok(record) => record,
        Err(err) => panic!("sample player is valid: {err}"),
    }
}
