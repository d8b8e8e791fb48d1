mod config;
mod decisions;
mod error;
mod events;
mod finance;
mod habits;
mod leaderboard;
mod mortality;
mod narrative;
mod ripple;
mod rng;
mod skills;
#[cfg(test)]
mod testutil;
mod tick;
mod types;
pub mod venture;

pub use config::{BALANCE_VERSION, BalanceConfig, ConfigError};
pub use decisions::{
    ActionOutcome, Decision, EducationProgram, InvestmentAccount, OutcomeStatus, apply_decision,
};
pub use error::{Rejection, SimError};
pub use events::{Effect, EventChoice, PendingEvent, resolve_event};
pub use finance::IncomeBreakdown;
pub use leaderboard::{Grade, Leaderboard, LeaderboardEntry, insert_ranked, leaderboard_entry};
pub use narrative::{NarrativeError, NarrativeSnapshot, Narrator, OfflineNarrator, fallback_narrative};
pub use ripple::{PendingRipple, RippleEffect};
pub use skills::{SkillStack, evaluate_stack};
pub use tick::{TickOutcome, TickSummary, advance_month};
pub use types::{
    ActiveEffect, ActiveEffectKind, DebtCategory, Debts, DietQuality, ExerciseLevel, Finances,
    GameRecord, GeneticsTier, HabitSettings, LifeStatus, LogEntry, NewPlayer, RelationshipStatus,
    SkillCombo, SkillKind, Skills, SleepQuality, StressManagement, TimeBudget, Vitals,
};
