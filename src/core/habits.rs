use super::config::{BalanceConfig, HabitTable};
use super::types::{DietQuality, ExerciseLevel, HabitSettings, Vitals, clamp_pct};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HabitDelta {
    pub health: f64,
    pub happiness: f64,
    pub cost: f64,
    pub poor_habit_streak: u32,
    pub exercise_streak: u32,
}

fn is_poor_combination(habits: &HabitSettings) -> bool {
    habits.diet != DietQuality::Healthy && habits.exercise == ExerciseLevel::Sedentary
}

fn is_active(habits: &HabitSettings) -> bool {
    matches!(
        habits.exercise,
        ExerciseLevel::Moderate | ExerciseLevel::Athletic
    )
}

/// One month of habit consequences. Deltas repeat every month the habit is
/// held; nothing here is one-time.
pub fn monthly_habit_delta(
    table: &HabitTable,
    habits: &HabitSettings,
    poor_habit_streak: u32,
    exercise_streak: u32,
) -> HabitDelta {
    let axes = [
        table.exercise(habits.exercise),
        table.diet(habits.diet),
        table.sleep(habits.sleep),
        table.stress(habits.stress),
    ];
    let mut health: f64 = axes.iter().map(|a| a.health).sum();
    let happiness: f64 = axes.iter().map(|a| a.happiness).sum();
    let cost: f64 = axes.iter().map(|a| a.cost).sum();

    let poor_habit_streak = if is_poor_combination(habits) {
        poor_habit_streak + 1
    } else {
        poor_habit_streak.saturating_sub(table.poor_streak_decay)
    };
    if poor_habit_streak > table.poor_streak_grace_months {
        health -= table.poor_streak_health_penalty;
    }

    let exercise_streak = if is_active(habits) {
        exercise_streak + 1
    } else {
        0
    };

    HabitDelta {
        health,
        happiness,
        cost,
        poor_habit_streak,
        exercise_streak,
    }
}

pub fn apply_habit_delta(vitals: &mut Vitals, delta: &HabitDelta) {
    vitals.health = clamp_pct(vitals.health + delta.health);
    vitals.happiness = clamp_pct(vitals.happiness + delta.happiness);
    vitals.poor_habit_streak = delta.poor_habit_streak;
    vitals.exercise_streak = delta.exercise_streak;
}

/// Whether switching from `before` to `after` counts as an improvement on
/// any axis without regressing another.
pub fn habits_improved(before: &HabitSettings, after: &HabitSettings) -> bool {
    let pairs = [
        (before.exercise as u8, after.exercise as u8),
        (before.diet as u8, after.diet as u8),
        (before.sleep as u8, after.sleep as u8),
        (before.stress as u8, after.stress as u8),
    ];
    let regressed = pairs.iter().any(|(b, a)| a < b) || (!before.smoker && after.smoker);
    let improved = pairs.iter().any(|(b, a)| a > b) || (before.smoker && !after.smoker);
    improved && !regressed
}

pub fn trailing_average(history: &[f64], window: usize, fallback: f64) -> f64 {
    if history.is_empty() || window == 0 {
        return fallback;
    }
    let start = history.len().saturating_sub(window);
    let slice = &history[start..];
    slice.iter().sum::<f64>() / slice.len() as f64
}

/// Projected life expectancy in years, recomputed from scratch every tick.
pub fn project_life_expectancy(vitals: &Vitals, net_worth: f64, config: &BalanceConfig) -> f64 {
    let life = &config.life;
    let mut years = life.baseline_life_expectancy;
    years += vitals.habits.genetics.life_expectancy_years();

    let trailing_health =
        trailing_average(&vitals.health_history, life.health_history_months, vitals.health);
    years += if trailing_health < 40.0 {
        -5.0
    } else if trailing_health < 60.0 {
        -3.0
    } else if trailing_health >= 80.0 {
        3.0
    } else {
        0.0
    };

    if vitals.exercise_streak >= life.long_streak_months {
        years += 3.0;
    }
    if net_worth > life.wealth_longevity_threshold {
        years += 2.0;
    }
    if vitals.habits.smoker {
        years -= 7.0;
    }
    if vitals.poor_habit_streak >= life.long_streak_months {
        years -= 5.0;
    }

    years.clamp(life.life_expectancy_min, life.life_expectancy_max)
}
