mod store;

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    ActionOutcome, BalanceConfig, ConfigError, Decision, EventChoice, GameRecord, Leaderboard,
    NarrativeSnapshot, Narrator, NewPlayer, OfflineNarrator, SimError, TickOutcome, advance_month,
    apply_decision, fallback_narrative, leaderboard_entry, resolve_event,
    venture::{VentureSettings, adjust_venture, apply_venture_decision, fire_employee, hire_candidate},
};
pub use store::{InMemoryLeaderboard, RecordStore};

const NARRATIVE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_LEADERBOARD_LIMIT: usize = 20;

#[derive(Parser, Debug)]
#[command(
    name = "lifepath",
    about = "Month-by-month life simulation with an embedded venture builder"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, help = "Balance table JSON; built-in defaults when omitted")]
        balance: Option<PathBuf>,
    },
    /// Run one life headless and print a JSON summary per month
    Simulate {
        #[arg(long, default_value = "Player")]
        name: String,
        #[arg(long, default_value_t = 22)]
        age: u32,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 12)]
        months: u32,
        #[arg(long, default_value_t = 3_500.0)]
        income: f64,
        #[arg(long, default_value_t = 2_000.0)]
        expenses: f64,
        #[arg(long, default_value_t = 2_000.0)]
        cash: f64,
        #[arg(long)]
        balance: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Serve { port, balance } => {
            let config = load_balance(balance.as_deref())?;
            run_http_server(port, AppState::new(config)).await?;
        }
        Command::Simulate {
            name,
            age,
            seed,
            months,
            income,
            expenses,
            cash,
            balance,
        } => {
            let config = load_balance(balance.as_deref())?;
            let player = NewPlayer {
                name,
                age,
                seed,
                monthly_income: income,
                monthly_expenses: expenses,
                cash,
                ..NewPlayer::default()
            };
            for line in simulate_lines(player, months, &config)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn load_balance(path: Option<&std::path::Path>) -> Result<BalanceConfig, ConfigError> {
    match path {
        Some(path) => {
            let config = BalanceConfig::load(path)?;
            info!(target: "api", path = %path.display(), "balance table loaded");
            Ok(config)
        }
        None => Ok(BalanceConfig::default()),
    }
}

/// Headless run: one JSON summary line per month, pending events answered
/// with the cautious option, then the leaderboard row if the life ended.
fn simulate_lines(player: NewPlayer, months: u32, config: &BalanceConfig) -> Result<Vec<String>, AppError> {
    let mut record = GameRecord::new("cli", player, config)?;
    let mut lines = Vec::new();
    for _ in 0..months {
        if record.is_terminal() {
            break;
        }
        let TickOutcome { record: next, summary } = advance_month(&record, config)?;
        record = next;
        lines.push(serde_json::to_string(&summary)?);
        if let Some(pending) = record.pending_event.as_ref() {
            let choice = if pending.choice.is_some() {
                EventChoice::Decline
            } else {
                EventChoice::None
            };
            if !record.is_terminal() {
                record = resolve_event(&record, choice, config)?.record;
            }
        }
    }
    if let Some(entry) = leaderboard_entry(&record) {
        lines.push(serde_json::to_string(&entry)?);
    }
    Ok(lines)
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<RecordStore>,
    config: Arc<BalanceConfig>,
    narrator: Arc<dyn Narrator>,
    leaderboard: Arc<dyn Leaderboard>,
}

impl AppState {
    pub fn new(config: BalanceConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(OfflineNarrator),
            Arc::new(InMemoryLeaderboard::default()),
        )
    }

    pub fn with_collaborators(
        config: BalanceConfig,
        narrator: Arc<dyn Narrator>,
        leaderboard: Arc<dyn Leaderboard>,
    ) -> Self {
        Self {
            store: Arc::new(RecordStore::default()),
            config: Arc::new(config),
            narrator,
            leaderboard,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/records", post(create_record_handler))
        .route("/api/records/:id", get(get_record_handler))
        .route("/api/records/:id/advance", post(advance_handler))
        .route("/api/records/:id/decisions", post(decision_handler))
        .route("/api/records/:id/event", post(resolve_event_handler))
        .route(
            "/api/records/:id/venture/decisions/:decision_id",
            post(venture_decision_handler),
        )
        .route("/api/records/:id/venture/settings", post(venture_settings_handler))
        .route("/api/records/:id/venture/hire/:candidate_id", post(hire_handler))
        .route("/api/records/:id/venture/fire/:employee_id", post(fire_handler))
        .route("/api/records/:id/narrative", get(narrative_handler))
        .route("/api/leaderboard", get(leaderboard_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(target: "api", %addr, "lifepath HTTP API listening");
    axum::serve(listener, router(state)).await
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct ResolveEventPayload {
    choice: EventChoice,
}

#[derive(Debug, Deserialize)]
struct LeaderboardQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
enum NarrativeSource {
    Service,
    Fallback,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NarrativeResponse {
    text: String,
    source: NarrativeSource,
}

/// Anything an operation hands back that carries the next record.
trait CarriesRecord {
    fn next_record(&self) -> &GameRecord;
}

impl CarriesRecord for ActionOutcome {
    fn next_record(&self) -> &GameRecord {
        &self.record
    }
}

impl CarriesRecord for TickOutcome {
    fn next_record(&self) -> &GameRecord {
        &self.record
    }
}

/// Runs `op` against the stored record while holding its lock and stores
/// the result, so two requests on one record never interleave.
async fn apply_locked<T, F>(state: &AppState, id: &str, op: F) -> Response
where
    T: CarriesRecord + Serialize,
    F: FnOnce(&GameRecord, &BalanceConfig) -> Result<T, SimError>,
{
    let handle = match state.store.handle(id).await {
        Ok(handle) => handle,
        Err(err) => return sim_error_response(&err),
    };
    let mut record = handle.lock().await;
    let outcome = match op(&*record, &state.config) {
        Ok(outcome) => outcome,
        Err(err) => return sim_error_response(&err),
    };
    let next = outcome.next_record();
    if !record.is_terminal() && next.is_terminal() {
        if let Some(entry) = leaderboard_entry(next) {
            info!(target: "api", id = %entry.id, score = entry.score, grade = ?entry.grade, "life archived");
            state.leaderboard.submit(entry);
        }
    }
    *record = next.clone();
    json_response(StatusCode::OK, outcome)
}

async fn create_record_handler(State(state): State<AppState>, Json(player): Json<NewPlayer>) -> Response {
    match state.store.create(player, &state.config).await {
        Ok(record) => {
            info!(target: "api", id = %record.id, "record created");
            json_response(StatusCode::CREATED, record)
        }
        Err(err) => sim_error_response(&err),
    }
}

async fn get_record_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.get(&id).await {
        Ok(record) => json_response(StatusCode::OK, record),
        Err(err) => sim_error_response(&err),
    }
}

async fn advance_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    apply_locked(&state, &id, advance_month).await
}

async fn decision_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(decision): Json<Decision>,
) -> Response {
    apply_locked(&state, &id, |record, config| apply_decision(record, &decision, config)).await
}

async fn resolve_event_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ResolveEventPayload>,
) -> Response {
    apply_locked(&state, &id, |record, config| resolve_event(record, payload.choice, config)).await
}

async fn venture_decision_handler(
    State(state): State<AppState>,
    Path((id, decision_id)): Path<(String, u64)>,
) -> Response {
    apply_locked(&state, &id, |record, _| apply_venture_decision(record, decision_id)).await
}

async fn venture_settings_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(settings): Json<VentureSettings>,
) -> Response {
    apply_locked(&state, &id, |record, _| adjust_venture(record, &settings)).await
}

async fn hire_handler(
    State(state): State<AppState>,
    Path((id, candidate_id)): Path<(String, u64)>,
) -> Response {
    apply_locked(&state, &id, |record, config| hire_candidate(record, candidate_id, config)).await
}

async fn fire_handler(
    State(state): State<AppState>,
    Path((id, employee_id)): Path<(String, u64)>,
) -> Response {
    apply_locked(&state, &id, |record, config| fire_employee(record, employee_id, config)).await
}

async fn narrative_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let snapshot = match state.store.get(&id).await {
        Ok(record) => NarrativeSnapshot::from_record(&record),
        Err(err) => return sim_error_response(&err),
    };
    json_response(StatusCode::OK, narrate(state.narrator.clone(), snapshot).await)
}

/// Asks the narrator off the async runtime, bounded by a timeout. Any
/// failure falls back to the local template.
async fn narrate(narrator: Arc<dyn Narrator>, snapshot: NarrativeSnapshot) -> NarrativeResponse {
    let request = snapshot.clone();
    let task = tokio::task::spawn_blocking(move || narrator.narrate(&request));
    let failure = match tokio::time::timeout(NARRATIVE_TIMEOUT, task).await {
        Ok(Ok(Ok(text))) => {
            return NarrativeResponse {
                text,
                source: NarrativeSource::Service,
            };
        }
        Ok(Ok(Err(err))) => err.to_string(),
        Ok(Err(join)) => join.to_string(),
        Err(_) => "timed out".to_string(),
    };
    warn!(target: "api", reason = %failure, "narrative fell back to template");
    NarrativeResponse {
        text: fallback_narrative(&snapshot),
        source: NarrativeSource::Fallback,
    }
}

async fn leaderboard_handler(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    json_response(StatusCode::OK, state.leaderboard.top(limit))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn sim_error_status(err: &SimError) -> StatusCode {
    match err {
        SimError::UnknownRecord(_) => StatusCode::NOT_FOUND,
        SimError::Terminal { .. } => StatusCode::CONFLICT,
        SimError::InvalidSetup(_) => StatusCode::BAD_REQUEST,
    }
}

fn sim_error_response(err: &SimError) -> Response {
    error_response(sim_error_status(err), &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LifeStatus, NarrativeError, OutcomeStatus};
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    async fn created(state: &AppState) -> String {
        let response = create_record_handler(State(state.clone()), Json(NewPlayer::default())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        body["id"].as_str().expect("id").to_string()
    }

    struct Failing;

    impl Narrator for Failing {
        fn narrate(&self, _snapshot: &NarrativeSnapshot) -> Result<String, NarrativeError> {
            Err(NarrativeError::Failed("503".to_string()))
        }
    }

    struct Fixed;

    impl Narrator for Fixed {
        fn narrate(&self, snapshot: &NarrativeSnapshot) -> Result<String, NarrativeError> {
            Ok(format!("{} keeps going.", snapshot.name))
        }
    }

    #[test]
    fn cli_parses_both_subcommands() {
        let cli = Cli::try_parse_from(["lifepath", "serve", "--port", "9000"]).expect("parses");
        assert!(matches!(cli.command, Command::Serve { port: 9000, balance: None }));
        let cli = Cli::try_parse_from([
            "lifepath", "simulate", "--name", "Sam", "--age", "30", "--seed", "7", "--months", "24",
        ])
        .expect("parses");
        match cli.command {
            Command::Simulate { name, age, seed, months, .. } => {
                assert_eq!((name.as_str(), age, seed, months), ("Sam", 30, 7, 24));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn sim_errors_map_to_statuses() {
        assert_eq!(
            sim_error_status(&SimError::UnknownRecord("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            sim_error_status(&SimError::Terminal {
                id: "x".to_string(),
                status: LifeStatus::Deceased
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn simulate_emits_one_line_per_month() {
        let player = NewPlayer {
            seed: 3,
            ..NewPlayer::default()
        };
        let lines = simulate_lines(player, 6, &BalanceConfig::default()).expect("runs");
        assert_eq!(lines.len(), 6);
        let last: Value = serde_json::from_str(&lines[5]).expect("json");
        assert_eq!(last["month"], 7);
    }

    #[test]
    fn simulate_stops_at_terminal_age_and_reports_score() {
        let player = NewPlayer {
            age: 74,
            ..NewPlayer::default()
        };
        let lines = simulate_lines(player, 24, &BalanceConfig::default()).expect("runs");
        assert!(lines.len() <= 13);
        let entry: Value = serde_json::from_str(lines.last().expect("lines")).expect("json");
        assert!(entry["grade"].is_string());
        assert_ne!(entry["status"], "active");
    }

    #[tokio::test]
    async fn advance_and_reject_unknown_record() {
        let state = AppState::new(BalanceConfig::default());
        let id = created(&state).await;
        let response = advance_handler(State(state.clone()), Path(id.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let body = body_json(response).await;
        assert_eq!(body["summary"]["month"], 2);
        assert_eq!(state.store.get(&id).await.expect("stored").month, 2);

        let missing = advance_handler(State(state), Path("nope".to_string())).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert!(body_json(missing).await["error"].is_string());
    }

    #[tokio::test]
    async fn rejected_decision_is_ok_with_status_field() {
        let state = AppState::new(BalanceConfig::default());
        let id = created(&state).await;
        let decision = Decision::PayDebt {
            category: crate::core::DebtCategory::CreditCard,
            amount: 1_000_000.0,
        };
        let response = decision_handler(State(state.clone()), Path(id.clone()), Json(decision)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "rejected");
        let outcome: ActionOutcome = serde_json::from_value(body).expect("outcome");
        assert_eq!(outcome.status, OutcomeStatus::Rejected);
    }

    #[tokio::test]
    async fn terminal_record_is_archived_and_then_conflicts() {
        let state = AppState::new(BalanceConfig::default());
        let player = NewPlayer {
            age: 74,
            ..NewPlayer::default()
        };
        let response = create_record_handler(State(state.clone()), Json(player)).await;
        let id = body_json(response).await["id"].as_str().expect("id").to_string();
        for _ in 0..12 {
            let response = advance_handler(State(state.clone()), Path(id.clone())).await;
            if response.status() == StatusCode::CONFLICT {
                break;
            }
            assert_eq!(response.status(), StatusCode::OK);
        }
        let last = advance_handler(State(state.clone()), Path(id.clone())).await;
        assert_eq!(last.status(), StatusCode::CONFLICT);
        let board = state.leaderboard.top(10);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].id, id);
    }

    #[tokio::test]
    async fn narrative_falls_back_when_service_fails() {
        let state = AppState::with_collaborators(
            BalanceConfig::default(),
            Arc::new(Failing),
            Arc::new(InMemoryLeaderboard::default()),
        );
        let id = created(&state).await;
        let body = body_json(narrative_handler(State(state), Path(id)).await).await;
        assert_eq!(body["source"], "fallback");
        assert!(body["text"].as_str().expect("text").starts_with("Player, age 22"));

        let state = AppState::with_collaborators(
            BalanceConfig::default(),
            Arc::new(Fixed),
            Arc::new(InMemoryLeaderboard::default()),
        );
        let id = created(&state).await;
        let body = body_json(narrative_handler(State(state), Path(id)).await).await;
        assert_eq!(body["source"], "service");
        assert_eq!(body["text"], "Player keeps going.");
    }
}
