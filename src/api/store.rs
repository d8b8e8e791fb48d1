use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, RwLock};

use crate::core::{
    BalanceConfig, GameRecord, Leaderboard, LeaderboardEntry, NewPlayer, SimError, insert_ranked,
};

/// In-memory record store. Each record sits behind its own async mutex so a
/// tick or decision holds the record for the whole read-modify-write.
#[derive(Default)]
pub struct RecordStore {
    records: RwLock<HashMap<String, Arc<Mutex<GameRecord>>>>,
    next_id: AtomicU64,
}

impl RecordStore {
    pub async fn create(&self, player: NewPlayer, config: &BalanceConfig) -> Result<GameRecord, SimError> {
        let id = format!("life-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let record = GameRecord::new(id.clone(), player, config)?;
        self.records
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(record.clone())));
        Ok(record)
    }

    pub async fn handle(&self, id: &str) -> Result<Arc<Mutex<GameRecord>>, SimError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SimError::UnknownRecord(id.to_string()))
    }

    pub async fn get(&self, id: &str) -> Result<GameRecord, SimError> {
        let handle = self.handle(id).await?;
        let record = handle.lock().await;
        Ok(record.clone())
    }
}

/// Leaderboard kept in process memory, highest score first.
#[derive(Default)]
pub struct InMemoryLeaderboard {
    entries: StdMutex<Vec<LeaderboardEntry>>,
}

impl Leaderboard for InMemoryLeaderboard {
    fn submit(&self, entry: LeaderboardEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        insert_ranked(&mut entries, entry);
    }

    fn top(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().take(limit).cloned().collect()
    }
}
