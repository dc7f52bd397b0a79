use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dispatch::Dispatcher;

/// Shared application state: the dispatcher that owns the ledger.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Deserialize)]
pub struct AppendBody {
    pub difficulty: Option<i64>,
    pub payload: Option<String>,
}

#[derive(Deserialize)]
pub struct CorruptBody {
    pub index: Option<i64>,
    pub payload: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub height: usize,
    pub tip_difficulty: Option<u32>,
    pub total_difficulty: u64,
    pub total_expected_hashes: u128,
    pub hashes_per_second: u64,
    pub chain_hash: String,
    pub valid: bool,
}
