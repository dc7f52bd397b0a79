use serde::{Deserialize, Serialize};

use super::DispatchError;
use crate::ledger::{Block, Ledger};

/// Envelope returned for every request. Exactly one of `data` and
/// `error_message` is set, depending on `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default)]
    pub execution_time_millis: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Response {
    pub fn success(data: impl Into<String>, execution_time_millis: u64) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            execution_time_millis,
            error_message: None,
        }
    }

    pub fn failure(error: &DispatchError) -> Self {
        Self {
            success: false,
            data: None,
            execution_time_millis: 0,
            error_message: Some(error.to_string()),
        }
    }

    /// The text an operator should see: the data on success, the error
    /// message otherwise.
    pub fn message(&self) -> &str {
        let text = if self.success {
            &self.data
        } else {
            &self.error_message
        };
        text.as_deref().unwrap_or_default()
    }
}

impl From<DispatchError> for Response {
    fn from(error: DispatchError) -> Self {
        Self::failure(&error)
    }
}

/// Serialized form of one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub index: u64,
    pub timestamp: String,
    pub transaction: String,
    pub previous_hash: String,
    pub nonce: String, // decimal, may exceed 64 bits
    pub difficulty: u32,
}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            timestamp: block.created.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            transaction: block.payload.clone(),
            previous_hash: block.previous_hash.clone(),
            nonce: block.nonce.to_string(),
            difficulty: block.difficulty,
        }
    }
}

/// Every block in order plus the ledger's chain hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDump {
    pub chain: Vec<BlockRecord>,
    pub chain_hash: String,
}

impl From<&Ledger> for ChainDump {
    fn from(ledger: &Ledger) -> Self {
        Self {
            chain: ledger.blocks().iter().map(BlockRecord::from).collect(),
            chain_hash: ledger.chain_hash().to_string(),
        }
    }
}
