use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::DispatchError;
use crate::ledger::MAX_DIFFICULTY;

/// The closed set of operations, tagged by their wire number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Operation {
    Status = 0,
    Append = 1,
    Validate = 2,
    Dump = 3,
    Corrupt = 4,
    Repair = 5,
    Disconnect = 6,
}

/// The `type` field of a wire request. Integers outside the known set are
/// kept so they can be refused as an invalid option rather than as a
/// malformed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationTag {
    Known(Operation),
    Unknown(i64),
}

/// A request exactly as it travels over the wire. Fields a given operation
/// does not use are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRequest {
    #[serde(rename = "type")]
    pub operation: OperationTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<i64>,
    #[serde(default, alias = "payload", skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
}

impl WireRequest {
    /// A request for `operation` with no arguments.
    pub const fn new(operation: Operation) -> Self {
        Self {
            operation: OperationTag::Known(operation),
            difficulty: None,
            data: None,
            index: None,
        }
    }
}

/// A checked request, ready to run against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Status,
    Append { difficulty: u32, payload: String },
    Validate,
    Dump,
    Corrupt { index: usize, payload: String },
    Repair,
    Disconnect,
}

impl Request {
    /// Parse one JSON document into a checked request.
    pub fn decode(raw: &str) -> Result<Self, DispatchError> {
        let wire: WireRequest = serde_json::from_str(raw).map_err(DispatchError::Malformed)?;
        Self::try_from(wire)
    }

    pub fn encode(&self) -> Result<String, DispatchError> {
        serde_json::to_string(&WireRequest::from(self.clone())).map_err(DispatchError::Encode)
    }

    pub fn operation(&self) -> Operation {
        match self {
            Request::Status => Operation::Status,
            Request::Append { .. } => Operation::Append,
            Request::Validate => Operation::Validate,
            Request::Dump => Operation::Dump,
            Request::Corrupt { .. } => Operation::Corrupt,
            Request::Repair => Operation::Repair,
            Request::Disconnect => Operation::Disconnect,
        }
    }
}

impl TryFrom<WireRequest> for Request {
    type Error = DispatchError;

    fn try_from(wire: WireRequest) -> Result<Self, Self::Error> {
        let operation = match wire.operation {
            OperationTag::Known(operation) => operation,
            OperationTag::Unknown(tag) => return Err(DispatchError::InvalidOption(tag)),
        };
        let request = match operation {
            Operation::Status => Request::Status,
            Operation::Append => {
                let difficulty = wire
                    .difficulty
                    .and_then(|d| u32::try_from(d).ok())
                    .filter(|d| (1..=MAX_DIFFICULTY).contains(d))
                    .ok_or(DispatchError::InvalidParams)?;
                let payload = wire.data.ok_or(DispatchError::InvalidParams)?;
                Request::Append {
                    difficulty,
                    payload,
                }
            }
            Operation::Validate => Request::Validate,
            Operation::Dump => Request::Dump,
            Operation::Corrupt => {
                let index = wire
                    .index
                    .and_then(|i| usize::try_from(i).ok())
                    .ok_or(DispatchError::InvalidParams)?;
                let payload = wire.data.ok_or(DispatchError::InvalidParams)?;
                Request::Corrupt { index, payload }
            }
            Operation::Repair => Request::Repair,
            Operation::Disconnect => Request::Disconnect,
        };
        Ok(request)
    }
}

impl From<Request> for WireRequest {
    fn from(request: Request) -> Self {
        let mut wire = WireRequest::new(request.operation());
        match request {
            Request::Append {
                difficulty,
                payload,
            } => {
                wire.difficulty = Some(i64::from(difficulty));
                wire.data = Some(payload);
            }
            Request::Corrupt { index, payload } => {
                wire.index = i64::try_from(index).ok();
                wire.data = Some(payload);
            }
            _ => {}
        }
        wire
    }
}
