//! Request/response contract between transports and the ledger.

pub mod dispatcher;
pub mod error;
pub mod request;
pub mod response;

pub use dispatcher::{Dispatcher, Reply};
pub use error::DispatchError;
pub use request::{Operation, OperationTag, Request, WireRequest};
pub use response::{BlockRecord, ChainDump, Response};
