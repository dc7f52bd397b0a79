//! Single-node Proof-of-Work ledger with operator-driven corruption and
//! repair, served over a TCP session protocol and an HTTP API.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod ledger;
pub mod session;
