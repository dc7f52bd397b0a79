use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use log::{debug, info, warn};

use super::{ChainDump, DispatchError, Request, Response};
use crate::ledger::{Block, Ledger};

/// What the transport should do after a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Respond(Response),
    Disconnect,
}

impl Reply {
    /// Collapse into an envelope for transports without sessions.
    pub fn into_response(self) -> Response {
        match self {
            Reply::Respond(response) => response,
            Reply::Disconnect => Response::success("Session closed", 0),
        }
    }
}

/// Owns the ledger and runs requests against it one at a time.
#[derive(Debug)]
pub struct Dispatcher {
    ledger: Mutex<Ledger>,
}

impl Dispatcher {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
        }
    }

    /// Mine the genesis block and measure this machine's hash rate.
    pub fn boot(genesis_difficulty: u32, benchmark_rounds: u64) -> Self {
        let mut ledger = Ledger::with_genesis(genesis_difficulty);
        info!(
            "LEDGER - genesis mined (difficulty={}, hash={})",
            genesis_difficulty,
            ledger.chain_hash()
        );
        let rate = ledger.benchmark_hash_rate(benchmark_rounds);
        info!("LEDGER - benchmark: ~{rate} hashes/sec over {benchmark_rounds} digests");
        Self::new(ledger)
    }

    /// Decode and run one raw request.
    pub fn handle_raw(&self, raw: &str) -> Reply {
        match Request::decode(raw) {
            Ok(request) => self.handle(request),
            Err(err) => {
                warn!("rejected request {raw:?}: {err}");
                Reply::Respond(err.into())
            }
        }
    }

    pub fn handle(&self, request: Request) -> Reply {
        debug!("request: {request:?}");
        if request == Request::Disconnect {
            info!("Visitor exit");
            return Reply::Disconnect;
        }
        let operation = request.operation();
        let response = match self.execute(request) {
            Ok(response) => response,
            Err(err) => {
                warn!("{operation:?} refused: {err}");
                Response::from(err)
            }
        };
        debug!("response: {response:?}");
        Reply::Respond(response)
    }

    /// Run `f` with shared access to the ledger.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&Ledger) -> R) -> Result<R, DispatchError> {
        let ledger = self.lock()?;
        Ok(f(&ledger))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>, DispatchError> {
        self.ledger.lock().map_err(|_| DispatchError::Unavailable)
    }

    fn execute(&self, request: Request) -> Result<Response, DispatchError> {
        let mut ledger = self.lock()?;
        match request {
            Request::Status => Ok(Response::success(ledger.to_string(), 0)),

            Request::Append {
                difficulty,
                payload,
            } => {
                let start = Instant::now();
                let index = ledger.len() as u64;
                let block = ledger.append(Block::new(index, payload, difficulty));
                let millis = elapsed_millis(start);
                info!(
                    "LEDGER - sealed block #{} (nonce={}, difficulty={}) in {millis} ms",
                    block.index, block.nonce, block.difficulty
                );
                Ok(Response::success(
                    format!("Total execution time to add this block was {millis} milliseconds"),
                    millis,
                ))
            }

            Request::Validate => {
                let start = Instant::now();
                let verdict = ledger.validate();
                let millis = elapsed_millis(start);
                info!("LEDGER - verified {} blocks: {:?}", ledger.len(), verdict);
                Ok(Response::success(
                    format!(
                        "Chain verification: {verdict}\n\
                         Total execution time to verify the chain was {millis} milliseconds"
                    ),
                    millis,
                ))
            }

            Request::Dump => {
                let dump = ChainDump::from(&*ledger);
                let body = serde_json::to_string(&dump).map_err(DispatchError::Encode)?;
                Ok(Response::success(body, 0))
            }

            Request::Corrupt { index, payload } => {
                let current = ledger.block(index).ok_or(DispatchError::InvalidParams)?;
                if current.payload == payload {
                    return Err(DispatchError::UnchangedPayload);
                }
                ledger.overwrite_payload(index, payload.as_str());
                warn!("LEDGER - block {index} payload overwritten without re-mining");
                Ok(Response::success(
                    format!("Block {index} now holds {payload}"),
                    0,
                ))
            }

            Request::Repair => {
                let start = Instant::now();
                ledger.repair();
                let millis = elapsed_millis(start);
                info!("LEDGER - re-mined {} blocks in {millis} ms", ledger.len());
                Ok(Response::success(
                    format!(
                        "Total execution time required to repair the chain was {millis} milliseconds"
                    ),
                    millis,
                ))
            }

            Request::Disconnect => Ok(Reply::Disconnect.into_response()),
        }
    }
}

fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{Dispatcher, Reply};
    use crate::dispatch::{ChainDump, Request, Response};
    use crate::ledger::Ledger;

    fn dispatcher() -> Dispatcher {
        let mut ledger = Ledger::with_genesis(2);
        ledger.add_block("A", 2);
        ledger.add_block("B", 2);
        Dispatcher::new(ledger)
    }

    fn respond(d: &Dispatcher, request: Request) -> Response {
        match d.handle(request) {
            Reply::Respond(response) => response,
            Reply::Disconnect => panic!("unexpected disconnect"),
        }
    }

    fn corrupt(index: usize, payload: &str) -> Request {
        Request::Corrupt {
            index,
            payload: payload.into(),
        }
    }

    #[test]
    fn status_reports_chain_summary() {
        let d = dispatcher();
        let resp = respond(&d, Request::Status);
        assert!(resp.success);
        assert!(resp.message().starts_with("Current size of chain: 3"));
    }

    #[test]
    fn append_grows_the_chain() {
        let d = dispatcher();
        let resp = respond(
            &d,
            Request::Append {
                difficulty: 1,
                payload: "C".into(),
            },
        );
        assert!(resp.success);
        assert!(resp.message().starts_with("Total execution time to add this block was"));
        assert_eq!(d.with_ledger(Ledger::len).unwrap(), 4);
        assert_eq!(d.with_ledger(Ledger::total_difficulty).unwrap(), 7);
    }

    #[test]
    fn corrupt_validate_repair_scenario() {
        let d = dispatcher();

        let resp = respond(&d, corrupt(1, "A2"));
        assert!(resp.success);
        assert_eq!(resp.message(), "Block 1 now holds A2");

        let resp = respond(&d, Request::Validate);
        assert!(resp.success);
        assert!(resp.message().starts_with(
            "Chain verification: FALSE\nBlock 2 previous hash does not match hash of parent"
        ));

        assert!(respond(&d, Request::Repair).success);

        let resp = respond(&d, Request::Validate);
        assert!(resp.message().starts_with("Chain verification: TRUE\n"));
    }

    #[test]
    fn corrupt_rejects_bad_input_without_mutating() {
        let d = dispatcher();
        let before = d.with_ledger(|l| l.chain_hash().to_string()).unwrap();

        let resp = respond(&d, corrupt(3, "x"));
        assert!(!resp.success);
        assert_eq!(resp.message(), "Invalid params");
        assert_eq!(resp.data, None);

        let resp = respond(&d, corrupt(1, "A"));
        assert_eq!(resp.error_message.as_deref(), Some("New data is equal to old"));

        let verdict = d.with_ledger(Ledger::validate).unwrap();
        assert!(verdict.is_valid());
        assert_eq!(d.with_ledger(|l| l.chain_hash().to_string()).unwrap(), before);
    }

    #[test]
    fn dump_lists_blocks_in_order() {
        let d = dispatcher();
        let resp = respond(&d, Request::Dump);
        let dump: ChainDump = serde_json::from_str(resp.message()).unwrap();
        assert_eq!(dump.chain.len(), 3);
        assert_eq!(dump.chain[0].previous_hash, "");
        assert_eq!(dump.chain[1].transaction, "A");
        assert_eq!(dump.chain[2].transaction, "B");
        assert_eq!(dump.chain_hash, d.with_ledger(|l| l.chain_hash().to_string()).unwrap());
    }

    #[test]
    fn raw_requests_are_checked() {
        let d = dispatcher();
        let reply = d.handle_raw(r#"{"type":1,"difficulty":0,"data":"x"}"#);
        assert_eq!(
            reply,
            Reply::Respond(Response {
                success: false,
                data: None,
                execution_time_millis: 0,
                error_message: Some("Invalid params".into()),
            })
        );
        let reply = d.handle_raw("{oops");
        assert_eq!(reply.into_response().message(), "Invalid request");
        assert_eq!(d.handle_raw(r#"{"type":6}"#), Reply::Disconnect);
        assert_eq!(d.with_ledger(Ledger::len).unwrap(), 3);
    }

    #[test]
    fn boot_mines_genesis_and_benchmarks() {
        let d = Dispatcher::boot(1, 1_000);
        d.with_ledger(|l| {
            assert_eq!(l.len(), 1);
            assert!(l.validate().is_valid());
            assert!(l.hashes_per_second() > 0);
        })
        .unwrap();
    }
}
