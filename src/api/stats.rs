use std::sync::Arc;

use actix_web::{HttpResponse, Responder, get, web};
use log::warn;

use super::models::{AppState, StatsResponse};
use crate::dispatch::{DispatchError, Response};

/// Aggregate figures for the whole chain.
#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    // The ledger lock can be held for a whole mining search; wait for it
    // on the blocking pool, not on the worker.
    let dispatcher = Arc::clone(&state.dispatcher);
    let snapshot = web::block(move || {
        dispatcher.with_ledger(|ledger| StatsResponse {
            height: ledger.len(),
            tip_difficulty: ledger.tip().map(|b| b.difficulty),
            total_difficulty: ledger.total_difficulty(),
            total_expected_hashes: ledger.total_expected_hashes(),
            hashes_per_second: ledger.hashes_per_second(),
            chain_hash: ledger.chain_hash().to_string(),
            valid: ledger.validate().is_valid(),
        })
    })
    .await
    .unwrap_or_else(|err| {
        warn!("blocking pool failed: {err}");
        Err(DispatchError::Unavailable)
    });

    match snapshot {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(err) => {
            warn!("stats unavailable: {err}");
            HttpResponse::ServiceUnavailable().json(Response::from(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::{App, test, web};

    use crate::api::{AppState, init_routes, models::StatsResponse};
    use crate::dispatch::{Dispatcher, Request};
    use crate::ledger::Ledger;

    #[actix_web::test]
    async fn stats_waits_for_in_flight_append_off_the_worker() {
        let dispatcher = Arc::new(Dispatcher::new(Ledger::with_genesis(1)));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(Arc::clone(&dispatcher))))
                .configure(init_routes),
        )
        .await;

        let miner = Arc::clone(&dispatcher);
        let append = std::thread::spawn(move || {
            miner.handle(Request::Append {
                difficulty: 3,
                payload: "slow".into(),
            })
        });
        std::thread::sleep(Duration::from_millis(5));

        let req = test::TestRequest::get().uri("/api/v1/stats/").to_request();
        let stats: StatsResponse = test::call_and_read_body_json(&app, req).await;
        assert!(stats.valid);
        assert!(stats.height == 1 || stats.height == 2);

        append.join().unwrap();
        let req = test::TestRequest::get().uri("/api/v1/stats/").to_request();
        let stats: StatsResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats.height, 2);
        assert_eq!(stats.total_difficulty, 4);
    }
}
