mod chain;
mod health;
pub mod models;
mod stats;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_status)
            .service(chain::append_block)
            .service(chain::validate_chain)
            .service(chain::get_chain)
            .service(chain::corrupt_block)
            .service(chain::repair_chain)
            .service(chain::raw_request)
            .service(stats::get_stats),
    );
}
