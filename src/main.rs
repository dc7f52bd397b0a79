use std::io;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;
use tokio::net::TcpListener;

use pow_ledger::api::{self, AppState};
use pow_ledger::config::Config;
use pow_ledger::dispatch::Dispatcher;
use pow_ledger::session;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();
    let config = Config::from_env();

    println!("⛓️ Blockchain server running");

    let boot_config = config.clone();
    let dispatcher = web::block(move || {
        Dispatcher::boot(boot_config.genesis_difficulty, boot_config.benchmark_rounds)
    })
    .await
    .map_err(io::Error::other)?;
    let dispatcher = Arc::new(dispatcher);

    let listener = TcpListener::bind(config.session_addr()).await?;
    let sessions = session::serve(listener, Arc::clone(&dispatcher));

    info!("HTTP API at http://{}:{}/api/v1", config.host, config.port);
    let state = web::Data::new(AppState::new(dispatcher));
    let http = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    tokio::try_join!(http, sessions)?;
    Ok(())
}
