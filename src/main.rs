use std::process::ExitCode;

use northwind_products_suite::{config::StubConfig, server, state::AppState, telemetry};
use tracing::{event, Level};

#[tokio::main]
async fn main() -> ExitCode {
    let config = StubConfig::from_env();

    if let Err(e) = telemetry::init_json_logging() {
        eprintln!("Failed to open log file: {}", e);
        return ExitCode::FAILURE;
    }

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            event!(Level::ERROR, "Failed to bind {}: {}", config.bind_addr, e);
            return ExitCode::FAILURE;
        }
    };

    event!(Level::INFO, "Stub Products API listening on {}", config.bind_addr);

    let shutdown = server::wait_for_signal(tokio::signal::ctrl_c());

    match server::serve(listener, AppState::seeded(), shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            event!(Level::ERROR, "Stub Products API stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}
