use log::*;
use service::{config::Config, logging::Logger};
use std::process::ExitCode;
use web::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::new();

    if let Err(err) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {err}");
        return ExitCode::FAILURE;
    }

    info!(
        "Starting DingTalk broker ({}) in {} mode",
        config.provider_alias(),
        config.runtime_env()
    );

    let app_state = match AppState::new(config) {
        Ok(app_state) => app_state,
        Err(err) => {
            error!("Failed to configure the DingTalk provider: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = web::init_server(app_state).await {
        error!("Server exited with error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
