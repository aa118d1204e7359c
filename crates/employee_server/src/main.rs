//! Employee directory server entry point.

use std::process::ExitCode;

use employee_core::init_logging;
use employee_server::{config::Config, error::ServerError, start_server};
use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=server_exit module=http status=error error={err}");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ServerError> {
    let config = Config::load()?;
    init_logging(&config.log_level, config.log_dir.as_deref()).map_err(ServerError::Logging)?;
    info!(
        "event=config_loaded module=http status=ok db_path={} static_dir={} store_timeout_s={}",
        config.db_path.display(),
        config.static_dir.display(),
        config.store_timeout.as_secs()
    );

    start_server(config).await
}
