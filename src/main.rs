use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use dynamics_crm::auth::Credentials;
use dynamics_crm::cli::{self, AppContext, Cli};
use dynamics_crm::config::Config;
use log::{error, info};
use std::process::ExitCode;

const LOG_FILE: &str = "dynamics-crm.log";

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("Warning: could not open {}: {}", LOG_FILE, e);
    }

    let cli = Cli::parse();
    info!("Starting dynamics-crm");

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("{}", format!("Error: {:#}", err).red());
            ExitCode::FAILURE
        }
    }
}

// Log to file (truncate on each run), level from RUST_LOG, default info
fn init_logging() -> std::io::Result<()> {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(LOG_FILE)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // .env may carry DYNAMICS_URL as well as the credentials
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    let credentials = Credentials::from_env()?;
    let ctx = AppContext::build(config, credentials, cli.no_browser)?;

    cli::dispatch(cli.command, &ctx).await
}
