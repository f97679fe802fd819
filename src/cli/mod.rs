pub mod app;
pub mod commands;
pub mod context;
pub mod ui;

pub use app::{Cli, Commands};
pub use context::AppContext;

use anyhow::Result;
use std::process::ExitCode;

pub async fn dispatch(command: Commands, ctx: &AppContext) -> Result<ExitCode> {
    match command {
        Commands::Account(cmd) => commands::account_command(cmd, ctx).await,
        Commands::Opportunity(cmd) => commands::opportunity_command(cmd, ctx).await,
        Commands::Get(args) => commands::get_command(args, ctx).await,
        Commands::Auth(cmd) => commands::auth_command(cmd, ctx).await,
    }
}
