//! Account lookup commands

use super::{print_json, required_text};
use crate::api::{Account, AccountsApi, NameMatch};
use crate::cli::AppContext;
use crate::cli::ui::with_spinner;
use crate::ui::table::Table;
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::process::ExitCode;

#[derive(Args)]
pub struct AccountCommands {
    #[command(subcommand)]
    pub command: AccountSubcommands,
}

#[derive(Subcommand)]
pub enum AccountSubcommands {
    /// Search accounts by name
    Search {
        /// Account name to search for
        #[arg(short, long)]
        name: Option<String>,
        /// Maximum number of results (defaults to settings.account_search_top)
        #[arg(short, long)]
        top: Option<u32>,
        /// Match anywhere in the name instead of the start
        #[arg(short, long)]
        contains: bool,
        /// Print raw JSON
        #[arg(short, long)]
        json: bool,
    },
}

pub async fn account_command(cmd: AccountCommands, ctx: &AppContext) -> Result<ExitCode> {
    match cmd.command {
        AccountSubcommands::Search {
            name,
            top,
            contains,
            json,
        } => {
            let name = required_text(name.as_deref(), "--name")?;
            let top = top.unwrap_or(ctx.config.settings.account_search_top);
            search(ctx, name, top, NameMatch::from_contains_flag(contains), json).await
        }
    }
}

async fn search(
    ctx: &AppContext,
    name: &str,
    top: u32,
    mode: NameMatch,
    json: bool,
) -> Result<ExitCode> {
    ctx.ensure_signed_in().await?;

    let accounts = with_spinner(
        format!("Searching accounts {} '{}'...", mode.describe(), name),
        AccountsApi::new(&ctx.client).search_by_name(name, top, mode),
    )
    .await?;

    if json {
        print_json(&accounts.value)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!();
    println!("{}", format!("Search results for accounts {} '{}':", mode.describe(), name).green());
    println!();

    if accounts.is_empty() {
        println!("{}", format!("No accounts found {} '{}'", mode.describe(), name).yellow());
        return Ok(ExitCode::SUCCESS);
    }

    print!("{}", accounts_table(&accounts.value).render());
    println!();
    println!("{}", format!("Total results: {}", accounts.len()).dimmed());
    Ok(ExitCode::SUCCESS)
}

pub fn accounts_table(accounts: &[Account]) -> Table {
    let mut table = Table::new(&["Account Name", "Owner", "Account ID"]);
    for account in accounts {
        table.add_row(vec![
            account.name.clone(),
            account.owner_name.clone(),
            account.account_id.clone(),
        ]);
    }
    table
}
