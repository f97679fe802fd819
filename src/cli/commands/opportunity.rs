//! Opportunity lookup commands

use super::{print_json, required_text};
use crate::api::models::opportunity::shape_search_results;
use crate::api::{
    AccountsApi, NameMatch, OpportunitiesApi, OpportunitiesRequest, Opportunity, parse_guid,
};
use crate::cli::AppContext;
use crate::cli::ui::with_spinner;
use crate::ui::prompts::select_account;
use crate::ui::table::Table;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use log::info;
use std::process::ExitCode;

#[derive(Args)]
pub struct OpportunityCommands {
    #[command(subcommand)]
    pub command: OpportunitySubcommands,
}

#[derive(Subcommand)]
pub enum OpportunitySubcommands {
    /// Search opportunities by name, newest first
    Search {
        /// Opportunity name to search for
        #[arg(short, long)]
        name: Option<String>,
        /// Maximum number of results (defaults to settings.default_top)
        #[arg(short, long)]
        top: Option<u32>,
        /// Match anywhere in the name instead of the start
        #[arg(short, long)]
        contains: bool,
        /// Include won and lost opportunities
        #[arg(long)]
        include_closed: bool,
        /// Print raw JSON
        #[arg(short, long)]
        json: bool,
    },
    /// List the opportunities of an account by its id
    ByAccount {
        /// Account GUID
        account_id: String,
        /// Include won and lost opportunities
        #[arg(short = 'c', long)]
        include_closed: bool,
        /// Maximum number of results (defaults to settings.default_top)
        #[arg(short, long)]
        top: Option<u32>,
        /// Print raw JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Find an account by name, then list its opportunities
    ByAccountName {
        /// Account name to search for
        account_name: String,
        /// Include won and lost opportunities
        #[arg(short = 'c', long)]
        include_closed: bool,
        /// Match anywhere in the account name instead of the start
        #[arg(long)]
        contains: bool,
        /// Print raw JSON
        #[arg(short, long)]
        json: bool,
    },
}

pub async fn opportunity_command(cmd: OpportunityCommands, ctx: &AppContext) -> Result<ExitCode> {
    let default_top = ctx.config.settings.default_top;

    match cmd.command {
        OpportunitySubcommands::Search {
            name,
            top,
            contains,
            include_closed,
            json,
        } => {
            let name = required_text(name.as_deref(), "--name")?;
            let request = OpportunitiesRequest::default()
                .with_top(top.unwrap_or(default_top))
                .with_match_mode(NameMatch::from_contains_flag(contains))
                .including_closed(include_closed);
            search(ctx, name, &request, json).await
        }
        OpportunitySubcommands::ByAccount {
            account_id,
            include_closed,
            top,
            json,
        } => {
            let account_id = parse_guid(&account_id, "Account ID")?;
            let request = OpportunitiesRequest::default()
                .with_top(top.unwrap_or(default_top))
                .including_closed(include_closed);
            by_account(ctx, &account_id, &request, json).await
        }
        OpportunitySubcommands::ByAccountName {
            account_name,
            include_closed,
            contains,
            json,
        } => {
            let account_name = required_text(Some(account_name.as_str()), "ACCOUNT_NAME")?;
            let request = OpportunitiesRequest::default()
                .with_top(default_top)
                .with_match_mode(NameMatch::from_contains_flag(contains))
                .including_closed(include_closed);
            by_account_name(ctx, account_name, &request, json).await
        }
    }
}

async fn search(
    ctx: &AppContext,
    name: &str,
    request: &OpportunitiesRequest,
    json: bool,
) -> Result<ExitCode> {
    ctx.ensure_signed_in().await?;

    let mode = request.match_mode;
    let result = with_spinner(
        format!("Searching opportunities {} '{}'...", mode.describe(), name),
        OpportunitiesApi::new(&ctx.client).search_by_name(name, request),
    )
    .await?;
    let opportunities = shape_search_results(result.into_vec(), request.include_closed);

    if json {
        print_json(&opportunities)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!();
    println!(
        "{}",
        format!("Search results for opportunities {} '{}':", mode.describe(), name).green()
    );
    println!();

    if opportunities.is_empty() {
        println!("{}", format!("No opportunities found {} '{}'", mode.describe(), name).yellow());
        return Ok(ExitCode::SUCCESS);
    }

    print!("{}", opportunity_list_table(&opportunities).render());
    println!();
    println!("{}", format!("Total results: {}", opportunities.len()).dimmed());
    Ok(ExitCode::SUCCESS)
}

async fn by_account(
    ctx: &AppContext,
    account_id: &str,
    request: &OpportunitiesRequest,
    json: bool,
) -> Result<ExitCode> {
    ctx.ensure_signed_in().await?;

    let result = with_spinner(
        format!("Loading opportunities for account {}...", account_id),
        OpportunitiesApi::new(&ctx.client).get_by_account(account_id, request),
    )
    .await?;

    if json {
        print_json(&result.value)?;
        return Ok(ExitCode::SUCCESS);
    }

    if result.is_empty() {
        println!("{}", format!("No opportunities found for account {}", account_id).yellow());
        return Ok(ExitCode::SUCCESS);
    }

    println!();
    print!("{}", opportunity_detail_table(&result.value).render());
    println!();
    println!("{}", format!("Total results: {}", result.len()).dimmed());
    Ok(ExitCode::SUCCESS)
}

async fn by_account_name(
    ctx: &AppContext,
    account_name: &str,
    request: &OpportunitiesRequest,
    json: bool,
) -> Result<ExitCode> {
    ctx.ensure_signed_in().await?;

    let mode = request.match_mode;
    let accounts = with_spinner(
        format!("Looking up accounts {} '{}'...", mode.describe(), account_name),
        AccountsApi::new(&ctx.client).search_by_name(
            account_name,
            ctx.config.settings.account_search_top,
            mode,
        ),
    )
    .await?;

    if accounts.is_empty() {
        println!("{}", format!("No account found {} '{}'", mode.describe(), account_name).yellow());
        return Ok(ExitCode::FAILURE);
    }

    let account = select_account(&accounts.value)?;
    let account_id = account
        .account_id
        .as_deref()
        .context("Selected account has no id")?;
    let label = account.name.as_deref().unwrap_or(account_id);
    info!("Using account {} ({})", label, account_id);
    if !json {
        println!("Found account: {}", label.bold());
    }

    let result = with_spinner(
        format!("Loading opportunities for {}...", label),
        OpportunitiesApi::new(&ctx.client).get_by_account(account_id, request),
    )
    .await?;
    let opportunities = shape_search_results(result.into_vec(), request.include_closed);

    if json {
        print_json(&opportunities)?;
        return Ok(ExitCode::SUCCESS);
    }

    if opportunities.is_empty() {
        println!("{}", format!("No opportunities found for account '{}'", label).yellow());
        return Ok(ExitCode::SUCCESS);
    }

    println!();
    print!("{}", opportunity_detail_table(&opportunities).render());
    println!();
    println!("{}", format!("Total results: {}", opportunities.len()).dimmed());
    Ok(ExitCode::SUCCESS)
}

/// Short listing used for name searches
pub fn opportunity_list_table(opportunities: &[Opportunity]) -> Table {
    let mut table = Table::new(&[
        "Parent Account",
        "Name",
        "Created",
        "State",
        "Status",
        "Probability",
        "Owner",
    ]);
    for opp in opportunities {
        table.add_row(vec![
            opp.parent_account_name.clone(),
            opp.name.clone(),
            opp.created_date(),
            opp.state_label.clone(),
            opp.status_label.clone(),
            opp.probability_label.clone(),
            opp.owner_name.clone(),
        ]);
    }
    table
}

/// Full listing used when an account is known
pub fn opportunity_detail_table(opportunities: &[Opportunity]) -> Table {
    let mut table = Table::new(&[
        "Number",
        "Auto number",
        "Parent Account",
        "Name",
        "Created",
        "State",
        "Status",
        "Probability",
        "Owner",
        "Estimated Close Date",
    ]);
    for opp in opportunities {
        table.add_row(vec![
            opp.opportunity_number.clone(),
            opp.auto_number.clone(),
            opp.parent_account_name.clone(),
            opp.name.clone(),
            opp.created_date(),
            opp.state_label.clone(),
            opp.status_label.clone(),
            opp.probability_label.clone(),
            opp.owner_name.clone(),
            opp.estimated_close().map(|d| d.format("%Y-%m-%d").to_string()),
        ]);
    }
    table
}
