//! Sign-in and token cache commands

use crate::auth::CachedAccount;
use crate::cli::AppContext;
use crate::ui::prompts::prompt_confirmation;
use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use colored::Colorize;
use is_terminal::IsTerminal;
use std::process::ExitCode;

#[derive(Args)]
pub struct AuthCommands {
    #[command(subcommand)]
    pub command: AuthSubcommands,
}

#[derive(Subcommand)]
pub enum AuthSubcommands {
    /// Acquire a token, signing in through the browser if needed
    Login,
    /// Remove every cached account and the cache file
    Logout {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show cached accounts and token expiry
    Status,
}

pub async fn auth_command(cmd: AuthCommands, ctx: &AppContext) -> Result<ExitCode> {
    match cmd.command {
        AuthSubcommands::Login => login(ctx).await,
        AuthSubcommands::Logout { yes } => logout(ctx, yes).await,
        AuthSubcommands::Status => status(ctx).await,
    }
}

async fn login(ctx: &AppContext) -> Result<ExitCode> {
    let token = ctx.ensure_signed_in().await?;
    println!(
        "{} Signed in as {} ({}, expires {})",
        "✓".green().bold(),
        token.username.bold(),
        token.origin,
        token.expires_on.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(ExitCode::SUCCESS)
}

async fn logout(ctx: &AppContext, yes: bool) -> Result<ExitCode> {
    if !yes
        && std::io::stdin().is_terminal()
        && !prompt_confirmation("Remove all cached accounts?", false)?
    {
        println!("Cancelled");
        return Ok(ExitCode::SUCCESS);
    }

    let removed = ctx.provider.invalidate_cache().await?;
    println!("{} Token cache cleared ({} account(s) removed)", "✓".green().bold(), removed);
    Ok(ExitCode::SUCCESS)
}

async fn status(ctx: &AppContext) -> Result<ExitCode> {
    println!("{}", "Authentication Status".bold());
    println!("  Mode:  {:?}", ctx.provider.mode());
    println!("  Cache: {}", ctx.provider.cache().path().display());
    println!();

    let accounts = ctx.provider.cache_status().await?;
    if accounts.is_empty() {
        println!("{}", "No cached accounts. Run 'dynamics-crm auth login' to sign in.".yellow());
        return Ok(ExitCode::SUCCESS);
    }

    for account in &accounts {
        println!("  {}", describe_account(account));
    }
    Ok(ExitCode::SUCCESS)
}

fn describe_account(account: &CachedAccount) -> String {
    let expiry = if account.is_expired_at(Utc::now()) {
        if account.refresh_token.is_some() {
            "expired, refreshable".yellow().to_string()
        } else {
            "expired".red().to_string()
        }
    } else {
        format!("valid until {}", account.expires_on.format("%Y-%m-%d %H:%M UTC"))
            .green()
            .to_string()
    };
    format!("{} [{}] {}", account.username.bold(), account.scope, expiry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn account(expires_in: Duration, refresh: bool) -> CachedAccount {
        CachedAccount {
            home_account_id: "oid.tid".to_string(),
            username: "jane@contoso.com".to_string(),
            tenant_id: "tid".to_string(),
            client_id: "cid".to_string(),
            scope: "https://org.crm.dynamics.com/user_impersonation".to_string(),
            access_token: "secret".to_string(),
            refresh_token: refresh.then(|| "refresh".to_string()),
            expires_on: Utc::now() + expires_in,
        }
    }

    #[test]
    fn test_describe_account_expiry() {
        colored::control::set_override(false);

        assert!(describe_account(&account(Duration::hours(1), false)).contains("valid until"));
        assert!(describe_account(&account(Duration::minutes(-1), true)).ends_with("expired, refreshable"));
        assert!(describe_account(&account(Duration::minutes(-1), false)).ends_with("expired"));
        assert!(!describe_account(&account(Duration::hours(1), false)).contains("secret"));
    }
}
