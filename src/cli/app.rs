use super::commands::{AccountCommands, AuthCommands, GetArgs, OpportunityCommands};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dynamics-crm", version)]
#[command(about = "Search accounts and opportunities in Microsoft Dynamics 365 CRM")]
pub struct Cli {
    /// Print the sign-in URL instead of opening a browser
    #[arg(long, global = true)]
    pub no_browser: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Account lookups
    Account(AccountCommands),
    /// Opportunity lookups
    Opportunity(OpportunityCommands),
    /// Fetch a single record as JSON
    Get(GetArgs),
    /// Sign-in and token cache management
    Auth(AuthCommands),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{
        AccountSubcommands, AuthSubcommands, EntityKind, OpportunitySubcommands,
    };

    #[test]
    fn test_account_search_flags() {
        let cli = Cli::try_parse_from([
            "dynamics-crm", "account", "search", "-n", "Contoso", "-t", "5", "-c", "-j",
        ])
        .unwrap();

        match cli.command {
            Commands::Account(AccountCommands {
                command: AccountSubcommands::Search { name, top, contains, json },
            }) => {
                assert_eq!(name.as_deref(), Some("Contoso"));
                assert_eq!(top, Some(5));
                assert!(contains);
                assert!(json);
            }
            _ => panic!("expected account search"),
        }
    }

    #[test]
    fn test_by_account_name_short_c_means_include_closed() {
        let cli = Cli::try_parse_from([
            "dynamics-crm", "opportunity", "by-account-name", "Contoso", "-c", "--contains",
        ])
        .unwrap();

        match cli.command {
            Commands::Opportunity(OpportunityCommands {
                command: OpportunitySubcommands::ByAccountName { account_name, include_closed, contains, json },
            }) => {
                assert_eq!(account_name, "Contoso");
                assert!(include_closed);
                assert!(contains);
                assert!(!json);
            }
            _ => panic!("expected by-account-name"),
        }
    }

    #[test]
    fn test_get_with_expand_and_global_flag() {
        let cli = Cli::try_parse_from([
            "dynamics-crm",
            "get",
            "opportunity",
            "00000000-0000-0000-0000-000000000001",
            "--expand",
            "parentaccountid($select=name)",
            "--no-browser",
        ])
        .unwrap();

        assert!(cli.no_browser);
        match cli.command {
            Commands::Get(args) => {
                assert_eq!(args.entity, EntityKind::Opportunity);
                assert_eq!(args.expand.as_deref(), Some("parentaccountid($select=name)"));
            }
            _ => panic!("expected get"),
        }
    }

    #[test]
    fn test_logout_yes_flag() {
        let cli = Cli::try_parse_from(["dynamics-crm", "auth", "logout", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Auth(AuthCommands { command: AuthSubcommands::Logout { yes: true } })
        ));
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        assert!(Cli::try_parse_from(["dynamics-crm", "get", "invoice", "abc"]).is_err());
    }
}
