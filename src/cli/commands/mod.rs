pub mod account;
pub mod auth;
pub mod get;
pub mod opportunity;

pub use account::{AccountCommands, AccountSubcommands, account_command};
pub use auth::{AuthCommands, AuthSubcommands, auth_command};
pub use get::{EntityKind, GetArgs, get_command};
pub use opportunity::{OpportunityCommands, OpportunitySubcommands, opportunity_command};

use anyhow::{Result, bail};
use serde::Serialize;

/// Trimmed value of a required text argument
fn required_text<'a>(value: Option<&'a str>, flag: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => bail!("{} parameter is required", flag),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text(Some("  Contoso "), "--name").unwrap(), "Contoso");

        let err = required_text(Some("   "), "--name").unwrap_err();
        assert_eq!(err.to_string(), "--name parameter is required");
        assert!(required_text(None, "--name").is_err());
    }
}
