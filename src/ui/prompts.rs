use crate::api::Account;
use anyhow::{Result, bail};
use dialoguer::Select;
use is_terminal::IsTerminal;

const PAGE_SIZE: usize = 10;

/// Let the user pick one of several same-named accounts.
/// Accounts without an id are not offered.
pub fn select_account(accounts: &[Account]) -> Result<&Account> {
    let candidates: Vec<&Account> = accounts
        .iter()
        .filter(|a| a.account_id.as_deref().is_some_and(|id| !id.trim().is_empty()))
        .collect();

    match candidates.as_slice() {
        [] => bail!("None of the matching accounts has an id"),
        [only] => return Ok(*only),
        _ => {}
    }

    if !std::io::stdin().is_terminal() {
        bail!(
            "{} accounts match; refine the name or use 'opportunity by-account <ACCOUNT_ID>'",
            candidates.len()
        );
    }

    let labels: Vec<String> = candidates.iter().map(|a| a.display_label()).collect();
    let selection = Select::new()
        .with_prompt("Select an account")
        .items(&labels)
        .default(0)
        .max_length(PAGE_SIZE)
        .interact()?;

    Ok(candidates[selection])
}

/// Interactive confirmation prompt using arrow-key navigable selection
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let default_index = if default_yes { 0 } else { 1 };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(selection == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str, id: Option<&str>) -> Account {
        Account {
            name: Some(name.to_string()),
            account_id: id.map(str::to_string),
            ..Account::default()
        }
    }

    #[test]
    fn test_single_candidate_needs_no_prompt() {
        let accounts = vec![account("No id", None), account("Contoso", Some("abc"))];
        let chosen = select_account(&accounts).unwrap();
        assert_eq!(chosen.name.as_deref(), Some("Contoso"));
    }

    #[test]
    fn test_no_candidates_is_error() {
        let accounts = vec![account("No id", None), account("Blank", Some("  "))];
        assert!(select_account(&accounts).is_err());
    }
}
