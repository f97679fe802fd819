use crate::api::constants::entity_sets;
use crate::api::pretty_json;
use crate::cli::AppContext;
use crate::cli::ui::with_spinner;
use anyhow::Result;
use clap::{Args, ValueEnum};
use std::process::ExitCode;

#[derive(Args)]
pub struct GetArgs {
    /// Record type
    #[arg(value_enum)]
    pub entity: EntityKind,
    /// Record GUID
    pub id: String,
    /// OData $expand expression, e.g. "parentaccountid($select=name)"
    #[arg(long)]
    pub expand: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Account,
    Opportunity,
    Contact,
    Lead,
}

impl EntityKind {
    pub fn entity_set(self) -> &'static str {
        match self {
            EntityKind::Account => entity_sets::ACCOUNTS,
            EntityKind::Opportunity => entity_sets::OPPORTUNITIES,
            EntityKind::Contact => entity_sets::CONTACTS,
            EntityKind::Lead => entity_sets::LEADS,
        }
    }
}

pub async fn get_command(args: GetArgs, ctx: &AppContext) -> Result<ExitCode> {
    let id = crate::api::parse_guid(&args.id, "Record ID")?;
    ctx.ensure_signed_in().await?;

    let record = with_spinner(
        format!("Fetching {} {}...", args.entity.entity_set(), id),
        ctx.client
            .get_by_id_with_expand(args.entity.entity_set(), &id, args.expand.as_deref()),
    )
    .await?;

    println!("{}", pretty_json(&record)?);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_sets() {
        assert_eq!(EntityKind::Account.entity_set(), "accounts");
        assert_eq!(EntityKind::Opportunity.entity_set(), "opportunities");
        assert_eq!(EntityKind::Contact.entity_set(), "contacts");
        assert_eq!(EntityKind::Lead.entity_set(), "leads");
    }
}
