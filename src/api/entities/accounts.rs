use crate::api::DynamicsClient;
use crate::api::client::parse_guid;
use crate::api::constants::{entity_sets, navigation};
use crate::api::models::{Account, Opportunity};
use crate::api::query::{EntityCollection, Filter, NameMatch, Query, QueryBuilder};
use crate::error::Result;
use log::debug;
use serde_json::Value;

pub const DEFAULT_TOP: u32 = 20;

pub struct AccountsApi<'a> {
    client: &'a DynamicsClient,
}

impl<'a> AccountsApi<'a> {
    pub fn new(client: &'a DynamicsClient) -> Self {
        Self { client }
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Account> {
        let id = parse_guid(account_id, "Account ID")?;
        debug!("Getting account with ID: {}", id);
        self.client
            .get_entity(&Query::record(entity_sets::ACCOUNTS, id))
            .await
    }

    pub async fn get_accounts(&self, top: Option<u32>) -> Result<EntityCollection<Account>> {
        QueryBuilder::collection(entity_sets::ACCOUNTS)
            .top(top.unwrap_or(DEFAULT_TOP))
            .fetch(self.client)
            .await
    }

    pub async fn get_accounts_with_fields(
        &self,
        fields: &[&str],
        top: Option<u32>,
    ) -> Result<EntityCollection<Account>> {
        QueryBuilder::collection(entity_sets::ACCOUNTS)
            .select(fields)
            .top(top.unwrap_or(DEFAULT_TOP))
            .fetch(self.client)
            .await
    }

    pub async fn get_accounts_by_filter(
        &self,
        filter: Filter,
        top: Option<u32>,
    ) -> Result<EntityCollection<Account>> {
        QueryBuilder::collection(entity_sets::ACCOUNTS)
            .filter(filter)
            .top(top.unwrap_or(DEFAULT_TOP))
            .fetch(self.client)
            .await
    }

    pub async fn get_account_with_related(&self, account_id: &str, expand: &str) -> Result<Value> {
        self.client
            .get_by_id_with_expand(entity_sets::ACCOUNTS, account_id, Some(expand))
            .await
    }

    /// All opportunities whose customer is the account, unfiltered
    pub async fn get_opportunities(
        &self,
        account_id: &str,
        top: Option<u32>,
    ) -> Result<EntityCollection<Opportunity>> {
        self.client
            .get_related(
                entity_sets::ACCOUNTS,
                account_id,
                navigation::ACCOUNT_OPPORTUNITIES,
                top.unwrap_or(DEFAULT_TOP),
                None,
                None,
            )
            .await
    }

    /// Name search selecting the name and owner
    pub async fn search_by_name(
        &self,
        search: &str,
        top: u32,
        mode: NameMatch,
    ) -> Result<EntityCollection<Account>> {
        debug!("Searching accounts {} '{}', top {}", mode.describe(), search, top);
        self.client
            .search_by_name(entity_sets::ACCOUNTS, search, top, mode, Account::SEARCH_FIELDS)
            .await
    }
}
