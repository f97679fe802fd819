use crate::api::DynamicsClient;
use crate::api::client::parse_guid;
use crate::api::constants::{entity_sets, navigation};
use crate::api::models::Opportunity;
use crate::api::models::opportunity::sort_by_state_then_close_date;
use crate::api::query::{EntityCollection, Filter, NameMatch, OrderBy, Query, QueryBuilder};
use crate::error::{DynamicsError, Result};
use log::debug;
use serde_json::Value;

pub const DEFAULT_TOP: u32 = 20;

/// Options shared by name and account searches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpportunitiesRequest {
    pub top: u32,
    pub match_mode: NameMatch,
    pub include_closed: bool,
}

impl Default for OpportunitiesRequest {
    fn default() -> Self {
        Self {
            top: DEFAULT_TOP,
            match_mode: NameMatch::StartsWith,
            include_closed: false,
        }
    }
}

impl OpportunitiesRequest {
    pub fn with_top(mut self, top: u32) -> Self {
        self.top = top;
        self
    }

    pub fn with_match_mode(mut self, mode: NameMatch) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn including_closed(mut self, include_closed: bool) -> Self {
        self.include_closed = include_closed;
        self
    }

    fn state_filter(&self) -> Option<Filter> {
        (!self.include_closed).then(Filter::active)
    }
}

pub struct OpportunitiesApi<'a> {
    client: &'a DynamicsClient,
}

impl<'a> OpportunitiesApi<'a> {
    pub fn new(client: &'a DynamicsClient) -> Self {
        Self { client }
    }

    pub async fn get_opportunity(&self, opportunity_id: &str) -> Result<Opportunity> {
        let id = parse_guid(opportunity_id, "Opportunity ID")?;
        debug!("Getting opportunity with ID: {}", id);
        self.client
            .get_entity(&Query::record(entity_sets::OPPORTUNITIES, id))
            .await
    }

    pub async fn get_opportunity_with_related(
        &self,
        opportunity_id: &str,
        expand: &str,
    ) -> Result<Value> {
        self.client
            .get_by_id_with_expand(entity_sets::OPPORTUNITIES, opportunity_id, Some(expand))
            .await
    }

    pub async fn get_opportunities(
        &self,
        top: Option<u32>,
    ) -> Result<EntityCollection<Opportunity>> {
        QueryBuilder::collection(entity_sets::OPPORTUNITIES)
            .top(top.unwrap_or(DEFAULT_TOP))
            .fetch(self.client)
            .await
    }

    pub async fn get_opportunities_with_fields(
        &self,
        fields: &[&str],
        top: Option<u32>,
    ) -> Result<EntityCollection<Opportunity>> {
        QueryBuilder::collection(entity_sets::OPPORTUNITIES)
            .select(fields)
            .top(top.unwrap_or(DEFAULT_TOP))
            .fetch(self.client)
            .await
    }

    pub async fn get_opportunities_by_filter(
        &self,
        filter: Filter,
        top: Option<u32>,
    ) -> Result<EntityCollection<Opportunity>> {
        QueryBuilder::collection(entity_sets::OPPORTUNITIES)
            .filter(filter)
            .top(top.unwrap_or(DEFAULT_TOP))
            .fetch(self.client)
            .await
    }

    /// Newest first; open only unless the request includes closed records
    pub async fn search_by_name(
        &self,
        search: &str,
        request: &OpportunitiesRequest,
    ) -> Result<EntityCollection<Opportunity>> {
        let search = search.trim();
        if search.is_empty() {
            return Err(DynamicsError::validation("Opportunity name must not be empty"));
        }
        debug!(
            "Searching opportunities {} '{}', top {}, include closed: {}",
            request.match_mode.describe(),
            search,
            request.top,
            request.include_closed
        );

        QueryBuilder::collection(entity_sets::OPPORTUNITIES)
            .name_match("name", search, request.match_mode)
            .filter_opt(request.state_filter())
            .top(request.top)
            .newest_first()
            .fetch(self.client)
            .await
    }

    /// Opportunities of one account, sorted by state then close date
    pub async fn get_by_account(
        &self,
        account_id: &str,
        request: &OpportunitiesRequest,
    ) -> Result<EntityCollection<Opportunity>> {
        debug!(
            "Getting opportunities for account {}, top {}, include closed: {}",
            account_id, request.top, request.include_closed
        );
        let mut result = self
            .client
            .get_related(
                entity_sets::ACCOUNTS,
                account_id,
                navigation::ACCOUNT_OPPORTUNITIES,
                request.top,
                request.state_filter(),
                Some(OrderBy::desc("estimatedclosedate")),
            )
            .await?;

        sort_by_state_then_close_date(&mut result.value);
        Ok(result)
    }

    pub async fn get_by_contact(
        &self,
        contact_id: &str,
        top: Option<u32>,
    ) -> Result<EntityCollection<Opportunity>> {
        self.client
            .get_related(
                entity_sets::CONTACTS,
                contact_id,
                navigation::CONTACT_OPPORTUNITIES,
                top.unwrap_or(DEFAULT_TOP),
                None,
                None,
            )
            .await
    }

    /// 0 Qualify, 1 Develop, 2 Propose, 3 Close
    pub async fn get_by_sales_stage(
        &self,
        sales_stage: i32,
        top: Option<u32>,
    ) -> Result<EntityCollection<Opportunity>> {
        self.get_opportunities_by_filter(Filter::eq("salesstage", sales_stage), top)
            .await
    }

    pub async fn get_open(&self, top: Option<u32>) -> Result<EntityCollection<Opportunity>> {
        self.get_opportunities_by_filter(Filter::active(), top).await
    }

    pub async fn get_won(&self, top: Option<u32>) -> Result<EntityCollection<Opportunity>> {
        let won = Filter::and(vec![Filter::eq("statecode", 1), Filter::eq("statuscode", 3)]);
        self.get_opportunities_by_filter(won, top).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = OpportunitiesRequest::default();
        assert_eq!(request.top, 20);
        assert_eq!(request.match_mode, NameMatch::StartsWith);
        assert!(!request.include_closed);
        assert_eq!(request.state_filter(), Some(Filter::active()));
    }

    #[test]
    fn test_including_closed_drops_state_filter() {
        let request = OpportunitiesRequest::default().including_closed(true);
        assert!(request.state_filter().is_none());
    }
}
