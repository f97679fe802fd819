use crate::api::DynamicsClient;
use crate::api::client::parse_guid;
use crate::api::constants::entity_sets;
use crate::api::models::Lead;
use crate::api::query::{EntityCollection, Filter, Query, QueryBuilder};
use crate::error::Result;
use serde_json::Value;

pub const DEFAULT_TOP: u32 = 10;

pub struct LeadsApi<'a> {
    client: &'a DynamicsClient,
}

impl<'a> LeadsApi<'a> {
    pub fn new(client: &'a DynamicsClient) -> Self {
        Self { client }
    }

    pub async fn get_lead(&self, lead_id: &str) -> Result<Lead> {
        let id = parse_guid(lead_id, "Lead ID")?;
        self.client
            .get_entity(&Query::record(entity_sets::LEADS, id))
            .await
    }

    pub async fn get_lead_with_related(&self, lead_id: &str, expand: &str) -> Result<Value> {
        self.client
            .get_by_id_with_expand(entity_sets::LEADS, lead_id, Some(expand))
            .await
    }

    pub async fn get_leads_by_filter(
        &self,
        filter: Filter,
        top: Option<u32>,
    ) -> Result<EntityCollection<Lead>> {
        QueryBuilder::collection(entity_sets::LEADS)
            .filter(filter)
            .top(top.unwrap_or(DEFAULT_TOP))
            .fetch(self.client)
            .await
    }

    pub async fn get_open(&self, top: Option<u32>) -> Result<EntityCollection<Lead>> {
        self.get_leads_by_filter(Filter::active(), top).await
    }

    pub async fn get_qualified(&self, top: Option<u32>) -> Result<EntityCollection<Lead>> {
        let qualified = Filter::and(vec![Filter::eq("statecode", 1), Filter::eq("statuscode", 3)]);
        self.get_leads_by_filter(qualified, top).await
    }

    pub async fn get_by_source(
        &self,
        lead_source_code: i32,
        top: Option<u32>,
    ) -> Result<EntityCollection<Lead>> {
        self.get_leads_by_filter(Filter::eq("leadsourcecode", lead_source_code), top)
            .await
    }

    /// 1 hot, 2 warm, 3 cold
    pub async fn get_by_rating(
        &self,
        rating_code: i32,
        top: Option<u32>,
    ) -> Result<EntityCollection<Lead>> {
        self.get_leads_by_filter(Filter::eq("leadqualitycode", rating_code), top)
            .await
    }
}
