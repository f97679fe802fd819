use super::constants::{self, headers};
use super::query::{EntityCollection, Filter, NameMatch, OrderBy, Query, QueryBuilder};
use crate::auth::TokenSource;
use crate::error::{DynamicsError, Result};
use log::{debug, info};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Shared transport for the token provider and the query client
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("dynamics-crm/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Validate a record id and return it in canonical hyphenated form
pub fn parse_guid(id: &str, label: &str) -> Result<String> {
    uuid::Uuid::parse_str(id.trim())
        .map(|guid| guid.hyphenated().to_string())
        .map_err(|_| {
            DynamicsError::validation(format!("{} must be a valid GUID, got '{}'", label, id))
        })
}

pub fn pretty_json(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| DynamicsError::decode(e.to_string()))
}

/// Dynamics 365 Web API client; one per process, borrowed by the entity APIs
pub struct DynamicsClient {
    http: reqwest::Client,
    api_root: String,
    tokens: Arc<dyn TokenSource>,
}

impl DynamicsClient {
    pub fn new(http: reqwest::Client, dynamics_url: &str, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http,
            api_root: constants::api_root(dynamics_url),
            tokens,
        }
    }

    /// `<org>/api/data/v9.2/`
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    pub async fn get_json(&self, query: &Query) -> Result<Value> {
        let body = self.send(query).await?;
        decode_body(&body)
    }

    /// Single record, decoded into `T`
    pub async fn get_entity<T: DeserializeOwned>(&self, query: &Query) -> Result<T> {
        let body = self.send(query).await?;
        decode_body(&body)
    }

    pub async fn get_collection<T: DeserializeOwned>(
        &self,
        query: &Query,
    ) -> Result<EntityCollection<T>> {
        let body = self.send(query).await?;
        decode_body(&body)
    }

    /// Raw record, optionally with related data expanded
    pub async fn get_by_id_with_expand(
        &self,
        entity_set: &str,
        id: &str,
        expand: Option<&str>,
    ) -> Result<Value> {
        let id = parse_guid(id, "Record ID")?;
        let mut query = Query::record(entity_set, id);
        if let Some(expand) = expand {
            query = query.with_expand(expand);
        }
        self.get_json(&query).await
    }

    pub async fn search_by_name<T: DeserializeOwned>(
        &self,
        entity_set: &str,
        search: &str,
        top: u32,
        mode: NameMatch,
        select: &[&str],
    ) -> Result<EntityCollection<T>> {
        self.search_by_field(entity_set, "name", search, top, mode, select)
            .await
    }

    pub async fn search_by_field<T: DeserializeOwned>(
        &self,
        entity_set: &str,
        field: &str,
        search: &str,
        top: u32,
        mode: NameMatch,
        select: &[&str],
    ) -> Result<EntityCollection<T>> {
        let search = require_search(search)?;
        QueryBuilder::collection(entity_set)
            .name_match(field, search, mode)
            .top(top)
            .select(select)
            .fetch(self)
            .await
    }

    pub async fn get_related<T: DeserializeOwned>(
        &self,
        parent_set: &str,
        parent_id: &str,
        navigation: &str,
        top: u32,
        filter: Option<Filter>,
        orderby: Option<OrderBy>,
    ) -> Result<EntityCollection<T>> {
        let parent_id = parse_guid(parent_id, "Parent ID")?;
        QueryBuilder::related(parent_set, parent_id, navigation)
            .filter_opt(filter)
            .top(top)
            .orderby_opt(orderby)
            .fetch(self)
            .await
    }

    async fn send(&self, query: &Query) -> Result<String> {
        let url = query.to_url(&self.api_root);
        let token = self.tokens.bearer_token().await?;

        info!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, headers::ACCEPT_JSON)
            .header(headers::ODATA_MAX_VERSION, headers::ODATA_VERSION_VALUE)
            .header(headers::ODATA_VERSION, headers::ODATA_VERSION_VALUE)
            .header("Prefer", headers::PREFER_FORMATTED_VALUES)
            .send()
            .await?;

        let status = response.status();
        debug!("Response status: {}", status);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DynamicsError::Request {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        Ok(body)
    }
}

fn require_search(search: &str) -> Result<&str> {
    let search = search.trim();
    if search.is_empty() {
        return Err(DynamicsError::validation("Search text must not be empty"));
    }
    Ok(search)
}

fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| DynamicsError::decode(e.to_string()))
}

#[derive(Deserialize)]
struct ODataErrorBody {
    error: ODataError,
}

#[derive(Deserialize)]
struct ODataError {
    #[serde(default)]
    message: Option<String>,
}

fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ODataErrorBody>(body) {
        if let Some(message) = parsed.error.message.filter(|m| !m.is_empty()) {
            return message;
        }
    }

    let text = body.trim();
    if text.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        text.to_string()
    }
}
