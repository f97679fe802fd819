//! QueryBuilder for fluent query construction

use super::filters::{Filter, NameMatch};
use super::query::{OrderBy, Query, Target};
use super::result::EntityCollection;
use crate::api::client::DynamicsClient;
use crate::error::Result;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new(target: Target) -> Self {
        Self {
            query: Query::new(target),
        }
    }

    pub fn collection(entity_set: impl Into<String>) -> Self {
        Self {
            query: Query::collection(entity_set),
        }
    }

    pub fn related(
        entity_set: impl Into<String>,
        id: impl Into<String>,
        navigation: impl Into<String>,
    ) -> Self {
        Self {
            query: Query::related(entity_set, id, navigation),
        }
    }

    /// Select specific fields, in the given order
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.query.select = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Add a filter condition; repeated calls are joined with `and`
    pub fn filter(mut self, filter: Filter) -> Self {
        self.query.filter = Some(match self.query.filter.take() {
            Some(existing) => existing.and_also(filter),
            None => filter,
        });
        self
    }

    pub fn filter_opt(self, filter: Option<Filter>) -> Self {
        match filter {
            Some(filter) => self.filter(filter),
            None => self,
        }
    }

    pub fn name_match(self, field: &str, value: &str, mode: NameMatch) -> Self {
        self.filter(mode.filter(field, value))
    }

    pub fn orderby(mut self, order: OrderBy) -> Self {
        self.query.orderby.push(order);
        self
    }

    pub fn orderby_opt(self, order: Option<OrderBy>) -> Self {
        match order {
            Some(order) => self.orderby(order),
            None => self,
        }
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.query.expand = Some(expand.into());
        self
    }

    pub fn top(mut self, top: u32) -> Self {
        self.query.top = Some(top);
        self
    }

    /// Build the final Query object (reusable)
    pub fn build(self) -> Query {
        self.query
    }

    /// Build and execute immediately
    pub async fn fetch<T: DeserializeOwned>(
        self,
        client: &DynamicsClient,
    ) -> Result<EntityCollection<T>> {
        client.get_collection(&self.build()).await
    }
}

// Convenience methods for common patterns
impl QueryBuilder {
    /// Open records only (statecode = 0)
    pub fn active_only(self) -> Self {
        self.filter(Filter::active())
    }

    pub fn newest_first(self) -> Self {
        self.orderby(OrderBy::desc("createdon"))
    }
}
