//! Dynamics 365 Web API Module
//!
//! Authenticated OData client, typed query building and the entity-specific
//! query sets built on top of them.

pub mod client;
pub mod constants;
pub mod entities;
pub mod models;
pub mod query;

pub use client::{DynamicsClient, build_http_client, parse_guid, pretty_json};
pub use entities::{AccountsApi, ContactsApi, LeadsApi, OpportunitiesApi, OpportunitiesRequest};
pub use models::{Account, Contact, Lead, Opportunity};
pub use query::{
    EntityCollection, Filter, FilterValue, NameMatch, OrderBy, Query, QueryBuilder, Target,
};
