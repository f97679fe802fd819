//! OData Query Builder Module
//!
//! Query (reusable, renders to a URL) and QueryBuilder (fluent) over typed
//! filters and ordering.

pub mod builder;
pub mod filters;
pub mod query;
pub mod result;

pub use builder::QueryBuilder;
pub use filters::{Filter, FilterValue, NameMatch};
pub use query::{OrderBy, Query, Target};
pub use result::EntityCollection;
