//! Reusable Query object
//!
//! A resource path plus system query options. Rendering is deterministic:
//! options are emitted as `$filter`, `$top`, `$select`, `$expand`,
//! `$orderby`, each value percent-encoded.

use super::filters::Filter;

/// The resource a query addresses, relative to the Web API root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `accounts`
    Collection(String),
    /// `accounts(<id>)`
    Record { entity_set: String, id: String },
    /// `accounts(<id>)/opportunity_customer_accounts`
    Navigation {
        entity_set: String,
        id: String,
        navigation: String,
    },
}

impl Target {
    pub fn path(&self) -> String {
        match self {
            Target::Collection(entity_set) => entity_set.clone(),
            Target::Record { entity_set, id } => format!("{}({})", entity_set, id),
            Target::Navigation {
                entity_set,
                id,
                navigation,
            } => format!("{}({})/{}", entity_set, id, navigation),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    Asc(String),
    Desc(String),
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self::Asc(field.into())
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::Desc(field.into())
    }

    pub fn to_odata_string(&self) -> String {
        match self {
            OrderBy::Asc(field) => format!("{} asc", field),
            OrderBy::Desc(field) => format!("{} desc", field),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub target: Target,
    pub filter: Option<Filter>,
    pub top: Option<u32>,
    pub select: Vec<String>,
    pub expand: Option<String>,
    pub orderby: Vec<OrderBy>,
}

impl Query {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            filter: None,
            top: None,
            select: Vec::new(),
            expand: None,
            orderby: Vec::new(),
        }
    }

    pub fn collection(entity_set: impl Into<String>) -> Self {
        Self::new(Target::Collection(entity_set.into()))
    }

    pub fn record(entity_set: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(Target::Record {
            entity_set: entity_set.into(),
            id: id.into(),
        })
    }

    pub fn related(
        entity_set: impl Into<String>,
        id: impl Into<String>,
        navigation: impl Into<String>,
    ) -> Self {
        Self::new(Target::Navigation {
            entity_set: entity_set.into(),
            id: id.into(),
            navigation: navigation.into(),
        })
    }

    /// Clone and modify - useful for creating variations of base queries
    pub fn with_top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    /// Encoded query string without the leading `?`; empty when no options are set
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();

        if let Some(filter) = &self.filter {
            params.push(("$filter", filter.to_odata_string()));
        }

        if let Some(top) = self.top {
            params.push(("$top", top.to_string()));
        }

        if !self.select.is_empty() {
            params.push(("$select", self.select.join(",")));
        }

        if let Some(expand) = self.expand.as_deref().filter(|e| !e.trim().is_empty()) {
            params.push(("$expand", expand.trim().to_string()));
        }

        if !self.orderby.is_empty() {
            let clauses: Vec<String> = self.orderby.iter().map(|o| o.to_odata_string()).collect();
            params.push(("$orderby", clauses.join(",")));
        }

        params
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Path and query relative to the Web API root
    pub fn to_relative_url(&self) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            self.target.path()
        } else {
            format!("{}?{}", self.target.path(), query)
        }
    }

    /// `api_root` must end with `/`
    pub fn to_url(&self, api_root: &str) -> String {
        format!("{}{}", api_root, self.to_relative_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(query: &Query) -> String {
        urlencoding::decode(&query.to_relative_url()).unwrap().into_owned()
    }

    #[test]
    fn test_bare_collection() {
        let query = Query::collection("contacts");
        assert_eq!(query.to_relative_url(), "contacts");
        assert_eq!(
            query.to_url("https://test.crm.dynamics.com/api/data/v9.2/"),
            "https://test.crm.dynamics.com/api/data/v9.2/contacts"
        );
    }

    #[test]
    fn test_option_order_is_fixed() {
        let mut query = Query::related("accounts", "abc", "opportunity_customer_accounts")
            .with_filter(Filter::active())
            .with_top(20)
            .with_expand("parentaccountid($select=name)");
        query.select = vec!["name".to_string(), "statecode".to_string()];
        query.orderby = vec![OrderBy::desc("estimatedclosedate")];

        assert_eq!(
            decoded(&query),
            "accounts(abc)/opportunity_customer_accounts?$filter=statecode eq 0&$top=20\
             &$select=name,statecode&$expand=parentaccountid($select=name)&$orderby=estimatedclosedate desc"
        );
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let query = Query::collection("opportunities")
            .with_filter(Filter::contains("name", "R&D #1"))
            .with_top(5);
        let url = query.to_relative_url();

        assert!(url.starts_with("opportunities?$filter=contains%28name%2C%27R%26D%20%231%27%29"));
        assert!(url.ends_with("&$top=5"));
    }

    #[test]
    fn test_record_with_expand() {
        let query = Query::record("accounts", "00000000-0000-0000-0000-000000000001")
            .with_expand("primarycontactid");
        assert_eq!(
            decoded(&query),
            "accounts(00000000-0000-0000-0000-000000000001)?$expand=primarycontactid"
        );
    }

    #[test]
    fn test_blank_expand_is_dropped() {
        let query = Query::record("leads", "x").with_expand("  ");
        assert_eq!(query.to_relative_url(), "leads(x)");
    }

    #[test]
    fn test_multiple_orderby() {
        let mut query = Query::collection("opportunities");
        query.orderby = vec![OrderBy::asc("statecode"), OrderBy::desc("createdon")];
        assert_eq!(decoded(&query), "opportunities?$orderby=statecode asc,createdon desc");
    }
}
