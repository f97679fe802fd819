//! API Constants for the Dynamics 365 Web API

/// Dynamics 365 Web API version
pub const API_VERSION: &str = "v9.2";

/// Base API path for Dynamics 365
pub const API_BASE_PATH: &str = "/api/data";

/// Full API path with version
pub fn api_path() -> String {
    format!("{}/{}", API_BASE_PATH, API_VERSION)
}

/// Web API root for an organization URL, always ending with `/`
pub fn api_root(dynamics_url: &str) -> String {
    format!("{}{}/", dynamics_url.trim_end_matches('/'), api_path())
}

/// Standard headers for Dynamics 365 requests
pub mod headers {
    pub const ODATA_MAX_VERSION: &str = "OData-MaxVersion";
    pub const ODATA_VERSION: &str = "OData-Version";
    pub const ODATA_VERSION_VALUE: &str = "4.0";
    pub const ACCEPT_JSON: &str = "application/json";

    /// Ask for display labels next to option sets, lookups and dates
    pub const PREFER_FORMATTED_VALUES: &str =
        "odata.include-annotations=\"OData.Community.Display.V1.FormattedValue\"";

    pub const FORMATTED_VALUE_SUFFIX: &str = "@OData.Community.Display.V1.FormattedValue";
}

/// Entity set names
pub mod entity_sets {
    pub const ACCOUNTS: &str = "accounts";
    pub const OPPORTUNITIES: &str = "opportunities";
    pub const CONTACTS: &str = "contacts";
    pub const LEADS: &str = "leads";
}

/// Collection-valued navigation properties
pub mod navigation {
    pub const ACCOUNT_OPPORTUNITIES: &str = "opportunity_customer_accounts";
    pub const CONTACT_OPPORTUNITIES: &str = "opportunity_customer_contacts";
    pub const ACCOUNT_CONTACTS: &str = "contact_customer_accounts";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_root() {
        assert_eq!(api_root("https://org.crm4.dynamics.com"), "https://org.crm4.dynamics.com/api/data/v9.2/");
        assert_eq!(api_root("https://org.crm4.dynamics.com/"), "https://org.crm4.dynamics.com/api/data/v9.2/");
    }
}
