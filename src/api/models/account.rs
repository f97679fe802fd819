use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "@odata.etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(rename = "accountid", default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "accountnumber", default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,

    #[serde(rename = "_ownerid_value", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(
        rename = "_ownerid_value@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_name: Option<String>,

    #[serde(rename = "_primarycontactid_value", default, skip_serializing_if = "Option::is_none")]
    pub primary_contact_id: Option<String>,

    #[serde(
        rename = "_primarycontactid_value@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_contact_name: Option<String>,

    #[serde(rename = "telephone1", default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,

    #[serde(rename = "emailaddress1", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "websiteurl", default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(rename = "address1_city", default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(rename = "address1_country", default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(rename = "statecode", default, skip_serializing_if = "Option::is_none")]
    pub state_code: Option<i32>,

    #[serde(
        rename = "statecode@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub state_label: Option<String>,

    #[serde(rename = "createdon", default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
}

impl Account {
    /// Fields requested by name searches
    pub const SEARCH_FIELDS: &'static [&'static str] = &["name", "_ownerid_value"];

    /// `Name (Owner: owner)`, used to tell same-named accounts apart
    pub fn display_label(&self) -> String {
        format!(
            "{} (Owner: {})",
            self.name.as_deref().unwrap_or("N/A"),
            self.owner_name.as_deref().unwrap_or("N/A")
        )
    }
}
