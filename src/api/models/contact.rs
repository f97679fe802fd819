use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "@odata.etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(rename = "contactid", default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,

    #[serde(rename = "fullname", default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(rename = "firstname", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(rename = "lastname", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(rename = "jobtitle", default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    #[serde(rename = "emailaddress1", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "telephone1", default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,

    #[serde(rename = "mobilephone", default, skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,

    /// Account or contact this person belongs to
    #[serde(rename = "_parentcustomerid_value", default, skip_serializing_if = "Option::is_none")]
    pub parent_customer_id: Option<String>,

    #[serde(
        rename = "_parentcustomerid_value@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_customer_name: Option<String>,

    #[serde(rename = "_ownerid_value", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(
        rename = "_ownerid_value@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_name: Option<String>,

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
