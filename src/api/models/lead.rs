use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(rename = "@odata.etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(rename = "leadid", default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,

    #[serde(rename = "fullname", default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Topic of the lead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(rename = "companyname", default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(rename = "emailaddress1", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "telephone1", default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,

    #[serde(rename = "leadsourcecode", default, skip_serializing_if = "Option::is_none")]
    pub lead_source_code: Option<i32>,

    #[serde(
        rename = "leadsourcecode@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub lead_source_label: Option<String>,

    /// Rating: 1 hot, 2 warm, 3 cold
    #[serde(rename = "leadqualitycode", default, skip_serializing_if = "Option::is_none")]
    pub lead_quality_code: Option<i32>,

    #[serde(
        rename = "leadqualitycode@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub lead_quality_label: Option<String>,

    #[serde(rename = "statecode", default, skip_serializing_if = "Option::is_none")]
    pub state_code: Option<i32>,

    #[serde(
        rename = "statecode@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub state_label: Option<String>,

    #[serde(rename = "statuscode", default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i32>,

    #[serde(
        rename = "statuscode@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_label: Option<String>,

    #[serde(rename = "_ownerid_value", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(
        rename = "_ownerid_value@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_name: Option<String>,

    #[serde(rename = "createdon", default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_lead_labels() {
        let json = r#"{
            "leadid": "44444444-4444-4444-4444-444444444444",
            "subject": "Interested in CRM",
            "leadqualitycode": 1,
            "leadqualitycode@OData.Community.Display.V1.FormattedValue": "Hot",
            "unknownfield": true
        }"#;
        let lead: Lead = serde_json::from_str(json).unwrap();
        assert_eq!(lead.lead_quality_code, Some(1));
        assert_eq!(lead.lead_quality_label.as_deref(), Some("Hot"));
        assert!(lead.full_name.is_none());
    }
}
