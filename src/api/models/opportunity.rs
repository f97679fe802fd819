use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    #[serde(rename = "@odata.etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(rename = "opportunityid", default, skip_serializing_if = "Option::is_none")]
    pub opportunity_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "mac_opportunitynumber", default, skip_serializing_if = "Option::is_none")]
    pub opportunity_number: Option<String>,

    #[serde(rename = "mac_autonumberopportunity", default, skip_serializing_if = "Option::is_none")]
    pub auto_number: Option<String>,

    #[serde(rename = "estimatedvalue", default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,

    #[serde(
        rename = "estimatedvalue@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_value_label: Option<String>,

    #[serde(rename = "actualvalue", default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<f64>,

    #[serde(rename = "closeprobability", default, skip_serializing_if = "Option::is_none")]
    pub close_probability: Option<i32>,

    /// Date only, `YYYY-MM-DD`
    #[serde(rename = "estimatedclosedate", default, skip_serializing_if = "Option::is_none")]
    pub estimated_close_date: Option<String>,

    #[serde(rename = "actualclosedate", default, skip_serializing_if = "Option::is_none")]
    pub actual_close_date: Option<String>,

    #[serde(rename = "createdon", default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,

    #[serde(rename = "modifiedon", default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<String>,

    /// 0 open, 1 won, 2 lost
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

    #[serde(rename = "salesstage", default, skip_serializing_if = "Option::is_none")]
    pub sales_stage: Option<i32>,

    #[serde(rename = "stepname", default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,

    #[serde(rename = "mac_probability", default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<i32>,

    #[serde(
        rename = "mac_probability@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub probability_label: Option<String>,

    #[serde(rename = "_customerid_value", default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    #[serde(
        rename = "_customerid_value@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_name: Option<String>,

    #[serde(rename = "_parentaccountid_value", default, skip_serializing_if = "Option::is_none")]
    pub parent_account_id: Option<String>,

    #[serde(
        rename = "_parentaccountid_value@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_account_name: Option<String>,

    #[serde(rename = "_parentcontactid_value", default, skip_serializing_if = "Option::is_none")]
    pub parent_contact_id: Option<String>,

    #[serde(rename = "_ownerid_value", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(
        rename = "_ownerid_value@OData.Community.Display.V1.FormattedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_name: Option<String>,
}

impl Opportunity {
    pub const STATE_OPEN: i32 = 0;

    pub fn is_open(&self) -> bool {
        self.state_code == Some(Self::STATE_OPEN)
    }

    pub fn estimated_close(&self) -> Option<NaiveDate> {
        self.estimated_close_date.as_deref().and_then(parse_date)
    }

    /// `createdon` as `YYYY-MM-DD`
    pub fn created_date(&self) -> Option<String> {
        self.created_on
            .as_deref()
            .and_then(parse_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
    }
}

// Accepts both date-only values and full timestamps
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// State code ascending, then estimated close date descending (undated last).
/// Stable, so ties keep server order.
pub fn sort_by_state_then_close_date(opportunities: &mut [Opportunity]) {
    opportunities.sort_by(|a, b| {
        a.state_code
            .cmp(&b.state_code)
            .then_with(|| match (a.estimated_close(), b.estimated_close()) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });
}

/// Client-side shaping for name and account-name searches: closed records
/// included means sort, otherwise keep open records in server order
pub fn shape_search_results(
    opportunities: Vec<Opportunity>,
    include_closed: bool,
) -> Vec<Opportunity> {
    if include_closed {
        let mut sorted = opportunities;
        sort_by_state_then_close_date(&mut sorted);
        sorted
    } else {
        opportunities.into_iter().filter(Opportunity::is_open).collect()
    }
}
