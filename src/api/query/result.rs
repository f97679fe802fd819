//! OData collection responses

use serde::{Deserialize, Serialize};

/// `{"@odata.context": ..., "@odata.nextLink": ..., "value": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCollection<T> {
    #[serde(rename = "@odata.context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(rename = "@odata.nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

impl<T> Default for EntityCollection<T> {
    fn default() -> Self {
        Self {
            context: None,
            next_link: None,
            value: Vec::new(),
        }
    }
}

impl<T> EntityCollection<T> {
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Server signalled more pages; this client never follows them
    pub fn has_more(&self) -> bool {
        self.next_link.is_some()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.value
    }
}

impl<T> IntoIterator for EntityCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.value.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_decode_envelope() {
        let json = r#"{
            "@odata.context": "https://org.crm4.dynamics.com/api/data/v9.2/$metadata#accounts",
            "@odata.nextLink": "https://org.crm4.dynamics.com/api/data/v9.2/accounts?$skiptoken=1",
            "value": [{"name": "A"}, {"name": "B"}]
        }"#;
        let collection: EntityCollection<Value> = serde_json::from_str(json).unwrap();

        assert_eq!(collection.len(), 2);
        assert!(collection.has_more());
        assert_eq!(collection.value[1]["name"], "B");
    }

    #[test]
    fn test_opportunity_envelope_survives_reencoding() {
        use crate::api::models::Opportunity;

        let json = r#"{
            "@odata.context": "https://org.crm4.dynamics.com/api/data/v9.2/$metadata#opportunities",
            "value": [
                {
                    "opportunityid": "6f1d0a3e-8a2b-4c1d-9e0f-123456789abc",
                    "name": "Cloud Migration",
                    "estimatedvalue": 125000.0,
                    "estimatedvalue@OData.Community.Display.V1.FormattedValue": "€125,000.00",
                    "statecode": 0,
                    "statecode@OData.Community.Display.V1.FormattedValue": "Open",
                    "_ownerid_value": "11111111-2222-3333-4444-555555555555",
                    "_ownerid_value@OData.Community.Display.V1.FormattedValue": "Jane Doe"
                },
                {
                    "opportunityid": "0a0b0c0d-0000-4000-8000-000000000001",
                    "name": "Azure Cloud Support",
                    "statecode": 1,
                    "statecode@OData.Community.Display.V1.FormattedValue": "Won",
                    "estimatedclosedate": "2024-03-31"
                }
            ]
        }"#;

        let first: EntityCollection<Opportunity> = serde_json::from_str(json).unwrap();
        let encoded = serde_json::to_string(&first).unwrap();
        let second: EntityCollection<Opportunity> = serde_json::from_str(&encoded).unwrap();

        assert_eq!(first, second);
        let names: Vec<_> = second.value.iter().map(|o| o.name.as_deref()).collect();
        assert_eq!(names, vec![Some("Cloud Migration"), Some("Azure Cloud Support")]);
        assert_eq!(second.value[0].estimated_value_label.as_deref(), Some("€125,000.00"));
        assert_eq!(second.value[0].owner_name.as_deref(), Some("Jane Doe"));
        assert_eq!(second.value[1].state_label.as_deref(), Some("Won"));
        assert!(encoded.contains("statecode@OData.Community.Display.V1.FormattedValue"));
    }

    #[test]
    fn test_missing_value_is_empty() {
        let collection: EntityCollection<Value> = serde_json::from_str("{}").unwrap();
        assert!(collection.is_empty());
        assert!(!collection.has_more());
    }
}
