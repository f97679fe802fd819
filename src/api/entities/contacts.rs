use crate::api::DynamicsClient;
use crate::api::client::parse_guid;
use crate::api::constants::{entity_sets, navigation};
use crate::api::models::Contact;
use crate::api::query::{EntityCollection, Filter, NameMatch, Query, QueryBuilder};
use crate::error::Result;
use serde_json::Value;

pub const DEFAULT_TOP: u32 = 10;

const SEARCH_FIELDS: &[&str] = &["fullname", "emailaddress1", "_parentcustomerid_value"];

pub struct ContactsApi<'a> {
    client: &'a DynamicsClient,
}

impl<'a> ContactsApi<'a> {
    pub fn new(client: &'a DynamicsClient) -> Self {
        Self { client }
    }

    pub async fn get_contact(&self, contact_id: &str) -> Result<Contact> {
        let id = parse_guid(contact_id, "Contact ID")?;
        self.client
            .get_entity(&Query::record(entity_sets::CONTACTS, id))
            .await
    }

    pub async fn get_contact_with_related(&self, contact_id: &str, expand: &str) -> Result<Value> {
        self.client
            .get_by_id_with_expand(entity_sets::CONTACTS, contact_id, Some(expand))
            .await
    }

    pub async fn get_contacts_with_fields(
        &self,
        fields: &[&str],
        top: Option<u32>,
    ) -> Result<EntityCollection<Contact>> {
        QueryBuilder::collection(entity_sets::CONTACTS)
            .select(fields)
            .top(top.unwrap_or(DEFAULT_TOP))
            .fetch(self.client)
            .await
    }

    pub async fn get_contacts_by_filter(
        &self,
        filter: Filter,
        top: Option<u32>,
    ) -> Result<EntityCollection<Contact>> {
        QueryBuilder::collection(entity_sets::CONTACTS)
            .filter(filter)
            .top(top.unwrap_or(DEFAULT_TOP))
            .fetch(self.client)
            .await
    }

    pub async fn get_by_account(
        &self,
        account_id: &str,
        top: Option<u32>,
    ) -> Result<EntityCollection<Contact>> {
        self.client
            .get_related(
                entity_sets::ACCOUNTS,
                account_id,
                navigation::ACCOUNT_CONTACTS,
                top.unwrap_or(DEFAULT_TOP),
                None,
                None,
            )
            .await
    }

    pub async fn search_by_name(
        &self,
        search: &str,
        top: Option<u32>,
        mode: NameMatch,
    ) -> Result<EntityCollection<Contact>> {
        self.client
            .search_by_field(
                entity_sets::CONTACTS,
                "fullname",
                search,
                top.unwrap_or(DEFAULT_TOP),
                mode,
                SEARCH_FIELDS,
            )
            .await
    }
}
