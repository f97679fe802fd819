//! Per-entity query sets; each borrows the shared `DynamicsClient`

pub mod accounts;
pub mod contacts;
pub mod leads;
pub mod opportunities;

pub use accounts::AccountsApi;
pub use contacts::ContactsApi;
pub use leads::LeadsApi;
pub use opportunities::{OpportunitiesApi, OpportunitiesRequest};
