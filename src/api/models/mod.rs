//! Entity DTOs
//!
//! Every field is optional and named after the server's logical name.
//! Formatted-value annotations land in `*_label` / `*_name` siblings.

pub mod account;
pub mod contact;
pub mod lead;
pub mod opportunity;

pub use account::Account;
pub use contact::Contact;
pub use lead::Lead;
pub use opportunity::Opportunity;
