pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod ui;

pub use error::{DynamicsError, Result};
