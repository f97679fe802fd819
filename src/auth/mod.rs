pub mod cache;
pub mod credentials;
pub mod interactive;
pub mod provider;
pub mod secrets;

pub use cache::{CachedAccount, TokenCache};
pub use credentials::Credentials;
pub use interactive::{BrowserFlow, InteractiveFlow};
pub use provider::{AccessToken, TokenOrigin, TokenProvider};
pub use secrets::{KeyringStore, MemorySecretStore, SecretStore};

use crate::error::Result;
use async_trait::async_trait;

/// Anything able to hand out a bearer token for the next request
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

/// Fixed token; handy for scripts that already hold one and for tests
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
