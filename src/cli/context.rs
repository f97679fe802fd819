use crate::api::{DynamicsClient, build_http_client};
use crate::auth::{AccessToken, BrowserFlow, Credentials, TokenProvider};
use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;

/// Everything a command handler needs, built once in `main`
pub struct AppContext {
    pub config: Config,
    pub provider: Arc<TokenProvider>,
    pub client: DynamicsClient,
}

impl AppContext {
    pub fn build(config: Config, credentials: Credentials, no_browser: bool) -> Result<Self> {
        let dynamics_url = config.dynamics_url()?;
        let http = build_http_client(config.request_timeout())?;

        let mut flow = BrowserFlow::new(config.login_timeout());
        if no_browser {
            flow = flow.without_browser();
        }

        let provider = Arc::new(
            TokenProvider::from_config(http.clone(), Arc::new(credentials), &config)?
                .with_flow(Box::new(flow)),
        );
        let client = DynamicsClient::new(http, &dynamics_url, provider.clone());

        Ok(Self {
            config,
            provider,
            client,
        })
    }

    /// Acquire a token up front so a browser sign-in never races a spinner;
    /// later requests are served from the cache
    pub async fn ensure_signed_in(&self) -> Result<AccessToken> {
        self.provider.acquire_token().await
    }
}
