//! Token acquisition against Azure AD
//!
//! Silent first (cache, then refresh token), browser sign-in only when the
//! identity provider asks for user interaction. In client-credentials mode the
//! browser step is replaced by the confidential client grant.

use super::TokenSource;
use super::cache::{CachedAccount, TokenCache};
use super::credentials::Credentials;
use super::interactive::{AuthorizationParams, BrowserFlow, InteractiveFlow};
use super::secrets::KeyringStore;
use crate::config::{AuthMode, Config, DEFAULT_AUTHORITY_HOST};
use crate::error::{DynamicsError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use oauth2::{CsrfToken, PkceCodeChallenge};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

const OIDC_SCOPES: &str = "openid profile offline_access";
const DEFAULT_EXPIRES_IN: i64 = 3600;
/// Upper bound on a server-provided lifetime
const MAX_EXPIRES_IN: i64 = 86_400;

/// Where a returned token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    Cache,
    Refreshed,
    Interactive,
    ClientCredentials,
}

impl fmt::Display for TokenOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TokenOrigin::Cache => "cache",
            TokenOrigin::Refreshed => "refresh token",
            TokenOrigin::Interactive => "interactive sign-in",
            TokenOrigin::ClientCredentials => "client credentials",
        };
        f.write_str(label)
    }
}

#[derive(Clone)]
pub struct AccessToken {
    pub secret: String,
    pub username: String,
    pub expires_on: DateTime<Utc>,
    pub origin: TokenOrigin,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("username", &self.username)
            .field("expires_on", &self.expires_on)
            .field("origin", &self.origin)
            .finish()
    }
}

enum AcquireState {
    NoToken,
    NeedsInteractive,
    Valid(CachedAccount, TokenOrigin),
}

pub struct TokenProvider {
    http: reqwest::Client,
    credentials: Arc<Credentials>,
    resource: String,
    authority_host: String,
    mode: AuthMode,
    cache: TokenCache,
    flow: Box<dyn InteractiveFlow>,
    lock: Mutex<()>,
}

impl TokenProvider {
    /// `resource` is the organization root, e.g. https://contoso.crm4.dynamics.com
    pub fn new(
        http: reqwest::Client,
        credentials: Arc<Credentials>,
        resource: impl Into<String>,
        cache: TokenCache,
    ) -> Self {
        Self {
            http,
            credentials,
            resource: resource.into().trim_end_matches('/').to_string(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            mode: AuthMode::default(),
            cache,
            flow: Box::new(BrowserFlow::default()),
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(
        http: reqwest::Client,
        credentials: Arc<Credentials>,
        config: &Config,
    ) -> Result<Self> {
        let cache = TokenCache::new(config.cache_dir()?, Arc::new(KeyringStore::default()));
        Ok(Self::new(http, credentials, config.dynamics_url()?, cache)
            .with_mode(config.auth.mode)
            .with_authority_host(&config.auth.authority_host)
            .with_flow(Box::new(BrowserFlow::new(config.login_timeout()))))
    }

    pub fn with_mode(mut self, mode: AuthMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_authority_host(mut self, host: &str) -> Self {
        self.authority_host = host.trim_end_matches('/').to_string();
        self
    }

    pub fn with_flow(mut self, flow: Box<dyn InteractiveFlow>) -> Self {
        self.flow = flow;
        self
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    pub fn default_scope(&self) -> String {
        match self.mode {
            AuthMode::Interactive => format!("{}/user_impersonation", self.resource),
            AuthMode::ClientCredentials => format!("{}/.default", self.resource),
        }
    }

    pub async fn acquire_token(&self) -> Result<AccessToken> {
        let scope = self.default_scope();
        self.acquire_token_for(&scope).await
    }

    pub async fn acquire_token_for(&self, scope: &str) -> Result<AccessToken> {
        let _guard = self.lock.lock().await;

        let mut state = AcquireState::NoToken;
        loop {
            state = match state {
                AcquireState::NoToken => self.acquire_silent(scope).await?,
                AcquireState::NeedsInteractive => match self.mode {
                    AuthMode::Interactive => {
                        info!("Silent acquisition not possible, starting browser sign-in");
                        let account = self.acquire_interactive(scope).await?;
                        AcquireState::Valid(account, TokenOrigin::Interactive)
                    }
                    AuthMode::ClientCredentials => {
                        let account = self.acquire_for_client(scope).await?;
                        AcquireState::Valid(account, TokenOrigin::ClientCredentials)
                    }
                },
                AcquireState::Valid(account, origin) => {
                    info!("Token acquired from {} for {}", origin, account.username);
                    return Ok(AccessToken {
                        secret: account.access_token,
                        username: account.username,
                        expires_on: account.expires_on,
                        origin,
                    });
                }
            };
        }
    }

    /// Remove every cached account, then the cache file itself
    pub async fn invalidate_cache(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        info!("Invalidating token cache...");

        let mut removed = 0;
        for account in self.cache.accounts()? {
            if self.cache.remove(&account)? {
                info!("Removed account: {}", account.username);
                removed += 1;
            }
        }

        if self.cache.exists() {
            info!("Deleting cache file at: {:?}", self.cache.path());
            self.cache.delete_file()?;
            info!("Cache file deleted");
        }

        info!("Token cache invalidated successfully");
        Ok(removed)
    }

    pub async fn cache_status(&self) -> Result<Vec<CachedAccount>> {
        let _guard = self.lock.lock().await;
        self.cache.accounts()
    }

    async fn acquire_silent(&self, scope: &str) -> Result<AcquireState> {
        let creds = &self.credentials;
        let Some(account) = self.cache.find(&creds.tenant_id, &creds.client_id, scope)? else {
            debug!("No cached token for scope {}", scope);
            return Ok(AcquireState::NeedsInteractive);
        };

        if !account.is_expired() {
            return Ok(AcquireState::Valid(account, TokenOrigin::Cache));
        }

        debug!("Cached token for {} expired at {}", account.username, account.expires_on);
        if self.mode == AuthMode::ClientCredentials {
            return Ok(AcquireState::NeedsInteractive);
        }

        let Some(refresh_token) = account.refresh_token.clone() else {
            return Ok(AcquireState::NeedsInteractive);
        };

        match self.redeem_refresh_token(&account, &refresh_token, scope).await? {
            Some(refreshed) => Ok(AcquireState::Valid(refreshed, TokenOrigin::Refreshed)),
            None => Ok(AcquireState::NeedsInteractive),
        }
    }

    async fn redeem_refresh_token(
        &self,
        previous: &CachedAccount,
        refresh_token: &str,
        scope: &str,
    ) -> Result<Option<CachedAccount>> {
        info!("Refreshing token for {}", previous.username);
        let request_scope = self.request_scope(scope);
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.credentials.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("scope", request_scope.as_str()),
        ];

        match self.post_token(&form).await? {
            GrantOutcome::Issued(response) => {
                let account = self.account_from_response(response, scope, Some(previous));
                self.cache.store(account.clone())?;
                Ok(Some(account))
            }
            GrantOutcome::Rejected(error) if error.requires_interaction() => {
                info!("Refresh token rejected ({}), user interaction required", error.error);
                Ok(None)
            }
            GrantOutcome::Rejected(error) => Err(error.into_error("Token refresh failed")),
        }
    }

    async fn acquire_interactive(&self, scope: &str) -> Result<CachedAccount> {
        let (code_challenge, code_verifier) = PkceCodeChallenge::new_random_sha256();
        let state = CsrfToken::new_random().secret().clone();
        let params = AuthorizationParams {
            authorize_endpoint: self.endpoint("authorize"),
            client_id: self.credentials.client_id.clone(),
            scope: self.request_scope(scope),
            state: state.clone(),
            code_challenge,
        };

        let response = self.flow.authorize(&params).await?;
        if response.state.as_deref() != Some(state.as_str()) {
            return Err(DynamicsError::authentication(
                "Sign-in response state does not match the request",
            ));
        }

        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.credentials.client_id.as_str()),
            ("code", response.code.as_str()),
            ("redirect_uri", response.redirect_uri.as_str()),
            ("code_verifier", code_verifier.secret().as_str()),
            ("scope", params.scope.as_str()),
        ];

        match self.post_token(&form).await? {
            GrantOutcome::Issued(token) => {
                let account = self.account_from_response(token, scope, None);
                self.cache.store(account.clone())?;
                Ok(account)
            }
            GrantOutcome::Rejected(error) => {
                Err(error.into_error("Authorization code redemption failed"))
            }
        }
    }

    async fn acquire_for_client(&self, scope: &str) -> Result<CachedAccount> {
        info!("Requesting application token for {}", scope);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", scope),
        ];

        match self.post_token(&form).await? {
            GrantOutcome::Issued(token) => {
                let account = self.account_from_response(token, scope, None);
                self.cache.store(account.clone())?;
                Ok(account)
            }
            GrantOutcome::Rejected(error) => {
                Err(error.into_error("Client credentials grant failed"))
            }
        }
    }

    async fn post_token(&self, form: &[(&str, &str)]) -> Result<GrantOutcome> {
        let url = self.endpoint("token");
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| DynamicsError::authentication(format!("Token request failed: {}", e)))?;

        let status = response.status();
        debug!("Token request status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| {
                DynamicsError::authentication(format!("Token response unreadable: {}", e))
            })?;

        if status.is_success() {
            return serde_json::from_str(&body)
                .map(GrantOutcome::Issued)
                .map_err(|e| {
                    DynamicsError::authentication(format!("Unexpected token response: {}", e))
                });
        }

        match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(error) => Ok(GrantOutcome::Rejected(error)),
            Err(_) => Err(DynamicsError::authentication(format!(
                "Token endpoint returned {}: {}",
                status,
                body.trim()
            ))),
        }
    }

    fn account_from_response(
        &self,
        response: TokenResponse,
        scope: &str,
        previous: Option<&CachedAccount>,
    ) -> CachedAccount {
        let claims = response.id_token.as_deref().and_then(decode_id_token);
        let app_mode = self.mode == AuthMode::ClientCredentials;

        let username = claims
            .as_ref()
            .and_then(|c| c.preferred_username.clone())
            .or_else(|| previous.map(|p| p.username.clone()))
            .unwrap_or_else(|| {
                if app_mode {
                    self.credentials.client_id.clone()
                } else {
                    "unknown".to_string()
                }
            });

        let home_account_id = claims
            .as_ref()
            .and_then(IdTokenClaims::home_account_id)
            .or_else(|| previous.map(|p| p.home_account_id.clone()))
            .unwrap_or_else(|| self.credentials.client_id.clone());

        let expires_in = response
            .expires_in()
            .unwrap_or_else(|| {
                warn!("Token response without expires_in, assuming {}s", DEFAULT_EXPIRES_IN);
                DEFAULT_EXPIRES_IN
            })
            .clamp(0, MAX_EXPIRES_IN);

        CachedAccount {
            home_account_id,
            username,
            tenant_id: self.credentials.tenant_id.clone(),
            client_id: self.credentials.client_id.clone(),
            scope: scope.to_string(),
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
            expires_on: Utc::now() + Duration::seconds(expires_in),
        }
    }

    fn request_scope(&self, scope: &str) -> String {
        match self.mode {
            AuthMode::Interactive => format!("{} {}", scope, OIDC_SCOPES),
            AuthMode::ClientCredentials => scope.to_string(),
        }
    }

    fn endpoint(&self, kind: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/{}",
            self.authority_host, self.credentials.tenant_id, kind
        )
    }
}

#[async_trait]
impl TokenSource for TokenProvider {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.acquire_token().await?.secret)
    }
}

enum GrantOutcome {
    Issued(TokenResponse),
    Rejected(TokenErrorResponse),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

impl TokenResponse {
    // Some endpoints send expires_in as a string
    fn expires_in(&self) -> Option<i64> {
        match self.expires_in.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenErrorResponse {
    fn requires_interaction(&self) -> bool {
        matches!(
            self.error.as_str(),
            "invalid_grant" | "interaction_required" | "consent_required" | "login_required"
        )
    }

    fn into_error(self, context: &str) -> DynamicsError {
        let detail = match self.error_description {
            Some(description) => {
                // AAD descriptions carry trace ids on extra lines
                let first_line = description.lines().next().unwrap_or_default().to_string();
                format!("{}: {}", self.error, first_line)
            }
            None => self.error,
        };
        DynamicsError::authentication(format!("{} ({})", context, detail))
    }
}

#[derive(Debug, Default, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    oid: Option<String>,
    #[serde(default)]
    tid: Option<String>,
}

impl IdTokenClaims {
    fn home_account_id(&self) -> Option<String> {
        match (&self.oid, &self.tid) {
            (Some(oid), Some(tid)) => Some(format!("{}.{}", oid, tid)),
            _ => None,
        }
    }
}

/// Claims are read without signature validation; they only label the cache entry
fn decode_id_token(token: &str) -> Option<IdTokenClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::secrets::MemorySecretStore;

    fn fake_id_token(claims: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn test_decode_id_token_claims() {
        let token = fake_id_token(r#"{"preferred_username":"jane@contoso.com","oid":"o1","tid":"t1"}"#);
        let claims = decode_id_token(&token).unwrap();
        assert_eq!(claims.preferred_username.as_deref(), Some("jane@contoso.com"));
        assert_eq!(claims.home_account_id().as_deref(), Some("o1.t1"));
    }

    #[test]
    fn test_decode_garbage_id_token() {
        assert!(decode_id_token("not-a-jwt").is_none());
        assert!(decode_id_token("a.!!!.c").is_none());
    }

    #[test]
    fn test_interaction_error_codes() {
        for code in ["invalid_grant", "interaction_required", "consent_required", "login_required"] {
            let err = TokenErrorResponse {
                error: code.to_string(),
                error_description: None,
            };
            assert!(err.requires_interaction(), "{}", code);
        }

        let err = TokenErrorResponse {
            error: "temporarily_unavailable".to_string(),
            error_description: Some("AADSTS1: busy\r\nTrace ID: 123".to_string()),
        };
        assert!(!err.requires_interaction());
        let message = err.into_error("Token refresh failed").to_string();
        assert!(message.contains("AADSTS1: busy"));
        assert!(!message.contains("Trace ID"));
    }

    #[test]
    fn test_expires_in_number_or_string() {
        let numeric: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","expires_in":3599}"#).unwrap();
        let text: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","expires_in":"3599"}"#).unwrap();
        let missing: TokenResponse = serde_json::from_str(r#"{"access_token":"a"}"#).unwrap();

        assert_eq!(numeric.expires_in(), Some(3599));
        assert_eq!(text.expires_in(), Some(3599));
        assert_eq!(missing.expires_in(), None);
    }

    #[test]
    fn test_huge_expires_in_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TokenProvider::new(
            reqwest::Client::new(),
            Arc::new(Credentials::new("tid", "cid", "secret")),
            "https://org.crm4.dynamics.com",
            TokenCache::new(dir.path(), Arc::new(MemorySecretStore::new())),
        );

        let huge: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","expires_in":9223372036854775807}"#).unwrap();
        let account = provider.account_from_response(huge, "scope", None);
        assert!(account.expires_on <= Utc::now() + Duration::seconds(MAX_EXPIRES_IN));

        let negative: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","expires_in":-60}"#).unwrap();
        let account = provider.account_from_response(negative, "scope", None);
        assert!(account.is_expired());
    }

    #[test]
    fn test_scopes_per_mode() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TokenProvider::new(
            reqwest::Client::new(),
            Arc::new(Credentials::new("tid", "cid", "secret")),
            "https://org.crm4.dynamics.com/",
            TokenCache::new(dir.path(), Arc::new(MemorySecretStore::new())),
        );

        assert_eq!(provider.default_scope(), "https://org.crm4.dynamics.com/user_impersonation");
        assert_eq!(
            provider.request_scope(&provider.default_scope()),
            "https://org.crm4.dynamics.com/user_impersonation openid profile offline_access"
        );
        assert_eq!(
            provider.endpoint("token"),
            "https://login.microsoftonline.com/tid/oauth2/v2.0/token"
        );

        let provider = provider.with_mode(AuthMode::ClientCredentials);
        assert_eq!(provider.default_scope(), "https://org.crm4.dynamics.com/.default");
        assert_eq!(provider.request_scope("x/.default"), "x/.default");
    }

    #[test]
    fn test_access_token_debug_redacts_secret() {
        let token = AccessToken {
            secret: "eyJ-secret".to_string(),
            username: "jane".to_string(),
            expires_on: Utc::now(),
            origin: TokenOrigin::Cache,
        };
        assert!(!format!("{:?}", token).contains("eyJ-secret"));
    }
}
