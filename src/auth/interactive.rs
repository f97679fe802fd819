//! Browser sign-in: authorization code with PKCE over a loopback redirect

use crate::error::{DynamicsError, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, CsrfToken, PkceCodeChallenge, RedirectUrl, Scope};
use reqwest::Url;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const MAX_REQUEST_BYTES: usize = 16 * 1024;

const SUCCESS_PAGE: &str = "<html><body><h3>Sign-in complete.</h3><p>You can close this window and return to the terminal.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h3>Sign-in failed.</h3><p>Return to the terminal for details.</p></body></html>";

/// Everything needed to build the authorize URL except the redirect URI
#[derive(Debug, Clone)]
pub struct AuthorizationParams {
    pub authorize_endpoint: String,
    pub client_id: String,
    /// Space separated
    pub scope: String,
    pub state: String,
    pub code_challenge: PkceCodeChallenge,
}

impl AuthorizationParams {
    pub fn authorize_url(&self, redirect_uri: &str) -> Result<Url> {
        let auth_url = AuthUrl::new(self.authorize_endpoint.clone()).map_err(|e| {
            DynamicsError::configuration(format!("Invalid authorize endpoint: {}", e))
        })?;
        let redirect_url = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| DynamicsError::configuration(format!("Invalid redirect URI: {}", e)))?;

        let client = BasicClient::new(ClientId::new(self.client_id.clone()), None, auth_url, None)
            .set_redirect_uri(redirect_url);

        let state = self.state.clone();
        let (url, _) = client
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(self.scope.split_whitespace().map(|s| Scope::new(s.to_string())))
            .set_pkce_challenge(self.code_challenge.clone())
            .add_extra_param("response_mode", "query")
            .add_extra_param("prompt", "select_account")
            .url();
        Ok(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: Option<String>,
    /// Redirect URI the code was issued for; must be repeated on redemption
    pub redirect_uri: String,
}

/// User-facing part of the sign-in. The provider owns PKCE, state checks and
/// the code exchange.
#[async_trait]
pub trait InteractiveFlow: Send + Sync {
    async fn authorize(&self, params: &AuthorizationParams) -> Result<AuthorizationResponse>;
}

/// Opens the system browser and waits on a local listener for the redirect
#[derive(Debug, Clone)]
pub struct BrowserFlow {
    timeout: Duration,
    open_browser: bool,
}

impl Default for BrowserFlow {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            open_browser: true,
        }
    }
}

impl BrowserFlow {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Only print the sign-in URL; used on headless machines
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }
}

#[async_trait]
impl InteractiveFlow for BrowserFlow {
    async fn authorize(&self, params: &AuthorizationParams) -> Result<AuthorizationResponse> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://localhost:{}", port);
        let url = params.authorize_url(&redirect_uri)?;

        info!("Waiting for sign-in redirect on port {}", port);
        eprintln!("Opening browser to sign in. If it does not open, visit:\n\n  {}\n", url);

        if self.open_browser {
            if let Err(e) = webbrowser::open(url.as_str()) {
                warn!("Failed to open browser: {}", e);
            }
        }

        let callback = wait_for_callback(&listener, self.timeout).await?;
        Ok(AuthorizationResponse {
            code: callback.code,
            state: callback.state,
            redirect_uri,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: Option<String>,
}

/// Accept connections until one carries a `code` or an `error`
pub async fn wait_for_callback(
    listener: &TcpListener,
    timeout: Duration,
) -> Result<CallbackParams> {
    match tokio::time::timeout(timeout, accept_callback(listener)).await {
        Ok(result) => result,
        Err(_) => Err(DynamicsError::authentication(format!(
            "Timed out after {}s waiting for browser sign-in",
            timeout.as_secs()
        ))),
    }
}

async fn accept_callback(listener: &TcpListener) -> Result<CallbackParams> {
    loop {
        let (mut stream, peer) = listener.accept().await?;
        debug!("Loopback connection from {}", peer);

        let target = match read_request_target(&mut stream).await {
            Ok(Some(target)) => target,
            Ok(None) => continue,
            Err(e) => {
                debug!("Ignoring malformed loopback request: {}", e);
                continue;
            }
        };

        match parse_callback(&target) {
            Some(Ok(params)) => {
                respond(&mut stream, SUCCESS_PAGE).await;
                return Ok(params);
            }
            Some(Err(err)) => {
                respond(&mut stream, FAILURE_PAGE).await;
                return Err(err);
            }
            // Browsers also ask for /favicon.ico and the like
            None => respond_not_found(&mut stream).await,
        }
    }
}

/// `None` when the target carries neither a code nor an error
pub fn parse_callback(target: &str) -> Option<Result<CallbackParams>> {
    let url = Url::parse("http://localhost").ok()?.join(target).ok()?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        let message = match description {
            Some(description) => format!("{}: {}", error, description),
            None => error,
        };
        return Some(Err(DynamicsError::authentication(format!(
            "Sign-in was not completed ({})",
            message
        ))));
    }

    code.map(|code| Ok(CallbackParams { code, state }))
}

async fn read_request_target(stream: &mut TcpStream) -> std::io::Result<Option<String>> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    while !buf.windows(2).any(|w| w == b"\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > MAX_REQUEST_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "request line too long",
            ));
        }
    }

    let text = String::from_utf8_lossy(&buf);
    let request_line = text.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Ok(Some(target.to_string())),
        _ => Ok(None),
    }
}

async fn respond(stream: &mut TcpStream, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!("Failed to write loopback response: {}", e);
    }
    let _ = stream.shutdown().await;
}

async fn respond_not_found(stream: &mut TcpStream) {
    let response = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use oauth2::PkceCodeVerifier;

    fn params(challenge: PkceCodeChallenge) -> AuthorizationParams {
        AuthorizationParams {
            authorize_endpoint: "https://login.microsoftonline.com/tid/oauth2/v2.0/authorize".into(),
            client_id: "client".into(),
            scope: "https://org.crm4.dynamics.com/user_impersonation openid".into(),
            state: "abc".into(),
            code_challenge: challenge,
        }
    }

    #[test]
    fn test_authorize_url_uses_s256_challenge() {
        let verifier = PkceCodeVerifier::new("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string());
        let challenge = PkceCodeChallenge::from_code_verifier_sha256(&verifier);
        let url = params(challenge).authorize_url("http://localhost:5000").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(pairs.contains(&(
            "code_challenge".into(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM".into()
        )));
        assert!(pairs.contains(&("code_challenge_method".into(), "S256".into())));
    }

    #[test]
    fn test_authorize_url_carries_state_and_redirect() {
        let (challenge, _) = PkceCodeChallenge::new_random_sha256();
        let url = params(challenge).authorize_url("http://localhost:5000").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(url.as_str().starts_with("https://login.microsoftonline.com/tid/oauth2/v2.0/authorize?"));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("client_id".into(), "client".into())));
        assert!(pairs.contains(&("state".into(), "abc".into())));
        assert!(pairs.contains(&("redirect_uri".into(), "http://localhost:5000".into())));
        assert!(pairs.contains(&("response_mode".into(), "query".into())));
        assert!(pairs.contains(&(
            "scope".into(),
            "https://org.crm4.dynamics.com/user_impersonation openid".into()
        )));
    }

    #[test]
    fn test_invalid_authorize_endpoint() {
        let (challenge, _) = PkceCodeChallenge::new_random_sha256();
        let mut bad = params(challenge);
        bad.authorize_endpoint = "not a url".into();
        assert!(matches!(
            bad.authorize_url("http://localhost:5000"),
            Err(DynamicsError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_callback_code() {
        let parsed = parse_callback("/?code=abc%2F123&state=xyz").unwrap().unwrap();
        assert_eq!(parsed.code, "abc/123");
        assert_eq!(parsed.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_parse_callback_error() {
        let parsed = parse_callback("/?error=access_denied&error_description=User+cancelled&state=xyz");
        match parsed {
            Some(Err(DynamicsError::Authentication(msg))) => {
                assert!(msg.contains("access_denied"));
                assert!(msg.contains("User cancelled"));
            }
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_callback_ignores_unrelated_paths() {
        assert!(parse_callback("/favicon.ico").is_none());
    }

    async fn send_request(port: u16, target: &str) {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", target);
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        let _ = stream.read_to_end(&mut response).await;
    }

    #[tokio::test]
    async fn test_wait_for_callback_skips_favicon() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let client = tokio::spawn(async move {
            send_request(port, "/favicon.ico").await;
            send_request(port, "/?code=the-code&state=s1").await;
        });

        let params = wait_for_callback(&listener, Duration::from_secs(5)).await.unwrap();
        client.await.unwrap();
        assert_eq!(params.code, "the-code");
        assert_eq!(params.state.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_wait_for_callback_access_denied() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let client = tokio::spawn(async move {
            send_request(port, "/?error=access_denied&state=s1").await;
        });

        let result = wait_for_callback(&listener, Duration::from_secs(5)).await;
        client.await.unwrap();
        assert!(matches!(result, Err(DynamicsError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_wait_for_callback_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let result = wait_for_callback(&listener, Duration::from_millis(50)).await;
        match result {
            Err(DynamicsError::Authentication(msg)) => assert!(msg.contains("Timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
