//! OAuth callback: exchange a temporary code for a token pair
//!
//! The flow runs once per callback: fetch a CSRF token, POST the temp code,
//! persist both tokens. Failures land on the error screen and are not retried.

use crate::error::{AuthError, Error, Result};
use crate::store::{keys, KeyValueStore};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const CSRF_PATH: &str = "/api/v1/csrf-token";
pub const EXCHANGE_PATH: &str = "/exchange-temp-code";
pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";
pub const GENERIC_EXCHANGE_ERROR: &str = "Failed to exchange code";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Backend calls used by the callback flow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Current CSRF token, if the server issued one
    async fn csrf_token(&self) -> Result<Option<String>>;

    async fn exchange(&self, temp_code: &str, csrf_token: &str) -> Result<TokenPair>;
}

#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    temp_code: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ExchangeResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CsrfResponse {
    csrf_token: Option<String>,
}

/// Token exchange against the chat backend over HTTP
pub struct HttpTokenExchange {
    client: Client,
    server_url: String,
}

impl HttpTokenExchange {
    pub fn new(server_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    async fn csrf_token(&self) -> Result<Option<String>> {
        let url = format!("{}{}", self.server_url, CSRF_PATH);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AuthError::Csrf(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Csrf(format!("HTTP {}", response.status())).into());
        }

        if let Some(cookie) = response.cookies().find(|c| c.name() == CSRF_COOKIE) {
            return Ok(Some(cookie.value().to_string()));
        }

        // Some deployments return the token in the body instead
        let body: CsrfResponse = response.json().await.unwrap_or_default();
        Ok(body.csrf_token)
    }

    async fn exchange(&self, temp_code: &str, csrf_token: &str) -> Result<TokenPair> {
        let url = format!("{}{}", self.server_url, EXCHANGE_PATH);
        debug!("Exchanging temp code at {}", url);

        let response = self
            .client
            .post(&url)
            .header(CSRF_HEADER, csrf_token)
            .json(&ExchangeRequest { temp_code })
            .send()
            .await?;

        let status = response.status();
        let body: ExchangeResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Unreadable exchange response ({}): {}", status, e);
                return Err(AuthError::Rejected(GENERIC_EXCHANGE_ERROR.to_string()).into());
            }
        };

        if !status.is_success() {
            let message = body
                .error
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_EXCHANGE_ERROR.to_string());
            return Err(AuthError::Rejected(message).into());
        }

        match (body.access_token, body.refresh_token) {
            (Some(access_token), Some(refresh_token)) => Ok(TokenPair {
                access_token,
                refresh_token,
            }),
            _ => Err(AuthError::Rejected(GENERIC_EXCHANGE_ERROR.to_string()).into()),
        }
    }
}

/// Read `temp_code` from a callback URL's query string
pub fn temp_code_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == "temp_code")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// What the callback screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScreen {
    Processing,
    Error(String),
    Authenticated { access_token: String },
}

impl AuthScreen {
    pub fn title(&self) -> &str {
        match self {
            AuthScreen::Processing => "Processing authentication...",
            AuthScreen::Error(_) => "Error",
            AuthScreen::Authenticated { .. } => "Successfully Authenticated!",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            AuthScreen::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Label of the button leading back to the chat
    pub fn action_label(&self) -> Option<&'static str> {
        match self {
            AuthScreen::Authenticated { .. } => Some("Go to Chat"),
            _ => None,
        }
    }
}

/// One OAuth callback
pub struct AuthCallback<T: TokenExchange> {
    store: Arc<dyn KeyValueStore>,
    exchange: T,
    screen: AuthScreen,
    attempted: bool,
}

impl<T: TokenExchange> AuthCallback<T> {
    pub fn new(store: Arc<dyn KeyValueStore>, exchange: T) -> Self {
        Self {
            store,
            exchange,
            screen: AuthScreen::Processing,
            attempted: false,
        }
    }

    pub fn screen(&self) -> &AuthScreen {
        &self.screen
    }

    /// Run the exchange; later calls return the first outcome
    pub async fn run(&mut self, temp_code: Option<&str>) -> &AuthScreen {
        if self.attempted {
            return &self.screen;
        }
        self.attempted = true;

        self.screen = match self.exchange_and_persist(temp_code).await {
            Ok(pair) => {
                info!("Authentication completed");
                AuthScreen::Authenticated {
                    access_token: pair.access_token,
                }
            }
            Err(e) => {
                warn!("Authentication failed: {}", e);
                AuthScreen::Error(screen_message(&e))
            }
        };
        &self.screen
    }

    async fn exchange_and_persist(&self, temp_code: Option<&str>) -> Result<TokenPair> {
        let temp_code = temp_code
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCode)?;

        let csrf = self.exchange.csrf_token().await?.unwrap_or_default();
        let pair = self.exchange.exchange(temp_code, &csrf).await?;

        self.store.set(keys::ACCESS_TOKEN, &pair.access_token)?;
        self.store.set(keys::REFRESH_TOKEN, &pair.refresh_token)?;
        Ok(pair)
    }
}

fn screen_message(err: &Error) -> String {
    match err {
        Error::Auth(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn pair() -> TokenPair {
        TokenPair {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_exchange_persists_tokens() {
        let store = Arc::new(MemoryStore::new());
        let mut exchange = MockTokenExchange::new();
        exchange
            .expect_csrf_token()
            .times(1)
            .returning(|| Ok(Some("csrf-1".to_string())));
        exchange
            .expect_exchange()
            .with(eq("code-1"), eq("csrf-1"))
            .times(1)
            .returning(|_, _| Ok(pair()));

        let mut callback = AuthCallback::new(store.clone(), exchange);
        assert_eq!(callback.screen(), &AuthScreen::Processing);

        let screen = callback.run(Some("code-1")).await.clone();
        assert_eq!(
            screen,
            AuthScreen::Authenticated {
                access_token: "access-1".to_string()
            }
        );
        assert_eq!(screen.action_label(), Some("Go to Chat"));
        assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("access-1"));
        assert_eq!(store.get(keys::REFRESH_TOKEN).unwrap().as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn test_missing_code_makes_no_requests() {
        let store = Arc::new(MemoryStore::new());
        let mut exchange = MockTokenExchange::new();
        exchange.expect_csrf_token().never();
        exchange.expect_exchange().never();

        let mut callback = AuthCallback::new(store.clone(), exchange);
        let screen = callback.run(None).await;
        assert_eq!(screen, &AuthScreen::Error("No temporary code provided".to_string()));
        assert!(store.get(keys::ACCESS_TOKEN).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_message_is_shown_verbatim() {
        let store = Arc::new(MemoryStore::new());
        let mut exchange = MockTokenExchange::new();
        exchange.expect_csrf_token().returning(|| Ok(None));
        exchange
            .expect_exchange()
            .with(eq("stale"), eq(""))
            .times(1)
            .returning(|_, _| Err(AuthError::Rejected("Invalid or expired code".to_string()).into()));

        let mut callback = AuthCallback::new(store.clone(), exchange);
        let screen = callback.run(Some("stale")).await;
        assert_eq!(screen.title(), "Error");
        assert_eq!(screen.detail(), Some("Invalid or expired code"));
        assert!(store.get(keys::REFRESH_TOKEN).unwrap().is_none());
    }

    #[test]
    fn test_failure_is_not_retried() {
        let store = Arc::new(MemoryStore::new());
        let mut exchange = MockTokenExchange::new();
        exchange.expect_csrf_token().times(1).returning(|| Ok(None));
        exchange
            .expect_exchange()
            .times(1)
            .returning(|_, _| Err(AuthError::Transport("connection refused".to_string()).into()));

        let mut callback = AuthCallback::new(store, exchange);
        tokio_test::block_on(callback.run(Some("code")));
        let screen = tokio_test::block_on(callback.run(Some("code")));
        assert_eq!(screen, &AuthScreen::Error("connection refused".to_string()));
    }

    #[test]
    fn test_temp_code_from_url() {
        assert_eq!(
            temp_code_from_url("http://localhost:5001/auth-callback?temp_code=abc%20d&x=1"),
            Some("abc d".to_string())
        );
        assert_eq!(temp_code_from_url("http://localhost:5001/auth-callback?temp_code="), None);
        assert_eq!(temp_code_from_url("http://localhost:5001/auth-callback"), None);
        assert_eq!(temp_code_from_url("not a url"), None);
    }

    /// Serve one canned HTTP response on a loopback port
    async fn respond_once(response: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_non_json_exchange_body_shows_generic_message() {
        let server = respond_once(
            "HTTP/1.1 502 Bad Gateway\r\nContent-Type: text/html\r\nContent-Length: 11\r\nConnection: close\r\n\r\n<h1>502</h1",
        )
        .await;

        let exchange = HttpTokenExchange::new(server).unwrap();
        let err = exchange.exchange("code", "csrf").await.unwrap_err();
        assert_eq!(screen_message(&err), GENERIC_EXCHANGE_ERROR);
    }

    #[test]
    fn test_http_exchange_trims_server_url() {
        let exchange = HttpTokenExchange::new("http://localhost:5001/").unwrap();
        assert_eq!(exchange.server_url(), "http://localhost:5001");
    }
}
