//! HTTP clients for the storefront API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

mod cart;
mod notification;
mod push;

pub use cart::CartClient;
pub use notification::NotificationClient;
pub use push::{FrameStream, SseConnector, WsConnector};

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use url::Url;
use uuid::Uuid;

use crate::auth::{BearerToken, TokenSource};
use crate::objects::ApiErrorBody;

/// Header carrying a per-mutation id so the backend can deduplicate retries.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Errors produced by the SDK HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// No bearer token is available.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The base URL scheme has no push transport counterpart.
    #[error("unsupported url scheme: {0}")]
    Scheme(String),

    #[error("websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(e))
    }
}

impl ClientError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// The session is missing or was rejected by the server.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::NotAuthenticated)
            || self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// The server refused a quantity because availability changed.
    pub fn is_stock_conflict(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY)
        )
    }

    /// A 4xx other than 401: the request itself was refused.
    pub fn is_rejection(&self) -> bool {
        self.status()
            .is_some_and(|s| s.is_client_error() && s != StatusCode::UNAUTHORIZED)
    }

    /// The structured error body, when the server sent one.
    pub fn error_body(&self) -> Option<ApiErrorBody> {
        match self {
            ClientError::Api { body, .. } => ApiErrorBody::parse(body),
            _ => None,
        }
    }

    /// Stock figure reported alongside a conflict.
    pub fn available_stock(&self) -> Option<u32> {
        self.error_body().and_then(|b| b.available_stock)
    }

    /// Best message to show a user: the server's own text when present.
    pub fn server_message(&self) -> String {
        match self {
            ClientError::Api { body, status } => self
                .error_body()
                .and_then(|b| b.message)
                .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_owned()))
                .unwrap_or_else(|| status.to_string()),
            other => other.to_string(),
        }
    }
}

/// Shared connection details for every storefront API client.
///
/// Each request reads the current token from the [`TokenSource`], so a
/// sign-in or sign-out is picked up without rebuilding clients.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    tokens: TokenSource,
}

impl ApiClient {
    /// Create a new `ApiClient`.
    ///
    /// * `base_url` – root URL of the storefront backend.
    /// * `tokens` – read-only view of the auth session.
    pub fn new(base_url: Url, tokens: TokenSource) -> Self {
        Self {
            http: Client::new(),
            base_url,
            tokens,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenSource {
        &self.tokens
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    fn bearer(&self) -> Result<BearerToken, ClientError> {
        self.tokens.current().ok_or(ClientError::NotAuthenticated)
    }

    /// Authenticated request to `path`.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.bearer()?;
        let url = self.endpoint(path)?;
        Ok(self.http.request(method, url).bearer_auth(token.expose()))
    }

    /// Authenticated request tagged with a fresh request id.
    fn mutation(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let request_id = Uuid::new_v4();
        tracing::debug!(%method, path, %request_id, "Sending mutation");
        Ok(self
            .request(method, path)?
            .header(REQUEST_ID_HEADER, request_id.to_string()))
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}

/// Like [`parse_response`] for endpoints whose success body is an ack.
async fn expect_success(resp: reqwest::Response) -> Result<(), ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    Ok(())
}
