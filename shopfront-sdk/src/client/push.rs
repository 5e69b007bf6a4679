//! Push stream transports for live notifications.
//!
//! Both transports authenticate with a `token` query parameter, since
//! browsers' streaming APIs cannot set headers and backends accept the same
//! convention from every client. Each yields the raw payload of every frame;
//! decoding is left to [`PushFrame::parse`](crate::objects::PushFrame::parse).

use futures_util::stream::{self, BoxStream, StreamExt};
use reqwest::header::ACCEPT;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::{ApiClient, ClientError};
use crate::sse::SseDecoder;

/// Default path of the notification stream.
pub const NOTIFICATION_STREAM_PATH: &str = "/api/notifications/stream";

/// Raw frame payloads; ends when the server closes the stream.
pub type FrameStream = BoxStream<'static, Result<String, ClientError>>;

fn stream_url(api: &ApiClient, path: &str) -> Result<Url, ClientError> {
    let token = api.bearer()?;
    let mut url = api.endpoint(path)?;
    url.query_pairs_mut().append_pair("token", token.expose());
    Ok(url)
}

/// Server-sent events over a long-lived `GET`.
#[derive(Debug, Clone)]
pub struct SseConnector {
    api: ApiClient,
    path: String,
}

impl SseConnector {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            path: NOTIFICATION_STREAM_PATH.to_owned(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Open the stream. Resolves once the response headers arrive, which is
    /// the handshake as far as reconnect logic is concerned.
    pub async fn open(&self) -> Result<FrameStream, ClientError> {
        let url = stream_url(&self.api, &self.path)?;
        let resp = self
            .api
            .http
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }

        let mut decoder = SseDecoder::new();
        let frames = resp
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => decoder
                    .feed(&bytes)
                    .into_iter()
                    .map(|event| Ok(event.data))
                    .collect::<Vec<_>>(),
                Err(e) => vec![Err(ClientError::Http(e))],
            })
            .flat_map(stream::iter);

        Ok(frames.boxed())
    }
}

/// The same stream over a WebSocket, for backends that expose one.
#[derive(Debug, Clone)]
pub struct WsConnector {
    api: ApiClient,
    path: String,
}

impl WsConnector {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            path: NOTIFICATION_STREAM_PATH.to_owned(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub async fn open(&self) -> Result<FrameStream, ClientError> {
        let mut url = stream_url(&self.api, &self.path)?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            "ws" | "wss" => "",
            other => return Err(ClientError::Scheme(other.to_owned())),
        };
        if !scheme.is_empty() {
            url.set_scheme(scheme)
                .map_err(|()| ClientError::Scheme(scheme.to_owned()))?;
        }

        let (socket, _) = tokio_tungstenite::connect_async(url.as_str()).await?;

        let frames = socket.filter_map(|msg| async move {
            match msg {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Binary(bin)) => Some(Ok(String::from_utf8_lossy(&bin).into_owned())),
                // Control frames; tungstenite answers pings itself.
                Ok(_) => None,
                Err(e) => Some(Err(ClientError::from(e))),
            }
        });

        Ok(frames.boxed())
    }
}
