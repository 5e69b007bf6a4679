//! Notification API client.
//!
//! Read/unread/delete operations are independent of the push stream; the
//! stream itself is opened through [`SseConnector`](super::SseConnector) or
//! [`WsConnector`](super::WsConnector).

use reqwest::Method;

use super::{ApiClient, ClientError, expect_success, parse_response};
use crate::objects::notification::{NotificationId, UnreadCountResponse};

#[derive(Debug, Clone)]
pub struct NotificationClient {
    api: ApiClient,
}

impl NotificationClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// `GET /api/notifications/unread-count`
    pub async fn unread_count(&self) -> Result<u64, ClientError> {
        let resp = self
            .api
            .request(Method::GET, "/api/notifications/unread-count")?
            .send()
            .await?;
        let body: UnreadCountResponse = parse_response(resp).await?;
        Ok(body.count)
    }

    /// `PUT /api/notifications/{id}/read`
    pub async fn mark_read(&self, id: &NotificationId) -> Result<(), ClientError> {
        let path = format!(
            "/api/notifications/{}/read",
            urlencoding::encode(id.as_str())
        );
        let resp = self.api.mutation(Method::PUT, &path)?.send().await?;
        expect_success(resp).await
    }

    /// `PUT /api/notifications/read-all`
    pub async fn mark_all_read(&self) -> Result<(), ClientError> {
        let resp = self
            .api
            .mutation(Method::PUT, "/api/notifications/read-all")?
            .send()
            .await?;
        expect_success(resp).await
    }

    /// `DELETE /api/notifications/{id}`
    pub async fn delete(&self, id: &NotificationId) -> Result<(), ClientError> {
        let path = format!("/api/notifications/{}", urlencoding::encode(id.as_str()));
        let resp = self.api.mutation(Method::DELETE, &path)?.send().await?;
        expect_success(resp).await
    }

    /// `DELETE /api/notifications/read` – drop every read notification.
    pub async fn clear_read(&self) -> Result<(), ClientError> {
        let resp = self
            .api
            .mutation(Method::DELETE, "/api/notifications/read")?
            .send()
            .await?;
        expect_success(resp).await
    }
}
