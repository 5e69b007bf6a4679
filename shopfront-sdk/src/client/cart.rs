//! Cart API client.

use reqwest::Method;

use super::{ApiClient, ClientError, expect_success, parse_response};
use crate::objects::cart::{
    AddToCartRequest, CartLine, CartResponse, LineId, RemoveLinesRequest, UpdateQuantityRequest,
};

/// Typed HTTP client for the cart endpoints.
#[derive(Debug, Clone)]
pub struct CartClient {
    api: ApiClient,
}

impl CartClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// `GET /api/cart` – the full cart of the signed-in user.
    pub async fn fetch_cart(&self) -> Result<CartResponse, ClientError> {
        let resp = self.api.request(Method::GET, "/api/cart")?.send().await?;
        parse_response(resp).await
    }

    /// `POST /api/cart/items` – add a product, returning the resulting line.
    ///
    /// When the pair is already in the cart the server returns the existing
    /// line with its accumulated quantity.
    pub async fn add_item(&self, request: &AddToCartRequest) -> Result<CartLine, ClientError> {
        let resp = self
            .api
            .mutation(Method::POST, "/api/cart/items")?
            .json(request)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `PUT /api/cart/items/{id}` – set a line's quantity.
    pub async fn update_quantity(
        &self,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<CartLine, ClientError> {
        let path = format!(
            "/api/cart/items/{}",
            urlencoding::encode(line_id.as_str())
        );
        let resp = self
            .api
            .mutation(Method::PUT, &path)?
            .json(&UpdateQuantityRequest { quantity })
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `DELETE /api/cart/items` – remove one or more lines.
    pub async fn remove_lines(&self, ids: &[LineId]) -> Result<(), ClientError> {
        let body = RemoveLinesRequest { ids: ids.to_vec() };
        let resp = self
            .api
            .mutation(Method::DELETE, "/api/cart/items")?
            .json(&body)
            .send()
            .await?;
        expect_success(resp).await
    }
}
