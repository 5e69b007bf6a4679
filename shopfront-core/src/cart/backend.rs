use async_trait::async_trait;
use shopfront_sdk::client::{CartClient, ClientError};
use shopfront_sdk::objects::{AddToCartRequest, CartLine, CartResponse, LineId};

/// Server side of the cart as seen by [`CartStore`](super::CartStore).
///
/// Implemented by the SDK's [`CartClient`]; tests substitute in-process
/// fakes.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Whether a session token is currently available.
    fn is_authenticated(&self) -> bool;

    async fn fetch_cart(&self) -> Result<CartResponse, ClientError>;

    async fn add_item(&self, request: &AddToCartRequest) -> Result<CartLine, ClientError>;

    async fn update_quantity(
        &self,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<CartLine, ClientError>;

    async fn remove_lines(&self, ids: &[LineId]) -> Result<(), ClientError>;
}

#[async_trait]
impl CartBackend for CartClient {
    fn is_authenticated(&self) -> bool {
        self.api().tokens().is_authenticated()
    }

    async fn fetch_cart(&self) -> Result<CartResponse, ClientError> {
        CartClient::fetch_cart(self).await
    }

    async fn add_item(&self, request: &AddToCartRequest) -> Result<CartLine, ClientError> {
        CartClient::add_item(self, request).await
    }

    async fn update_quantity(
        &self,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<CartLine, ClientError> {
        CartClient::update_quantity(self, line_id, quantity).await
    }

    async fn remove_lines(&self, ids: &[LineId]) -> Result<(), ClientError> {
        CartClient::remove_lines(self, ids).await
    }
}
