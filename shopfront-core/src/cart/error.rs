use reqwest::StatusCode;
use shopfront_sdk::client::ClientError;
use shopfront_sdk::objects::LineId;
use thiserror::Error;

/// Errors returned by cart mutations.
///
/// These are meant to be displayed: each variant tells the caller which
/// affordance to show (login redirect, inline prompt, stock notice, retry).
#[derive(Debug, Error)]
pub enum CartError {
    /// No valid session; send the user to the login entry point.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The request lacked variant or quantity context.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// Availability changed under the line. The line has been rolled back to
    /// its last confirmed quantity.
    #[error("stock conflict on line {line_id}: {message}")]
    StockConflict {
        line_id: LineId,
        available: Option<u32>,
        message: String,
    },

    /// The server refused the request; `message` is its own wording.
    #[error("{message}")]
    Rejected { message: String },

    #[error("cart line not found: {0}")]
    LineNotFound(LineId),

    /// Transport failure, server error or undecodable response.
    #[error("network error: {0}")]
    Transient(#[source] ClientError),
}

impl CartError {
    /// Classify a client error. `line_id` is the line the request was about,
    /// when there is one; only then can a conflict be a stock conflict.
    pub(crate) fn from_client(err: ClientError, line_id: Option<&LineId>) -> Self {
        match line_id {
            _ if err.is_unauthorized() => CartError::NotAuthenticated,
            Some(id) if err.is_stock_conflict() => CartError::StockConflict {
                line_id: id.clone(),
                available: err.available_stock(),
                message: err.server_message(),
            },
            _ if err.is_rejection() => CartError::Rejected {
                message: err.server_message(),
            },
            _ => CartError::Transient(err),
        }
    }

    /// Classify a failed add. A bad request there means the product or
    /// variant choice was refused, which the caller prompts for inline.
    pub(crate) fn from_add(err: ClientError) -> Self {
        if err.status() == Some(StatusCode::BAD_REQUEST) {
            return CartError::InvalidSelection(err.server_message());
        }
        Self::from_client(err, None)
    }

    /// Whether offering a retry makes sense.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CartError::Transient(_))
    }
}
