use reqwest::StatusCode;
use shopfront_sdk::client::ClientError;
use thiserror::Error;

/// Errors from the server-confirmed inbox operations.
///
/// None of these are fatal; callers typically show a toast and move on.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("notification not found")]
    NotFound,

    #[error("{message}")]
    Rejected { message: String },

    #[error("network error: {0}")]
    Transient(#[source] ClientError),
}

impl From<ClientError> for NotificationError {
    fn from(err: ClientError) -> Self {
        if err.is_unauthorized() {
            NotificationError::NotAuthenticated
        } else if err.status() == Some(StatusCode::NOT_FOUND) {
            NotificationError::NotFound
        } else if err.is_rejection() {
            NotificationError::Rejected {
                message: err.server_message(),
            }
        } else {
            NotificationError::Transient(err)
        }
    }
}
