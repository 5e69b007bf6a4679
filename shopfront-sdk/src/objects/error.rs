//! Error bodies returned by the storefront API.

use serde::{Deserialize, Serialize};

/// JSON error body. Backends use either `message` or `error` for the text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, alias = "error")]
    pub message: Option<String>,
    /// Present on stock conflicts: what the server can actually supply now.
    #[serde(default)]
    pub available_stock: Option<u32>,
}

impl ApiErrorBody {
    /// Parse an error body, returning `None` if it is not a JSON object.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}
