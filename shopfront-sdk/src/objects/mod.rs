pub mod cart;
pub mod error;
pub mod notification;

pub use cart::{
    AddToCartRequest, CartLine, CartResponse, LineId, RemoveLinesRequest, UpdateQuantityRequest,
};
pub use error::ApiErrorBody;
pub use notification::{
    Notification, NotificationId, Priority, PushFrame, UnreadCountResponse,
};

use serde::{Deserialize, Deserializer};

/// Accept an identifier sent either as a JSON string or as a JSON integer.
///
/// Backends are inconsistent about this, and ids are opaque on the client
/// side anyway.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Uint(n) => n.to_string(),
    })
}

/// Same as [`string_or_number`] but for optional fields.
pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Str(s)) => Some(s),
        Some(Raw::Int(n)) => Some(n.to_string()),
        Some(Raw::Uint(n)) => Some(n.to_string()),
        None => None,
    })
}
