//! Cart API request and response types.
//!
//! Monetary amounts are decimals in the platform's base currency unit. They
//! are accepted as JSON numbers or strings and never treated as integer
//! cents.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::{opt_string_or_number, string_or_number};

/// Identifier of a cart line (not of the product it holds).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LineId(pub String);

impl LineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LineId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        string_or_number(deserializer).map(LineId)
    }
}

fn default_selected() -> bool {
    true
}

/// One line item in the cart.
///
/// `name` and `image_url` are a display snapshot taken when the line was
/// added; they are not kept in sync with the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: LineId,
    #[serde(deserialize_with = "string_or_number")]
    pub product_id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub variant_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    #[serde(default)]
    pub original_unit_price: Option<Decimal>,
    #[serde(default)]
    pub discount_percent: Option<Decimal>,
    pub quantity: u32,
    /// New lines count towards checkout unless the user deselects them.
    #[serde(default = "default_selected")]
    pub is_selected: bool,
    /// Server-reported stock, `None` when the backend did not say.
    #[serde(default)]
    pub available_stock: Option<u32>,
}

impl CartLine {
    /// The variant id with blank values folded into `None`.
    pub fn variant(&self) -> Option<&str> {
        self.variant_id.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// Whether this line holds the given product/variant pair.
    pub fn is_item(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        let variant_id = variant_id.filter(|v| !v.trim().is_empty());
        self.product_id == product_id && self.variant() == variant_id
    }

    /// Clamp a requested quantity into `[1, available_stock]`.
    ///
    /// With unknown stock only the lower bound applies. With a known stock of
    /// zero the result is zero, which callers must treat as unsatisfiable.
    pub fn clamp_quantity(&self, requested: u32) -> u32 {
        let requested = requested.max(1);
        match self.available_stock {
            Some(stock) => requested.min(stock),
            None => requested,
        }
    }

    /// `unit_price × quantity`.
    pub fn line_subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Amount taken off [`line_subtotal`](Self::line_subtotal) by
    /// `discount_percent`.
    pub fn line_discount(&self) -> Decimal {
        match self.discount_percent {
            Some(pct) if pct > Decimal::ZERO => self.line_subtotal() * pct / Decimal::ONE_HUNDRED,
            _ => Decimal::ZERO,
        }
    }
}

/// `GET /api/cart` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    #[serde(default)]
    pub items: Vec<CartLine>,
    /// Server-side total. Informational only; the client derives its own.
    #[serde(default)]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub item_count: Option<u32>,
}

/// `POST /api/cart/items` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub quantity: u32,
}

/// `PUT /api/cart/items/{id}` request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// `DELETE /api/cart/items` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLinesRequest {
    pub ids: Vec<LineId>,
}
