//! The materialized cart view and its derived values.
//!
//! Totals are computed from the line sequence on every call and never
//! stored, so they cannot drift from the lines they describe.

use rust_decimal::Decimal;
use shopfront_sdk::objects::{CartLine, LineId};

/// Lines with at most this much stock left count as almost sold out.
pub const ALMOST_SOLD_OUT_THRESHOLD: u32 = 20;

/// Money totals over the selected lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectedTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    /// `discount / subtotal` as a percentage, two decimal places.
    pub discount_percentage: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    /// A cart fetch is in flight.
    pub loading: bool,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, id: &LineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.id == id)
    }

    pub fn selected_lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|l| l.is_selected)
    }

    /// Number of selected lines.
    pub fn selected_count(&self) -> usize {
        self.selected_lines().count()
    }

    /// Units across every line, selected or not.
    pub fn total_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn all_selected(&self) -> bool {
        self.lines.iter().all(|l| l.is_selected)
    }

    pub fn subtotal(&self) -> Decimal {
        self.selected_lines().map(CartLine::line_subtotal).sum()
    }

    pub fn discount_total(&self) -> Decimal {
        self.selected_lines().map(CartLine::line_discount).sum()
    }

    pub fn total(&self) -> Decimal {
        self.subtotal() - self.discount_total()
    }

    pub fn selected_totals(&self) -> SelectedTotals {
        let subtotal = self.subtotal();
        let discount = self.discount_total();
        let discount_percentage = if subtotal.is_zero() {
            Decimal::ZERO
        } else {
            (discount / subtotal * Decimal::ONE_HUNDRED).round_dp(2)
        };
        SelectedTotals {
            subtotal,
            discount,
            total: subtotal - discount,
            discount_percentage,
        }
    }

    /// Lines with `0 < available_stock <= 20`.
    pub fn almost_sold_out_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| {
                l.available_stock
                    .is_some_and(|s| s > 0 && s <= ALMOST_SOLD_OUT_THRESHOLD)
            })
            .count()
    }
}
