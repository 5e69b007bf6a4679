//! Client-side cart store.
//!
//! [`CartStore`] mirrors the server-held cart. It is the single writer of the
//! line sequence; views read it through [`CartStore::snapshot`] or a
//! [`watch::Receiver`] from [`CartStore::subscribe`].
//!
//! # Mutation model
//!
//! - `add_to_cart` is confirmed-only: price and stock are validated by the
//!   server before anything is inserted locally.
//! - `update_quantity`, `remove_item` and `remove_selected` are optimistic and
//!   roll back when the server refuses.
//! - Selection toggles are local only.
//!
//! Every local change to a line is stamped with a sequence number drawn from
//! the same counter as cart fetches. Only the response to the most recently
//! issued quantity request for a line may touch that line, and a fetch
//! response never overwrites a line changed after the fetch was issued or
//! one with an update still in flight. A slow response can therefore never
//! overwrite a newer one.

mod backend;
mod error;
mod snapshot;

pub use backend::CartBackend;
pub use error::CartError;
pub use snapshot::{ALMOST_SOLD_OUT_THRESHOLD, CartSnapshot, SelectedTotals};

use std::collections::HashMap;

use shopfront_sdk::objects::{AddToCartRequest, CartLine, LineId};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// Result of a quantity update that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The server confirmed; this is the line as it now stands.
    Applied(CartLine),
    /// A newer update for the same line took over; this response was
    /// discarded.
    Superseded,
    /// The requested quantity was zero or below, so the line was removed.
    Removed,
}

/// Request bookkeeping. Guarded separately from the published snapshot and
/// never held across a backend call.
#[derive(Debug, Default)]
struct Ledger {
    next_seq: u64,
    /// Latest issued update per line.
    pending: HashMap<LineId, u64>,
    /// Last server-confirmed quantity of lines with an update in flight.
    confirmed: HashMap<LineId, u32>,
    /// Sequence of the latest local change per line. Pruned once a fetch
    /// issued after the change lands.
    touched: HashMap<LineId, u64>,
    fetch_seq: u64,
}

impl Ledger {
    fn issue(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Stamp a local change to `line_id`.
    fn touch(&mut self, line_id: &LineId) -> u64 {
        let seq = self.issue();
        self.touched.insert(line_id.clone(), seq);
        seq
    }

    fn forget(&mut self, line_id: &LineId) {
        self.pending.remove(line_id);
        self.confirmed.remove(line_id);
    }
}

/// Drop lines the server reports with zero quantity and clamp the rest to
/// known stock. Sold-out lines (stock 0) are kept as reported so they can be
/// shown; they cannot be increased.
fn normalize(mut line: CartLine) -> Option<CartLine> {
    if line.quantity == 0 {
        return None;
    }
    if line.available_stock.is_some_and(|s| s > 0) {
        line.quantity = line.clamp_quantity(line.quantity);
    }
    Some(line)
}

pub struct CartStore<B> {
    backend: B,
    state: watch::Sender<CartSnapshot>,
    ledger: Mutex<Ledger>,
}

impl<B: CartBackend> CartStore<B> {
    pub fn new(backend: B) -> Self {
        let (state, _) = watch::channel(CartSnapshot::default());
        Self {
            backend,
            state,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// A copy of the current cart.
    pub fn snapshot(&self) -> CartSnapshot {
        self.state.borrow().clone()
    }

    /// Receive every change to the cart.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.state.subscribe()
    }

    pub fn selected_totals(&self) -> SelectedTotals {
        self.state.borrow().selected_totals()
    }

    pub fn almost_sold_out_count(&self) -> usize {
        self.state.borrow().almost_sold_out_count()
    }

    // -- Server reconciliation ---------------------------------------------

    /// Replace the local cart with the server's.
    ///
    /// Failures are logged and leave the previous lines in place; the next
    /// navigation is expected to try again. If fetches overlap, only the most
    /// recently started one applies its response. Lines changed locally after
    /// the fetch was issued, and lines with an update in flight, keep their
    /// local state.
    pub async fn fetch_cart(&self) {
        if !self.backend.is_authenticated() {
            debug!("Skipping cart fetch without a session");
            return;
        }

        let seq = {
            let mut ledger = self.ledger.lock().await;
            let seq = ledger.issue();
            ledger.fetch_seq = seq;
            seq
        };
        self.state.send_modify(|s| s.loading = true);

        let result = self.backend.fetch_cart().await;

        let mut ledger = self.ledger.lock().await;
        if ledger.fetch_seq != seq {
            debug!(seq, "Discarding response of superseded cart fetch");
            return;
        }

        match result {
            Ok(response) => {
                let Ledger {
                    pending,
                    confirmed,
                    touched,
                    ..
                } = &mut *ledger;
                touched.retain(|_, changed| *changed > seq);
                let keeps_local =
                    |id: &LineId| touched.contains_key(id) || pending.contains_key(id);

                self.state.send_modify(|s| {
                    let previous = std::mem::take(&mut s.lines);
                    let mut lines = Vec::with_capacity(response.items.len());
                    for mut line in response.items.into_iter().filter_map(normalize) {
                        let old = previous.iter().find(|l| l.id == line.id);
                        if keeps_local(&line.id) {
                            // Absent locally means removed after the fetch
                            // was issued.
                            if let Some(old) = old {
                                if !touched.contains_key(&line.id) {
                                    confirmed.insert(line.id.clone(), line.quantity);
                                }
                                lines.push(old.clone());
                            }
                            continue;
                        }
                        // Selection is client-side state; keep what the
                        // user chose for lines we already knew.
                        if let Some(old) = old {
                            line.is_selected = old.is_selected;
                        }
                        lines.push(line);
                    }
                    // Lines added locally after the fetch was issued.
                    for old in previous {
                        if keeps_local(&old.id) && !lines.iter().any(|l| l.id == old.id) {
                            lines.push(old);
                        }
                    }
                    s.lines = lines;
                    s.loading = false;
                });
                info!(lines = self.state.borrow().lines.len(), "Cart fetched");
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch cart, keeping previous state");
                self.state.send_modify(|s| s.loading = false);
            }
        }
    }

    // -- Mutations ---------------------------------------------------------

    /// Add `quantity` units of a product (and variant) to the cart.
    ///
    /// Nothing changes locally until the server confirms. The confirmed line
    /// replaces any existing line for the same product/variant pair, so a
    /// repeated add accumulates quantity on one line.
    pub async fn add_to_cart(
        &self,
        product_id: &str,
        variant_id: Option<&str>,
        quantity: u32,
    ) -> Result<CartLine, CartError> {
        if product_id.trim().is_empty() {
            return Err(CartError::InvalidSelection("a product is required".into()));
        }
        if variant_id.is_some_and(|v| v.trim().is_empty()) {
            return Err(CartError::InvalidSelection("select a variant first".into()));
        }
        if quantity == 0 {
            return Err(CartError::InvalidSelection(
                "quantity must be at least 1".into(),
            ));
        }
        if !self.backend.is_authenticated() {
            return Err(CartError::NotAuthenticated);
        }

        let request = AddToCartRequest {
            product_id: product_id.to_owned(),
            variant_id: variant_id.map(str::to_owned),
            quantity,
        };

        let line = match self.backend.add_item(&request).await {
            Ok(line) => line,
            Err(e) => {
                warn!(product_id, ?variant_id, error = %e, "Add to cart failed");
                return Err(CartError::from_add(e));
            }
        };
        let Some(mut line) = normalize(line) else {
            return Err(CartError::Rejected {
                message: "the server returned an empty cart line".into(),
            });
        };
        line.is_selected = true;

        let mut ledger = self.ledger.lock().await;
        ledger.forget(&line.id);
        ledger.touch(&line.id);
        self.state.send_modify(|s| {
            let existing = s.lines.iter_mut().find(|l| {
                l.id == line.id || l.is_item(&line.product_id, line.variant())
            });
            match existing {
                Some(slot) => {
                    line.is_selected = slot.is_selected;
                    *slot = line.clone();
                }
                None => s.lines.push(line.clone()),
            }
        });
        drop(ledger);

        info!(line_id = %line.id, product_id, quantity = line.quantity, "Added to cart");
        Ok(line)
    }

    /// Flip the selection of one line. Local only.
    ///
    /// Returns the new selection state.
    pub fn toggle_selection(&self, line_id: &LineId) -> Result<bool, CartError> {
        let mut selected = None;
        self.state.send_if_modified(|s| {
            match s.lines.iter_mut().find(|l| &l.id == line_id) {
                Some(line) => {
                    line.is_selected = !line.is_selected;
                    selected = Some(line.is_selected);
                    true
                }
                None => false,
            }
        });
        selected.ok_or_else(|| CartError::LineNotFound(line_id.clone()))
    }

    /// Select every line, or deselect every line if all are already
    /// selected. Local only.
    pub fn toggle_select_all(&self) {
        self.state.send_modify(|s| {
            let select = !s.all_selected();
            for line in &mut s.lines {
                line.is_selected = select;
            }
        });
    }

    /// Set a line's quantity.
    ///
    /// Zero or below removes the line. Otherwise the quantity is clamped to
    /// `[1, available_stock]`, applied immediately and confirmed with the
    /// server. A refusal rolls the line back to its last confirmed quantity.
    pub async fn update_quantity(
        &self,
        line_id: &LineId,
        new_quantity: i64,
    ) -> Result<UpdateOutcome, CartError> {
        if new_quantity <= 0 {
            self.remove_item(line_id).await?;
            return Ok(UpdateOutcome::Removed);
        }
        let requested = u32::try_from(new_quantity).unwrap_or(u32::MAX);

        let (seq, quantity) = {
            let mut ledger = self.ledger.lock().await;
            let (current, target) = {
                let state = self.state.borrow();
                let line = state
                    .line(line_id)
                    .ok_or_else(|| CartError::LineNotFound(line_id.clone()))?;
                (line.quantity, line.clamp_quantity(requested))
            };
            if target == 0 {
                return Err(CartError::StockConflict {
                    line_id: line_id.clone(),
                    available: Some(0),
                    message: "this item is sold out".into(),
                });
            }

            ledger.confirmed.entry(line_id.clone()).or_insert(current);
            let seq = ledger.touch(line_id);
            ledger.pending.insert(line_id.clone(), seq);

            self.state.send_modify(|s| {
                if let Some(line) = s.lines.iter_mut().find(|l| &l.id == line_id) {
                    line.quantity = target;
                }
            });
            (seq, target)
        };

        debug!(%line_id, seq, quantity, requested, "Updating quantity");
        let result = self.backend.update_quantity(line_id, quantity).await;

        let mut ledger = self.ledger.lock().await;
        let latest = ledger.pending.get(line_id) == Some(&seq);

        match result {
            Ok(server_line) if !latest => {
                // Still useful as the new rollback point if a newer request
                // for this line is in flight.
                if ledger.pending.contains_key(line_id) {
                    ledger
                        .confirmed
                        .insert(line_id.clone(), server_line.quantity);
                }
                debug!(%line_id, seq, "Discarding superseded quantity confirmation");
                Ok(UpdateOutcome::Superseded)
            }
            Err(e) if !latest => {
                debug!(%line_id, seq, error = %e, "Discarding superseded quantity failure");
                Ok(UpdateOutcome::Superseded)
            }
            Ok(server_line) => {
                ledger.forget(line_id);
                ledger.touch(line_id);
                let applied = normalize(server_line);
                self.state.send_modify(|s| {
                    let Some(pos) = s.lines.iter().position(|l| &l.id == line_id) else {
                        return;
                    };
                    match &applied {
                        Some(line) => {
                            if let Some(slot) = s.lines.get_mut(pos) {
                                let is_selected = slot.is_selected;
                                *slot = line.clone();
                                slot.is_selected = is_selected;
                            }
                        }
                        None => {
                            s.lines.remove(pos);
                        }
                    }
                });
                match self.state.borrow().line(line_id) {
                    Some(line) => Ok(UpdateOutcome::Applied(line.clone())),
                    None => Ok(UpdateOutcome::Removed),
                }
            }
            Err(e) => {
                let confirmed = ledger.confirmed.remove(line_id);
                ledger.pending.remove(line_id);
                ledger.touch(line_id);
                let err = CartError::from_client(e, Some(line_id));
                let available = match &err {
                    CartError::StockConflict { available, .. } => *available,
                    _ => None,
                };

                self.state.send_modify(|s| {
                    if let Some(line) = s.lines.iter_mut().find(|l| &l.id == line_id) {
                        if let Some(quantity) = confirmed {
                            line.quantity = quantity;
                        }
                        if available.is_some() {
                            line.available_stock = available;
                        }
                    }
                });
                warn!(
                    %line_id,
                    rolled_back_to = ?confirmed,
                    error = %err,
                    "Quantity update refused, rolled back"
                );
                Err(err)
            }
        }
    }

    /// Remove one line. Restored if the server refuses.
    pub async fn remove_item(&self, line_id: &LineId) -> Result<(), CartError> {
        let removed = {
            let mut ledger = self.ledger.lock().await;
            let mut removed = None;
            self.state.send_if_modified(|s| {
                let Some(pos) = s.lines.iter().position(|l| &l.id == line_id) else {
                    return false;
                };
                removed = Some((pos, s.lines.remove(pos)));
                true
            });
            let removed = removed.ok_or_else(|| CartError::LineNotFound(line_id.clone()))?;
            ledger.forget(line_id);
            ledger.touch(line_id);
            removed
        };

        let result = self.backend.remove_lines(std::slice::from_ref(line_id)).await;
        let mut ledger = self.ledger.lock().await;
        ledger.touch(line_id);
        match result {
            Ok(()) => {
                info!(%line_id, "Removed cart line");
                Ok(())
            }
            Err(e) => {
                warn!(%line_id, error = %e, "Remove failed, restoring line");
                self.restore(vec![removed]);
                Err(CartError::from_client(e, Some(line_id)))
            }
        }
    }

    /// Remove every selected line in one request.
    ///
    /// Returns how many lines were removed. All of them are restored if the
    /// server refuses.
    pub async fn remove_selected(&self) -> Result<usize, CartError> {
        let removed = {
            let mut ledger = self.ledger.lock().await;
            let mut removed = Vec::new();
            self.state.send_if_modified(|s| {
                let mut kept = Vec::with_capacity(s.lines.len());
                for (pos, line) in std::mem::take(&mut s.lines).into_iter().enumerate() {
                    if line.is_selected {
                        removed.push((pos, line));
                    } else {
                        kept.push(line);
                    }
                }
                s.lines = kept;
                !removed.is_empty()
            });
            for (_, line) in &removed {
                ledger.forget(&line.id);
                ledger.touch(&line.id);
            }
            removed
        };

        if removed.is_empty() {
            return Ok(0);
        }

        let ids: Vec<LineId> = removed.iter().map(|(_, l)| l.id.clone()).collect();
        let result = self.backend.remove_lines(&ids).await;
        let mut ledger = self.ledger.lock().await;
        for id in &ids {
            ledger.touch(id);
        }
        match result {
            Ok(()) => {
                info!(count = ids.len(), "Removed selected cart lines");
                Ok(ids.len())
            }
            Err(e) => {
                warn!(count = ids.len(), error = %e, "Bulk remove failed, restoring lines");
                self.restore(removed);
                Err(CartError::from_client(e, None))
            }
        }
    }

    /// Put removed lines back at their former positions (ascending), unless
    /// a line with the same id has reappeared meanwhile.
    fn restore(&self, removed: Vec<(usize, CartLine)>) {
        self.state.send_modify(|s| {
            for (pos, line) in removed {
                if s.lines.iter().any(|l| l.id == line.id) {
                    continue;
                }
                let pos = pos.min(s.lines.len());
                s.lines.insert(pos, line);
            }
        });
    }
}

#[cfg(test)]
mod tests;
