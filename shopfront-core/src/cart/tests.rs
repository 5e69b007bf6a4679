use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use shopfront_sdk::client::ClientError;
use shopfront_sdk::objects::{AddToCartRequest, CartLine, CartResponse, LineId};
use tokio::sync::{mpsc, oneshot};

use super::*;

type Responder = oneshot::Sender<Result<CartLine, ClientError>>;

/// In-process stand-in for the cart API.
///
/// Behaves like a small server by default. With `manual` set, quantity
/// updates are handed to the test, which answers them in any order. A held
/// fetch reads the server lines, then waits for the test to release it.
struct FakeCart {
    authenticated: AtomicBool,
    server: StdMutex<Vec<CartLine>>,
    next_id: AtomicU64,
    new_line_stock: Option<u32>,
    failure: StdMutex<Option<(StatusCode, String)>>,
    manual: Option<mpsc::UnboundedSender<(LineId, u32, Responder)>>,
    fetch_gate: StdMutex<Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
}

impl FakeCart {
    fn new(lines: Vec<CartLine>) -> Self {
        Self {
            authenticated: AtomicBool::new(true),
            server: StdMutex::new(lines),
            next_id: AtomicU64::new(100),
            new_line_stock: Some(50),
            failure: StdMutex::new(None),
            manual: None,
            fetch_gate: StdMutex::new(None),
        }
    }

    /// Hold the next fetch after it has read the server lines. Returns a
    /// receiver that fires once the lines are read and a sender that lets
    /// the fetch respond.
    fn hold_next_fetch(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (taken_tx, taken_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.fetch_gate.lock().unwrap() = Some((taken_tx, release_rx));
        (taken_rx, release_tx)
    }

    fn fail_next(&self, status: StatusCode, body: &str) {
        *self.failure.lock().unwrap() = Some((status, body.to_owned()));
    }

    fn take_failure(&self) -> Result<(), ClientError> {
        match self.failure.lock().unwrap().take() {
            Some((status, body)) => Err(ClientError::Api { status, body }),
            None => Ok(()),
        }
    }

    fn server_lines(&self) -> Vec<CartLine> {
        self.server.lock().unwrap().clone()
    }
}

#[async_trait]
impl CartBackend for FakeCart {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn fetch_cart(&self) -> Result<CartResponse, ClientError> {
        self.take_failure()?;
        let items = self.server_lines();
        let gate = self.fetch_gate.lock().unwrap().take();
        if let Some((taken, release)) = gate {
            taken.send(()).unwrap();
            release.await.unwrap();
        }
        Ok(CartResponse {
            items,
            total: None,
            item_count: None,
        })
    }

    async fn add_item(&self, request: &AddToCartRequest) -> Result<CartLine, ClientError> {
        self.take_failure()?;
        let mut server = self.server.lock().unwrap();
        let variant = request.variant_id.as_deref();
        if let Some(line) = server
            .iter_mut()
            .find(|l| l.is_item(&request.product_id, variant))
        {
            line.quantity += request.quantity;
            return Ok(line.clone());
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let line = CartLine {
            id: LineId::new(format!("L{id}")),
            product_id: request.product_id.clone(),
            variant_id: request.variant_id.clone(),
            name: format!("Product {}", request.product_id),
            image_url: None,
            unit_price: Decimal::from(1000),
            original_unit_price: None,
            discount_percent: None,
            quantity: request.quantity,
            is_selected: true,
            available_stock: self.new_line_stock,
        };
        server.push(line.clone());
        Ok(line)
    }

    async fn update_quantity(
        &self,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<CartLine, ClientError> {
        if let Some(calls) = &self.manual {
            let (tx, rx) = oneshot::channel();
            calls.send((line_id.clone(), quantity, tx)).unwrap();
            return rx.await.unwrap();
        }

        self.take_failure()?;
        let mut server = self.server.lock().unwrap();
        let line = server
            .iter_mut()
            .find(|l| &l.id == line_id)
            .ok_or_else(|| ClientError::Api {
                status: StatusCode::NOT_FOUND,
                body: String::new(),
            })?;
        if let Some(stock) = line.available_stock {
            if quantity > stock {
                return Err(ClientError::Api {
                    status: StatusCode::CONFLICT,
                    body: format!(r#"{{"message":"only {stock} left","available_stock":{stock}}}"#),
                });
            }
        }
        line.quantity = quantity;
        Ok(line.clone())
    }

    async fn remove_lines(&self, ids: &[LineId]) -> Result<(), ClientError> {
        self.take_failure()?;
        self.server.lock().unwrap().retain(|l| !ids.contains(&l.id));
        Ok(())
    }
}

fn line(id: &str, product: &str, price: i64, quantity: u32, stock: Option<u32>) -> CartLine {
    CartLine {
        id: LineId::new(id),
        product_id: product.into(),
        variant_id: Some("V1".into()),
        name: product.into(),
        image_url: None,
        unit_price: Decimal::from(price),
        original_unit_price: None,
        discount_percent: None,
        quantity,
        is_selected: true,
        available_stock: stock,
    }
}

async fn loaded_store(lines: Vec<CartLine>) -> CartStore<FakeCart> {
    let store = CartStore::new(FakeCart::new(lines));
    store.fetch_cart().await;
    store
}

fn ids(store: &CartStore<FakeCart>) -> Vec<String> {
    store
        .snapshot()
        .lines
        .iter()
        .map(|l| l.id.to_string())
        .collect()
}

// -- Reconciliation ---------------------------------------------------------

#[tokio::test]
async fn test_fetch_replaces_lines() {
    let store = loaded_store(vec![line("L1", "P1", 1000, 2, Some(5))]).await;
    let snapshot = store.snapshot();
    assert_eq!(snapshot.lines.len(), 1);
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_fetch_failure_keeps_previous_lines() {
    let store = loaded_store(vec![line("L1", "P1", 1000, 2, Some(5))]).await;
    store.backend().server.lock().unwrap().clear();
    store
        .backend()
        .fail_next(StatusCode::SERVICE_UNAVAILABLE, "down");

    store.fetch_cart().await;

    assert_eq!(ids(&store), vec!["L1"]);
    assert!(!store.snapshot().loading);
}

#[tokio::test]
async fn test_fetch_without_session_is_skipped() {
    let fake = FakeCart::new(vec![line("L1", "P1", 1000, 2, None)]);
    fake.authenticated.store(false, Ordering::SeqCst);
    let store = CartStore::new(fake);
    store.fetch_cart().await;
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_fetch_keeps_local_selection() {
    let store = loaded_store(vec![
        line("L1", "P1", 1000, 1, None),
        line("L2", "P2", 1000, 1, None),
    ])
    .await;
    store.toggle_selection(&LineId::new("L2")).unwrap();

    store.fetch_cart().await;

    let snapshot = store.snapshot();
    assert!(snapshot.lines[0].is_selected);
    assert!(!snapshot.lines[1].is_selected);
}

#[tokio::test]
async fn test_fetch_keeps_line_removed_after_it_was_issued() {
    let store = Arc::new(
        loaded_store(vec![
            line("L1", "P1", 1000, 1, None),
            line("L2", "P2", 1000, 1, None),
        ])
        .await,
    );
    let (taken, release) = store.backend().hold_next_fetch();
    let fetch = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_cart().await }
    });
    taken.await.unwrap();

    store.remove_item(&LineId::new("L1")).await.unwrap();
    release.send(()).unwrap();
    fetch.await.unwrap();

    assert_eq!(ids(&store), vec!["L2"]);
    assert!(!store.snapshot().loading);
}

#[tokio::test]
async fn test_fetch_keeps_quantity_changed_after_it_was_issued() {
    let store = Arc::new(loaded_store(vec![line("L1", "P1", 1000, 1, Some(10))]).await);
    let (taken, release) = store.backend().hold_next_fetch();
    let fetch = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_cart().await }
    });
    taken.await.unwrap();

    let outcome = store.update_quantity(&LineId::new("L1"), 4).await.unwrap();
    assert!(matches!(outcome, UpdateOutcome::Applied(ref l) if l.quantity == 4));
    release.send(()).unwrap();
    fetch.await.unwrap();

    assert_eq!(store.snapshot().lines[0].quantity, 4);

    // A fetch issued after the change sees the server's view again.
    store.fetch_cart().await;
    assert_eq!(store.snapshot().lines[0].quantity, 4);
}

#[tokio::test]
async fn test_fetch_keeps_line_added_after_it_was_issued() {
    let store = Arc::new(loaded_store(vec![line("L1", "P1", 1000, 1, None)]).await);
    let (taken, release) = store.backend().hold_next_fetch();
    let fetch = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_cart().await }
    });
    taken.await.unwrap();

    let added = store.add_to_cart("P2", Some("V1"), 2).await.unwrap();
    release.send(()).unwrap();
    fetch.await.unwrap();

    assert_eq!(ids(&store), vec!["L1".to_owned(), added.id.to_string()]);
}

// -- Add to cart ------------------------------------------------------------

#[tokio::test]
async fn test_add_to_empty_cart() {
    let store = loaded_store(vec![]).await;

    let added = store.add_to_cart("P1", Some("V1"), 3).await.unwrap();

    let snapshot = store.snapshot();
    assert_eq!(snapshot.lines.len(), 1);
    assert_eq!(snapshot.lines[0].quantity, 3);
    assert_eq!(snapshot.lines[0], added);
    assert!(added.is_selected);
    assert_eq!(snapshot.selected_count(), 1);
}

#[tokio::test]
async fn test_adding_same_pair_merges_into_one_line() {
    let store = loaded_store(vec![]).await;

    store.add_to_cart("P1", Some("V1"), 3).await.unwrap();
    store.add_to_cart("P1", Some("V1"), 2).await.unwrap();
    store.add_to_cart("P1", Some("V2"), 1).await.unwrap();

    let snapshot = store.snapshot();
    assert_eq!(snapshot.lines.len(), 2);
    let merged = snapshot
        .lines
        .iter()
        .find(|l| l.is_item("P1", Some("V1")))
        .unwrap();
    assert_eq!(merged.quantity, 5);
}

#[tokio::test]
async fn test_add_rejects_missing_context() {
    let store = loaded_store(vec![]).await;

    assert!(matches!(
        store.add_to_cart("P1", Some("  "), 1).await,
        Err(CartError::InvalidSelection(_))
    ));
    assert!(matches!(
        store.add_to_cart("P1", Some("V1"), 0).await,
        Err(CartError::InvalidSelection(_))
    ));
    assert!(matches!(
        store.add_to_cart("", None, 1).await,
        Err(CartError::InvalidSelection(_))
    ));
    assert!(store.backend().server_lines().is_empty());
}

#[tokio::test]
async fn test_add_requires_session() {
    let store = loaded_store(vec![]).await;
    store.backend().authenticated.store(false, Ordering::SeqCst);

    assert!(matches!(
        store.add_to_cart("P1", Some("V1"), 1).await,
        Err(CartError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_add_failure_carries_server_message_and_changes_nothing() {
    let store = loaded_store(vec![line("L1", "P1", 1000, 1, None)]).await;
    store.backend().fail_next(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"message":"sale has ended"}"#,
    );

    let err = store.add_to_cart("P2", Some("V1"), 1).await.unwrap_err();

    assert!(matches!(err, CartError::Rejected { ref message } if message == "sale has ended"));
    assert_eq!(ids(&store), vec!["L1"]);
}

#[tokio::test]
async fn test_add_refused_for_missing_variant_is_invalid_selection() {
    let store = loaded_store(vec![]).await;
    store
        .backend()
        .fail_next(StatusCode::BAD_REQUEST, r#"{"message":"variant required"}"#);

    let err = store.add_to_cart("P1", None, 1).await.unwrap_err();

    assert!(matches!(err, CartError::InvalidSelection(ref message) if message == "variant required"));
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_add_to_existing_line_keeps_its_selection() {
    let store = loaded_store(vec![line("L1", "P1", 1000, 1, None)]).await;
    store.toggle_selection(&LineId::new("L1")).unwrap();

    let added = store.add_to_cart("P1", Some("V1"), 2).await.unwrap();

    assert_eq!(added.quantity, 3);
    assert!(!added.is_selected);
    let snapshot = store.snapshot();
    assert_eq!(snapshot.lines.len(), 1);
    assert!(!snapshot.lines[0].is_selected);
    assert_eq!(snapshot.selected_count(), 0);
}

// -- Selection --------------------------------------------------------------

#[tokio::test]
async fn test_toggle_selection() {
    let store = loaded_store(vec![line("L1", "P1", 1000, 1, None)]).await;
    let id = LineId::new("L1");

    assert!(!store.toggle_selection(&id).unwrap());
    assert!(store.toggle_selection(&id).unwrap());
    assert!(matches!(
        store.toggle_selection(&LineId::new("nope")),
        Err(CartError::LineNotFound(_))
    ));
}

#[tokio::test]
async fn test_toggle_select_all_twice_restores_uniform_selection() {
    let store = loaded_store(vec![
        line("L1", "P1", 1000, 1, None),
        line("L2", "P2", 1000, 1, None),
    ])
    .await;
    let before: Vec<bool> = store.snapshot().lines.iter().map(|l| l.is_selected).collect();

    store.toggle_select_all();
    assert_eq!(store.snapshot().selected_count(), 0);
    store.toggle_select_all();

    let after: Vec<bool> = store.snapshot().lines.iter().map(|l| l.is_selected).collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_toggle_select_all_selects_when_partially_selected() {
    let store = loaded_store(vec![
        line("L1", "P1", 1000, 1, None),
        line("L2", "P2", 1000, 1, None),
    ])
    .await;
    store.toggle_selection(&LineId::new("L1")).unwrap();

    store.toggle_select_all();

    assert!(store.snapshot().all_selected());
}

// -- Totals -----------------------------------------------------------------

#[tokio::test]
async fn test_selected_totals_are_stable() {
    let mut discounted = line("L2", "P2", 2000, 1, None);
    discounted.discount_percent = Some(Decimal::from(10));
    let store = loaded_store(vec![line("L1", "P1", 1000, 1, None), discounted]).await;

    let first = store.selected_totals();
    let second = store.selected_totals();

    assert_eq!(first, second);
    assert_eq!(first.subtotal, Decimal::from(3000));
    assert_eq!(first.discount, Decimal::from(200));
    assert_eq!(first.total, Decimal::from(2800));
}

#[tokio::test]
async fn test_almost_sold_out_count() {
    let store = loaded_store(vec![
        line("L1", "P1", 1000, 1, Some(3)),
        line("L2", "P2", 1000, 1, Some(80)),
    ])
    .await;
    assert_eq!(store.almost_sold_out_count(), 1);
}

// -- Quantity updates -------------------------------------------------------

#[tokio::test]
async fn test_update_clamps_to_stock() {
    let store = loaded_store(vec![line("L1", "P1", 1000, 2, Some(5))]).await;
    let id = LineId::new("L1");

    let outcome = store.update_quantity(&id, 10).await.unwrap();

    let UpdateOutcome::Applied(applied) = outcome else {
        unreachable!("expected an applied update, got {outcome:?}");
    };
    assert_eq!(applied.quantity, 5);
    assert_eq!(store.snapshot().lines[0].quantity, 5);
    assert_eq!(store.backend().server_lines()[0].quantity, 5);
}

#[tokio::test]
async fn test_quantity_stays_within_bounds() {
    let store = loaded_store(vec![line("L1", "P1", 1000, 2, Some(5))]).await;
    let id = LineId::new("L1");

    for requested in [3, 100, 1, 7, 5, 2] {
        store.update_quantity(&id, requested).await.unwrap();
        let snapshot = store.snapshot();
        let line = snapshot.line(&id).unwrap();
        assert!(
            (1..=5).contains(&line.quantity),
            "quantity {} out of bounds after requesting {requested}",
            line.quantity
        );
    }

    assert_eq!(
        store.update_quantity(&id, 0).await.unwrap(),
        UpdateOutcome::Removed
    );
    assert!(store.snapshot().line(&id).is_none());
    assert!(store.backend().server_lines().is_empty());
}

#[tokio::test]
async fn test_negative_quantity_removes_line() {
    let store = loaded_store(vec![line("L1", "P1", 1000, 2, None)]).await;
    assert_eq!(
        store.update_quantity(&LineId::new("L1"), -3).await.unwrap(),
        UpdateOutcome::Removed
    );
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_sold_out_line_cannot_be_updated() {
    let store = loaded_store(vec![line("L1", "P1", 1000, 2, Some(0))]).await;
    assert!(matches!(
        store.update_quantity(&LineId::new("L1"), 1).await,
        Err(CartError::StockConflict {
            available: Some(0),
            ..
        })
    ));
}

#[tokio::test]
async fn test_stock_conflict_rolls_back() {
    let store = loaded_store(vec![line("L1", "P1", 1000, 2, Some(5))]).await;
    let id = LineId::new("L1");
    // Stock drops on the server behind the client's back.
    store.backend().server.lock().unwrap()[0].available_stock = Some(3);

    let err = store.update_quantity(&id, 4).await.unwrap_err();

    assert!(matches!(
        err,
        CartError::StockConflict {
            available: Some(3),
            ..
        }
    ));
    let snapshot = store.snapshot();
    assert_eq!(snapshot.lines[0].quantity, 2);
    assert_eq!(snapshot.lines[0].available_stock, Some(3));
    assert_eq!(snapshot.total_count(), 2);
}

#[tokio::test]
async fn test_transient_failure_rolls_back() {
    let store = loaded_store(vec![line("L1", "P1", 1000, 2, Some(5))]).await;
    store.backend().fail_next(StatusCode::BAD_GATEWAY, "");

    let err = store.update_quantity(&LineId::new("L1"), 4).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(store.snapshot().lines[0].quantity, 2);
}

#[tokio::test]
async fn test_unknown_line() {
    let store = loaded_store(vec![]).await;
    assert!(matches!(
        store.update_quantity(&LineId::new("L9"), 2).await,
        Err(CartError::LineNotFound(_))
    ));
}

#[tokio::test]
async fn test_out_of_order_responses_keep_latest() {
    let (calls_tx, mut calls_rx) = mpsc::unbounded_channel();
    let mut fake = FakeCart::new(vec![line("L1", "P1", 1000, 1, Some(10))]);
    fake.manual = Some(calls_tx);
    let store = Arc::new(CartStore::new(fake));
    store.fetch_cart().await;
    let id = LineId::new("L1");

    let first = tokio::spawn({
        let store = store.clone();
        let id = id.clone();
        async move { store.update_quantity(&id, 2).await }
    });
    let (_, q1, respond_first) = calls_rx.recv().await.unwrap();

    let second = tokio::spawn({
        let store = store.clone();
        let id = id.clone();
        async move { store.update_quantity(&id, 3).await }
    });
    let (_, q2, respond_second) = calls_rx.recv().await.unwrap();
    assert_eq!((q1, q2), (2, 3));
    assert_eq!(store.snapshot().lines[0].quantity, 3);

    // The newer request is answered first, the older one straggles in.
    respond_second
        .send(Ok(line("L1", "P1", 1000, 3, Some(10))))
        .unwrap();
    assert!(matches!(
        second.await.unwrap(),
        Ok(UpdateOutcome::Applied(ref l)) if l.quantity == 3
    ));

    respond_first
        .send(Ok(line("L1", "P1", 1000, 2, Some(10))))
        .unwrap();
    assert_eq!(first.await.unwrap().unwrap(), UpdateOutcome::Superseded);

    assert_eq!(store.snapshot().lines[0].quantity, 3);
}

#[tokio::test]
async fn test_failed_newer_request_rolls_back_to_older_confirmation() {
    let (calls_tx, mut calls_rx) = mpsc::unbounded_channel();
    let mut fake = FakeCart::new(vec![line("L1", "P1", 1000, 1, Some(10))]);
    fake.manual = Some(calls_tx);
    let store = Arc::new(CartStore::new(fake));
    store.fetch_cart().await;
    let id = LineId::new("L1");

    let first = tokio::spawn({
        let store = store.clone();
        let id = id.clone();
        async move { store.update_quantity(&id, 2).await }
    });
    let (_, _, respond_first) = calls_rx.recv().await.unwrap();
    let second = tokio::spawn({
        let store = store.clone();
        let id = id.clone();
        async move { store.update_quantity(&id, 6).await }
    });
    let (_, _, respond_second) = calls_rx.recv().await.unwrap();

    respond_first
        .send(Ok(line("L1", "P1", 1000, 2, Some(10))))
        .unwrap();
    assert_eq!(first.await.unwrap().unwrap(), UpdateOutcome::Superseded);

    respond_second
        .send(Err(ClientError::Api {
            status: StatusCode::CONFLICT,
            body: r#"{"message":"only 4 left","available_stock":4}"#.into(),
        }))
        .unwrap();
    assert!(matches!(
        second.await.unwrap(),
        Err(CartError::StockConflict { .. })
    ));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.lines[0].quantity, 2);
    assert_eq!(snapshot.lines[0].available_stock, Some(4));
}

#[tokio::test]
async fn test_refetch_keeps_in_flight_update() {
    let (calls_tx, mut calls_rx) = mpsc::unbounded_channel();
    let mut fake = FakeCart::new(vec![line("L1", "P1", 1000, 1, Some(10))]);
    fake.manual = Some(calls_tx);
    let store = Arc::new(CartStore::new(fake));
    store.fetch_cart().await;
    let id = LineId::new("L1");

    let pending = tokio::spawn({
        let store = store.clone();
        let id = id.clone();
        async move { store.update_quantity(&id, 4).await }
    });
    let (_, _, respond) = calls_rx.recv().await.unwrap();

    store.fetch_cart().await;
    assert_eq!(store.snapshot().lines[0].quantity, 4);

    respond.send(Ok(line("L1", "P1", 1000, 4, Some(10)))).unwrap();
    assert!(matches!(
        pending.await.unwrap().unwrap(),
        UpdateOutcome::Applied(ref l) if l.quantity == 4
    ));
    assert_eq!(store.snapshot().lines[0].quantity, 4);
}

#[tokio::test]
async fn test_refetch_during_update_moves_rollback_point() {
    let (calls_tx, mut calls_rx) = mpsc::unbounded_channel();
    let mut fake = FakeCart::new(vec![line("L1", "P1", 1000, 1, Some(10))]);
    fake.manual = Some(calls_tx);
    let store = Arc::new(CartStore::new(fake));
    store.fetch_cart().await;
    let id = LineId::new("L1");

    let pending = tokio::spawn({
        let store = store.clone();
        let id = id.clone();
        async move { store.update_quantity(&id, 4).await }
    });
    let (_, _, respond) = calls_rx.recv().await.unwrap();

    // Someone else changed the line on the server meanwhile.
    store.backend().server.lock().unwrap()[0].quantity = 2;
    store.fetch_cart().await;
    assert_eq!(store.snapshot().lines[0].quantity, 4);

    respond
        .send(Err(ClientError::Api {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: String::new(),
        }))
        .unwrap();
    assert!(matches!(
        pending.await.unwrap(),
        Err(CartError::Transient(_))
    ));
    assert_eq!(store.snapshot().lines[0].quantity, 2);
}

// -- Removal ----------------------------------------------------------------

#[tokio::test]
async fn test_failed_remove_restores_position() {
    let store = loaded_store(vec![
        line("L1", "P1", 1000, 1, None),
        line("L2", "P2", 1000, 1, None),
        line("L3", "P3", 1000, 1, None),
    ])
    .await;
    store
        .backend()
        .fail_next(StatusCode::INTERNAL_SERVER_ERROR, "");

    assert!(store.remove_item(&LineId::new("L2")).await.is_err());

    assert_eq!(ids(&store), vec!["L1", "L2", "L3"]);
}

#[tokio::test]
async fn test_remove_item() {
    let store = loaded_store(vec![
        line("L1", "P1", 1000, 1, None),
        line("L2", "P2", 1000, 1, None),
    ])
    .await;

    store.remove_item(&LineId::new("L1")).await.unwrap();

    assert_eq!(ids(&store), vec!["L2"]);
    assert_eq!(store.backend().server_lines().len(), 1);
}

#[tokio::test]
async fn test_remove_selected() {
    let store = loaded_store(vec![
        line("L1", "P1", 1000, 1, None),
        line("L2", "P2", 1000, 1, None),
        line("L3", "P3", 1000, 1, None),
    ])
    .await;
    store.toggle_selection(&LineId::new("L2")).unwrap();

    assert_eq!(store.remove_selected().await.unwrap(), 2);

    assert_eq!(ids(&store), vec!["L2"]);
    assert_eq!(store.remove_selected().await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_remove_selected_restores_all() {
    let store = loaded_store(vec![
        line("L1", "P1", 1000, 1, None),
        line("L2", "P2", 1000, 1, None),
        line("L3", "P3", 1000, 1, None),
    ])
    .await;
    store.toggle_selection(&LineId::new("L2")).unwrap();
    store.backend().fail_next(StatusCode::BAD_GATEWAY, "");

    assert!(store.remove_selected().await.is_err());

    assert_eq!(ids(&store), vec!["L1", "L2", "L3"]);
}
