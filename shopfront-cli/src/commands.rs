//! Subcommand handlers.

use std::fmt::Write as _;
use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use shopfront_core::cart::{CartSnapshot, CartStore, UpdateOutcome};
use shopfront_core::config::NotificationConfig;
use shopfront_core::notifications::{
    ChannelHandle, LogAlerter, NotificationChannel, NotificationInbox,
};
use shopfront_sdk::client::{ApiClient, CartClient, NotificationClient, SseConnector, WsConnector};
use shopfront_sdk::objects::{LineId, NotificationId};
use tracing::{info, warn};

use crate::config::file::Transport;

#[derive(Debug, clap::Subcommand)]
pub enum CartCommand {
    /// Print the cart with totals over the selected lines
    Show,
    /// Add a product (or more of it) to the cart
    Add {
        product: String,
        #[arg(long)]
        variant: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity; zero or less removes it
    Qty {
        line: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove one line
    Remove { line: String },
    /// Remove every selected line
    RemoveSelected,
}

#[derive(Debug, clap::Subcommand)]
pub enum NotificationCommand {
    /// Stay connected and log notifications until interrupted
    Watch,
    /// Print the unread counter
    Unread,
    /// Mark one notification as read
    Read { id: String },
    /// Mark every notification as read
    ReadAll,
    /// Delete one notification
    Delete { id: String },
    /// Delete every read notification
    ClearRead,
}

pub async fn run_cart(api: ApiClient, command: CartCommand) -> anyhow::Result<()> {
    let store = CartStore::new(CartClient::new(api));
    store.fetch_cart().await;

    match command {
        CartCommand::Show => {}
        CartCommand::Add {
            product,
            variant,
            quantity,
        } => {
            let line = store
                .add_to_cart(&product, variant.as_deref(), quantity)
                .await?;
            info!(line_id = %line.id, quantity = line.quantity, "Added to cart");
        }
        CartCommand::Qty { line, quantity } => {
            match store.update_quantity(&LineId::new(line), quantity).await? {
                UpdateOutcome::Applied(line) => {
                    info!(line_id = %line.id, quantity = line.quantity, "Quantity updated")
                }
                UpdateOutcome::Removed => info!("Line removed"),
                UpdateOutcome::Superseded => {}
            }
        }
        CartCommand::Remove { line } => store.remove_item(&LineId::new(line)).await?,
        CartCommand::RemoveSelected => {
            let removed = store.remove_selected().await?;
            info!(removed, "Removed selected lines");
        }
    }

    print!("{}", render_cart(&store.snapshot()));
    Ok(())
}

pub async fn run_notifications(
    api: ApiClient,
    stream_api: ApiClient,
    transport: Transport,
    config: NotificationConfig,
    command: NotificationCommand,
    shutdown: impl Future<Output = std::io::Result<()>>,
) -> anyhow::Result<()> {
    let inbox = Arc::new(
        NotificationInbox::with_capacity(NotificationClient::new(api), config.recent_capacity)
            .with_alerter(Arc::new(LogAlerter)),
    );

    match command {
        NotificationCommand::Watch => {
            return watch(inbox, stream_api, transport, config, shutdown).await;
        }
        NotificationCommand::Unread => {}
        NotificationCommand::Read { id } => inbox.mark_read(&NotificationId::new(id)).await?,
        NotificationCommand::ReadAll => inbox.mark_all_read().await?,
        NotificationCommand::Delete { id } => inbox.delete(&NotificationId::new(id)).await?,
        NotificationCommand::ClearRead => inbox.clear_read().await?,
    }

    inbox.refresh_unread_count().await;
    println!("unread: {}", inbox.unread());
    Ok(())
}

async fn watch(
    inbox: Arc<NotificationInbox<NotificationClient>>,
    stream_api: ApiClient,
    transport: Transport,
    config: NotificationConfig,
    shutdown: impl Future<Output = std::io::Result<()>>,
) -> anyhow::Result<()> {
    inbox.refresh_unread_count().await;
    info!(unread = inbox.unread(), "Watching notifications");

    let handle: ChannelHandle = match transport {
        Transport::Sse => {
            NotificationChannel::new(SseConnector::new(stream_api), config.backoff).spawn(inbox.clone())
        }
        Transport::Ws => {
            NotificationChannel::new(WsConnector::new(stream_api), config.backoff).spawn(inbox.clone())
        }
    };

    let mut status = handle.subscribe_state();
    let mut unread = inbox.subscribe();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            result = &mut shutdown => {
                result.context("failed to install signal handlers")?;
                break;
            }

            Ok(()) = status.changed() => {
                let current = *status.borrow_and_update();
                info!(state = %current.state, attempts = current.attempts, "Notification channel");
                if current.exhausted {
                    warn!("Notification stream gave up, press Ctrl+C to exit");
                }
            }

            Ok(()) = unread.changed() => {
                let count = unread.borrow_and_update().unread;
                info!(unread = count, "Unread notifications");
            }
        }
    }

    handle.disconnect().await;
    Ok(())
}

fn render_cart(snapshot: &CartSnapshot) -> String {
    if snapshot.is_empty() {
        return "cart is empty\n".to_string();
    }

    let mut out = String::new();
    for line in &snapshot.lines {
        let mark = if line.is_selected { "x" } else { " " };
        let stock = line
            .available_stock
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        let _ = writeln!(
            out,
            "[{mark}] {id}  {name}  {qty} x {price}  (stock {stock})",
            id = line.id,
            name = line.name,
            qty = line.quantity,
            price = line.unit_price,
        );
    }

    let totals = snapshot.selected_totals();
    let _ = writeln!(
        out,
        "selected {}/{}  subtotal {}  discount {} ({}%)  total {}",
        snapshot.selected_count(),
        snapshot.lines.len(),
        totals.subtotal,
        totals.discount,
        totals.discount_percentage,
        totals.total,
    );
    let almost = snapshot.almost_sold_out_count();
    if almost > 0 {
        let _ = writeln!(out, "{almost} line(s) almost sold out");
    }
    out
}
