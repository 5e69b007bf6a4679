//! Notification inbox: the unread counter and recent list the UI renders.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use kanau::processor::Processor;
use shopfront_sdk::client::{ClientError, NotificationClient};
use shopfront_sdk::objects::{Notification, NotificationId, PushFrame};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::NotificationError;
use crate::config::DEFAULT_RECENT_CAPACITY;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboxSnapshot {
    pub unread: u64,
    /// Newest first, never longer than the inbox capacity.
    pub recent: VecDeque<Notification>,
}

/// Host hook for system-level alerts.
pub trait Alerter: Send + Sync {
    /// Whether the host allows alerts right now.
    fn permitted(&self) -> bool;
    fn alert(&self, notification: &Notification);
}

/// Writes alerts to the log. Used by the terminal client.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlerter;

impl Alerter for LogAlerter {
    fn permitted(&self) -> bool {
        true
    }

    fn alert(&self, notification: &Notification) {
        info!(
            title = %notification.title,
            priority = ?notification.priority,
            "{}",
            notification.message
        );
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoAlerter;

impl Alerter for NoAlerter {
    fn permitted(&self) -> bool {
        false
    }

    fn alert(&self, _notification: &Notification) {}
}

#[async_trait]
pub trait NotificationBackend: Send + Sync {
    async fn unread_count(&self) -> Result<u64, ClientError>;
    async fn mark_read(&self, id: &NotificationId) -> Result<(), ClientError>;
    async fn mark_all_read(&self) -> Result<(), ClientError>;
    async fn delete(&self, id: &NotificationId) -> Result<(), ClientError>;
    async fn clear_read(&self) -> Result<(), ClientError>;
}

#[async_trait]
impl NotificationBackend for NotificationClient {
    async fn unread_count(&self) -> Result<u64, ClientError> {
        NotificationClient::unread_count(self).await
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<(), ClientError> {
        NotificationClient::mark_read(self, id).await
    }

    async fn mark_all_read(&self) -> Result<(), ClientError> {
        NotificationClient::mark_all_read(self).await
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), ClientError> {
        NotificationClient::delete(self, id).await
    }

    async fn clear_read(&self) -> Result<(), ClientError> {
        NotificationClient::clear_read(self).await
    }
}

/// Holds the unread counter and a bounded list of recent notifications.
///
/// Push frames only ever touch local state. The REST operations are
/// confirmed against the server one by one and never interact with the
/// channel that feeds the inbox.
pub struct NotificationInbox<B> {
    backend: B,
    alerter: Arc<dyn Alerter>,
    capacity: usize,
    state: watch::Sender<InboxSnapshot>,
}

impl<B: NotificationBackend> NotificationInbox<B> {
    pub fn new(backend: B) -> Self {
        Self::with_capacity(backend, DEFAULT_RECENT_CAPACITY)
    }

    pub fn with_capacity(backend: B, capacity: usize) -> Self {
        Self {
            backend,
            alerter: Arc::new(NoAlerter),
            capacity,
            state: watch::Sender::new(InboxSnapshot::default()),
        }
    }

    pub fn with_alerter(mut self, alerter: Arc<dyn Alerter>) -> Self {
        self.alerter = alerter;
        self
    }

    pub fn snapshot(&self) -> InboxSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<InboxSnapshot> {
        self.state.subscribe()
    }

    pub fn unread(&self) -> u64 {
        self.state.borrow().unread
    }

    /// Decode a raw frame and apply it. Returns whether anything changed.
    pub fn handle_raw(&self, raw: &str) -> bool {
        match PushFrame::parse(raw) {
            Some(frame) => self.apply(frame),
            None => {
                debug!(len = raw.len(), "Ignoring push frame");
                false
            }
        }
    }

    pub fn apply(&self, frame: PushFrame) -> bool {
        match frame {
            PushFrame::UnreadCount { count } => {
                self.state.send_modify(|s| s.unread = count);
                true
            }
            PushFrame::Connected => false,
            PushFrame::Notification(notification) => {
                if self.alerter.permitted() {
                    self.alerter.alert(&notification);
                }
                let capacity = self.capacity;
                self.state.send_modify(|s| {
                    s.recent.push_front(notification);
                    s.recent.truncate(capacity);
                    s.unread += 1;
                });
                true
            }
        }
    }

    /// Replace the counter with the server's figure. On failure the
    /// previous value is kept.
    pub async fn refresh_unread_count(&self) {
        match self.backend.unread_count().await {
            Ok(count) => self.state.send_modify(|s| s.unread = count),
            Err(e) => debug!(error = %e, "Failed to refresh unread count"),
        }
    }

    pub async fn mark_read(&self, id: &NotificationId) -> Result<(), NotificationError> {
        let mut flipped = false;
        self.state.send_if_modified(|s| {
            if let Some(n) = find_mut(&mut s.recent, id).filter(|n| !n.is_read) {
                n.is_read = true;
                s.unread = s.unread.saturating_sub(1);
                flipped = true;
            }
            flipped
        });

        if let Err(e) = self.backend.mark_read(id).await {
            warn!(%id, error = %e, "Failed to mark notification as read");
            if flipped {
                self.state.send_modify(|s| {
                    if let Some(n) = find_mut(&mut s.recent, id) {
                        n.is_read = false;
                    }
                    s.unread += 1;
                });
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Mark everything read. On failure the entries flipped here, id-less
    /// ones included, are unread again and the counter is restored.
    pub async fn mark_all_read(&self) -> Result<(), NotificationError> {
        let mut previous_unread = 0;
        let mut flipped = Vec::new();
        self.state.send_modify(|s| {
            previous_unread = std::mem::take(&mut s.unread);
            for n in s.recent.iter_mut().filter(|n| !n.is_read) {
                n.is_read = true;
                flipped.push(n.clone());
            }
        });

        if let Err(e) = self.backend.mark_all_read().await {
            warn!(error = %e, "Failed to mark all notifications as read");
            self.state.send_modify(|s| {
                // Entries are matched by content; pushes may have shifted
                // them meanwhile.
                for n in s.recent.iter_mut() {
                    if let Some(pos) = flipped.iter().position(|f| f == &*n) {
                        flipped.swap_remove(pos);
                        n.is_read = false;
                    }
                }
                s.unread += previous_unread;
            });
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn delete(&self, id: &NotificationId) -> Result<(), NotificationError> {
        if let Err(e) = self.backend.delete(id).await {
            warn!(%id, error = %e, "Failed to delete notification");
            return Err(e.into());
        }
        self.state.send_if_modified(|s| {
            let Some(pos) = s.recent.iter().position(|n| n.id.as_ref() == Some(id)) else {
                return false;
            };
            if s.recent.remove(pos).is_some_and(|n| !n.is_read) {
                s.unread = s.unread.saturating_sub(1);
            }
            true
        });
        Ok(())
    }

    pub async fn clear_read(&self) -> Result<(), NotificationError> {
        if let Err(e) = self.backend.clear_read().await {
            warn!(error = %e, "Failed to clear read notifications");
            return Err(e.into());
        }
        self.state.send_modify(|s| s.recent.retain(|n| !n.is_read));
        Ok(())
    }
}

fn find_mut<'a>(
    recent: &'a mut VecDeque<Notification>,
    id: &NotificationId,
) -> Option<&'a mut Notification> {
    recent.iter_mut().find(|n| n.id.as_ref() == Some(id))
}

/// How the push channel feeds the inbox.
impl<B: NotificationBackend> Processor<PushFrame> for NotificationInbox<B> {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, frame: PushFrame) -> Result<(), Infallible> {
        self.apply(frame);
        Ok(())
    }
}
