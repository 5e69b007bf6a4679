//! Push channel runner.
//!
//! One tokio task owns the [`ReconnectMachine`], the open transport and the
//! reconnect timer. Everything outside the task talks to it through the
//! [`ChannelHandle`]: a status watch going out, a shutdown watch and a
//! retry notification coming in.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use kanau::processor::Processor;
use shopfront_sdk::client::{ClientError, FrameStream, SseConnector, WsConnector};
use shopfront_sdk::objects::PushFrame;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::{AfterFailure, ConnectionState, ReconnectMachine};
use crate::utils::backoff::BackoffPolicy;

/// A transport able to open the notification stream.
#[async_trait]
pub trait PushConnector: Send + Sync + 'static {
    /// Resolves once the stream is established.
    async fn connect(&self) -> Result<FrameStream, ClientError>;
}

#[async_trait]
impl PushConnector for SseConnector {
    async fn connect(&self) -> Result<FrameStream, ClientError> {
        self.open().await
    }
}

#[async_trait]
impl PushConnector for WsConnector {
    async fn connect(&self) -> Result<FrameStream, ClientError> {
        self.open().await
    }
}

/// Receives every decoded frame the channel reads, in order. Heartbeats and
/// undecodable frames never reach it.
///
/// Implemented for every infallible [`Processor`] of [`PushFrame`]s.
pub trait FrameHandler:
    Processor<PushFrame, Output = (), Error = Infallible> + Send + Sync + 'static
{
}

impl<P> FrameHandler for P where
    P: Processor<PushFrame, Output = (), Error = Infallible> + Send + Sync + 'static
{
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStatus {
    pub state: ConnectionState,
    /// Reconnect attempts since the last successful handshake.
    pub attempts: u32,
    /// The retry budget is spent; only [`ChannelHandle::retry`] reconnects.
    pub exhausted: bool,
}

pub struct NotificationChannel<C> {
    connector: C,
    policy: BackoffPolicy,
}

impl<C: PushConnector> NotificationChannel<C> {
    pub fn new(connector: C, policy: BackoffPolicy) -> Self {
        Self { connector, policy }
    }

    /// Start connecting on a new task and feed frames to `handler`.
    pub fn spawn<H: FrameHandler>(self, handler: Arc<H>) -> ChannelHandle {
        let (status_tx, status_rx) = watch::channel(ChannelStatus::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let retry = Arc::new(Notify::new());

        let runner = Runner {
            connector: self.connector,
            machine: ReconnectMachine::new(self.policy),
            handler,
            status_tx,
            shutdown_rx,
            retry: retry.clone(),
        };
        let task = tokio::spawn(runner.run());

        ChannelHandle {
            status: status_rx,
            shutdown: shutdown_tx,
            retry,
            task: Some(task),
        }
    }
}

/// Owner-side handle of a running channel.
///
/// Dropping it tears the channel down: the transport is closed and any
/// pending reconnect is cancelled.
pub struct ChannelHandle {
    status: watch::Receiver<ChannelStatus>,
    shutdown: watch::Sender<bool>,
    retry: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    pub fn status(&self) -> ChannelStatus {
        *self.status.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ChannelStatus> {
        self.status.clone()
    }

    pub fn is_exhausted(&self) -> bool {
        self.status.borrow().exhausted
    }

    /// Reconnect with a fresh budget. No-op unless the channel gave up.
    pub fn retry(&self) {
        if self.is_exhausted() {
            self.retry.notify_one();
        }
    }

    /// Close the transport and wait for the task to finish.
    pub async fn disconnect(mut self) {
        let _ = self.shutdown.send(true);
        let Some(task) = self.task.take() else {
            return;
        };
        if let Err(e) = task.await {
            if !e.is_cancelled() {
                warn!(error = %e, "Notification channel task failed");
            }
        }
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Runner<C, H> {
    connector: C,
    machine: ReconnectMachine,
    handler: Arc<H>,
    status_tx: watch::Sender<ChannelStatus>,
    shutdown_rx: watch::Receiver<bool>,
    retry: Arc<Notify>,
}

impl<C: PushConnector, H: FrameHandler> Runner<C, H> {
    async fn run(mut self) {
        'connect: loop {
            self.machine.connect_requested();
            self.publish(false);

            let opened = tokio::select! {
                biased;

                _ = shutdown_requested(&mut self.shutdown_rx) => break 'connect,
                result = self.connector.connect() => result,
            };

            match opened {
                Ok(mut frames) => {
                    self.machine.handshake_succeeded();
                    self.publish(false);
                    info!("Notification stream connected");

                    loop {
                        tokio::select! {
                            biased;

                            _ = shutdown_requested(&mut self.shutdown_rx) => break 'connect,
                            next = frames.next() => match next {
                                Some(Ok(raw)) => match PushFrame::parse(&raw) {
                                    Some(frame) => {
                                        let _ = self.handler.process(frame).await;
                                    }
                                    None => debug!(len = raw.len(), "Ignoring push frame"),
                                },
                                Some(Err(e)) => {
                                    warn!(error = %e, "Notification stream failed");
                                    break;
                                }
                                None => {
                                    info!("Notification stream closed by server");
                                    break;
                                }
                            },
                        }
                    }
                }
                Err(e) => warn!(error = %e, "Failed to open notification stream"),
            }

            match self.machine.connection_lost() {
                AfterFailure::Retry { attempt, delay } => {
                    self.publish(false);
                    info!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Reconnecting notification stream"
                    );
                    tokio::select! {
                        biased;

                        _ = shutdown_requested(&mut self.shutdown_rx) => break 'connect,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                AfterFailure::Exhausted => {
                    self.publish(true);
                    warn!(
                        attempts = self.machine.attempts(),
                        "Notification stream retry budget exhausted"
                    );
                    tokio::select! {
                        biased;

                        _ = shutdown_requested(&mut self.shutdown_rx) => break 'connect,
                        _ = self.retry.notified() => {
                            debug!("Manual notification stream retry");
                            self.machine.reset();
                        }
                    }
                }
            }
        }

        self.machine.reset();
        self.publish(false);
        info!("Notification channel stopped");
    }

    fn publish(&self, exhausted: bool) {
        let status = ChannelStatus {
            state: self.machine.state(),
            attempts: self.machine.attempts(),
            exhausted,
        };
        self.status_tx.send_if_modified(|current| {
            let changed = *current != status;
            *current = status;
            changed
        });
    }
}

/// Resolves once shutdown is signalled or the handle is gone.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
