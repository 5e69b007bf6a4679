//! Live notification delivery.
//!
//! - [`ReconnectMachine`] is the connection state machine with its backoff
//!   policy. It performs no I/O.
//! - [`NotificationChannel`] drives the machine on a tokio task over a
//!   [`PushConnector`], decodes every frame and hands it to a
//!   [`FrameHandler`], any infallible `Processor` of push frames.
//! - [`NotificationInbox`] is the handler the UI reads: unread counter,
//!   bounded recent list, and the server-confirmed read/delete operations.

mod channel;
mod error;
mod inbox;
mod state;

pub use channel::{ChannelHandle, ChannelStatus, FrameHandler, NotificationChannel, PushConnector};
pub use error::NotificationError;
pub use inbox::{
    Alerter, InboxSnapshot, LogAlerter, NoAlerter, NotificationBackend, NotificationInbox,
};
pub use state::{AfterFailure, ConnectionState, ReconnectMachine};
