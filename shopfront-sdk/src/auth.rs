//! Bearer-token session shared between the auth flow and API clients.
//!
//! [`AuthSession`] is the only writer. Everything else holds a
//! [`TokenSource`], which can read the current token and wait for changes
//! but cannot modify it.

use std::fmt;

use tokio::sync::watch;

/// An opaque bearer token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Owner of the session token.
#[derive(Debug)]
pub struct AuthSession {
    tx: watch::Sender<Option<BearerToken>>,
}

impl AuthSession {
    /// Create a session, optionally already signed in.
    pub fn new(initial: Option<BearerToken>) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn sign_in(&self, token: BearerToken) {
        self.tx.send_replace(Some(token));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    /// Hand out a read-only view of the token.
    pub fn source(&self) -> TokenSource {
        TokenSource {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Read-only access to the current bearer token.
#[derive(Debug, Clone)]
pub struct TokenSource {
    rx: watch::Receiver<Option<BearerToken>>,
}

impl TokenSource {
    /// A source that always yields `token`, for tools that never sign out.
    pub fn fixed(token: Option<BearerToken>) -> Self {
        let (_tx, rx) = watch::channel(token);
        Self { rx }
    }

    pub fn current(&self) -> Option<BearerToken> {
        self.rx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for the next sign-in or sign-out.
    ///
    /// Returns `Err` once the owning [`AuthSession`] is gone.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}
