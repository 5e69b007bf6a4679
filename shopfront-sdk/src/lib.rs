//! Shared wire types and HTTP clients for the Shopfront storefront API.
//!
//! The `client` feature pulls in `reqwest` and the push transports; without
//! it only the serde types, the auth session and the SSE decoder are built.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod auth;
#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod sse;
