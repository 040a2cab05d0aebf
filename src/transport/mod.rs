//! Protocol seam.
//!
//! The WhatsApp multi-device protocol lives outside this crate. A [`Transport`] opens one
//! [`Socket`] per connection attempt; the socket serves the library's key-store callbacks
//! against the [`AuthStore`](crate::auth::AuthStore) it was opened with and surfaces everything
//! else as [`SocketEvent`]s.

mod bridge;

pub use bridge::BridgeTransport;

use crate::auth::SharedAuthStore;
use crate::error::ProtocolError;
use async_trait::async_trait;
use izumie_schema::{ConnectionUpdate, Credentials, Jid};

#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    ConnectionUpdate(ConnectionUpdate),
    /// Full current credentials; must be persisted.
    CredsUpdate(Credentials),
}

#[async_trait]
pub trait Socket: Send + Sync {
    /// Next event in arrival order; `None` once the session is gone.
    async fn next_event(&mut self) -> Option<SocketEvent>;

    /// Asks the server for an 8-character pairing code for `phone` (digits only).
    async fn request_pairing_code(&self, phone: &str) -> Result<String, ProtocolError>;

    async fn send_text(&self, jid: &Jid, text: &str) -> Result<(), ProtocolError>;
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Starts a fresh socket session. Dropping the socket tears the session down.
    async fn connect(&self, auth: SharedAuthStore) -> Result<Box<dyn Socket>, ProtocolError>;
}
