pub mod auth;
pub mod bridge;
pub mod connection;
pub mod jid;

pub use auth::{Credentials, KeyEntries, KeyMutation, SessionSnapshot};
pub use bridge::{BridgeCall, InboundFrame, OutboundFrame};
pub use connection::{ConnectionState, ConnectionUpdate, DisconnectReason, LastDisconnect};
pub use jid::{Jid, JidParseError, USER_SERVER};
