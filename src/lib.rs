pub mod auth;
pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod service;
pub mod transport;
mod utils;

pub use connection::{ConnectionManager, LoginMode, RunOutcome};
pub use error::{IzumieError, ProtocolError};
pub use service::SessionId;
