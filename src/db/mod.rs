//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `patch.rs`: write payloads accepted by the actor
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)

pub mod actor;
pub mod models;
pub mod patch;
pub mod schema;

pub use models::{DbAuthEntry, DbAuthState, DbSessionRecord};
pub use patch::{AuthKeysPatch, SessionUpsert};
pub use schema::{SESSIONS_DDL, SQLITE_INIT};

pub use actor::{DbActorHandle, spawn};
