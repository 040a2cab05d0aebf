//! Credential store adapter.
//!
//! One capability trait, three backends selected by `auth.backend`:
//! - `memory.rs`: process-local map
//! - `file.rs`: `creds.json` plus one JSON file per key
//! - `sql.rs`: `auth_creds` / `auth_state` tables, loaded once and written through

mod file;
mod memory;
mod sql;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sql::SqlStore;

use crate::config::{AuthBackend, AuthConfig};
use crate::db::DbActorHandle;
use crate::error::IzumieError;
use async_trait::async_trait;
use izumie_schema::{Credentials, KeyEntries, KeyMutation, SessionSnapshot};
use std::sync::Arc;
use tracing::info;

/// Storage for the credentials and signal keys the protocol library reads and writes.
///
/// No backend coordinates between processes; the last writer wins.
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Stored credentials, or `None` for a fresh login.
    async fn load_creds(&self) -> Result<Option<Credentials>, IzumieError>;

    /// Replaces the stored credentials. Called on every `creds.update`.
    async fn save_creds(&self, creds: &Credentials) -> Result<(), IzumieError>;

    /// Looks up `ids` in `category`; absent ids are omitted from the result.
    async fn get_keys(&self, category: &str, ids: &[String]) -> Result<KeyEntries, IzumieError>;

    /// Applies a partial write; `None` values delete.
    async fn mutate_keys(&self, mutation: &KeyMutation) -> Result<(), IzumieError>;

    /// Everything currently stored.
    async fn snapshot(&self) -> Result<SessionSnapshot, IzumieError>;

    /// Removes everything stored.
    async fn clear(&self) -> Result<(), IzumieError>;
}

pub type SharedAuthStore = Arc<dyn AuthStore>;

/// Opens the backend named by the configuration.
pub async fn open(cfg: &AuthConfig, db: &DbActorHandle) -> Result<SharedAuthStore, IzumieError> {
    let store: SharedAuthStore = match cfg.backend {
        AuthBackend::Memory => Arc::new(MemoryStore::new()),
        AuthBackend::File => Arc::new(FileStore::new(&cfg.dir)),
        AuthBackend::Sql => Arc::new(SqlStore::load(db.clone(), &cfg.session_key).await?),
    };
    info!(backend = ?cfg.backend, "auth store ready");
    Ok(store)
}
