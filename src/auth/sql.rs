use super::{AuthStore, MemoryStore};
use crate::db::{AuthKeysPatch, DbActorHandle};
use crate::error::IzumieError;
use async_trait::async_trait;
use izumie_schema::{Credentials, KeyEntries, KeyMutation, SessionSnapshot};
use serde_json::Value;
use tracing::{info, warn};

/// Relational backend: rows keyed by `session_key`, loaded once, then written through on every
/// mutation. Reads are served from the in-memory copy.
pub struct SqlStore {
    db: DbActorHandle,
    session_key: String,
    cache: MemoryStore,
}

impl SqlStore {
    pub async fn load(db: DbActorHandle, session_key: &str) -> Result<Self, IzumieError> {
        let state = db.load_auth_state(session_key).await?;

        let creds = match state.creds.as_deref().map(serde_json::from_str::<Value>) {
            Some(Ok(value)) => Credentials::from_value(value),
            Some(Err(e)) => {
                warn!(session_key, error = %e, "stored credentials are not valid JSON; starting fresh");
                None
            }
            None => None,
        };

        let mut keys = KeyMutation::new();
        for entry in &state.entries {
            match serde_json::from_str::<Value>(&entry.value) {
                Ok(value) => {
                    keys.insert(&entry.category, &entry.key_id, value);
                }
                Err(e) => {
                    warn!(
                        session_key,
                        category = %entry.category,
                        key_id = %entry.key_id,
                        error = %e,
                        "skipping unparsable key row"
                    );
                }
            }
        }

        info!(
            session_key,
            has_creds = creds.is_some(),
            keys = state.entries.len(),
            "relational auth state loaded"
        );

        let cache = MemoryStore::new();
        cache.replace(creds, &keys).await;

        Ok(Self {
            db,
            session_key: session_key.to_string(),
            cache,
        })
    }
}

#[async_trait]
impl AuthStore for SqlStore {
    async fn load_creds(&self) -> Result<Option<Credentials>, IzumieError> {
        self.cache.load_creds().await
    }

    async fn save_creds(&self, creds: &Credentials) -> Result<(), IzumieError> {
        self.cache.save_creds(creds).await?;
        self.db
            .save_auth_creds(&self.session_key, serde_json::to_string(creds)?)
            .await
    }

    async fn get_keys(&self, category: &str, ids: &[String]) -> Result<KeyEntries, IzumieError> {
        self.cache.get_keys(category, ids).await
    }

    async fn mutate_keys(&self, mutation: &KeyMutation) -> Result<(), IzumieError> {
        let mut patch = AuthKeysPatch::new(self.session_key.clone());
        for (category, id, value) in mutation.iter() {
            match value {
                Some(value) => patch.upserts.push((
                    category.to_string(),
                    id.to_string(),
                    serde_json::to_string(value)?,
                )),
                None => patch.deletes.push((category.to_string(), id.to_string())),
            }
        }

        self.cache.mutate_keys(mutation).await?;
        self.db.write_auth_keys(patch).await
    }

    async fn snapshot(&self) -> Result<SessionSnapshot, IzumieError> {
        self.cache.snapshot().await
    }

    async fn clear(&self) -> Result<(), IzumieError> {
        self.cache.clear().await?;
        self.db.clear_auth_state(&self.session_key).await
    }
}
