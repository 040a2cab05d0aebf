use super::session_id::SessionId;
use crate::auth::AuthStore;
use crate::db::{DbActorHandle, SessionUpsert};
use izumie_schema::SessionSnapshot;
use tracing::{error, info};

/// Writes auth snapshots into the `sessions` table. Never fails outward: every error is logged
/// and reported as `false`.
#[derive(Clone)]
pub struct SessionPersister {
    db: DbActorHandle,
}

impl SessionPersister {
    pub fn new(db: DbActorHandle) -> Self {
        Self { db }
    }

    /// Snapshots `auth` and upserts it under `id`.
    pub async fn persist(&self, id: &SessionId, auth: &dyn AuthStore) -> bool {
        let snapshot = match auth.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(session_id = %id, error = %e, "failed to read auth state for persistence");
                return false;
            }
        };
        self.store(id, &snapshot).await
    }

    /// Upserts a prepared snapshot under `id`; last write wins.
    pub async fn store(&self, id: &SessionId, snapshot: &SessionSnapshot) -> bool {
        let data = match serde_json::to_string(snapshot) {
            Ok(data) => data,
            Err(e) => {
                error!(session_id = %id, error = %e, "failed to serialize session snapshot");
                return false;
            }
        };

        let upsert = SessionUpsert {
            id: id.to_string(),
            data,
        };
        match self.db.upsert_session(upsert).await {
            Ok(()) => {
                info!(
                    session_id = %id,
                    has_creds = snapshot.creds.is_some(),
                    keys = snapshot.key_count(),
                    "session stored"
                );
                true
            }
            Err(e) => {
                error!(session_id = %id, error = %e, "error saving session to database");
                false
            }
        }
    }
}
