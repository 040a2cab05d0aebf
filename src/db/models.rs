use chrono::{DateTime, Utc};
use izumie_schema::SessionSnapshot;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbSessionRecord {
    pub id: String,
    /// Serialized `SessionSnapshot`.
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbSessionRecord {
    pub fn snapshot(&self) -> Result<SessionSnapshot, serde_json::Error> {
        serde_json::from_str(&self.data)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbAuthEntry {
    pub category: String,
    pub key_id: String,
    /// Serialized key material.
    pub value: String,
}

/// Everything stored for one session key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbAuthState {
    pub creds: Option<String>,
    pub entries: Vec<DbAuthEntry>,
}
