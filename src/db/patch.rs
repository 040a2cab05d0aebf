use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUpsert {
    pub id: String,
    /// Serialized `SessionSnapshot`.
    pub data: String,
}

/// One batch of relational key-store writes, applied in a single transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthKeysPatch {
    pub session_key: String,
    /// `(category, key_id, serialized value)`.
    pub upserts: Vec<(String, String, String)>,
    /// `(category, key_id)`.
    pub deletes: Vec<(String, String)>,
}

impl AuthKeysPatch {
    pub fn new(session_key: impl Into<String>) -> Self {
        Self {
            session_key: session_key.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}
