use super::AuthStore;
use crate::error::IzumieError;
use ahash::AHashMap;
use async_trait::async_trait;
use izumie_schema::{Credentials, KeyEntries, KeyMutation, SessionSnapshot};
use serde_json::Value;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct AuthTable {
    creds: Option<Credentials>,
    keys: AHashMap<String, AHashMap<String, Value>>,
}

impl AuthTable {
    fn apply(&mut self, mutation: &KeyMutation) {
        for (category, id, value) in mutation.iter() {
            match value {
                Some(value) => {
                    self.keys
                        .entry(category.to_string())
                        .or_default()
                        .insert(id.to_string(), value.clone());
                }
                None => {
                    if let Some(entries) = self.keys.get_mut(category) {
                        entries.remove(id);
                        if entries.is_empty() {
                            self.keys.remove(category);
                        }
                    }
                }
            }
        }
    }
}

/// Transient store; also the read cache of [`super::SqlStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<AuthTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) async fn replace(&self, creds: Option<Credentials>, mutation: &KeyMutation) {
        let mut table = self.table.write().await;
        *table = AuthTable {
            creds,
            keys: AHashMap::new(),
        };
        table.apply(mutation);
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn load_creds(&self) -> Result<Option<Credentials>, IzumieError> {
        Ok(self.table.read().await.creds.clone())
    }

    async fn save_creds(&self, creds: &Credentials) -> Result<(), IzumieError> {
        self.table.write().await.creds = Some(creds.clone());
        Ok(())
    }

    async fn get_keys(&self, category: &str, ids: &[String]) -> Result<KeyEntries, IzumieError> {
        let table = self.table.read().await;
        let Some(entries) = table.keys.get(category) else {
            return Ok(KeyEntries::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| entries.get(id).map(|v| (id.clone(), v.clone())))
            .collect())
    }

    async fn mutate_keys(&self, mutation: &KeyMutation) -> Result<(), IzumieError> {
        self.table.write().await.apply(mutation);
        Ok(())
    }

    async fn snapshot(&self) -> Result<SessionSnapshot, IzumieError> {
        let table = self.table.read().await;
        Ok(SessionSnapshot {
            creds: table.creds.clone(),
            keys: table
                .keys
                .iter()
                .map(|(category, entries)| {
                    (
                        category.clone(),
                        entries
                            .iter()
                            .map(|(id, v)| (id.clone(), v.clone()))
                            .collect(),
                    )
                })
                .collect(),
        })
    }

    async fn clear(&self) -> Result<(), IzumieError> {
        *self.table.write().await = AuthTable::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn get_omits_absent_ids_and_null_deletes() {
        let store = MemoryStore::new();
        let mut mutation = KeyMutation::new();
        mutation
            .insert("pre-key", "1", json!({ "public": "a" }))
            .insert("pre-key", "2", json!({ "public": "b" }));
        store.mutate_keys(&mutation).await.unwrap();

        let ids = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        let found = store.get_keys("pre-key", &ids).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(!found.contains_key("3"));

        let mut delete = KeyMutation::new();
        delete.delete("pre-key", "1");
        store.mutate_keys(&delete).await.unwrap();

        let found = store.get_keys("pre-key", &ids).await.unwrap();
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["2"]);
        assert!(store.get_keys("session", &ids).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn snapshot_and_clear() {
        let store = MemoryStore::new();
        let creds = Credentials::from_value(json!({ "registrationId": 7 })).unwrap();
        store.save_creds(&creds).await.unwrap();
        let mut mutation = KeyMutation::new();
        mutation.insert("session", "123.0", json!("blob"));
        store.mutate_keys(&mutation).await.unwrap();

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.creds, Some(creds));
        assert_eq!(snapshot.keys["session"]["123.0"], json!("blob"));

        store.clear().await.unwrap();
        assert!(store.snapshot().await.unwrap().is_empty());
        assert_eq!(store.load_creds().await.unwrap(), None);
    }
}
