//! Authentication state shapes shared by the stores and the bridge.
//!
//! Credentials and key material are opaque JSON owned by the protocol library; this crate only
//! reads the handful of fields needed to drive the login flow.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key material for one category, keyed by key id.
pub type KeyEntries = BTreeMap<String, Value>;

/// Opaque account credentials (noise key, signed identity key, registration id, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(Map<String, Value>);

impl Credentials {
    /// Wraps a JSON value; returns `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// True once the library has generated the noise key pair.
    pub fn noise_key_ready(&self) -> bool {
        self.0
            .get("noiseKey")
            .and_then(|k| k.get("public"))
            .is_some_and(|v| !v.is_null())
    }

    /// Own account id (`me.id`), present after a successful link.
    pub fn me_id(&self) -> Option<&str> {
        self.0.get("me")?.get("id")?.as_str()
    }
}

/// A partial key-store write: `category -> id -> value`. A `None` value deletes the entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMutation(BTreeMap<String, BTreeMap<String, Option<Value>>>);

impl KeyMutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: &str, id: &str, value: Value) -> &mut Self {
        self.entry(category).insert(id.to_string(), Some(value));
        self
    }

    pub fn delete(&mut self, category: &str, id: &str) -> &mut Self {
        self.entry(category).insert(id.to_string(), None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }

    /// Iterates `(category, id, value)` triples in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, Option<&Value>)> {
        self.0.iter().flat_map(|(category, entries)| {
            entries
                .iter()
                .map(move |(id, value)| (category.as_str(), id.as_str(), value.as_ref()))
        })
    }

    fn entry(&mut self, category: &str) -> &mut BTreeMap<String, Option<Value>> {
        self.0.entry(category.to_string()).or_default()
    }
}

/// Serialized snapshot of a whole auth state, as stored in a session row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub creds: Option<Credentials>,
    #[serde(default)]
    pub keys: BTreeMap<String, KeyEntries>,
}

impl SessionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.creds.is_none() && self.key_count() == 0
    }

    pub fn key_count(&self) -> usize {
        self.keys.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn credentials_expose_noise_key_and_me() {
        let creds = Credentials::from_value(json!({
            "noiseKey": { "public": "AAAA", "private": "BBBB" },
            "me": { "id": "12025550123:7@s.whatsapp.net", "name": "izumie" },
            "registrationId": 42
        }))
        .unwrap();

        assert!(creds.noise_key_ready());
        assert_eq!(creds.me_id(), Some("12025550123:7@s.whatsapp.net"));

        let fresh = Credentials::from_value(json!({ "registrationId": 1 })).unwrap();
        assert!(!fresh.noise_key_ready());
        assert_eq!(fresh.me_id(), None);

        assert!(Credentials::from_value(json!([1, 2])).is_none());
    }

    #[test]
    fn key_mutation_null_means_delete() {
        let raw = json!({
            "pre-key": { "1": { "public": "x" }, "2": null },
            "session": {}
        });
        let mutation: KeyMutation = serde_json::from_value(raw).unwrap();

        let items: Vec<_> = mutation.iter().collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].0, "pre-key");
        assert_eq!(items[0].1, "1");
        assert!(items[0].2.is_some());
        assert_eq!(items[1].1, "2");
        assert!(items[1].2.is_none());
        assert!(!mutation.is_empty());

        let mut only_empty = KeyMutation::new();
        only_empty.entry("session");
        assert!(only_empty.is_empty());
    }

    #[test]
    fn snapshot_counts_keys_across_categories() {
        let mut snapshot = SessionSnapshot::default();
        assert!(snapshot.is_empty());

        snapshot
            .keys
            .entry("pre-key".to_string())
            .or_default()
            .insert("1".to_string(), json!("a"));
        snapshot
            .keys
            .entry("app-state-sync-key".to_string())
            .or_default()
            .insert("AAAA".to_string(), json!({ "keyData": "b" }));

        assert_eq!(snapshot.key_count(), 2);
        assert!(!snapshot.is_empty());
    }
}
