use izumie::auth::{AuthStore, FileStore, SqlStore};
use izumie::config::{AuthBackend, AuthConfig};
use izumie_schema::{Credentials, KeyMutation};
use serde_json::json;
use std::path::PathBuf;

fn temp_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("izumie_{tag}_{}", uuid::Uuid::new_v4()))
}

fn temp_database_url(tag: &str) -> String {
    let db_path = temp_dir(tag).with_extension("sqlite");
    format!("sqlite:{}", db_path.to_str().unwrap())
}

fn creds() -> Credentials {
    Credentials::from_value(json!({
        "noiseKey": { "public": "bm9pc2U=" },
        "me": { "id": "12025550123:7@s.whatsapp.net" }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_file_store_round_trip() {
    let dir = temp_dir("file_store");
    let store = FileStore::new(&dir);

    assert!(store.load_creds().await.unwrap().is_none());
    assert!(store.snapshot().await.unwrap().is_empty());

    store.save_creds(&creds()).await.unwrap();
    assert_eq!(store.load_creds().await.unwrap(), Some(creds()));

    let mut mutation = KeyMutation::new();
    mutation
        .insert("pre-key", "1", json!({ "public": "a" }))
        .insert("pre-key", "2", json!({ "public": "b" }))
        .insert("session", "12025550123.0", json!("opaque"))
        .insert("app-state-sync-key", "AAAA/BBB:", json!(42));
    store.mutate_keys(&mutation).await.unwrap();

    let found = store
        .get_keys("pre-key", &["1".to_string(), "3".to_string()])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found["1"], json!({ "public": "a" }));

    // Ids with path separators survive the escaping.
    let found = store
        .get_keys("app-state-sync-key", &["AAAA/BBB:".to_string()])
        .await
        .unwrap();
    assert_eq!(found["AAAA/BBB:"], json!(42));

    let mut deletion = KeyMutation::new();
    deletion.delete("pre-key", "1").delete("pre-key", "never-written");
    store.mutate_keys(&deletion).await.unwrap();

    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.creds, Some(creds()));
    assert_eq!(snapshot.key_count(), 3);
    assert!(!snapshot.keys["pre-key"].contains_key("1"));
    assert!(snapshot.keys["app-state-sync-key"].contains_key("AAAA/BBB:"));

    // A second store over the same directory sees the same state.
    let reopened = FileStore::new(&dir);
    assert_eq!(reopened.snapshot().await.unwrap(), snapshot);

    store.clear().await.unwrap();
    assert!(!dir.exists());
    assert!(store.snapshot().await.unwrap().is_empty());
    // Clearing twice is fine.
    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_file_store_skips_corrupt_key_files() {
    let dir = temp_dir("file_store_corrupt");
    let store = FileStore::new(&dir);

    let mut mutation = KeyMutation::new();
    mutation.insert("pre-key", "1", json!("good"));
    store.mutate_keys(&mutation).await.unwrap();

    tokio::fs::write(dir.join("keys/pre-key/2.json"), b"{not json")
        .await
        .unwrap();

    let found = store
        .get_keys("pre-key", &["1".to_string(), "2".to_string()])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.key_count(), 1);

    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_file_store_skips_unreadable_key_files() {
    let dir = temp_dir("file_store_unreadable");
    let store = FileStore::new(&dir);

    let mut mutation = KeyMutation::new();
    mutation.insert("pre-key", "1", json!("good"));
    store.mutate_keys(&mutation).await.unwrap();

    tokio::fs::write(dir.join("keys/pre-key/2.json"), [0xff, 0xfe, 0x00])
        .await
        .unwrap();
    tokio::fs::create_dir_all(dir.join("keys/pre-key/3.json"))
        .await
        .unwrap();

    let found = store
        .get_keys(
            "pre-key",
            &["1".to_string(), "2".to_string(), "3".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.key_count(), 1);
    assert_eq!(snapshot.keys["pre-key"]["1"], json!("good"));

    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_file_store_keeps_empty_ids() {
    let dir = temp_dir("file_store_empty_id");
    let store = FileStore::new(&dir);

    let mut mutation = KeyMutation::new();
    mutation
        .insert("app-state-sync-version", "", json!({ "version": 3 }))
        .insert("app-state-sync-version", ".", json!({ "version": 4 }));
    store.mutate_keys(&mutation).await.unwrap();

    let found = store
        .get_keys("app-state-sync-version", &[String::new()])
        .await
        .unwrap();
    assert_eq!(found[""], json!({ "version": 3 }));

    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.key_count(), 2);
    assert_eq!(
        snapshot.keys["app-state-sync-version"][""],
        json!({ "version": 3 })
    );
    assert_eq!(
        snapshot.keys["app-state-sync-version"]["."],
        json!({ "version": 4 })
    );

    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_sql_store_survives_reopen() {
    let db = izumie::db::spawn(&temp_database_url("sql_store")).await.unwrap();

    let store = SqlStore::load(db.clone(), "bot-1").await.unwrap();
    assert!(store.load_creds().await.unwrap().is_none());

    store.save_creds(&creds()).await.unwrap();
    let mut mutation = KeyMutation::new();
    mutation
        .insert("pre-key", "1", json!({ "public": "a" }))
        .insert("pre-key", "2", json!({ "public": "b" }));
    store.mutate_keys(&mutation).await.unwrap();
    let mut deletion = KeyMutation::new();
    deletion.delete("pre-key", "2");
    store.mutate_keys(&deletion).await.unwrap();

    let reopened = SqlStore::load(db.clone(), "bot-1").await.unwrap();
    assert_eq!(reopened.load_creds().await.unwrap(), Some(creds()));
    let snapshot = reopened.snapshot().await.unwrap();
    assert_eq!(snapshot, store.snapshot().await.unwrap());
    assert_eq!(snapshot.key_count(), 1);

    // Other session keys are isolated.
    let other = SqlStore::load(db.clone(), "bot-2").await.unwrap();
    assert!(other.snapshot().await.unwrap().is_empty());

    reopened.clear().await.unwrap();
    let after_clear = SqlStore::load(db, "bot-1").await.unwrap();
    assert!(after_clear.snapshot().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_selects_backend() {
    let db = izumie::db::spawn(&temp_database_url("open_backend"))
        .await
        .unwrap();

    for backend in [AuthBackend::Memory, AuthBackend::File, AuthBackend::Sql] {
        let cfg = AuthConfig {
            backend,
            dir: temp_dir("open_backend_dir"),
            session_key: "default".to_string(),
        };
        let store = izumie::auth::open(&cfg, &db).await.unwrap();
        store.save_creds(&creds()).await.unwrap();
        assert_eq!(store.load_creds().await.unwrap(), Some(creds()));
        store.clear().await.unwrap();
        assert!(store.load_creds().await.unwrap().is_none());
    }
}
