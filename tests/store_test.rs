use moodcli::{
    error::StoreError,
    management::{FileStore, KeyValueStore, MemoryStore},
};
use serde_json::{Map, Value, json};
use tempfile::tempdir;

fn items(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

#[tokio::test]
async fn test_file_store_missing_file_reads_empty() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path().join("storage.json"));

    let values = store.get(&["accessToken"]).await.unwrap();
    assert!(values.is_empty());
}

#[tokio::test]
async fn test_file_store_set_get_remove() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path().join("nested").join("storage.json"));

    store
        .set(items(json!({ "accessToken": "AT1", "refreshToken": null })))
        .await
        .unwrap();
    store
        .set(items(json!({ "codeVerifier": "v" })))
        .await
        .unwrap();

    let values = store
        .get(&["accessToken", "refreshToken", "missing"])
        .await
        .unwrap();
    assert_eq!(
        Value::Object(values),
        json!({ "accessToken": "AT1", "refreshToken": null })
    );

    store.remove(&["codeVerifier", "missing"]).await.unwrap();
    assert!(store.get(&["codeVerifier"]).await.unwrap().is_empty());
    assert_eq!(store.get(&["accessToken"]).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storage.json");

    FileStore::new(&path)
        .set(items(json!({ "accessToken": "AT1", "refreshToken": "RT1" })))
        .await
        .unwrap();

    let reopened = FileStore::new(&path);
    let values = reopened.get(&["accessToken", "refreshToken"]).await.unwrap();
    assert_eq!(values.get("refreshToken"), Some(&json!("RT1")));

    // no temporary file is left behind
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_file_store_rejects_non_object() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    let store = FileStore::new(&path);
    assert!(matches!(
        store.get(&["accessToken"]).await,
        Err(StoreError::NotAnObject)
    ));
}

#[tokio::test]
async fn test_file_store_empty_file_reads_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "  \n").unwrap();

    let store = FileStore::new(&path);
    assert!(store.get(&["accessToken"]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_memory_store_overwrites_keys() {
    let store = MemoryStore::new();
    store
        .set(items(json!({ "accessToken": "AT1", "refreshToken": "RT1" })))
        .await
        .unwrap();
    store
        .set(items(json!({ "accessToken": "AT2" })))
        .await
        .unwrap();

    assert_eq!(
        Value::Object(store.snapshot().await),
        json!({ "accessToken": "AT2", "refreshToken": "RT1" })
    );
}
