// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn file_store_round_trips_pair() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path());
    let pair = TokenPair::new("access-1", "refresh-1");

    store.save("abc", &pair).await?;
    let loaded = store.load("abc").await?;
    assert_eq!(loaded, pair);
    Ok(())
}

#[tokio::test]
async fn file_store_missing_record_is_empty_pair() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path().join("not-yet-created"));

    let loaded = store.load("abc").await?;
    assert_eq!(loaded.access_token, None);
    assert_eq!(loaded.refresh_token, None);
    Ok(())
}

#[tokio::test]
async fn file_store_keeps_null_fields() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path());
    let pair = TokenPair { access_token: None, refresh_token: Some("only-refresh".into()) };

    store.save("k", &pair).await?;
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store.path_for("k"))?)?;
    assert_eq!(raw["version"], 1);
    assert_eq!(raw["key"], "k");
    assert!(raw["data"]["access_token"].is_null());
    assert_eq!(raw["data"]["refresh_token"], "only-refresh");

    assert_eq!(store.load("k").await?, pair);
    Ok(())
}

#[tokio::test]
async fn file_store_overwrites_and_leaves_no_tmp_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path());

    store.save("k", &TokenPair::new("a1", "r1")).await?;
    store.save("k", &TokenPair::new("a2", "r2")).await?;

    assert_eq!(store.load("k").await?, TokenPair::new("a2", "r2"));
    let names: Vec<String> = std::fs::read_dir(dir.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["k.json".to_owned()]);
    Ok(())
}

#[tokio::test]
async fn file_store_rejects_unknown_version() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path());
    std::fs::write(
        store.path_for("k"),
        r#"{"version":9,"key":"k","data":{"access_token":null,"refresh_token":null}}"#,
    )?;

    let err = store.load("k").await.err();
    assert!(matches!(err, Some(XoltaError::Storage(_))));
    Ok(())
}

#[tokio::test]
async fn file_store_rejects_garbage() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path());
    std::fs::write(store.path_for("k"), "not json")?;

    assert!(store.load("k").await.is_err());
    Ok(())
}

#[tokio::test]
async fn memory_store_round_trip() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    assert!(store.load("k").await?.is_empty());

    store.save("k", &TokenPair::new("a", "r")).await?;
    assert_eq!(store.get("k").await, Some(TokenPair::new("a", "r")));
    Ok(())
}
