use chrono::{TimeZone, Utc};
use rstest::rstest;

use revstore_core::impls::{InMemoryNodeStore, StoreOp};
use revstore_core::ports::{Clock, FixedClock};
use revstore_core::{
    Filename, Key, NodeStore, RevisionKey, RevisionStore, StoreConfig, StoreError,
};

type TestStore = RevisionStore<InMemoryNodeStore, FixedClock>;

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
}

fn setup(config: StoreConfig) -> (InMemoryNodeStore, TestStore) {
    let store = InMemoryNodeStore::new();
    let revisions = RevisionStore::with_clock(store.clone(), config, clock()).unwrap();
    (store, revisions)
}

fn key(value: &str) -> Key {
    Key::new(value).unwrap()
}

fn rev(value: &str) -> RevisionKey {
    RevisionKey::new(value).unwrap()
}

fn file(value: &str) -> Filename {
    Filename::new(value).unwrap()
}

async fn deploy(revisions: &TestStore, key: &Key, revision: &str) {
    let revision = rev(revision);
    revisions
        .upload(key, Some(&revision), &file("index.html"), revision.as_str().as_bytes())
        .await
        .unwrap();
    revisions
        .trim_recent_uploads(key, Some(&revision))
        .await
        .unwrap();
}

async fn markers(revisions: &TestStore, key: &Key) -> Vec<String> {
    let mut names: Vec<String> = revisions
        .fetch_revisions(key)
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.revision.to_string())
        .collect();
    names.sort_by_key(|name| name.parse::<u64>().unwrap_or(u64::MAX));
    names
}

#[tokio::test]
async fn upload_returns_artifact_path_and_stores_content() {
    let (store, revisions) = setup(StoreConfig::default().with_key_prefix("/app"));

    let path = revisions
        .upload(&key("key"), Some(&rev("abc")), &file("index.html"), b"v1")
        .await
        .unwrap();

    assert_eq!(path, "/app/key/abc/index.html");
    assert_eq!(store.read(&path).await.unwrap(), b"v1");
    assert!(store.exists("/app/key/revisions").await.unwrap());
}

#[tokio::test]
async fn second_upload_to_same_path_fails_with_node_exists() {
    let (_, revisions) = setup(StoreConfig::default());
    let key = key("key");
    let revision = rev("1");

    revisions
        .upload(&key, Some(&revision), &file("index.html"), b"a")
        .await
        .unwrap();
    revisions
        .upload(&key, Some(&revision), &file("app.js"), b"b")
        .await
        .unwrap();
    revisions
        .upload(&key, Some(&revision), &file("assets/app.css"), b"c")
        .await
        .unwrap();

    let err = revisions
        .upload(&key, Some(&revision), &file("app.js"), b"again")
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::NodeExists("/key/1/app.js".to_string()));
    assert_eq!(
        err.to_string(),
        "Value already exists for key: /key/1/app.js"
    );
    assert_eq!(
        revisions
            .fetch(&key, &revision, &file("app.js"))
            .await
            .unwrap(),
        b"b"
    );
}

#[tokio::test]
async fn allow_overwrite_replaces_content() {
    let (store, revisions) = setup(StoreConfig::default().with_allow_overwrite(true));
    let key = key("key");

    let path = revisions
        .upload(&key, None, &file("index.html"), b"v1")
        .await
        .unwrap();
    revisions
        .upload(&key, None, &file("index.html"), b"v2")
        .await
        .unwrap();

    assert_eq!(store.read(&path).await.unwrap(), b"v2");
    assert_eq!(store.version(&path).await.unwrap(), 1);
}

#[tokio::test]
async fn missing_revision_uploads_as_default() {
    let (store, revisions) = setup(StoreConfig::default());
    let (other_store, other) = setup(StoreConfig::default());

    let implicit = revisions
        .upload(&key("key"), None, &file("index.html"), b"v1")
        .await
        .unwrap();
    let explicit = other
        .upload(&key("key"), Some(&rev("default")), &file("index.html"), b"v1")
        .await
        .unwrap();

    assert_eq!(implicit, explicit);
    assert_eq!(store.paths().await, other_store.paths().await);
}

#[tokio::test]
async fn first_deploy_lists_one_inactive_default_revision() {
    let (_, revisions) = setup(StoreConfig::default());
    let key = key("key");

    revisions
        .upload(&key, None, &file("index.html"), b"v1")
        .await
        .unwrap();
    revisions.trim_recent_uploads(&key, None).await.unwrap();

    let records = revisions.fetch_revisions(&key).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].revision, "default");
    assert!(!records[0].active);
    assert_eq!(records[0].timestamp, clock().now_millis());
}

#[tokio::test]
async fn trim_below_retention_removes_nothing() {
    let (_, revisions) = setup(StoreConfig::default());
    let key = key("key");

    for n in 1..=10 {
        deploy(&revisions, &key, &n.to_string()).await;
    }

    let expected: Vec<String> = (1..=10).map(|n| n.to_string()).collect();
    assert_eq!(markers(&revisions, &key).await, expected);
}

#[tokio::test]
async fn trim_above_retention_removes_oldest_and_its_artifacts() {
    let (store, revisions) = setup(StoreConfig::default());
    let key = key("key");
    for n in 1..=10 {
        deploy(&revisions, &key, &n.to_string()).await;
    }
    revisions
        .upload(&key, Some(&rev("1")), &file("assets/app.js"), b"js")
        .await
        .unwrap();

    deploy(&revisions, &key, "11").await;

    let expected: Vec<String> = (2..=11).map(|n| n.to_string()).collect();
    assert_eq!(markers(&revisions, &key).await, expected);
    let leftovers: Vec<String> = store
        .paths()
        .await
        .into_iter()
        .filter(|path| path.starts_with("/key/1/") || path == "/key/1")
        .collect();
    assert!(leftovers.is_empty(), "left behind: {leftovers:?}");
    assert!(store.exists("/key/2/index.html").await.unwrap());
    assert!(store.exists("/key/11/index.html").await.unwrap());
}

#[tokio::test]
async fn active_revision_is_never_pruned() {
    let (store, revisions) = setup(StoreConfig::default());
    let key = key("key");
    for n in 1..=10 {
        deploy(&revisions, &key, &n.to_string()).await;
    }
    revisions.activate(&key, &rev("1")).await.unwrap();

    deploy(&revisions, &key, "11").await;

    let expected: Vec<String> = (1..=11).map(|n| n.to_string()).collect();
    assert_eq!(markers(&revisions, &key).await, expected);
    assert_eq!(store.read("/key").await.unwrap(), b"1");
    assert!(store.exists("/key/1/index.html").await.unwrap());
}

#[tokio::test]
async fn active_revision_counts_toward_retention() {
    let (_, revisions) = setup(StoreConfig::default().with_retention(2));
    let key = key("key");
    deploy(&revisions, &key, "1").await;
    deploy(&revisions, &key, "2").await;
    revisions.activate(&key, &rev("2")).await.unwrap();

    deploy(&revisions, &key, "3").await;
    assert_eq!(markers(&revisions, &key).await, vec!["2", "3"]);

    // "2" is now the oldest; it is skipped, not replaced by "3".
    deploy(&revisions, &key, "4").await;
    assert_eq!(markers(&revisions, &key).await, vec!["2", "3", "4"]);

    deploy(&revisions, &key, "5").await;
    assert_eq!(markers(&revisions, &key).await, vec!["2", "4", "5"]);
}

#[tokio::test]
async fn newest_active_revision_keeps_history_at_retention() {
    let (store, revisions) = setup(StoreConfig::default());
    let key = key("key");
    for n in 1..=10 {
        deploy(&revisions, &key, &n.to_string()).await;
    }
    revisions.activate(&key, &rev("10")).await.unwrap();

    deploy(&revisions, &key, "11").await;

    let expected: Vec<String> = (2..=11).map(|n| n.to_string()).collect();
    assert_eq!(markers(&revisions, &key).await, expected);
    assert!(!store.exists("/key/1").await.unwrap());
    assert_eq!(store.read("/key").await.unwrap(), b"10");
}

#[tokio::test]
async fn pruning_follows_upload_order_not_names() {
    let (_, revisions) = setup(StoreConfig::default().with_retention(2));
    let key = key("key");

    for name in ["zulu", "alpha", "mike"] {
        deploy(&revisions, &key, name).await;
    }

    let mut remaining: Vec<String> = revisions
        .fetch_revisions(&key)
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.revision.to_string())
        .collect();
    remaining.sort();
    assert_eq!(remaining, vec!["alpha", "mike"]);
}

#[tokio::test]
async fn repeated_trim_is_idempotent() {
    let (store, revisions) = setup(StoreConfig::default());
    let key = key("key");
    deploy(&revisions, &key, "1").await;
    let before = store.paths().await;

    revisions
        .trim_recent_uploads(&key, Some(&rev("1")))
        .await
        .unwrap();
    revisions
        .trim_recent_uploads(&key, Some(&rev("1")))
        .await
        .unwrap();

    assert_eq!(store.paths().await, before);
}

#[tokio::test]
async fn failed_prune_resumes_on_next_trim() {
    let (store, revisions) = setup(StoreConfig::default().with_retention(1));
    let key = key("key");
    deploy(&revisions, &key, "1").await;
    revisions
        .upload(&key, Some(&rev("2")), &file("index.html"), b"2")
        .await
        .unwrap();
    revisions
        .upload(&key, Some(&rev("3")), &file("index.html"), b"3")
        .await
        .unwrap();
    store
        .create_exclusive("/key/revisions/2", b"")
        .await
        .unwrap();

    store
        .fail_next(StoreOp::Remove, StoreError::Backend("connection loss".into()))
        .await;
    let err = revisions
        .trim_recent_uploads(&key, Some(&rev("3")))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::Backend("connection loss".into()));
    assert!(markers(&revisions, &key).await.len() > 1);

    revisions
        .trim_recent_uploads(&key, Some(&rev("3")))
        .await
        .unwrap();
    assert_eq!(markers(&revisions, &key).await, vec!["3"]);
    assert!(!store.exists("/key/1").await.unwrap());
    assert!(!store.exists("/key/2").await.unwrap());
}

#[tokio::test]
async fn activate_then_read_back() {
    let (store, revisions) = setup(StoreConfig::default().with_key_prefix("app"));
    let key = key("/nested/key");
    deploy(&revisions, &key, "1").await;
    deploy(&revisions, &key, "2").await;

    assert_eq!(revisions.active_revision(&key).await.unwrap(), None);

    let activated = revisions.activate(&key, &rev("1")).await.unwrap();
    assert_eq!(activated, "1");
    assert_eq!(revisions.active_revision(&key).await.unwrap(), Some(rev("1")));

    revisions.activate(&key, &rev("2")).await.unwrap();
    assert_eq!(revisions.active_revision(&key).await.unwrap(), Some(rev("2")));
    assert_eq!(store.read("/app/nested/key").await.unwrap(), b"2");

    let records = revisions.fetch_revisions(&key).await.unwrap();
    let active: Vec<_> = records
        .iter()
        .filter(|record| record.active)
        .map(|record| record.revision.as_str())
        .collect();
    assert_eq!(active, vec!["2"]);
}

#[rstest]
#[case::unknown_revision(&["1", "2", "3"], "notme")]
#[case::never_uploaded(&[], "1")]
#[tokio::test]
async fn activate_unknown_revision_fails(#[case] history: &[&str], #[case] target: &str) {
    let (_, revisions) = setup(StoreConfig::default());
    let key = key("key");
    for revision in history {
        deploy(&revisions, &key, revision).await;
    }

    let err = revisions.activate(&key, &rev(target)).await.unwrap_err();

    assert_eq!(err, StoreError::InvalidRevision(target.to_string()));
    assert_eq!(err.to_string(), format!("`{target}` is not a valid revision key"));
    assert_eq!(revisions.active_revision(&key).await.unwrap(), None);
}

#[tokio::test]
async fn will_deploy_is_idempotent_on_overlapping_paths() {
    let (store, revisions) = setup(StoreConfig::default().with_key_prefix("/a"));

    revisions.will_deploy(&key("b")).await.unwrap();
    revisions.will_deploy(&key("b")).await.unwrap();
    revisions.will_deploy(&key("b/c")).await.unwrap();

    assert_eq!(
        store.paths().await,
        vec!["/a", "/a/b", "/a/b/c", "/a/b/c/revisions", "/a/b/revisions"]
    );
}

#[tokio::test]
async fn unknown_key_has_empty_history() {
    let (_, revisions) = setup(StoreConfig::default());
    assert!(revisions.fetch_revisions(&key("ghost")).await.unwrap().is_empty());
}

#[tokio::test]
async fn fetch_active_reads_the_serving_revision() {
    let (_, revisions) = setup(StoreConfig::default());
    let key = key("key");
    let index = file("index.html");

    assert_eq!(revisions.fetch_active(&key, &index).await.unwrap(), None);

    deploy(&revisions, &key, "1").await;
    deploy(&revisions, &key, "2").await;
    revisions.activate(&key, &rev("2")).await.unwrap();

    assert_eq!(
        revisions.fetch_active(&key, &index).await.unwrap(),
        Some(b"2".to_vec())
    );
}

#[tokio::test]
async fn concurrent_uploads_have_a_single_winner() {
    let (_, revisions) = setup(StoreConfig::default());
    let key = key("key");
    let revision = rev("1");
    let index = file("index.html");

    let (first, second) = tokio::join!(
        revisions.upload(&key, Some(&revision), &index, b"a"),
        revisions.upload(&key, Some(&revision), &index, b"b"),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(StoreError::NodeExists(_))))
    );
}

#[tokio::test]
async fn store_failures_pass_through_unchanged() {
    let (store, revisions) = setup(StoreConfig::default());
    store
        .fail_next(StoreOp::Children, StoreError::Backend("session expired".into()))
        .await;

    let err = revisions.fetch_revisions(&key("key")).await.unwrap_err();

    assert_eq!(err, StoreError::Backend("session expired".into()));
}
