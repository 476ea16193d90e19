// SQLite store round trip against a real database file.

use serde_json::{json, Value};
use sociograph::store::{EntityKind, EntityStore, Filter, SqliteStore};

async fn store() -> (tempfile::TempDir, SqliteStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let store = SqliteStore::new(&format!("sqlite://{}", path.display()))
        .await
        .unwrap();
    store.init().await.unwrap();
    (dir, store)
}

#[tokio::test]
async fn create_and_read_back() {
    let (_dir, store) = store().await;

    let record = store
        .create(EntityKind::User, json!({ "username": "alice", "role": "user" }))
        .await
        .unwrap();
    assert!(record.id > 0);

    let found = store
        .find_one(EntityKind::User, Filter::eq("username", "alice"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, record.id);
    assert_eq!(found.data["role"], "user");

    // Kinds are isolated from one another.
    assert!(store
        .find_one(EntityKind::Post, Filter::eq("username", "alice"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn results_come_back_newest_first() {
    let (_dir, store) = store().await;

    for name in ["a", "b", "c"] {
        store
            .create(EntityKind::User, json!({ "username": name }))
            .await
            .unwrap();
    }

    let records = store.find(EntityKind::User, Filter::All, None).await.unwrap();
    let names: Vec<&str> = records
        .iter()
        .map(|r| r.data["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["c", "b", "a"]);

    let limited = store
        .find(EntityKind::User, Filter::All, Some(1))
        .await
        .unwrap();
    assert_eq!(limited[0].data["username"], "c");
}

#[tokio::test]
async fn boolean_filters_compile_to_working_predicates() {
    let (_dir, store) = store().await;

    store
        .create(EntityKind::Follow, json!({ "follower": 1, "following": 2 }))
        .await
        .unwrap();
    store
        .create(EntityKind::Follow, json!({ "follower": 2, "following": 1 }))
        .await
        .unwrap();
    store
        .create(EntityKind::Follow, json!({ "follower": 3, "following": 1 }))
        .await
        .unwrap();

    let pair = Filter::or(vec![
        Filter::and(vec![Filter::eq("follower", 1), Filter::eq("following", 2)]),
        Filter::and(vec![Filter::eq("follower", 2), Filter::eq("following", 1)]),
    ]);
    assert_eq!(store.count(EntityKind::Follow, pair).await.unwrap(), 2);

    let not_from = Filter::not_in("follower", vec![Value::from(1), Value::from(2)]);
    let records = store
        .find(EntityKind::Follow, not_from, None)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].data["follower"], 3);

    // An empty exclusion list matches everything.
    assert_eq!(
        store
            .count(EntityKind::Follow, Filter::not_in("follower", vec![]))
            .await
            .unwrap(),
        3
    );
}

#[tokio::test]
async fn id_pseudo_field_targets_the_row_id() {
    let (_dir, store) = store().await;

    let first = store
        .create(EntityKind::Post, json!({ "content": "one" }))
        .await
        .unwrap();
    store
        .create(EntityKind::Post, json!({ "content": "two" }))
        .await
        .unwrap();

    let found = store
        .find_one(EntityKind::Post, Filter::by_id(first.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.data["content"], "one");
}

#[tokio::test]
async fn update_rewrites_data_and_requires_an_existing_row() {
    let (_dir, store) = store().await;

    let mut record = store
        .create(EntityKind::User, json!({ "username": "alice", "status": "active" }))
        .await
        .unwrap();
    record.data["status"] = json!("deleted");
    store.update(&record).await.unwrap();

    let found = store
        .find_one(EntityKind::User, Filter::by_id(record.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.data["status"], "deleted");

    record.id = 9999;
    assert!(store.update(&record).await.is_err());
}

#[tokio::test]
async fn delete_many_removes_only_matching_rows() {
    let (_dir, store) = store().await;

    store
        .create(EntityKind::Follow, json!({ "follower": 1, "following": 2 }))
        .await
        .unwrap();
    store
        .create(EntityKind::Follow, json!({ "follower": 1, "following": 3 }))
        .await
        .unwrap();
    store
        .create(EntityKind::Follow, json!({ "follower": 2, "following": 1 }))
        .await
        .unwrap();

    let removed = store
        .delete_many(EntityKind::Follow, Filter::eq("follower", 1))
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(
        store.count(EntityKind::Follow, Filter::All).await.unwrap(),
        1
    );
}
