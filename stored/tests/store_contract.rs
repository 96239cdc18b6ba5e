use std::{collections::HashSet, sync::Arc};

use bson::{Bson, doc};
use serde_json::json;
use stored::{document, memory::InMemoryStore, prelude::*};

fn ids(raw: &[&str]) -> HashSet<Id> {
    raw.iter().copied().map(Id::from).collect()
}

fn scoped(connector: &InMemoryConnector, collection: &str) -> InMemoryStore {
    connector
        .store_builder("testing-project")
        .collection(collection)
        .build()
        .unwrap()
}

fn unscoped(connector: &InMemoryConnector) -> InMemoryStore {
    connector.store_builder("testing-project").build().unwrap()
}

#[tokio::test]
async fn store_then_retrieve_round_trips() {
    let store = scoped(&InMemoryConnector::new(), "testing");
    let test1 = document::from_json(&json!({ "foo": "bar", "bing": "bong" })).unwrap();
    let test2 = document::from_json(&json!({ "foo": 12, "bing": { "nested": true } })).unwrap();

    store.store_item(&Id::from("test1"), test1.clone()).await.unwrap();
    store.store_item(&Id::from("test2"), test2.clone()).await.unwrap();

    let listed: HashSet<Id> = store.list().await.unwrap().into_iter().collect();
    assert!(listed.contains(&Id::from("test1")));
    assert!(listed.contains(&Id::from("test2")));

    assert_eq!(store.retrieve(&Id::from("test1")).await.unwrap(), test1);

    let fetched = store.retrieve(&Id::from("test2")).await.unwrap();
    assert_eq!(fetched, test2);
    assert_eq!(
        document::to_json(&fetched).unwrap(),
        json!({ "foo": 12, "bing": { "nested": true } })
    );

    store.delete(&Id::from("test1")).await.unwrap();
    store.delete(&Id::from("test2")).await.unwrap();

    let listed = store.list().await.unwrap();
    assert!(!listed.contains(&Id::from("test1")));
    assert!(!listed.contains(&Id::from("test2")));

    store.close().await;
}

#[tokio::test]
async fn store_item_overwrites_and_is_idempotent() {
    let store = scoped(&InMemoryConnector::new(), "testing");
    let id = Id::from("doc");

    store.store_item(&id, doc! { "v": 1 }.into()).await.unwrap();
    store.store_item(&id, doc! { "v": 2 }.into()).await.unwrap();
    store.store_item(&id, doc! { "v": 2 }.into()).await.unwrap();

    assert_eq!(store.retrieve(&id).await.unwrap(), Bson::Document(doc! { "v": 2 }));
    assert_eq!(store.list().await.unwrap(), vec![id]);
}

#[tokio::test]
async fn unknown_and_deleted_ids_are_not_found() {
    let store = scoped(&InMemoryConnector::new(), "testing");

    let err = store.retrieve(&Id::from("never-written")).await.unwrap_err();
    assert!(err.is_not_found());

    store.store_item(&Id::from("gone"), doc! { "a": 1 }.into()).await.unwrap();
    store.delete(&Id::from("gone")).await.unwrap();

    match store.retrieve(&Id::from("gone")).await {
        Err(StoreError::NotFound(id)) => assert_eq!(id, Id::from("gone")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn deleting_a_missing_id_succeeds() {
    let store = scoped(&InMemoryConnector::new(), "testing");

    store.delete(&Id::from("missing")).await.unwrap();
    store.delete(&Id::from("missing")).await.unwrap();
}

#[tokio::test]
async fn scoped_list_has_no_prefix() {
    let connector = InMemoryConnector::new();
    let store = scoped(&connector, "C");

    for id in ["a", "b", "c"] {
        store.store_item(&Id::from(id), doc! { "id": id }.into()).await.unwrap();
    }
    // Documents elsewhere are invisible to the scoped store.
    unscoped(&connector)
        .store_item(&Id::from("D/x"), doc! {}.into())
        .await
        .unwrap();

    let listed: HashSet<Id> = store.list().await.unwrap().into_iter().collect();

    assert_eq!(listed, ids(&["a", "b", "c"]));
}

#[tokio::test]
async fn unscoped_list_spans_collections() {
    let store = unscoped(&InMemoryConnector::new());

    store.store_item(&Id::from("X/one"), doc! { "n": 1 }.into()).await.unwrap();
    store.store_item(&Id::from("Y/one"), doc! { "n": 2 }.into()).await.unwrap();

    let listed: HashSet<Id> = store.list().await.unwrap().into_iter().collect();

    assert_eq!(listed, ids(&["X/one", "Y/one"]));
}

#[tokio::test]
async fn scoped_and_unscoped_views_agree() {
    let connector = InMemoryConnector::new();
    let users = scoped(&connector, "users");
    let everything = unscoped(&connector);

    users.store_item(&Id::from("alice"), doc! { "age": 30 }.into()).await.unwrap();

    assert_eq!(everything.list().await.unwrap(), vec![Id::from("users/alice")]);
    assert_eq!(
        everything.retrieve(&Id::from("users/alice")).await.unwrap(),
        Bson::Document(doc! { "age": 30 })
    );

    everything.delete(&Id::from("users/alice")).await.unwrap();
    assert!(users.retrieve(&Id::from("alice")).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn scoped_ids_with_a_separator_are_invalid() {
    let connector = InMemoryConnector::new();
    let store = scoped(&connector, "C");
    let nested = Id::from("x/y");

    let err = store.store_item(&nested, doc! { "n": 1 }.into()).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidId(_)));
    assert!(matches!(store.retrieve(&nested).await, Err(StoreError::InvalidId(_))));
    assert!(matches!(store.delete(&nested).await, Err(StoreError::InvalidId(_))));

    let mut visited = 0;
    store
        .apply(&mut |_id: Id, _doc: Storable| -> StoreResult<()> {
            visited += 1;
            Ok(())
        })
        .await
        .unwrap();

    assert!(store.list().await.unwrap().is_empty());
    assert!(unscoped(&connector).list().await.unwrap().is_empty());
    assert_eq!(visited, 0);
}

#[tokio::test]
async fn list_reflects_current_state() {
    let connector = InMemoryConnector::new();
    let store = scoped(&connector, "testing");
    let writer = scoped(&connector, "testing");

    assert!(store.list().await.unwrap().is_empty());

    writer.store_item(&Id::from("late"), doc! {}.into()).await.unwrap();

    assert_eq!(store.list().await.unwrap(), vec![Id::from("late")]);
}

#[tokio::test]
async fn apply_visits_every_listed_document() {
    let store = unscoped(&InMemoryConnector::new());
    store.store_item(&Id::from("X/a"), doc! { "n": 1 }.into()).await.unwrap();
    store.store_item(&Id::from("X/b"), doc! { "n": 2 }.into()).await.unwrap();
    store.store_item(&Id::from("Y/c"), doc! { "n": 3 }.into()).await.unwrap();

    let mut seen = Vec::new();
    store
        .apply(&mut |id: Id, doc: Storable| {
            let n = doc.as_document().and_then(|d| d.get_i32("n").ok()).unwrap_or_default();
            seen.push((id, n));
            Ok(())
        })
        .await
        .unwrap();

    seen.sort();
    assert_eq!(
        seen,
        vec![(Id::from("X/a"), 1), (Id::from("X/b"), 2), (Id::from("Y/c"), 3)]
    );
}

#[tokio::test]
async fn apply_stops_at_the_first_handler_error() {
    let store = scoped(&InMemoryConnector::new(), "testing");
    for id in ["a", "b", "c"] {
        store.store_item(&Id::from(id), doc! {}.into()).await.unwrap();
    }

    let order = store.list().await.unwrap();
    let mut calls = Vec::new();

    let err = store
        .apply(&mut |id: Id, _doc: Storable| {
            calls.push(id.clone());
            if calls.len() == 2 {
                return Err(StoreError::Handler(format!("rejected {id}")));
            }
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Handler(_)));
    assert_eq!(calls.len(), 2);
    assert_eq!(calls, order[..2].to_vec());
}

#[tokio::test]
async fn apply_propagates_unmarshal_errors() {
    let connector = InMemoryConnector::new();
    scoped(&connector, "testing")
        .store_item(&Id::from("bad"), doc! { "valid": false }.into())
        .await
        .unwrap();

    let strict = connector
        .store_builder("testing-project")
        .collection("testing")
        .unmarshaler(|raw: Bson| -> StoreResult<Storable> {
            match raw.as_document().and_then(|d| d.get_bool("valid").ok()) {
                Some(true) => Ok(raw),
                _ => Err(StoreError::Unmarshal("invalid document".into())),
            }
        })
        .build()
        .unwrap();

    let mut calls = 0;
    let err = strict
        .apply(&mut |_id: Id, _doc: Storable| {
            calls += 1;
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Unmarshal(_)));
    assert_eq!(calls, 0);
}

#[tokio::test]
async fn hooks_transform_at_the_boundary() {
    let connector = InMemoryConnector::new();
    let store = connector
        .store_builder("testing-project")
        .collection("testing")
        .marshaler(|doc: Storable| -> StoreResult<Bson> {
            Ok(Bson::Document(doc! { "payload": doc }))
        })
        .unmarshaler(|raw: Bson| -> StoreResult<Storable> {
            raw.as_document()
                .and_then(|d| d.get("payload").cloned())
                .ok_or_else(|| StoreError::Unmarshal("missing payload".into()))
        })
        .build()
        .unwrap();

    store.store_item(&Id::from("s"), Bson::from("plain string")).await.unwrap();

    assert_eq!(store.retrieve(&Id::from("s")).await.unwrap(), Bson::from("plain string"));

    let raw = scoped(&connector, "testing").retrieve(&Id::from("s")).await.unwrap();
    assert_eq!(raw, Bson::Document(doc! { "payload": "plain string" }));
}

#[tokio::test]
async fn non_document_values_are_rejected_without_hooks() {
    let store = scoped(&InMemoryConnector::new(), "testing");

    let err = store.store_item(&Id::from("n"), Bson::Int64(5)).await.unwrap_err();

    assert!(matches!(err, StoreError::InvalidDocument(_)));
}

#[tokio::test]
async fn reconnects_after_close() {
    let connector = InMemoryConnector::new();
    let store = scoped(&connector, "testing");

    store.store_item(&Id::from("kept"), doc! {}.into()).await.unwrap();
    store.close().await;

    assert_eq!(store.list().await.unwrap(), vec![Id::from("kept")]);
    assert_eq!(connector.connections(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_share_one_connection() {
    let connector = InMemoryConnector::new();
    let store = Arc::new(scoped(&connector, "testing"));

    let tasks = (0..32)
        .map(|n| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .store_item(&Id::new(format!("doc{n}")), doc! { "n": n }.into())
                    .await
            })
        })
        .collect::<Vec<_>>();

    for result in futures::future::join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert_eq!(store.list().await.unwrap().len(), 32);
    assert_eq!(connector.connections(), 1);
}
