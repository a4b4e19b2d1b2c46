mod helpers;

use std::sync::Arc;

use helpers::{build_store, test_config, FakeEmbedder, FakeGraph, GraphBehavior};
use memoir::memory::forget::ForgetTarget;
use memoir::memory::types::StoreOptions;

fn fixtures() -> (Arc<FakeEmbedder>, Arc<FakeGraph>) {
    (
        Arc::new(FakeEmbedder::new()),
        Arc::new(FakeGraph::new(GraphBehavior::Answer("ok".into()))),
    )
}

#[tokio::test]
async fn forget_by_id_removes_one_record() {
    let (embedder, graph) = fixtures();
    let store = build_store(embedder, graph.clone(), &test_config());

    let kept = store
        .store("I love hiking", StoreOptions::default())
        .await
        .unwrap();
    let dropped = store
        .store("I like pizza", StoreOptions::default())
        .await
        .unwrap();
    let dropped_id = dropped.record().unwrap().id.clone();

    let removed = store
        .forget(ForgetTarget::Id(dropped_id.clone()))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(store.record(&dropped_id).unwrap().is_none());
    assert!(store
        .record(&kept.record().unwrap().id)
        .unwrap()
        .is_some());
    assert_eq!(graph.deletes.lock().unwrap().as_slice(), &[dropped_id]);
}

#[tokio::test]
async fn forget_by_topic_removes_all_carrying_the_label() {
    let (embedder, graph) = fixtures();
    let store = build_store(embedder, graph, &test_config());

    store
        .store("I love hiking", StoreOptions::default())
        .await
        .unwrap();
    store
        .store("I enjoy camping", StoreOptions::default())
        .await
        .unwrap();
    store
        .store("I like pizza", StoreOptions::default())
        .await
        .unwrap();

    let removed = store
        .forget(ForgetTarget::Topic("outdoors".into()))
        .await
        .unwrap();
    assert_eq!(removed, 2);

    let stats = store.stats().unwrap();
    assert_eq!(stats.total, 1);
    assert!(stats.topics.contains_key("food"));
    assert!(!stats.topics.contains_key("outdoors"));
}

#[tokio::test]
async fn forget_all_clears_subject_and_graph() {
    let (embedder, graph) = fixtures();
    let store = build_store(embedder, graph.clone(), &test_config());

    store
        .store("I love hiking", StoreOptions::default())
        .await
        .unwrap();
    store
        .store("I like pizza", StoreOptions::default())
        .await
        .unwrap();

    let removed = store.forget(ForgetTarget::All).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(store.stats().unwrap().total, 0);
    assert!(*graph.cleared.lock().unwrap());
}

#[tokio::test]
async fn forget_missing_id_removes_nothing() {
    let (embedder, graph) = fixtures();
    let store = build_store(embedder, graph, &test_config());

    store
        .store("I love hiking", StoreOptions::default())
        .await
        .unwrap();
    let removed = store
        .forget(ForgetTarget::Id("no-such-id".into()))
        .await
        .unwrap();
    assert_eq!(removed, 0);
    assert_eq!(store.stats().unwrap().total, 1);
}

#[tokio::test]
async fn forgotten_record_no_longer_blocks_restore() {
    let (embedder, graph) = fixtures();
    let store = build_store(embedder, graph, &test_config());

    let first = store
        .store("I love hiking", StoreOptions::default())
        .await
        .unwrap();
    store
        .forget(ForgetTarget::Id(first.record().unwrap().id.clone()))
        .await
        .unwrap();

    // Identical text stores cleanly once the old record and vector are gone.
    let again = store
        .store("I love hiking", StoreOptions::default())
        .await
        .unwrap();
    assert!(!again.is_duplicate());
}
