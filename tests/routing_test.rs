mod helpers;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use helpers::{build_store, test_config, FakeEmbedder, FakeGraph, GraphBehavior};
use memoir::error::{Error, Result};
use memoir::knowledge::{Backend, KnowledgeBackend, KnowledgeCoordinator, RouteMode};
use memoir::memory::types::StoreOptions;

/// Scripted backend for the local side of the coordinator.
struct Scripted {
    response: Result<String>,
    calls: AtomicUsize,
}

impl Scripted {
    fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            response: Err(Error::backend(Backend::Local, "no matching statements")),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeBackend for Scripted {
    async fn answer(&self, _query: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(_) => Err(Error::backend(Backend::Local, "no matching statements")),
        }
    }
}

fn coordinator(
    local: Arc<dyn KnowledgeBackend>,
    graph: Arc<dyn KnowledgeBackend>,
) -> KnowledgeCoordinator {
    KnowledgeCoordinator::new(local, graph, Duration::from_millis(100), 4)
}

#[test]
fn auto_routes_definitional_queries_local() {
    let c = coordinator(
        Scripted::answering("local"),
        Arc::new(FakeGraph::new(GraphBehavior::Answer("graph".into()))),
    );
    assert_eq!(
        c.route("What is the capital of France right now?", RouteMode::Auto),
        Backend::Local
    );
    assert_eq!(c.route("who's your favorite composer of all time", RouteMode::Auto), Backend::Local);
    assert_eq!(c.route("short query", RouteMode::Auto), Backend::Local);
}

#[test]
fn auto_routes_relationship_queries_to_graph() {
    let c = coordinator(
        Scripted::answering("local"),
        Arc::new(FakeGraph::new(GraphBehavior::Answer("graph".into()))),
    );
    assert_eq!(
        c.route("How does photosynthesis relate to respiration?", RouteMode::Auto),
        Backend::Graph
    );
    assert_eq!(
        c.route("please compare sourdough and rye bread for me", RouteMode::Auto),
        Backend::Graph
    );
    // "analyzed" is not in the relationship vocabulary; defaults local
    assert_eq!(
        c.route("everything I analyzed last week went into a notebook", RouteMode::Auto),
        Backend::Local
    );
}

#[test]
fn definitional_prefix_wins_over_relationship_vocabulary() {
    let c = coordinator(
        Scripted::answering("local"),
        Arc::new(FakeGraph::new(GraphBehavior::Answer("graph".into()))),
    );
    assert_eq!(
        c.route("What is the relationship between mass and gravity?", RouteMode::Auto),
        Backend::Local
    );
}

#[test]
fn explicit_modes_bypass_analysis() {
    let c = coordinator(
        Scripted::answering("local"),
        Arc::new(FakeGraph::new(GraphBehavior::Answer("graph".into()))),
    );
    assert_eq!(
        c.route("How does photosynthesis relate to respiration?", RouteMode::Local),
        Backend::Local
    );
    assert_eq!(c.route("hello", RouteMode::Graph), Backend::Graph);
}

#[tokio::test]
async fn successful_primary_does_not_fall_back() {
    let local = Scripted::answering("from local");
    let graph = Arc::new(FakeGraph::new(GraphBehavior::Answer("from graph".into())));
    let c = coordinator(local.clone(), graph);

    let answer = c.query_knowledge("what is rust", RouteMode::Auto).await.unwrap();
    assert_eq!(answer.answer_text, "from local");
    assert_eq!(answer.backend_used, Backend::Local);
    assert!(!answer.fallback_used);
    assert_eq!(local.calls(), 1);

    let stats = c.stats();
    assert_eq!(stats.local_routes, 1);
    assert_eq!(stats.graph_routes, 0);
    assert_eq!(stats.fallbacks, 0);
}

#[tokio::test]
async fn graph_timeout_falls_back_to_local() {
    let local = Scripted::answering("local answer");
    let graph = Arc::new(FakeGraph::new(GraphBehavior::Hang));
    let c = coordinator(local.clone(), graph);

    let answer = c
        .query_knowledge("how do my hobbies relate to my career goals", RouteMode::Auto)
        .await
        .unwrap();
    assert_eq!(answer.backend_used, Backend::Local);
    assert!(answer.fallback_used);
    assert_eq!(answer.answer_text, "local answer");

    let stats = c.stats();
    assert_eq!(stats.graph_routes, 1);
    assert_eq!(stats.fallbacks, 1);
}

#[tokio::test]
async fn local_failure_falls_back_to_graph() {
    let local = Scripted::failing();
    let graph = Arc::new(FakeGraph::new(GraphBehavior::Answer("graph answer".into())));
    let c = coordinator(local.clone(), graph);

    let answer = c.query_knowledge("what is rust", RouteMode::Auto).await.unwrap();
    assert_eq!(answer.backend_used, Backend::Graph);
    assert!(answer.fallback_used);
    assert_eq!(local.calls(), 1);
}

#[tokio::test]
async fn dual_failure_is_an_error_never_empty_success() {
    let local = Scripted::failing();
    let graph = Arc::new(FakeGraph::new(GraphBehavior::Fail));
    let c = coordinator(local, graph);

    let err = c.query_knowledge("what is rust", RouteMode::Auto).await;
    match err {
        Err(Error::AllBackendsFailed { local, graph }) => {
            assert!(local.contains("no matching statements"));
            assert!(graph.contains("connection refused"));
        }
        other => panic!("expected AllBackendsFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn memory_store_answers_from_local_forms() {
    let embedder = Arc::new(FakeEmbedder::new());
    embedder.set("I love hiking", helpers::unit(0));
    embedder.set("hiking", helpers::with_cosine(0.9));
    let graph = Arc::new(FakeGraph::new(GraphBehavior::Answer("graph".into())));
    let store = Arc::new(build_store(embedder, graph.clone(), &test_config()));

    store
        .store("I love hiking", StoreOptions::default())
        .await
        .unwrap();

    let c = KnowledgeCoordinator::new(store, graph, Duration::from_millis(100), 4);
    let answer = c.query_knowledge("hiking", RouteMode::Local).await.unwrap();
    assert_eq!(answer.answer_text, "you love hiking");
    assert!(!answer.fallback_used);
}

#[tokio::test]
async fn empty_local_index_falls_back_to_graph() {
    let embedder = Arc::new(FakeEmbedder::new());
    let graph = Arc::new(FakeGraph::new(GraphBehavior::Answer("graph knows".into())));
    let store = Arc::new(build_store(embedder, graph.clone(), &test_config()));

    let c = KnowledgeCoordinator::new(store, graph, Duration::from_millis(100), 4);
    let answer = c.query_knowledge("what is rust", RouteMode::Auto).await.unwrap();
    assert_eq!(answer.backend_used, Backend::Graph);
    assert!(answer.fallback_used);
    assert_eq!(answer.answer_text, "graph knows");
}
