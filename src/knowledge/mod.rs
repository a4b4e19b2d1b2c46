//! Query routing between the local index and the graph retrieval service.
//!
//! The coordinator is state-free routing plus failure policy: pick a backend
//! (explicitly, or by analyzing the query in `Auto` mode), call it with a
//! timeout, and on error or timeout try the other backend exactly once. Dual
//! failure surfaces as an error — never as an empty success.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// The two retrieval backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Low-latency local index over stored statements.
    Local,
    /// Higher-latency relationship-aware graph service.
    Graph,
}

impl Backend {
    pub fn other(self) -> Backend {
        match self {
            Backend::Local => Backend::Graph,
            Backend::Graph => Backend::Local,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Graph => "graph",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a knowledge query should be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteMode {
    /// Always use the local index.
    Local,
    /// Always use the graph service.
    Graph,
    /// Analyze the query shape.
    #[default]
    Auto,
}

impl std::str::FromStr for RouteMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "graph" => Ok(Self::Graph),
            "auto" => Ok(Self::Auto),
            _ => Err(format!("unknown route mode: {s}")),
        }
    }
}

/// Query prefixes that mark a short definitional question.
const DEFINITIONAL_PREFIXES: &[&str] = &["what is ", "what's ", "who is ", "who's ", "define "];

/// Vocabulary that marks a relationship or comparison question.
const RELATIONSHIP_WORDS: &[&str] = &[
    "relate", "relates", "related", "relationship", "compare", "compares",
    "comparison", "connection", "connections", "connected", "analyze",
    "analysis", "versus", "vs",
];

/// A backend that can answer a free-form knowledge question.
#[async_trait]
pub trait KnowledgeBackend: Send + Sync {
    async fn answer(&self, query: &str) -> Result<String>;
}

/// Adapter exposing a [`GraphStore`](crate::graph::GraphStore) as a knowledge
/// backend.
pub struct GraphAnswerer {
    graph: Arc<dyn crate::graph::GraphStore>,
}

impl GraphAnswerer {
    pub fn new(graph: Arc<dyn crate::graph::GraphStore>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl KnowledgeBackend for GraphAnswerer {
    async fn answer(&self, query: &str) -> Result<String> {
        self.graph.query(query).await
    }
}

/// Answer returned from a routed knowledge query.
#[derive(Debug, Serialize)]
pub struct KnowledgeAnswer {
    pub answer_text: String,
    pub backend_used: Backend,
    pub fallback_used: bool,
}

/// Snapshot of routing diagnostics.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RoutingStats {
    pub local_routes: u64,
    pub graph_routes: u64,
    pub fallbacks: u64,
}

/// Routes open-domain queries between the two backends, with fallback.
pub struct KnowledgeCoordinator {
    local: Arc<dyn KnowledgeBackend>,
    graph: Arc<dyn KnowledgeBackend>,
    timeout: Duration,
    short_query_words: usize,
    local_routes: AtomicU64,
    graph_routes: AtomicU64,
    fallbacks: AtomicU64,
}

impl KnowledgeCoordinator {
    pub fn new(
        local: Arc<dyn KnowledgeBackend>,
        graph: Arc<dyn KnowledgeBackend>,
        timeout: Duration,
        short_query_words: usize,
    ) -> Self {
        Self {
            local,
            graph,
            timeout,
            short_query_words,
            local_routes: AtomicU64::new(0),
            graph_routes: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Pure routing decision. Explicit modes are always honored; `Auto` sends
    /// short definitional queries to the local index, relationship and
    /// comparison questions to the graph, and everything else local.
    pub fn route(&self, query: &str, mode: RouteMode) -> Backend {
        match mode {
            RouteMode::Local => Backend::Local,
            RouteMode::Graph => Backend::Graph,
            RouteMode::Auto => {
                let lower = query.trim().to_lowercase();
                if DEFINITIONAL_PREFIXES.iter().any(|p| lower.starts_with(p))
                    || lower.split_whitespace().count() <= self.short_query_words
                {
                    return Backend::Local;
                }
                let has_relationship_word = lower
                    .split(|c: char| !c.is_alphanumeric())
                    .any(|w| RELATIONSHIP_WORDS.contains(&w));
                if has_relationship_word {
                    Backend::Graph
                } else {
                    Backend::Local
                }
            }
        }
    }

    /// Route and execute a knowledge query, falling back to the other backend
    /// once on error or timeout.
    pub async fn query_knowledge(&self, query: &str, mode: RouteMode) -> Result<KnowledgeAnswer> {
        let primary = self.route(query, mode);
        match primary {
            Backend::Local => self.local_routes.fetch_add(1, Ordering::Relaxed),
            Backend::Graph => self.graph_routes.fetch_add(1, Ordering::Relaxed),
        };
        debug!(backend = %primary, "routing knowledge query");

        let primary_err = match self.call(primary, query).await {
            Ok(answer_text) => {
                return Ok(KnowledgeAnswer {
                    answer_text,
                    backend_used: primary,
                    fallback_used: false,
                })
            }
            Err(e) => e,
        };

        let fallback = primary.other();
        warn!(primary = %primary, fallback = %fallback, error = %primary_err,
            "backend failed, trying fallback");
        self.fallbacks.fetch_add(1, Ordering::Relaxed);

        match self.call(fallback, query).await {
            Ok(answer_text) => Ok(KnowledgeAnswer {
                answer_text,
                backend_used: fallback,
                fallback_used: true,
            }),
            Err(fallback_err) => {
                let (local, graph) = match primary {
                    Backend::Local => (primary_err.to_string(), fallback_err.to_string()),
                    Backend::Graph => (fallback_err.to_string(), primary_err.to_string()),
                };
                Err(Error::AllBackendsFailed { local, graph })
            }
        }
    }

    /// Call one backend with the per-backend timeout. A timeout is treated
    /// identically to a backend error.
    async fn call(&self, backend: Backend, query: &str) -> Result<String> {
        let answer = match backend {
            Backend::Local => self.local.answer(query),
            Backend::Graph => self.graph.answer(query),
        };
        match tokio::time::timeout(self.timeout, answer).await {
            Ok(result) => result,
            Err(_) => Err(Error::backend(
                backend,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }

    /// Diagnostic counters. Not required for correctness.
    pub fn stats(&self) -> RoutingStats {
        RoutingStats {
            local_routes: self.local_routes.load(Ordering::Relaxed),
            graph_routes: self.graph_routes.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl KnowledgeBackend for Fixed {
        async fn answer(&self, _query: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn coordinator() -> KnowledgeCoordinator {
        KnowledgeCoordinator::new(
            Arc::new(Fixed("local answer")),
            Arc::new(Fixed("graph answer")),
            Duration::from_secs(1),
            4,
        )
    }

    #[test]
    fn explicit_modes_are_honored() {
        let c = coordinator();
        // A relationship-shaped query still goes local when forced
        assert_eq!(
            c.route("how does A relate to B in this long question", RouteMode::Local),
            Backend::Local
        );
        assert_eq!(c.route("what is gravity", RouteMode::Graph), Backend::Graph);
    }

    #[test]
    fn auto_routes_definitional_to_local() {
        let c = coordinator();
        assert_eq!(c.route("What is gravity?", RouteMode::Auto), Backend::Local);
        assert_eq!(c.route("who is Marie Curie", RouteMode::Auto), Backend::Local);
        assert_eq!(c.route("define entropy", RouteMode::Auto), Backend::Local);
    }

    #[test]
    fn auto_routes_short_queries_to_local() {
        let c = coordinator();
        assert_eq!(c.route("gravity", RouteMode::Auto), Backend::Local);
        assert_eq!(c.route("tell me about gravity", RouteMode::Auto), Backend::Local);
    }

    #[test]
    fn auto_routes_relationship_queries_to_graph() {
        let c = coordinator();
        assert_eq!(
            c.route("How does photosynthesis relate to respiration?", RouteMode::Auto),
            Backend::Graph
        );
        assert_eq!(
            c.route("please give an analysis of these two economic systems", RouteMode::Auto),
            Backend::Graph
        );
    }

    #[test]
    fn auto_defaults_to_local() {
        let c = coordinator();
        assert_eq!(
            c.route("summarize everything you know about my week so far", RouteMode::Auto),
            Backend::Local
        );
    }

    #[test]
    fn relationship_word_matches_whole_word_only() {
        let c = coordinator();
        // "unrelatedly" must not trigger the relationship vocabulary
        assert_eq!(
            c.route("something unrelatedly happened during the long afternoon walk", RouteMode::Auto),
            Backend::Local
        );
    }

    #[test]
    fn route_mode_parses_from_str() {
        assert_eq!("auto".parse::<RouteMode>().unwrap(), RouteMode::Auto);
        assert_eq!("local".parse::<RouteMode>().unwrap(), RouteMode::Local);
        assert_eq!("graph".parse::<RouteMode>().unwrap(), RouteMode::Graph);
        assert!("hybrid".parse::<RouteMode>().is_err());
    }
}
