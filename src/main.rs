mod classify;
mod config;
mod db;
mod embedding;
mod error;
mod graph;
mod knowledge;
mod memory;
mod restate;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::MemoirConfig;
use knowledge::{GraphAnswerer, KnowledgeCoordinator, RouteMode};
use memory::forget::ForgetTarget;
use memory::store::MemoryStore;
use memory::types::{StoreOptions, Subject};

#[derive(Parser)]
#[command(name = "memoir", version, about = "Personal knowledge-memory core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a first-person statement about the subject
    Remember {
        text: String,
        /// Override the classified topics
        #[arg(long = "topic")]
        topics: Vec<String>,
        /// Statement was generated on the subject's behalf by this actor
        #[arg(long)]
        proxy_source: Option<String>,
    },
    /// Ranked search over stored statements
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Ask an open-domain question, routed between backends
    Ask {
        query: String,
        /// Routing mode: auto, local, or graph
        #[arg(long, default_value = "auto")]
        mode: String,
    },
    /// Delete statements by id, topic, or everything
    Forget {
        #[arg(long, conflicts_with_all = ["topic", "all"])]
        id: Option<String>,
        #[arg(long, conflicts_with = "all")]
        topic: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Show store statistics and the loaded topic dictionary version
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = MemoirConfig::load()?;

    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let conn = db::open_database(config.resolved_db_path())?;

    let classifier = classify::TopicClassifier::from_path(
        config.resolved_dictionary_path(),
        config.topics.presence_threshold,
    );
    if let Some(version) = classifier.dictionary_version() {
        db::set_meta(&conn, "dictionary_version", version)?;
    }

    let embedder: Arc<dyn embedding::EmbeddingProvider> =
        Arc::new(embedding::HttpEmbeddingProvider::new(&config.embedding)?);
    let graph: Arc<dyn graph::GraphStore> = Arc::new(graph::HttpGraphStore::new(&config.graph)?);

    let subject = Subject::new(config.subject.id.clone(), config.subject.name.clone());
    let store = Arc::new(MemoryStore::new(
        Arc::new(Mutex::new(conn)),
        embedder,
        graph.clone(),
        classifier.clone(),
        subject,
        &config,
    ));

    match cli.command {
        Command::Remember {
            text,
            topics,
            proxy_source,
        } => {
            let options = StoreOptions {
                topics: (!topics.is_empty()).then_some(topics),
                is_proxy: proxy_source.is_some(),
                proxy_source,
            };
            let outcome = store.store(&text, options).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Search {
            query,
            limit,
            threshold,
        } => {
            let hits = store.search(&query, limit, threshold).await?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        Command::Ask { query, mode } => {
            let mode: RouteMode = mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let coordinator = KnowledgeCoordinator::new(
                store.clone(),
                Arc::new(GraphAnswerer::new(graph)),
                Duration::from_secs(config.knowledge.timeout_secs),
                config.knowledge.short_query_words,
            );
            let answer = coordinator.query_knowledge(&query, mode).await?;
            println!("{}", serde_json::to_string_pretty(&answer)?);
        }
        Command::Forget { id, topic, all } => {
            let target = if all {
                ForgetTarget::All
            } else if let Some(topic) = topic {
                ForgetTarget::Topic(topic)
            } else if let Some(id) = id {
                ForgetTarget::Id(id)
            } else {
                anyhow::bail!("one of --id, --topic, or --all is required");
            };
            let removed = store.forget(target).await?;
            println!("removed {removed} statement(s)");
        }
        Command::Stats => {
            let stats = store.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            if let Some(version) = classifier.dictionary_version() {
                eprintln!("topic dictionary version: {version}");
            }
        }
    }

    Ok(())
}
