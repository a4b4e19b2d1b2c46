//! Memoir — a personal knowledge-memory core.
//!
//! Memoir accepts short first-person statements about a single tracked
//! individual, decides whether each one is new information, classifies it into
//! topics with a confidence score, and stores it in two grammatical forms for
//! two different retrieval backends:
//!
//! - **Local form** (second person, "you love hiking") goes into a local
//!   SQLite index with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   vector search — low latency, used for fact lookup.
//! - **Graph form** (third person, "Alice loves hiking") goes to a remote
//!   relationship-aware retrieval service over HTTP — higher latency, better
//!   for questions about connections between things.
//!
//! # Pipeline
//!
//! ```text
//! statement → classify + dedup → confidence → restate → mirrored writes
//! query     → search & rank (local)  or  knowledge coordinator (routed)
//! ```
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, and version metadata
//! - [`embedding`] — Opaque text-to-vector service client
//! - [`classify`] — Keyword-dictionary topic classification
//! - [`restate`] — First-person → second/third-person restatement transform
//! - [`memory`] — Core engine: dedup, confidence, store, search, forget
//! - [`graph`] — Client for the remote document/graph retrieval service
//! - [`knowledge`] — Query routing between local index and graph service

pub mod classify;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod knowledge;
pub mod memory;
pub mod restate;

pub use error::Error;
