//! Client for the remote relationship-aware retrieval service.
//!
//! The service stores plain text documents (the third-person graph form of
//! each statement) and answers natural-language queries with a configurable
//! response mode. Memoir only defines the seam and an HTTP implementation;
//! the graph engine itself is external.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::knowledge::Backend;

/// Seam for the remote document/graph retrieval service.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Insert a text document under the given id.
    async fn insert(&self, id: &str, text: &str) -> Result<()>;

    /// Ask a natural-language question; returns the service's answer text.
    async fn query(&self, query: &str) -> Result<String>;

    /// Delete the document stored under the given id.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete every document this store inserted.
    async fn clear(&self) -> Result<()>;
}

#[derive(Serialize)]
struct InsertRequest<'a> {
    id: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    mode: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    response: String,
}

/// HTTP implementation of [`GraphStore`].
pub struct HttpGraphStore {
    http: reqwest::Client,
    base_url: String,
    response_mode: String,
}

impl HttpGraphStore {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::backend(Backend::Graph, e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            response_mode: config.response_mode.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl GraphStore for HttpGraphStore {
    async fn insert(&self, id: &str, text: &str) -> Result<()> {
        self.http
            .post(self.url("/documents"))
            .json(&InsertRequest { id, text })
            .send()
            .await
            .map_err(|e| Error::backend(Backend::Graph, e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::backend(Backend::Graph, e.to_string()))?;
        Ok(())
    }

    async fn query(&self, query: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url("/query"))
            .json(&QueryRequest {
                query,
                mode: &self.response_mode,
            })
            .send()
            .await
            .map_err(|e| Error::backend(Backend::Graph, e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::backend(Backend::Graph, e.to_string()))?;

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::backend(Backend::Graph, e.to_string()))?;
        Ok(body.response)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.http
            .delete(self.url(&format!("/documents/{id}")))
            .send()
            .await
            .map_err(|e| Error::backend(Backend::Graph, e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::backend(Backend::Graph, e.to_string()))?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.http
            .delete(self.url("/documents"))
            .send()
            .await
            .map_err(|e| Error::backend(Backend::Graph, e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::backend(Backend::Graph, e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = HttpGraphStore::new(&GraphConfig {
            base_url: "http://localhost:9621/".into(),
            response_mode: "hybrid".into(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(store.url("/query"), "http://localhost:9621/query");
        assert_eq!(store.url("/documents/abc"), "http://localhost:9621/documents/abc");
    }
}
