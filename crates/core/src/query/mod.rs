//! Remote metadata queries.
//!
//! The pipeline only needs one operation from the production-tracking
//! service: fetch a page of entities matching a filter. Transport and
//! authentication belong to the implementation.

mod types;

pub use types::{EntityRequest, MAX_PAGE_SIZE};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when querying the metadata service.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The service could not be reached.
    #[error("Metadata service unavailable: {0}")]
    Unavailable(String),

    /// The requested entity does not exist.
    #[error("Entity not found: {kind} {id}")]
    NotFound { kind: String, id: String },

    /// The service rejected the request.
    #[error("Query rejected: {0}")]
    Rejected(String),

    /// The response could not be understood.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl QueryError {
    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Client for the remote metadata query service.
#[async_trait]
pub trait EntityQuery: Send + Sync {
    /// Returns the name of this client.
    fn name(&self) -> &str;

    /// Fetches one page of entities.
    ///
    /// The response is the raw payload, with the entities under `data`.
    async fn fetch_entities(&self, request: EntityRequest) -> Result<Value, QueryError>;
}
