//! Types for the query module.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Largest page the service hands out.
pub const MAX_PAGE_SIZE: u32 = 4999;

/// One page request against the metadata service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRequest {
    /// Entity kind, e.g. "Versions" or "Playlists".
    pub kind: String,
    /// Filter document understood by the service.
    pub filter: Value,
    /// Fields to return. Empty means the service default.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Sort keys, `-` prefixed for descending.
    #[serde(default)]
    pub sort: Vec<String>,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl EntityRequest {
    /// Creates a request for the first full page of `kind`.
    pub fn new(kind: impl Into<String>, filter: Value) -> Self {
        Self {
            kind: kind.into(),
            filter,
            fields: Vec::new(),
            sort: Vec::new(),
            page: 1,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Request for a single entity by id.
    pub fn by_id(kind: impl Into<String>, id: i64) -> Self {
        Self::new(kind, json!({ "id": id.to_string() })).with_page(1, 1)
    }

    /// Request for several entities by id.
    pub fn by_ids(kind: impl Into<String>, ids: &[i64]) -> Self {
        let joined = ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Self::new(kind, json!({ "id": joined }))
    }

    /// Sets the fields to return.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the sort keys.
    pub fn with_sort<I, S>(mut self, sort: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort = sort.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the page and page size. The size is clamped to the service limit.
    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page.max(1);
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }
}
