//! Mock metadata query service for testing.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::query::{EntityQuery, EntityRequest, QueryError};
use crate::record::VersionRecord;

/// Mock implementation of the EntityQuery trait.
///
/// Understands the three entity kinds used to load a playlist:
/// `Playlists`, `PlaylistVersionConnection` and `Versions`. Versions are
/// answered in descending id order so callers must restore the playlist
/// order themselves.
#[derive(Debug, Default)]
pub struct MockEntityQuery {
    playlists: Arc<RwLock<HashMap<i64, (String, Vec<i64>)>>>,
    versions: Arc<RwLock<HashMap<i64, VersionRecord>>>,
    requests: Arc<RwLock<Vec<EntityRequest>>>,
    fail_all: Arc<RwLock<bool>>,
}

impl MockEntityQuery {
    /// Create a new mock query service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a playlist holding the given version ids, in order.
    pub async fn add_playlist(&self, id: i64, code: &str, version_ids: &[i64]) {
        self.playlists
            .write()
            .await
            .insert(id, (code.to_string(), version_ids.to_vec()));
    }

    /// Add a version. Its id comes from the record.
    pub async fn add_version(&self, record: VersionRecord) {
        if let Some(id) = record.id() {
            self.versions.write().await.insert(id, record);
        }
    }

    /// Make every request fail as unreachable.
    pub async fn set_fail_all(&self, fail: bool) {
        *self.fail_all.write().await = fail;
    }

    /// All requests received.
    pub async fn recorded_requests(&self) -> Vec<EntityRequest> {
        self.requests.read().await.clone()
    }

    fn ids_from_filter(filter: &Value) -> Vec<i64> {
        filter
            .get("id")
            .and_then(Value::as_str)
            .map(|ids| ids.split(',').filter_map(|id| id.trim().parse().ok()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EntityQuery for MockEntityQuery {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_entities(&self, request: EntityRequest) -> Result<Value, QueryError> {
        self.requests.write().await.push(request.clone());

        if *self.fail_all.read().await {
            return Err(QueryError::Unavailable("mock query service down".to_string()));
        }

        match request.kind.as_str() {
            "Playlists" => {
                let id = Self::ids_from_filter(&request.filter)
                    .first()
                    .copied()
                    .unwrap_or_default();
                let playlists = self.playlists.read().await;
                let (code, _) = playlists.get(&id).ok_or_else(|| QueryError::NotFound {
                    kind: request.kind.clone(),
                    id: id.to_string(),
                })?;
                Ok(json!({
                    "data": {"id": id, "type": "Playlist", "attributes": {"code": code}}
                }))
            }
            "PlaylistVersionConnection" => {
                let id = request
                    .filter
                    .pointer("/conditions/0/2/id")
                    .and_then(Value::as_i64)
                    .unwrap_or_default();
                let playlists = self.playlists.read().await;
                let rows: Vec<Value> = playlists
                    .get(&id)
                    .map(|(_, versions)| {
                        versions
                            .iter()
                            .enumerate()
                            .map(|(order, version)| {
                                json!({
                                    "type": "PlaylistVersionConnection",
                                    "attributes": {"sg_sort_order": order},
                                    "relationships": {
                                        "version": {"data": {"type": "Version", "id": version}}
                                    }
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(json!({ "data": rows }))
            }
            "Versions" => {
                let mut ids = Self::ids_from_filter(&request.filter);
                ids.sort_unstable_by(|a, b| b.cmp(a));
                let versions = self.versions.read().await;
                let rows: Vec<Value> = ids
                    .iter()
                    .filter_map(|id| versions.get(id))
                    .map(|record| record.as_json().clone())
                    .collect();
                Ok(json!({ "data": rows }))
            }
            other => Err(QueryError::Rejected(format!("unsupported entity kind: {}", other))),
        }
    }
}
