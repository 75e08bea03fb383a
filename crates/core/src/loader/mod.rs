//! Loading a remote playlist into an in-memory one.
//!
//! The playlist's versions are looked up through its connection entities,
//! which carry the playlist order, then fetched in chunks and submitted to a
//! [`PlaylistBuilder`] as one batch.

use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::media::Playlist;
use crate::pipeline::{BuildOptions, BuildTarget, PendingBatch, PipelineError, PlaylistBuilder};
use crate::query::{EntityQuery, EntityRequest, QueryError, MAX_PAGE_SIZE};
use crate::record::{RecordError, VersionRecord};

/// Versions are fetched at most this many ids at a time.
const VERSION_CHUNK: usize = 100;

/// Version fields the pipeline reads.
pub const VERSION_FIELDS: &[&str] = &[
    "id",
    "code",
    "created_at",
    "entity",
    "frame_range",
    "project",
    "sg_ivy_dnuuid",
    "sg_path_to_frames",
    "sg_path_to_movie",
    "sg_project_name",
    "user",
];

/// Errors that can occur while loading a playlist.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Invalid record: {0}")]
    Records(#[from] RecordError),

    /// The service answered with something unexpected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The playlist has no versions.
    #[error("Playlist {0} has no versions")]
    NoVersions(i64),
}

/// Loads remote playlist `playlist_id` and submits its versions.
///
/// Returns the new playlist, named after the remote one, and the pending
/// batch filling it. Items appear in the playlist as they are built.
pub async fn load_playlist(
    query: &dyn EntityQuery,
    builder: &PlaylistBuilder,
    playlist_id: i64,
    options: BuildOptions,
) -> Result<(Arc<Playlist>, PendingBatch), LoaderError> {
    let remote = fetch(query, EntityRequest::by_id("Playlists", playlist_id)).await?;
    let name = remote
        .pointer("/data/attributes/code")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Playlist {}", playlist_id));

    let version_ids = fetch_version_order(query, playlist_id).await?;
    if version_ids.is_empty() {
        return Err(LoaderError::NoVersions(playlist_id));
    }

    let records = fetch_versions(query, &version_ids).await?;
    info!(
        playlist_id,
        playlist = %name,
        versions = records.len(),
        "Loaded playlist versions"
    );

    let rate = options.rate.unwrap_or_else(|| builder.default_rate());
    let playlist = Arc::new(Playlist::new(name, rate));
    let batch = builder
        .submit(
            records,
            BuildTarget::into_container(playlist.clone()),
            options,
        )
        .await?;

    Ok((playlist, batch))
}

/// Runs one query, logging failures with whether they are worth retrying.
async fn fetch(query: &dyn EntityQuery, request: EntityRequest) -> Result<Value, LoaderError> {
    let kind = request.kind.clone();
    query.fetch_entities(request).await.map_err(|e| {
        warn!(
            service = query.name(),
            kind = %kind,
            retryable = e.is_retryable(),
            "Entity query failed: {}",
            e
        );
        LoaderError::Query(e)
    })
}

/// Version ids of a playlist, in playlist order.
async fn fetch_version_order(
    query: &dyn EntityQuery,
    playlist_id: i64,
) -> Result<Vec<i64>, LoaderError> {
    let filter = json!({
        "logical_operator": "and",
        "conditions": [
            ["playlist", "is", {"type": "Playlist", "id": playlist_id}]
        ]
    });
    let request = EntityRequest::new("PlaylistVersionConnection", filter)
        .with_fields(["sg_sort_order", "version"])
        .with_sort(["sg_sort_order"])
        .with_page(1, MAX_PAGE_SIZE);

    let response = fetch(query, request).await?;
    let rows = data_array(&response)?;
    if rows.len() == MAX_PAGE_SIZE as usize {
        warn!(playlist_id, "Playlist has more versions than one page; extra versions ignored");
    }

    Ok(rows
        .iter()
        .filter_map(|row| row.pointer("/relationships/version/data/id").and_then(Value::as_i64))
        .collect())
}

/// Fetches versions by id and returns them in the order of `ids`.
///
/// Ids the service doesn't return are skipped.
async fn fetch_versions(
    query: &dyn EntityQuery,
    ids: &[i64],
) -> Result<Vec<VersionRecord>, LoaderError> {
    let mut records = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(VERSION_CHUNK) {
        let request = EntityRequest::by_ids("Versions", chunk).with_fields(VERSION_FIELDS.iter().copied());
        let response = fetch(query, request).await?;
        let rows = data_array(&response)?;

        for id in chunk {
            match rows.iter().find(|row| row.get("id").and_then(Value::as_i64) == Some(*id)) {
                Some(row) => records.push(VersionRecord::from_json(row.clone())?),
                None => warn!(version_id = id, "Version missing from response"),
            }
        }
        debug!(requested = chunk.len(), returned = rows.len(), "Fetched version chunk");
    }

    Ok(records)
}

fn data_array(response: &Value) -> Result<&Vec<Value>, LoaderError> {
    response
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| LoaderError::InvalidResponse("missing data array".to_string()))
}
