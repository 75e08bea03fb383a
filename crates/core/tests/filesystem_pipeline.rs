//! End-to-end runs against the filesystem collaborators and playlist loading.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use playbuild_core::{
    load_playlist,
    media::MediaKind,
    pipeline::{BuildOptions, BuildTarget, PipelineConfig, PlaylistBuilder},
    testing::{fixtures, MockEntityQuery, MockSourceBuilder},
    FrameRate, FsSourceBuilder, FsSupplementarySource, LoaderError, Playlist, SourceConfig,
    VersionRecord,
};

fn write_file(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"media").unwrap();
}

fn disk_record(id: i64, code: &str, movie: &Path) -> VersionRecord {
    VersionRecord::from_json(json!({
        "id": id,
        "type": "Version",
        "attributes": {
            "code": code,
            "sg_project_name": "ABC",
            "sg_ivy_dnuuid": format!("uuid-{}", id),
            "sg_path_to_movie": movie.to_string_lossy(),
            "frame_range": "1001-1024"
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_filesystem_batch_with_supplementary_media() {
    let shows = TempDir::new().unwrap();
    let extra = TempDir::new().unwrap();

    let movie_a = shows.path().join("abc_0010.mov");
    let movie_b = shows.path().join("abc_0020.mov");
    write_file(&movie_a);
    write_file(&movie_b);
    write_file(&extra.path().join("ABC/uuid-1/movie_dneg.mov"));
    write_file(&extra.path().join("ABC/uuid-1/.hidden.mov"));

    let builder = PlaylistBuilder::new(
        PipelineConfig::default().with_dispatch_delay(0),
        Arc::new(FsSourceBuilder::new(SourceConfig::default())),
    )
    .with_supplementary(Arc::new(FsSupplementarySource::new(extra.path())));
    builder.start().await;

    let playlist = Arc::new(Playlist::new("fs", FrameRate::default()));
    let media = builder
        .submit(
            vec![
                disk_record(1, "abc_0010", &movie_a),
                disk_record(2, "abc_0020", &movie_b),
            ],
            BuildTarget::into_container(playlist.clone()),
            BuildOptions::default(),
        )
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(media.len(), 2);
    assert_eq!(
        media[0].source_names(MediaKind::Image).await,
        vec!["SG Movie", "movie_dneg"]
    );
    assert_eq!(
        media[0].default_source(MediaKind::Image).await.unwrap().name,
        "movie_dneg"
    );
    // Nothing on disk for the second version.
    assert_eq!(media[1].source_names(MediaKind::Image).await, vec!["SG Movie"]);
    assert_eq!(playlist.len().await, 2);
}

#[tokio::test]
async fn test_missing_supplementary_root_keeps_items() {
    let shows = TempDir::new().unwrap();
    let movie = shows.path().join("abc_0010.mov");
    write_file(&movie);

    let builder = PlaylistBuilder::new(
        PipelineConfig::default().with_dispatch_delay(0),
        Arc::new(FsSourceBuilder::default()),
    )
    .with_supplementary(Arc::new(FsSupplementarySource::new(
        shows.path().join("not-mounted"),
    )));
    builder.start().await;

    let media = builder
        .submit(
            vec![disk_record(1, "abc_0010", &movie)],
            BuildTarget::none(),
            BuildOptions::default(),
        )
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(media.len(), 1);
    assert_eq!(media[0].source_count().await, 1);
}

#[tokio::test]
async fn test_load_playlist_end_to_end() {
    let query = MockEntityQuery::new();
    query.add_playlist(77, "abc_dailies", &[12, 10, 11]).await;
    for (id, code) in [(10, "first"), (11, "second"), (12, "third")] {
        query.add_version(fixtures::version_record(id, code)).await;
    }

    let builder = PlaylistBuilder::new(
        PipelineConfig::default().with_dispatch_delay(0),
        Arc::new(MockSourceBuilder::new()),
    );
    builder.start().await;

    let (playlist, batch) = load_playlist(&query, &builder, 77, BuildOptions::default())
        .await
        .unwrap();
    let media = batch.wait().await.unwrap();

    assert_eq!(playlist.name(), "abc_dailies");
    let names: Vec<&str> = media.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["third", "first", "second"]);
    assert_eq!(
        playlist.media_ids().await,
        media.iter().map(|m| m.id()).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_load_playlist_without_versions() {
    let query = MockEntityQuery::new();
    query.add_playlist(5, "empty", &[]).await;

    let builder = PlaylistBuilder::new(PipelineConfig::default(), Arc::new(MockSourceBuilder::new()));
    builder.start().await;

    let err = load_playlist(&query, &builder, 5, BuildOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LoaderError::NoVersions(5)));
}
