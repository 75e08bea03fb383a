pub mod config;
pub mod events;
pub mod loader;
pub mod media;
pub mod metrics;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod source;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError, LoggingConfig};
pub use events::{EventEnvelope, EventHandle, PipelineEvent, SkipReason};
pub use loader::{load_playlist, LoaderError};
pub use media::{
    ContainerError, Flag, FrameRate, MediaContainer, MediaId, MediaItem, MediaItemSnapshot,
    MediaKind, MediaSource, Playlist,
};
pub use pipeline::{
    BuildOptions, BuildTarget, BuilderStatus, PendingBatch, PipelineConfig, PipelineError,
    PlaylistBuilder,
};
pub use query::{EntityQuery, EntityRequest, QueryError};
pub use record::{extract_version_records, PayloadContext, RecordError, VersionRecord};
pub use source::{
    FsSourceBuilder, FsSupplementarySource, SourceBuilder, SourceConfig, SourceError,
    SupplementaryConfig, SupplementaryLookup, SupplementarySource,
};
