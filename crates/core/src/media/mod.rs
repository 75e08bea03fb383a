//! Media model: media items, their sources, and destination containers.
//!
//! A [`MediaItem`] is the artifact the pipeline builds. It owns one or more
//! [`MediaSource`]s and tracks which source plays by default per
//! [`MediaKind`]. Built items are inserted into a [`MediaContainer`]; the
//! in-memory [`Playlist`] keeps a batch in submission order even when items
//! arrive out of order.

mod error;
mod item;
mod playlist;
mod selection;
mod traits;
mod types;

pub use error::ContainerError;
pub use item::{MediaItem, MediaItemSnapshot};
pub use playlist::Playlist;
pub use selection::select_default_source;
pub use traits::MediaContainer;
pub use types::{Flag, FrameRate, MediaId, MediaKind, MediaSource, SourceId};
