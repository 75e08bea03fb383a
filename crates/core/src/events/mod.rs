//! Pipeline events.
//!
//! Build outcomes are published as [`PipelineEvent`]s through an
//! [`EventHandle`]. Consumers own the receiving end of the channel; the
//! pipeline never waits on them.

mod handle;
mod types;

pub use handle::{EventEnvelope, EventHandle};
pub use types::{PipelineEvent, SkipReason};
