//! The asynchronous build pipeline.
//!
//! [`PlaylistBuilder`] turns batches of version records into media items.
//! Every record becomes a job that goes through two stages:
//! - Primary: build the item's sources, select defaults, insert it into the
//!   target container
//! - Secondary: validate and attach supplementary sources
//!
//! A single dispatch task pulls jobs from the primary and secondary queues
//! under a cap of `worker_count` in-flight stages and re-arms itself after
//! each completion. Items finish out of order; the batch result is put back
//! into submission order before it is delivered.
//!
//! # Example
//!
//! ```ignore
//! use playbuild_core::pipeline::{BuildOptions, BuildTarget, PipelineConfig, PlaylistBuilder};
//! use playbuild_core::source::FsSourceBuilder;
//!
//! let builder = PlaylistBuilder::new(PipelineConfig::default(), Arc::new(FsSourceBuilder::default()));
//! builder.start().await;
//!
//! let batch = builder
//!     .submit(records, BuildTarget::into_container(playlist), BuildOptions::default())
//!     .await?;
//! let media = batch.wait().await?;
//! ```

mod aggregator;
mod builder;
mod config;
mod dispatcher;
mod error;
mod job;
mod queue;
mod types;
mod worker;

pub use builder::{PendingBatch, PlaylistBuilder};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use types::{BuildOptions, BuildTarget, BuilderStatus, Stage, WorkerStatus};
