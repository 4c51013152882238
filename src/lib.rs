//! `ssample`: keep a uniform random sample of an unbounded line stream.
//!
//! Lines are read once, in order, from a stream whose length is unknown. A
//! fixed-size reservoir keeps a uniformly random subset of them (Algorithm R),
//! each tagged with its 0-based position in the stream. The current sample can
//! be pulled over HTTP at any time; when the stream ends or the process is
//! interrupted, the final sample is written out in stream order.
//!
//! Exposed modules:
//! - `reservoir`: the sampler and its shared, lock-guarded handle.
//! - `snapshot`: sorted point-in-time copies and their renderings.
//! - `termination`: the single-fire stop signal and OS interrupt listener.
//! - `feed`: the producer task that drives the reservoir from a reader.
//! - `serve`: the HTTP view of the current sample.
//! - `sink`: side-channel copies of the input (append file, gzip file, echo).
//! - `app`: wiring of the above into one sampling run.

#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod reservoir;
pub mod serve;
pub mod sink;
pub mod snapshot;
pub mod termination;

pub use app::sample_stream;
pub use config::{Config, DEFAULT_CAPACITY};
pub use error::{Error, Result};
pub use feed::{feed, FeedOutcome};
pub use reservoir::{Entry, ReservoirSampler, SharedReservoir};
pub use snapshot::{truthy, OutputFormat, Snapshot};
pub use termination::{InterruptSignal, StopReason, Termination};
