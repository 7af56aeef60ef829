//! Bounded worker pool -- concurrent song lookups with result aggregation.
//!
//! Split into focused submodules:
//! - [`collector`] - Concurrency-safe sink for outcomes and failure records
//! - [`worker`] - The pool itself: slot-limited spawning, per-task guards, shutdown

mod collector;
mod worker;


pub use collector::Collector;
pub use worker::{PoolOptions, WorkerPool};
