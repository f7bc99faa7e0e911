//! Hierarchical task-execution runtime
//!
//! Two composable invocation wrappers, [`Flow`] and [`Task`], give
//! ordinary functions call-tree identity, retry semantics,
//! content-addressable result caching, bounded concurrency, and
//! per-invocation logging. Bodies receive a [`Scope`] handle carrying
//! their position in the call tree; they need to know nothing else
//! about the machinery around them.
//!
//! Flows orchestrate and are never cached or retried; tasks are the
//! leaves where retry, caching, and gating apply. Both come in a
//! cooperative (`run`) and a blocking (`run_blocking`) flavor.

mod active;
mod cache;
mod engine;
mod flow;
mod logger;
mod scope;
mod task;

pub use engine::{Engine, EngineConfig};
pub use flow::Flow;
pub use scope::{FrameKind, Scope};
pub use task::Task;

// Re-exported so callers need only one dependency.
pub use taskcore::{Args, CacheError, Gate, RetryDelay, SyncSemaphore, TaskError};
