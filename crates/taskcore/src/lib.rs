//! Foundational types for the task engine
//!
//! This crate provides the building blocks the runtime composes: the
//! error taxonomy, argument binding for cache keys, key derivation and
//! fingerprints, retry-delay policies, and concurrency gates. It holds
//! no engine state.

mod args;
mod error;
mod gate;
mod key;
mod retry;

pub use args::Args;
pub use error::{CacheError, TaskError};
pub use gate::{Gate, SyncPermit, SyncSemaphore};
pub use key::{cache_key, canonical_json, fingerprint, UNKEYED_FINGERPRINT};
pub use retry::RetryDelay;
