use crate::active::ActiveTasks;
use crate::cache::CacheStore;
use crate::scope::{IndexAllocator, Scope};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration for the engine. Absence of a root path fully disables
/// the corresponding subsystem; it never errors.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Directory for cache entries. `None` disables caching.
    pub cache_root: Option<PathBuf>,
    /// Directory for per-invocation log sinks. `None` disables them.
    pub log_root: Option<PathBuf>,
}

/// Shared engine state: configuration, the index-allocation table, the
/// cache store, and the active-task registry.
///
/// Cheap to clone; all clones share the same state. Hand out root
/// scopes with [`Engine::root`] and pass them to [`crate::Flow::run`]
/// or [`crate::Task::run`].
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    cache: CacheStore,
    log_root: Option<PathBuf>,
    allocator: IndexAllocator,
    active: ActiveTasks,
}

impl Engine {
    /// Engine with caching and invocation logging disabled.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                cache: CacheStore::new(config.cache_root),
                log_root: config.log_root,
                allocator: IndexAllocator::new(),
                active: ActiveTasks::new(),
            }),
        }
    }

    /// Detached root scope: empty call chain, empty index, no log sink.
    pub fn root(&self) -> Scope {
        Scope::root(self.clone())
    }

    /// Snapshot of the active-task registry: in-flight task count and
    /// their fingerprints, in entry order.
    pub fn active_tasks(&self) -> (usize, Vec<String>) {
        self.inner.active.snapshot()
    }

    pub(crate) fn cache(&self) -> &CacheStore {
        &self.inner.cache
    }

    pub(crate) fn log_root(&self) -> Option<&Path> {
        self.inner.log_root.as_deref()
    }

    pub(crate) fn allocator(&self) -> &IndexAllocator {
        &self.inner.allocator
    }

    pub(crate) fn active(&self) -> &ActiveTasks {
        &self.inner.active
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
