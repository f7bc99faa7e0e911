use crate::engine::Engine;
use crate::logger::LogSink;
use crate::scope::{FrameKind, Scope};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use taskcore::{cache_key, fingerprint, Args, CacheError, Gate, RetryDelay, TaskError};

/// A leaf invocation eligible for retry, caching, and concurrency
/// gating. Built once, runnable any number of times.
///
/// Composition order per call: context entry, registry entry, cache
/// probe, gate acquisition, retry loop, cache write on first success.
/// A cache hit returns before the gate and the retry loop are touched.
pub struct Task {
    name: String,
    retries: u32,
    retry_delay: RetryDelay,
    cache_on: Vec<String>,
    defaults: Map<String, Value>,
    gate: Option<Gate>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            retries: 1,
            retry_delay: RetryDelay::none(),
            cache_on: Vec::new(),
            defaults: Map::new(),
            gate: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total number of attempts, including the first. Clamped to at
    /// least 1; 1 means no retry.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    pub fn retry_delay(mut self, delay: RetryDelay) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Argument names whose bound values form the cache key. Order is
    /// irrelevant to the key; the canonical form sorts names.
    pub fn cache_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cache_on = names.into_iter().map(Into::into).collect();
        self
    }

    /// Declared default for an argument, applied before key derivation
    /// when the call site does not bind the name.
    pub fn default_arg(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        let name = name.into();
        match serde_json::to_value(value) {
            Ok(v) => {
                self.defaults.insert(name, v);
            }
            Err(e) => {
                tracing::warn!("default for '{}' is not serializable, dropped: {}", name, e);
            }
        }
        self
    }

    /// Bound on simultaneous executions of this task's body.
    pub fn gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Run the task body on the cooperative scheduler.
    ///
    /// `args` is the bindable view of the call's arguments, used only
    /// for cache-key derivation. The body receives a child [`Scope`]
    /// carrying the invocation's index and attempt number; on failure
    /// it is re-invoked up to the configured number of attempts, and
    /// the final error is returned verbatim.
    pub async fn run<F, Fut, T, E>(
        &self,
        parent: &Scope,
        args: &Args,
        body: F,
    ) -> Result<T, TaskError<E>>
    where
        F: Fn(Scope) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize + DeserializeOwned,
        E: fmt::Display,
    {
        if let Some(Gate::Blocking(_)) = &self.gate {
            return Err(TaskError::Configuration(format!(
                "task '{}' runs on the cooperative scheduler and requires a suspending gate",
                self.name
            )));
        }

        let engine = parent.engine().clone();
        let scope = self.enter(parent);
        let key = self.derive_key(&engine, args);
        let guard = ActiveGuard::enter(engine.clone(), TaskIdent::new(&self.name, key.as_deref()), "async");

        if let Some(path) = key
            .as_deref()
            .and_then(|k| engine.cache().entry_path(&self.name, k))
        {
            match engine.cache().read::<T>(&path).await {
                Ok(value) => {
                    tracing::info!("using cached result for {}", guard.ident);
                    return Ok(value);
                }
                Err(CacheError::Miss) | Err(CacheError::Disabled) => {}
                Err(e) => tracing::warn!("cache read failed for {}: {}", guard.ident, e),
            }
        }

        let _permit = match &self.gate {
            Some(Gate::Suspending(semaphore)) => {
                tracing::debug!("acquiring gate for {}", guard.ident);
                match Arc::clone(semaphore).acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(e) => {
                        tracing::warn!("gate closed for {}: {}", guard.ident, e);
                        None
                    }
                }
            }
            _ => None,
        };

        let mut attempt: u32 = 0;
        loop {
            if attempt > 0 {
                tracing::info!("retry {}/{} for {}", attempt, self.retries - 1, guard.ident);
            }
            match body(scope.with_attempt(attempt)).await {
                Ok(value) => {
                    if let Some(key) = &key {
                        self.store(&engine, key, &value).await;
                    }
                    tracing::info!("successfully completed {}", guard.ident);
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(
                        "attempt {}/{} failed for {}: {}",
                        attempt + 1,
                        self.retries,
                        guard.ident,
                        e
                    );
                    if attempt + 1 >= self.retries {
                        tracing::error!("all {} attempts failed for {}", self.retries, guard.ident);
                        return Err(TaskError::Failed(e));
                    }
                    let delay = self.retry_delay.for_attempt(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Blocking flavor of [`Task::run`] for synchronous bodies; may
    /// block the calling thread on the gate and on retry delays.
    pub fn run_blocking<F, T, E>(
        &self,
        parent: &Scope,
        args: &Args,
        body: F,
    ) -> Result<T, TaskError<E>>
    where
        F: Fn(Scope) -> Result<T, E>,
        T: Serialize + DeserializeOwned,
        E: fmt::Display,
    {
        if let Some(Gate::Suspending(_)) = &self.gate {
            return Err(TaskError::Configuration(format!(
                "task '{}' runs on a plain thread and requires a blocking gate",
                self.name
            )));
        }

        let engine = parent.engine().clone();
        let scope = self.enter(parent);
        let key = self.derive_key(&engine, args);
        let guard = ActiveGuard::enter(engine.clone(), TaskIdent::new(&self.name, key.as_deref()), "sync");

        if let Some(path) = key
            .as_deref()
            .and_then(|k| engine.cache().entry_path(&self.name, k))
        {
            match engine.cache().read_blocking::<T>(&path) {
                Ok(value) => {
                    tracing::info!("using cached result for {}", guard.ident);
                    return Ok(value);
                }
                Err(CacheError::Miss) | Err(CacheError::Disabled) => {}
                Err(e) => tracing::warn!("cache read failed for {}: {}", guard.ident, e),
            }
        }

        let _permit = match &self.gate {
            Some(Gate::Blocking(semaphore)) => {
                tracing::debug!("acquiring gate for {}", guard.ident);
                Some(semaphore.acquire())
            }
            _ => None,
        };

        let mut attempt: u32 = 0;
        loop {
            if attempt > 0 {
                tracing::info!("retry {}/{} for {}", attempt, self.retries - 1, guard.ident);
            }
            match body(scope.with_attempt(attempt)) {
                Ok(value) => {
                    if let Some(key) = &key {
                        self.store_blocking(&engine, key, &value);
                    }
                    tracing::info!("successfully completed {}", guard.ident);
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(
                        "attempt {}/{} failed for {}: {}",
                        attempt + 1,
                        self.retries,
                        guard.ident,
                        e
                    );
                    if attempt + 1 >= self.retries {
                        tracing::error!("all {} attempts failed for {}", self.retries, guard.ident);
                        return Err(TaskError::Failed(e));
                    }
                    let delay = self.retry_delay.for_attempt(attempt);
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Enter a child task scope and bind its own log sink; nested
    /// invocations must not log into an ancestor's sink.
    fn enter(&self, parent: &Scope) -> Scope {
        let scope = parent.child(FrameKind::Task, &self.name);
        match parent.engine().log_root() {
            Some(root) => {
                let sink = Arc::new(LogSink::new(root.to_path_buf(), scope.index()));
                scope.with_sink(sink)
            }
            None => scope,
        }
    }

    /// Cache key over the configured argument subset, after defaults.
    /// Any configured name left unbound disables caching for the call.
    fn derive_key(&self, engine: &Engine, args: &Args) -> Option<String> {
        if self.cache_on.is_empty() || !engine.cache().enabled() {
            return None;
        }
        let bound = args.with_defaults(&self.defaults);
        let mut selected = Map::new();
        for name in &self.cache_on {
            match bound.get(name) {
                Some(value) => {
                    selected.insert(name.clone(), value.clone());
                }
                None => return None,
            }
        }
        Some(cache_key(&selected))
    }

    async fn store<T: Serialize>(&self, engine: &Engine, key: &str, value: &T) {
        let Some(path) = engine.cache().entry_path(&self.name, key) else {
            return;
        };
        // Serialize to an owned buffer before the write moves off the
        // scheduler; the caller keeps using the returned value.
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("failed to serialize cache entry for {}: {}", self.name, e);
                return;
            }
        };
        match engine.cache().write(&path, bytes).await {
            Ok(()) => tracing::debug!("cached result for {} with id {}_{}", self.name, self.name, key),
            Err(e) => tracing::warn!("failed to write cache entry {}: {}", path.display(), e),
        }
    }

    fn store_blocking<T: Serialize>(&self, engine: &Engine, key: &str, value: &T) {
        let Some(path) = engine.cache().entry_path(&self.name, key) else {
            return;
        };
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("failed to serialize cache entry for {}: {}", self.name, e);
                return;
            }
        };
        match engine.cache().write_blocking(&path, &bytes) {
            Ok(()) => tracing::debug!("cached result for {} with id {}_{}", self.name, self.name, key),
            Err(e) => tracing::warn!("failed to write cache entry {}: {}", path.display(), e),
        }
    }
}

/// Log identity of one task invocation: name, pictogram fingerprint,
/// and a short cache-key prefix.
struct TaskIdent {
    name: String,
    fingerprint: String,
    short_key: String,
}

impl TaskIdent {
    fn new(name: &str, key: Option<&str>) -> Self {
        let (fp, short_key) = match key {
            Some(k) => (fingerprint(k), k.chars().take(7).collect()),
            None => (taskcore::UNKEYED_FINGERPRINT.to_string(), "unkeyed".to_string()),
        };
        Self {
            name: name.to_string(),
            fingerprint: fp,
            short_key,
        }
    }
}

impl fmt::Display for TaskIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {}({} {})", self.name, self.fingerprint, self.short_key)
    }
}

/// Registry entry held for the duration of one task invocation. Drop
/// runs on every exit path, so panics and cancellation still decrement
/// the count.
struct ActiveGuard {
    engine: Engine,
    ident: TaskIdent,
}

impl ActiveGuard {
    fn enter(engine: Engine, ident: TaskIdent, mode: &str) -> Self {
        let (count, fingerprints) = engine.active().enter(&ident.fingerprint);
        tracing::info!(
            "executing {} {}. active tasks: {}",
            mode,
            ident,
            active_display(count, &fingerprints)
        );
        Self { engine, ident }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let (count, fingerprints) = self.engine.active().exit(&self.ident.fingerprint);
        tracing::info!(
            "finished {}. active tasks: {}",
            self.ident,
            active_display(count, &fingerprints)
        );
    }
}

fn active_display(count: usize, fingerprints: &[String]) -> String {
    if count > 0 && count <= 4 {
        format!("{}: [{}]", count, fingerprints.join(";"))
    } else {
        count.to_string()
    }
}
