use crate::engine::Engine;
use crate::logger::LogSink;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Invocation kind, recorded in the frame chain as `flow:name` or
/// `task:name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Flow,
    Task,
}

impl FrameKind {
    fn label(self) -> &'static str {
        match self {
            FrameKind::Flow => "flow",
            FrameKind::Task => "task",
        }
    }
}

/// Per-invocation call context: ancestor frame chain, hierarchical
/// index, attempt number, and the nearest enclosing task's log sink.
///
/// Scopes are plain values handed into each body. A child scope never
/// mutates its parent, so the parent context is intact on every exit
/// path (return, error, panic, cancellation) and concurrent sibling
/// invocations cannot observe each other's context.
#[derive(Clone)]
pub struct Scope {
    engine: Engine,
    chain: Vec<String>,
    index: String,
    attempt: u32,
    sink: Option<Arc<LogSink>>,
}

impl Scope {
    pub(crate) fn root(engine: Engine) -> Self {
        Self {
            engine,
            chain: Vec::new(),
            index: String::new(),
            attempt: 0,
            sink: None,
        }
    }

    /// Frame ids from the outermost invocation down to this one.
    pub fn call_chain(&self) -> &[String] {
        &self.chain
    }

    /// Hierarchical index identifying this invocation's position in
    /// the call tree.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// 0-based attempt number of the nearest enclosing task.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Append a line to the nearest enclosing task's invocation log.
    /// No-op outside any task context or when no log root is
    /// configured. File I/O runs off the cooperative scheduler.
    pub async fn log(&self, content: impl Into<String>) {
        if let Some(sink) = &self.sink {
            sink.append(self.attempt, content.into()).await;
        }
    }

    /// Blocking flavor of [`Scope::log`] for synchronous bodies.
    pub fn log_blocking(&self, content: &str) {
        if let Some(sink) = &self.sink {
            sink.append_blocking(self.attempt, content);
        }
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Enter a child invocation under this scope. The child index is
    /// `parent_index + "_" + ordinal`, except that a flow entered at
    /// the root keeps the empty index.
    pub(crate) fn child(&self, kind: FrameKind, name: &str) -> Scope {
        let index = if kind == FrameKind::Flow && self.chain.is_empty() {
            self.index.clone()
        } else {
            let ordinal = self.engine.allocator().next_child(&self.index);
            format!("{}_{}", self.index, ordinal)
        };
        let mut chain = self.chain.clone();
        chain.push(format!("{}:{}", kind.label(), name));
        Scope {
            engine: self.engine.clone(),
            chain,
            index,
            attempt: self.attempt,
            sink: self.sink.clone(),
        }
    }

    pub(crate) fn with_sink(mut self, sink: Arc<LogSink>) -> Scope {
        self.sink = Some(sink);
        self
    }

    pub(crate) fn with_attempt(&self, attempt: u32) -> Scope {
        let mut scope = self.clone();
        scope.attempt = attempt;
        scope
    }
}

/// Child-ordinal allocation table, parent index → next unused ordinal.
/// Grows monotonically and is mutated under a single short lock, so
/// concurrently entered siblings always draw distinct ordinals.
pub(crate) struct IndexAllocator {
    counters: Mutex<HashMap<String, u64>>,
}

impl IndexAllocator {
    pub(crate) fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn next_child(&self, parent: &str) -> u64 {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let slot = counters.entry(parent.to_string()).or_insert(0);
        let ordinal = *slot;
        *slot += 1;
        ordinal
    }
}
