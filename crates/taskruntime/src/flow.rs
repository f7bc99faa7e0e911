use crate::scope::{FrameKind, Scope};
use std::future::Future;

/// A non-cached, non-retried orchestration invocation.
///
/// A flow enters a child scope under its parent, hands it to the body,
/// and returns the body's output verbatim, errors included. Flows never
/// touch the cache, the gate, or the active-task registry.
pub struct Flow {
    name: String,
}

impl Flow {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the flow body under a child scope of `parent`.
    pub async fn run<F, Fut, R>(&self, parent: &Scope, body: F) -> R
    where
        F: FnOnce(Scope) -> Fut,
        Fut: Future<Output = R>,
    {
        let scope = parent.child(FrameKind::Flow, &self.name);
        tracing::debug!("entering flow {} at index '{}'", self.name, scope.index());
        body(scope).await
    }

    /// Blocking flavor of [`Flow::run`].
    pub fn run_blocking<F, R>(&self, parent: &Scope, body: F) -> R
    where
        F: FnOnce(Scope) -> R,
    {
        let scope = parent.child(FrameKind::Flow, &self.name);
        tracing::debug!("entering flow {} at index '{}'", self.name, scope.index());
        body(scope)
    }
}
