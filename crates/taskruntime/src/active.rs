use std::sync::Mutex;

/// Observability-only registry of in-flight tasks: a count plus one
/// fingerprint per running task, in entry order, under a single mutex.
/// Flows are excluded. State starts from zero at process start and
/// carries no correctness obligation.
pub(crate) struct ActiveTasks {
    state: Mutex<ActiveState>,
}

#[derive(Default)]
struct ActiveState {
    count: usize,
    fingerprints: Vec<String>,
}

impl ActiveTasks {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ActiveState::default()),
        }
    }

    /// Record task entry; returns the registry snapshot after the
    /// update for log lines.
    pub(crate) fn enter(&self, fingerprint: &str) -> (usize, Vec<String>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.count += 1;
        state.fingerprints.push(fingerprint.to_string());
        (state.count, state.fingerprints.clone())
    }

    /// Record task exit; removes the first matching fingerprint.
    pub(crate) fn exit(&self, fingerprint: &str) -> (usize, Vec<String>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.count = state.count.saturating_sub(1);
        if let Some(pos) = state.fingerprints.iter().position(|f| f == fingerprint) {
            state.fingerprints.remove(pos);
        }
        (state.count, state.fingerprints.clone())
    }

    pub(crate) fn snapshot(&self) -> (usize, Vec<String>) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        (state.count, state.fingerprints.clone())
    }
}
