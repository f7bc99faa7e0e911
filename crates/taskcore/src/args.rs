use serde::Serialize;
use serde_json::{Map, Value};

/// Named argument bindings for cache-key derivation.
///
/// Rust has no runtime view of a function's parameters, so a call site
/// that wants caching hands the engine a bindable view of its arguments
/// here. Only the names selected by the task's `cache_on` configuration
/// ever reach the key hash; everything else is ignored.
#[derive(Debug, Clone, Default)]
pub struct Args(Map<String, Value>);

impl Args {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Bind one argument by name.
    ///
    /// A value that fails to serialize is dropped, which disables
    /// caching for the call when the name is part of the key subset.
    pub fn arg(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        let name = name.into();
        match serde_json::to_value(value) {
            Ok(v) => {
                self.0.insert(name, v);
            }
            Err(e) => {
                tracing::warn!("argument '{}' is not serializable, dropped: {}", name, e);
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay these bindings onto declared defaults, mirroring
    /// signature binding with defaults applied.
    pub fn with_defaults(&self, defaults: &Map<String, Value>) -> Map<String, Value> {
        let mut bound = defaults.clone();
        for (name, value) in &self.0 {
            bound.insert(name.clone(), value.clone());
        }
        bound
    }
}
