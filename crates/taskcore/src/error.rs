use thiserror::Error;

/// Error returned from a task invocation.
///
/// The body's own error type `E` is carried verbatim: the engine never
/// wraps, chains, or rewords it. Only a configuration mistake produces
/// an engine-originated error, and it is raised before the body runs.
#[derive(Error, Debug)]
pub enum TaskError<E> {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Failed(E),
}

impl<E> TaskError<E> {
    /// The body's error, if this is a failure after exhausted attempts.
    pub fn into_failure(self) -> Option<E> {
        match self {
            TaskError::Failed(e) => Some(e),
            TaskError::Configuration(_) => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, TaskError::Configuration(_))
    }
}

/// Internal cache outcomes. These never cross the public API: a miss
/// triggers normal execution and every I/O failure is logged and
/// swallowed by the runtime.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache miss")]
    Miss,

    #[error("caching is disabled")]
    Disabled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
