use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Delay schedule between failed attempts.
#[derive(Clone)]
pub enum RetryDelay {
    /// Same pause after every failed attempt.
    Fixed(Duration),
    /// Pause computed from the 0-based attempt number that just failed.
    Backoff(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl RetryDelay {
    /// No pause between attempts.
    pub fn none() -> Self {
        RetryDelay::Fixed(Duration::ZERO)
    }

    pub fn fixed_secs(secs: u64) -> Self {
        RetryDelay::Fixed(Duration::from_secs(secs))
    }

    pub fn fixed_millis(millis: u64) -> Self {
        RetryDelay::Fixed(Duration::from_millis(millis))
    }

    pub fn backoff(f: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        RetryDelay::Backoff(Arc::new(f))
    }

    /// Delay to wait after the given failed attempt.
    pub fn for_attempt(&self, attempt: u32) -> Duration {
        match self {
            RetryDelay::Fixed(d) => *d,
            RetryDelay::Backoff(f) => f(attempt),
        }
    }
}

impl Default for RetryDelay {
    fn default() -> Self {
        RetryDelay::none()
    }
}

impl fmt::Debug for RetryDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryDelay::Fixed(d) => f.debug_tuple("Fixed").field(d).finish(),
            RetryDelay::Backoff(_) => f.debug_tuple("Backoff").field(&"<fn>").finish(),
        }
    }
}
