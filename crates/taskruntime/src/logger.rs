use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Append-only log sink bound to one task invocation, named by
/// hierarchical index and attempt: `call_<index>.md` for attempt 0,
/// `call_<index>_<attempt>.md` otherwise.
///
/// Appends are best-effort: failures are logged and swallowed, and a
/// sink file is never truncated.
pub(crate) struct LogSink {
    dir: PathBuf,
    file_index: String,
}

impl LogSink {
    pub(crate) fn new(dir: PathBuf, index: &str) -> Self {
        // Indexes begin with the parent separator; strip it so files
        // are named `call_0.md` rather than `call__0.md`.
        Self {
            dir,
            file_index: index.trim_start_matches('_').to_string(),
        }
    }

    fn path(&self, attempt: u32) -> PathBuf {
        let name = if attempt > 0 {
            format!("call_{}_{}.md", self.file_index, attempt)
        } else {
            format!("call_{}.md", self.file_index)
        };
        self.dir.join(name)
    }

    /// Append one newline-terminated line for the given attempt.
    pub(crate) fn append_blocking(&self, attempt: u32, content: &str) {
        if let Err(e) = self.try_append(attempt, content) {
            tracing::warn!(
                "failed to append invocation log {}: {}",
                self.path(attempt).display(),
                e
            );
        }
    }

    /// Async append; the file write moves off the cooperative
    /// scheduler so sibling invocations are never stalled.
    pub(crate) async fn append(self: &Arc<Self>, attempt: u32, content: String) {
        let sink = Arc::clone(self);
        let joined =
            tokio::task::spawn_blocking(move || sink.append_blocking(attempt, &content)).await;
        if joined.is_err() {
            tracing::warn!("invocation log append was cancelled");
        }
    }

    fn try_append(&self, attempt: u32, content: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(attempt))?;
        writeln!(file, "{}", content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_zero_has_no_suffix() {
        let sink = LogSink::new(PathBuf::from("/logs"), "_0_1");
        assert_eq!(sink.path(0), PathBuf::from("/logs/call_0_1.md"));
        assert_eq!(sink.path(2), PathBuf::from("/logs/call_0_1_2.md"));
    }

    #[test]
    fn appends_accumulate_in_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LogSink::new(dir.path().to_path_buf(), "_3");
        sink.append_blocking(0, "first");
        sink.append_blocking(0, "second");

        let text = std::fs::read_to_string(dir.path().join("call_3.md")).unwrap();
        assert_eq!(text, "first\nsecond\n");
    }
}
