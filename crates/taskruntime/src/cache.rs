use serde::de::DeserializeOwned;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use taskcore::CacheError;
use uuid::Uuid;

/// Content-addressable, disk-backed result store. One serialized value
/// per file at `<root>/<task_name>_<key>.json`.
///
/// Strictly best-effort: every failure surfaces as a [`CacheError`] to
/// the runtime, which logs and swallows it; user code never sees cache
/// errors. With no root configured, every operation is a no-op.
pub(crate) struct CacheStore {
    root: Option<PathBuf>,
}

impl CacheStore {
    pub(crate) fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.root.is_some()
    }

    pub(crate) fn entry_path(&self, task: &str, key: &str) -> Option<PathBuf> {
        self.root
            .as_ref()
            .map(|root| root.join(format!("{}_{}.json", task, key)))
    }

    pub(crate) fn read_blocking<T: DeserializeOwned>(&self, path: &Path) -> Result<T, CacheError> {
        if !self.enabled() {
            return Err(CacheError::Disabled);
        }
        let bytes = read_bytes(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Async read; the file I/O runs off the cooperative scheduler and
    /// deserialization happens once the bytes are back.
    pub(crate) async fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<T, CacheError> {
        if !self.enabled() {
            return Err(CacheError::Disabled);
        }
        let path = path.to_path_buf();
        let bytes = match tokio::task::spawn_blocking(move || read_bytes(&path)).await {
            Ok(result) => result?,
            Err(e) => return Err(CacheError::Io(std::io::Error::new(ErrorKind::Other, e))),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub(crate) fn write_blocking(&self, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        if !self.enabled() {
            return Ok(());
        }
        write_bytes(path, bytes)
    }

    /// Async write. The caller hands over an owned, already-serialized
    /// buffer, so it is free to keep mutating the value it returned
    /// while the write proceeds off the scheduler.
    pub(crate) async fn write(&self, path: &Path, bytes: Vec<u8>) -> Result<(), CacheError> {
        if !self.enabled() {
            return Ok(());
        }
        let path = path.to_path_buf();
        match tokio::task::spawn_blocking(move || write_bytes(&path, &bytes)).await {
            Ok(result) => result,
            Err(e) => Err(CacheError::Io(std::io::Error::new(ErrorKind::Other, e))),
        }
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, CacheError> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::Miss),
        Err(e) => Err(e.into()),
    }
}

/// Atomic write: serialize into a uniquely named temp file in the same
/// directory, force it to disk, then rename onto the final path. The
/// rename is the only externally visible state change, so a reader can
/// never observe a partially written entry.
fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let tmp = PathBuf::from(format!(
        "{}.{}.tmp",
        path.display(),
        Uuid::new_v4().as_simple()
    ));

    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
