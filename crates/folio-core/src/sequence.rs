//! Sequence numbers for classified filenames.
//!
//! Each classification consumes exactly one number. Numbers are unique and
//! strictly increasing for a given counter, including across concurrent
//! callers. A counter that cannot advance reports an error instead of
//! handing out a repeat.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SequenceError;

/// Source of unique, increasing sequence numbers.
#[async_trait]
pub trait SequenceCounter: Send + Sync {
    async fn next_sequence(&self) -> Result<u64, SequenceError>;
}

/// Process-local counter. The first number handed out is 1.
#[derive(Debug, Default)]
pub struct MemorySequenceCounter {
    last: AtomicU64,
}

impl MemorySequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }
}

#[async_trait]
impl SequenceCounter for MemorySequenceCounter {
    async fn next_sequence(&self) -> Result<u64, SequenceError> {
        self.last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(1))
            .map(|last| last + 1)
            .map_err(|last| SequenceError::Exhausted { last })
    }
}

const LOCK_RETRIES: u32 = 200;
const LOCK_BACKOFF: Duration = Duration::from_millis(10);

/// Counter persisted in a small text file holding the last number issued.
///
/// A sibling `.lock` file serializes writers across processes; the value is
/// written to a temporary file and renamed into place. A missing counter
/// file starts the sequence at 1.
#[derive(Debug)]
pub struct FileSequenceCounter {
    path: PathBuf,
    guard: tokio::sync::Mutex<()>,
}

impl FileSequenceCounter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last number issued, or 0 if none has been.
    pub fn peek(&self) -> Result<u64, SequenceError> {
        read_last(&self.path)
    }
}

#[async_trait]
impl SequenceCounter for FileSequenceCounter {
    async fn next_sequence(&self) -> Result<u64, SequenceError> {
        let _held = self.guard.lock().await;
        let path = self.path.clone();
        let next = tokio::task::spawn_blocking(move || advance(&path))
            .await
            .map_err(|e| SequenceError::Unavailable {
                path: self.path.clone(),
                message: e.to_string(),
            })??;
        tracing::debug!("Issued sequence number {next} from {:?}", self.path);
        Ok(next)
    }
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> SequenceError {
    SequenceError::Unavailable {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn read_last(path: &Path) -> Result<u64, SequenceError> {
    match std::fs::read_to_string(path) {
        Ok(content) => content
            .trim()
            .parse::<u64>()
            .map_err(|e| unavailable(path, format!("corrupt counter {:?}: {e}", content.trim()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(unavailable(path, e)),
    }
}

/// Removes the lock file when dropped.
struct LockFile(PathBuf);

impl LockFile {
    fn acquire(counter: &Path) -> Result<Self, SequenceError> {
        let lock = with_suffix(counter, ".lock");
        for _ in 0..LOCK_RETRIES {
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock)
            {
                Ok(_) => return Ok(Self(lock)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    std::thread::sleep(LOCK_BACKOFF);
                }
                Err(e) => return Err(unavailable(counter, e)),
            }
        }
        Err(unavailable(
            counter,
            format!("timed out waiting for {}", lock.display()),
        ))
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            tracing::warn!("Failed to remove sequence lock {:?}: {e}", self.0);
        }
    }
}

fn advance(path: &Path) -> Result<u64, SequenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| unavailable(path, e))?;
    }
    let _lock = LockFile::acquire(path)?;

    let last = read_last(path)?;
    let next = last
        .checked_add(1)
        .ok_or(SequenceError::Exhausted { last })?;

    let tmp = with_suffix(path, ".tmp");
    let mut file = std::fs::File::create(&tmp).map_err(|e| unavailable(path, e))?;
    writeln!(file, "{next}").map_err(|e| unavailable(path, e))?;
    file.sync_all().map_err(|e| unavailable(path, e))?;
    std::fs::rename(&tmp, path).map_err(|e| unavailable(path, e))?;
    Ok(next)
}
