// ABOUTME: Advisory lock preventing concurrent deploys of the same variant facet.
// ABOUTME: Atomic file creation with holder info; stale locks auto-break.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Information about who holds a deploy lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// `{namespace}-{name}-{tag}-{facet}` key being locked.
    pub key: String,
}

impl LockInfo {
    pub fn new(key: &str) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            key: key.to_string(),
        }
    }

    /// A lock older than an hour outlives any plausible apply (the longest
    /// external operation is bounded by the 20-minute default timeout).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }
}

/// Errors from lock acquisition.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("deploy lock for '{key}' held by {holder} (pid {pid}) since {since}")]
    Held {
        key: String,
        holder: String,
        pid: u32,
        since: DateTime<Utc>,
    },

    #[error("failed to acquire deploy lock: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode lock info: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A held per-variant deploy lock. Released explicitly or by `Drop`.
#[derive(Debug)]
pub struct DeployLock {
    path: PathBuf,
    released: bool,
}

impl DeployLock {
    /// Acquire the lock for `key` under `state_dir`.
    ///
    /// Uses atomic create-new for acquisition (no check-then-create race).
    /// A stale or forced lock is broken with a warning and re-acquired.
    pub fn acquire(state_dir: &Path, key: &str, force: bool) -> Result<Self, LockError> {
        std::fs::create_dir_all(state_dir)?;
        let path = state_dir.join(format!("{key}.lock"));
        let info = LockInfo::new(key);
        let payload = serde_json::to_string(&info)?;

        match try_create(&path, &payload) {
            Ok(()) => {
                return Ok(Self {
                    path,
                    released: false,
                });
            }
            Err(e) if e.kind() != std::io::ErrorKind::AlreadyExists => return Err(e.into()),
            Err(_) => {}
        }

        // Lock file exists: break it if stale, forced, or unreadable.
        let existing: Option<LockInfo> = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok());

        let should_break = match &existing {
            Some(info) if force => {
                tracing::warn!(
                    "breaking lock held by {} (pid {}) since {}",
                    info.holder,
                    info.pid,
                    info.started_at
                );
                true
            }
            Some(info) if info.is_stale() => {
                tracing::warn!(
                    "auto-breaking stale lock held by {} (pid {}) since {}",
                    info.holder,
                    info.pid,
                    info.started_at
                );
                true
            }
            Some(_) => false,
            None => {
                tracing::warn!("lock info unreadable, breaking lock");
                true
            }
        };

        if !should_break {
            let info = existing.expect("non-breakable lock has readable info");
            return Err(LockError::Held {
                key: key.to_string(),
                holder: info.holder,
                pid: info.pid,
                since: info.started_at,
            });
        }

        std::fs::remove_file(&path)?;
        try_create(&path, &payload)?;
        Ok(Self {
            path,
            released: false,
        })
    }

    /// Release the lock, removing its file.
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        std::fs::remove_file(&self.path)?;
        Ok(())
    }
}

impl Drop for DeployLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn try_create(path: &Path, payload: &str) -> std::io::Result<()> {
    use std::io::Write as _;
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(payload.as_bytes())
}
