// ABOUTME: Run lock to prevent overlapping runs of the same project.
// ABOUTME: Atomically links a lock file holding LockInfo into the state directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::types::ServiceName;

/// Information about who holds a run lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Project being deployed.
    pub project: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(project: &ServiceName) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            project: project.to_string(),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }

    /// Path to the lock file for a project.
    pub fn lock_path(state_dir: &Path, project: &ServiceName) -> PathBuf {
        state_dir.join(format!("{project}.lock"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("run lock for {project} held by {holder} (pid {pid}) since {started_at}")]
    Held {
        project: String,
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error("run lock acquired by another process while breaking a stale lock")]
    Contended,

    #[error("run lock I/O on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to serialize lock info: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl LockError {
    /// Holder details when the lock is held by someone else.
    pub fn lock_holder_info(&self) -> Option<LockInfo> {
        match self {
            LockError::Held {
                project,
                holder,
                pid,
                started_at,
            } => Some(LockInfo {
                holder: holder.clone(),
                pid: *pid,
                started_at: *started_at,
                project: project.clone(),
            }),
            _ => None,
        }
    }
}

/// A held run lock. The lock file is removed on `release()` or drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    released: bool,
}

impl RunLock {
    /// Acquire the run lock for `project` in `state_dir`.
    ///
    /// The lock file is written under a private name and hard-linked into
    /// place, so it appears atomically with its contents. A stale lock (over
    /// an hour old) or an unreadable one is broken with a warning; `force`
    /// breaks any lock.
    pub fn acquire(state_dir: &Path, project: &ServiceName, force: bool) -> Result<Self, LockError> {
        fs::create_dir_all(state_dir).map_err(|source| LockError::Io {
            path: state_dir.to_path_buf(),
            source,
        })?;

        let path = LockInfo::lock_path(state_dir, project);
        let json = serde_json::to_string(&LockInfo::new(project))?;

        if Self::try_link(&path, &json)? {
            return Ok(Self {
                path,
                released: false,
            });
        }

        if !Self::should_break(&path, force) {
            return match Self::read(&path) {
                Some(existing) => Err(LockError::Held {
                    project: existing.project,
                    holder: existing.holder,
                    pid: existing.pid,
                    started_at: existing.started_at,
                }),
                None => Err(LockError::Contended),
            };
        }

        tracing::debug!("Removing stale/forced lock at {}", path.display());
        if let Err(source) = fs::remove_file(&path) {
            if source.kind() != io::ErrorKind::NotFound {
                return Err(LockError::Io { path, source });
            }
        }

        if Self::try_link(&path, &json)? {
            Ok(Self {
                path,
                released: false,
            })
        } else {
            Err(LockError::Contended)
        }
    }

    /// Returns false when the lock file already exists.
    fn try_link(path: &Path, json: &str) -> Result<bool, LockError> {
        let staging = path.with_extension(format!("lock.{}", std::process::id()));
        fs::write(&staging, json).map_err(|source| LockError::Io {
            path: staging.clone(),
            source,
        })?;

        let linked = fs::hard_link(&staging, path);
        let _ = fs::remove_file(&staging);

        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(source) => Err(LockError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn read(path: &Path) -> Option<LockInfo> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Check if an existing lock should be broken (stale, forced, or corrupted).
    fn should_break(path: &Path, force: bool) -> bool {
        match Self::read(path) {
            Some(existing) if force => {
                tracing::warn!(
                    "Breaking lock held by {} (pid {}) since {}",
                    existing.holder,
                    existing.pid,
                    existing.started_at
                );
                true
            }
            Some(existing) if existing.is_stale() => {
                tracing::warn!(
                    "Auto-breaking stale lock held by {} (pid {}) since {}",
                    existing.holder,
                    existing.pid,
                    existing.started_at
                );
                true
            }
            Some(_) => false,
            None if path.exists() => {
                tracing::warn!("Lock info unreadable, breaking lock");
                true
            }
            // Released between our attempt and this check
            None => true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock.
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LockError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}
