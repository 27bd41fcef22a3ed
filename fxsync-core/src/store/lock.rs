//! Exclusive lock serializing sync runs against one database.
//!
//! Appends are not deduplicated, so two concurrent runs that read the same
//! sync point would write the same days twice. The lock file
//! `<database>.lock` is created with create-new semantics, holds the owner's
//! pid, and is removed on drop. A run that was killed never drops its lock;
//! the next run takes over a lock whose owner process no longer exists.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::StoreError;

#[derive(Debug)]
pub struct SyncLock {
    path: PathBuf,
}

impl SyncLock {
    pub fn lock_path(database: &Path) -> PathBuf {
        let mut name = database.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    pub fn acquire(database: &Path) -> Result<Self, StoreError> {
        let path = Self::lock_path(database);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if Self::try_create(&path)? {
            return Ok(Self { path });
        }

        match read_owner(&path) {
            Some(pid) if !process_alive(pid) => {
                tracing::warn!(lock = %path.display(), pid, "taking over stale sync lock");
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                // Another run may have taken over first.
                if Self::try_create(&path)? {
                    Ok(Self { path })
                } else {
                    Err(StoreError::Locked { path })
                }
            }
            _ => Err(StoreError::Locked { path }),
        }
    }

    /// `false` when the lock file already exists.
    fn try_create(path: &Path) -> Result<bool, StoreError> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", std::process::id()) {
                    let _ = fs::remove_file(path);
                    return Err(e.into());
                }
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Pid recorded in a lock file; `None` when unreadable or not yet written.
fn read_owner(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

// No portable liveness check here: treat the owner as alive.
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
