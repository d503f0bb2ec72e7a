use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use time::OffsetDateTime;

use crate::error::{Result, ZipError};
use crate::zip::CompressionMethod;

/// Where an entry's bytes come from.
#[derive(Debug)]
pub enum SourceLocator {
    /// A file to open for reading.
    Path(PathBuf),
    /// An already open file. The label is only used in messages.
    Handle { file: File, label: PathBuf },
}

impl SourceLocator {
    pub fn label(&self) -> &Path {
        match self {
            SourceLocator::Path(path) => path,
            SourceLocator::Handle { label, .. } => label,
        }
    }
}

/// One input of an archive plus its per-entry overrides.
///
/// Size and modification time are read when the source is acquired, not here.
#[derive(Debug)]
pub struct EntrySource {
    pub locator: SourceLocator,
    /// Overrides the file's modification time. Only the instant matters: it
    /// is stored in the local calendar like a file's own mtime.
    pub modified: Option<OffsetDateTime>,
    /// Overrides the archive's default method.
    pub method: Option<CompressionMethod>,
    /// Entry comment, stored in the central directory.
    pub comment: Option<String>,
}

impl EntrySource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::from_locator(SourceLocator::Path(path.into()))
    }

    pub fn handle(file: File, label: impl Into<PathBuf>) -> Self {
        Self::from_locator(SourceLocator::Handle {
            file,
            label: label.into(),
        })
    }

    fn from_locator(locator: SourceLocator) -> Self {
        Self {
            locator,
            modified: None,
            method: None,
            comment: None,
        }
    }

    pub fn modified(mut self, modified: OffsetDateTime) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

impl From<&str> for EntrySource {
    fn from(path: &str) -> Self {
        Self::path(path)
    }
}

impl From<PathBuf> for EntrySource {
    fn from(path: PathBuf) -> Self {
        Self::path(path)
    }
}

impl From<&Path> for EntrySource {
    fn from(path: &Path) -> Self {
        Self::path(path)
    }
}

/// An open, shared-locked input file.
///
/// The lock is released by [`release`](Self::release) or on drop, whichever
/// comes first; the file is closed on drop.
#[derive(Debug)]
pub struct SourceGuard {
    file: File,
    path: PathBuf,
    size: u64,
    modified: SystemTime,
    locked: bool,
}

impl SourceGuard {
    /// Open and shared-lock a source.
    pub fn acquire(locator: SourceLocator) -> Result<Self> {
        let (file, path) = match locator {
            SourceLocator::Path(path) => match File::open(&path) {
                Ok(file) => (file, path),
                Err(source) => return Err(ZipError::CannotOpenSource { path, source }),
            },
            SourceLocator::Handle { file, label } => (file, label),
        };

        if let Err(source) = file.lock_shared() {
            return Err(ZipError::CannotLockSource { path, source });
        }

        // From here on the lock is owned by the guard, so any early return
        // still unlocks through Drop.
        let mut guard = Self {
            file,
            path,
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
            locked: true,
        };

        let metadata = match guard.file.metadata() {
            Ok(metadata) => metadata,
            Err(source) => {
                return Err(ZipError::CannotOpenSource {
                    path: guard.path.clone(),
                    source,
                });
            }
        };
        guard.size = metadata.len();
        guard.modified = metadata.modified().unwrap_or_else(|e| {
            log::warn!(
                "no modification time for {}: {e}, using now",
                guard.path.display()
            );
            SystemTime::now()
        });

        log::debug!("locked {} ({} bytes)", guard.path.display(), guard.size);
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size reported by the filesystem when the source was acquired.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Drop the shared lock. Calling this more than once has no effect.
    pub fn release(&mut self) {
        if !self.locked {
            return;
        }
        self.locked = false;
        if let Err(e) = self.file.unlock() {
            log::warn!("failed to unlock {}: {e}", self.path.display());
        } else {
            log::debug!("unlocked {}", self.path.display());
        }
    }
}

impl Read for SourceGuard {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        self.release();
    }
}
