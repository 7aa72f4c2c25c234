//! Durable storage for the staff session.
//!
//! The session is stored as one JSON document with two fixed keys, `token`
//! and `staff`, so it can be restored at startup without re-authenticating.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use honor_loyalty_core::StaffIdentity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a [`SessionStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stored document is not valid session JSON.
    #[error("corrupt session data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// On-disk shape of a session.
///
/// Either both fields are present or neither is. [`SessionManager`] discards
/// a document that carries only one of them.
///
/// [`SessionManager`]: super::SessionManager
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub staff: Option<StaffIdentity>,
}

impl std::fmt::Debug for PersistedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSession")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("staff", &self.staff)
            .finish()
    }
}

/// Durable client storage for the session.
pub trait SessionStore: Send + Sync {
    /// Read the stored session. A missing session is `Ok(default)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the storage cannot be read or is corrupt.
    fn load(&self) -> Result<PersistedSession, StoreError>;

    /// Replace the stored session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the session cannot be written.
    fn save(&self, session: &PersistedSession) -> Result<(), StoreError>;

    /// Remove any stored session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if existing data cannot be removed.
    fn clear(&self) -> Result<(), StoreError>;
}

impl<T: SessionStore + ?Sized> SessionStore for std::sync::Arc<T> {
    fn load(&self) -> Result<PersistedSession, StoreError> {
        (**self).load()
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        (**self).save(session)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

/// Session stored in a JSON file, written atomically via a sibling temp file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<PersistedSession, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(PersistedSession::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        {
            let mut file = open_private(&tmp)?;
            file.write_all(&serde_json::to_vec_pretty(session)?)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The token is a credential: keep the file readable by the owner only.
#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::File::create(path)
}

/// In-process store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<PersistedSession>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pre-populated session.
    #[must_use]
    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Current stored value.
    #[must_use]
    pub fn snapshot(&self) -> PersistedSession {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<PersistedSession, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = PersistedSession::default();
        Ok(())
    }
}
