//! On-disk OAuth token cache
//!
//! The file holds one [`PersistedToken`] as JSON and is replaced wholesale on
//! every refresh: the new content goes to a temporary file in the same
//! directory which is then renamed over the old one, so a concurrent reader
//! sees either the previous token or the new one, never a partial write.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use pagerline_domain::{PagerlineError, PersistedToken};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::errors::InfraError;

#[derive(Debug, Clone)]
pub struct TokenFileCache {
    path: PathBuf,
}

impl TokenFileCache {
    /// Cache backed by the file at `path`; nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached token. A missing, unreadable or corrupt file is a
    /// cache miss.
    pub fn load(&self) -> Option<PersistedToken> {
        let contents = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cached OAuth token");
                return None;
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "cannot read OAuth token cache");
                return None;
            }
        };

        match serde_json::from_slice(&contents) {
            Ok(token) => Some(token),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring corrupt OAuth token cache");
                None
            }
        }
    }

    /// Atomically replace the cached token.
    ///
    /// # Errors
    /// [`PagerlineError::Persistence`] when the directory is not writable.
    pub fn store(&self, token: &PersistedToken) -> Result<(), PagerlineError> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&directory).map_err(InfraError::from)?;

        let encoded = serde_json::to_vec_pretty(token)
            .map_err(|err| PagerlineError::Internal(format!("cannot encode OAuth token: {err}")))?;

        // NamedTempFile is created with owner-only permissions.
        let mut file = NamedTempFile::new_in(&directory).map_err(InfraError::from)?;
        file.write_all(&encoded).map_err(InfraError::from)?;
        file.as_file().sync_all().map_err(InfraError::from)?;
        file.persist(&self.path).map_err(|err| InfraError::from(err.error))?;

        debug!(path = %self.path.display(), "persisted OAuth token");
        Ok(())
    }

    /// Remove the cached token, if any.
    ///
    /// # Errors
    /// [`PagerlineError::Persistence`] when the file exists but cannot be
    /// removed.
    pub fn clear(&self) -> Result<(), PagerlineError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }
}
