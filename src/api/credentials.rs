//! Access-token sources for outgoing requests.
//!
//! The client asks its store for a token on every request. A missing token
//! is not an error: the request goes out unauthenticated and the server
//! decides.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

pub trait CredentialStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

/// Never supplies a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialStore for NoCredentials {
    fn access_token(&self) -> Option<String> {
        None
    }
}

/// Token held in memory, set after login and cleared on logout.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    token: RwLock<Option<String>>,
}

impl MemoryCredentials {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = token;
    }

    pub fn clear(&self) {
        self.set_token(None);
    }
}

impl CredentialStore for MemoryCredentials {
    fn access_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Token persisted in a file by some other program (a login flow, a
/// deployment secret). Read fresh on every request, never written.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentials {
    fn access_token(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read token file {}: {}", self.path.display(), e);
                None
            }
        }
    }
}
