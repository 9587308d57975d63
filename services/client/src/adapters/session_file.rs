//! services/client/src/adapters/session_file.rs
//!
//! A `SessionStore` that keeps the signed-in session in a JSON file, so a
//! sign-in survives between runs of the CLI.

use crate::adapters::records::SessionRecord;
use async_trait::async_trait;
use campus_forum_core::domain::Session;
use campus_forum_core::ports::{PortError, PortResult, SessionStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_error(action: &str, e: std::io::Error) -> PortError {
    PortError::Unexpected(format!("Failed to {}: {}", action, e))
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> PortResult<Option<Session>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("read the session file", e)),
        };
        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => Ok(Some(record.to_domain())),
            Err(e) => {
                // A damaged file is treated as signed out.
                warn!(path = %self.path.display(), "Ignoring an unreadable session file: {}", e);
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &Session) -> PortResult<()> {
        let raw = serde_json::to_string_pretty(&SessionRecord::from_domain(session))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(&format!("create {}", parent.display()), e))?;
        }
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| io_error("write the session file", e))?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove the session file", e)),
        }
    }
}
