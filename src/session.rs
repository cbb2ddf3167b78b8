//! Persisted auth session.
//!
//! Holds the bearer token and username across invocations, stored as a
//! small JSON file at the path configured in `[session].path`. Populated
//! on login/signup, cleared on logout.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Session {
    pub token: String,
    pub username: String,
}

impl Session {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
        }
    }
}

/// Load the session file. An absent file means "not logged in".
pub fn load(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;
    let session: Session = serde_json::from_str(&content)
        .with_context(|| format!("Corrupt session file: {}", path.display()))?;
    Ok(Some(session))
}

/// Write the session file, creating parent directories as needed.
pub fn save(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create session dir: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(session)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write session file: {}", path.display()))?;
    Ok(())
}

/// Remove the session file. An absent file is not an error.
pub fn clear(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove session file: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("session.json");

        assert!(load(&path).unwrap().is_none());

        let session = Session::new("tok-abc", "alice");
        save(&path, &session).unwrap();

        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded.token, "tok-abc");
        assert_eq!(loaded.username, "alice");
    }

    #[test]
    fn clear_removes_file_and_is_idempotent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        save(&path, &Session::new("t", "u")).unwrap();

        clear(&path).unwrap();
        assert!(load(&path).unwrap().is_none());
        clear(&path).unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load(&path).is_err());
    }
}
