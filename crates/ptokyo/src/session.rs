// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keeps the auth session on disk between runs.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use ptokyo_core::{PtokyoError, Session};

/// `<data dir>/ptokyo/session.json`.
pub fn session_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("ptokyo").join("session.json"))
}

/// Read a saved session. Missing or unreadable files yield `None`.
pub fn load(path: &Path) -> Option<Session> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read saved session");
            return None;
        }
    };
    serde_json::from_str(&raw)
        .inspect_err(|e| warn!(path = %path.display(), error = %e, "saved session is malformed"))
        .ok()
}

/// Write `session`, or delete the file when signed out.
pub fn save(path: &Path, session: Option<&Session>) -> Result<(), PtokyoError> {
    let Some(session) = session else {
        return match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PtokyoError::Internal(format!(
                "cannot remove {}: {e}",
                path.display()
            ))),
        };
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| {
            PtokyoError::Internal(format!("cannot create {}: {e}", dir.display()))
        })?;
    }
    let json = serde_json::to_string(session)
        .map_err(|e| PtokyoError::Internal(format!("cannot encode session: {e}")))?;
    let write_err = |e: std::io::Error| {
        PtokyoError::Internal(format!("cannot write {}: {e}", path.display()))
    };

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(write_err)?;

    // The mode only applies to new files; tighten older ones before writing.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(|e| {
                PtokyoError::Internal(format!("cannot restrict {}: {e}", path.display()))
            })?;
    }
    file.write_all(json.as_bytes()).map_err(write_err)?;
    Ok(())
}

/// Mirror every session change to `path` until the sender goes away.
pub fn spawn_persister(
    mut changes: watch::Receiver<Option<Session>>,
    path: PathBuf,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let session = changes.borrow_and_update().clone();
            match save(&path, session.as_ref()) {
                Ok(()) => debug!(signed_in = session.is_some(), "session file updated"),
                Err(e) => warn!(error = %e, "session not persisted"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use ptokyo_test_utils::session_for;

    use super::*;

    #[test]
    fn save_load_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        assert!(load(&path).is_none());

        save(&path, Some(&session_for("u7"))).unwrap();
        assert_eq!(load(&path).unwrap().user.id, "u7");

        save(&path, None).unwrap();
        assert!(!path.exists());
        save(&path, None).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private_to_the_user() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        save(&path, Some(&session_for("u1"))).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // A file left world-readable by something else is tightened on the next save.
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        save(&path, Some(&session_for("u2"))).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(load(&path).unwrap().user.id, "u2");
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load(&path).is_none());
    }

    #[tokio::test]
    async fn persister_follows_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let (tx, rx) = watch::channel(None);
        let task = spawn_persister(rx, path.clone());

        tx.send_replace(Some(session_for("u1")));
        tokio::task::yield_now().await;
        drop(tx);
        task.await.unwrap();
        // The last value sent before the sender closed is on disk.
        assert_eq!(load(&path).unwrap().user.id, "u1");
    }
}
