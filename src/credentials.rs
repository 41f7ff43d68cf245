//! Credential persistence: one cleartext JSON record on disk.
//!
//! The file holds at most one `{username, password, saved}` object and is
//! overwritten on every save. A missing or unreadable file is simply
//! "no saved credential"; a failed write is reported to the caller as a
//! [`SaveOutcome`] and goes no further.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
    /// Local timestamp of the last save, `YYYY-MM-DD HH:MM:SS`.
    pub saved: String,
}

impl Credential {
    /// Stamp a freshly entered pair with the current local time.
    pub fn new_now(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            saved: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Result of a save attempt. Failures are for reporting, never for raising.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved,
    Failed(std::io::Error),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the stored credential, if any.
    ///
    /// Missing file and malformed content both read as `None`.
    pub fn load(&self) -> Option<Credential> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<Credential>(&content) {
            Ok(cred) => {
                debug!("loaded saved credential from {}", self.path.display());
                Some(cred)
            }
            Err(e) => {
                debug!(
                    "credential file {} is unreadable ({}), treating as absent",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Overwrite the stored record. Pretty-printed UTF-8 JSON.
    pub fn save(&self, credential: &Credential) -> SaveOutcome {
        let json = match serde_json::to_string_pretty(credential) {
            Ok(j) => j,
            Err(e) => return SaveOutcome::Failed(e.into()),
        };
        match std::fs::write(&self.path, json) {
            Ok(()) => {
                info!("credential saved to {}", self.path.display());
                SaveOutcome::Saved
            }
            Err(e) => SaveOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join("autologin_config.json"))
    }

    #[test]
    fn load_missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().is_none());
    }

    #[test]
    fn load_malformed_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(dir.path().join("autologin_config.json"), "{not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let cred = Credential::new_now("student", "pa$$w'\"rd");
        assert!(store.save(&cred).is_saved());
        assert_eq!(store.load().unwrap(), cred);
    }

    #[test]
    fn resave_changes_only_the_timestamp_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let first = Credential {
            username: "student".into(),
            password: "secret".into(),
            saved: "2020-01-01 00:00:00".into(),
        };
        assert!(store.save(&first).is_saved());

        let loaded = store.load().unwrap();
        let resaved = Credential::new_now(loaded.username.clone(), loaded.password.clone());
        assert!(store.save(&resaved).is_saved());

        let after = store.load().unwrap();
        assert_eq!(after.username, first.username);
        assert_eq!(after.password, first.password);
        assert_ne!(after.saved, first.saved);
    }

    #[test]
    fn persisted_form_is_pretty_printed_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&Credential::new_now("u", "p"));

        let raw = std::fs::read_to_string(dir.path().join("autologin_config.json")).unwrap();
        assert!(raw.contains("\n"), "expected multi-line pretty output");
        assert!(raw.contains("\"username\": \"u\""));
    }

    #[test]
    fn save_into_missing_directory_reports_failure() {
        let store = CredentialStore::new("/nonexistent-dir/deeper/cfg.json");
        match store.save(&Credential::new_now("u", "p")) {
            SaveOutcome::Failed(_) => {}
            SaveOutcome::Saved => panic!("write into a missing directory should fail"),
        }
    }
}
