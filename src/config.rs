//! Process-wide configuration: file locations and environment overrides.
//!
//! Everything here is resolved **once** at startup and passed down as a
//! value; nothing below this module recomputes paths ad hoc.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// The portal this tool logs into. There is deliberately no configuration
/// surface for alternate targets.
pub const PORTAL_URL: &str = "https://poo.edu-74.ru/security/#/login";

/// Shown in the startup banner.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const CREDENTIALS_FILE: &str = "autologin_config.json";
pub const EVENT_LOG_FILE: &str = "autologin_log.txt";

pub const ENV_HOME_OVERRIDE: &str = "AUTOLOGIN_HOME";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";

/// Upper bound on waiting for the login form to appear after navigation.
pub const FORM_READY_TIMEOUT: Duration = Duration::from_secs(15);
/// Upper bound on waiting for the page to move somewhere after submit.
pub const POST_SUBMIT_TIMEOUT: Duration = Duration::from_secs(8);
/// Poll interval for both waits above.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Where the credential file and the event log live.
#[derive(Clone, Debug)]
pub struct AppPaths {
    pub base_dir: PathBuf,
    pub credentials: PathBuf,
    pub event_log: PathBuf,
}

impl AppPaths {
    /// Anchor both files in `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            credentials: base_dir.join(CREDENTIALS_FILE),
            event_log: base_dir.join(EVENT_LOG_FILE),
            base_dir,
        }
    }

    /// Resolve the base directory for this run.
    ///
    /// Order: `AUTOLOGIN_HOME` env var → the executable's directory → the
    /// process working directory → the user's home directory. The files sit
    /// next to the binary in the normal case, mirroring a portable install.
    pub fn resolve() -> Self {
        if let Ok(dir) = std::env::var(ENV_HOME_OVERRIDE) {
            let dir = dir.trim();
            if !dir.is_empty() {
                return Self::new(dir);
            }
        }

        let base = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| std::env::current_dir().ok())
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::new(base)
    }
}

/// Optional override for the Chromium-family browser executable.
///
/// Default behavior is auto-discovery (see `browser::find_chrome_executable`).
/// Only returns a value when `CHROME_EXECUTABLE` points at an existing path.
pub fn chrome_executable_override() -> Option<String> {
    let p = std::env::var(ENV_CHROME_EXECUTABLE).ok()?;
    let p = p.trim();
    if p.is_empty() {
        return None;
    }
    if Path::new(p).exists() {
        Some(p.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_anchored_in_base_dir() {
        let paths = AppPaths::new("/tmp/autologin-base");
        assert_eq!(
            paths.credentials,
            PathBuf::from("/tmp/autologin-base").join(CREDENTIALS_FILE)
        );
        assert_eq!(
            paths.event_log,
            PathBuf::from("/tmp/autologin-base").join(EVENT_LOG_FILE)
        );
    }

    #[test]
    fn resolve_always_yields_some_base() {
        let paths = AppPaths::resolve();
        assert!(!paths.base_dir.as_os_str().is_empty());
    }
}
