//! Browser control over native CDP via `chromiumoxide`.
//!
//! This module owns:
//! * Finding a usable Chromium-family executable (env override → PATH scan →
//!   well-known install paths).
//! * Building the visible-launch config: anti-automation flags, maximized
//!   window, spoofed desktop user-agent.
//! * [`PortalBrowser`], the single browser session for a run, released
//!   exactly once no matter which later step fails.

use anyhow::{anyhow, Result};
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use rand::seq::IndexedRandom;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config;

// ── Spoofed client identity ──────────────────────────────────────────────────

const DESKTOP_USER_AGENTS: &[&str] = &[
    // Chrome 132 – Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    // Chrome 132 – macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    // Chrome 131 – Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
];

/// Returns a randomly-chosen realistic desktop User-Agent string.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    DESKTOP_USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(DESKTOP_USER_AGENTS[0])
}

/// Masks the `navigator.webdriver` automation flag before any page script
/// runs. Installed via `Page.addScriptToEvaluateOnNewDocument`.
const WEBDRIVER_MASK_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', {
    get: () => undefined
});
window.chrome = window.chrome || { runtime: {} };
"#;

// ── Browser executable discovery ─────────────────────────────────────────────

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_EXECUTABLE` env var (explicit override)
/// 2. PATH scan – finds package-manager installs on all platforms.
/// 3. OS-specific well-known install paths.
pub fn find_chrome_executable() -> Option<String> {
    if let Some(p) = config::chrome_executable_override() {
        return Some(p);
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = [
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
            "chrome",
        ];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/local/bin/chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

// ── Visible-launch config ────────────────────────────────────────────────────

/// Build a `BrowserConfig` for a visible, maximized session.
///
/// `--disable-blink-features=AutomationControlled` suppresses the
/// `navigator.webdriver` fingerprint; `--disable-infobars` hides the
/// "controlled by automated software" banner. When `exe` is `None` the
/// config defers to chromiumoxide's own executable detection.
pub fn build_visible_config(exe: Option<&str>) -> Result<BrowserConfig> {
    let ua = random_user_agent();

    let mut builder = BrowserConfig::builder()
        .with_head()
        .arg("--start-maximized")
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-infobars")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-sync")
        .arg(format!("--user-agent={}", ua));

    if let Some(exe) = exe {
        builder = builder.chrome_executable(exe);
    }

    builder
        .build()
        .map_err(|e| anyhow!("Failed to build browser config: {}", e))
}

// ── Session ──────────────────────────────────────────────────────────────────

/// The one browser instance a run owns.
///
/// `close()` is idempotent; dropping a still-open session force-closes it on
/// a spawned task so an aborted run never leaks a Chromium process.
pub struct PortalBrowser {
    browser: Option<Browser>,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
}

impl PortalBrowser {
    /// Launch the browser and open the working tab.
    ///
    /// A launch that fails after the process started cleans up before
    /// returning; the caller never sees a half-open session.
    pub async fn launch() -> Result<Self> {
        let exe = find_chrome_executable();
        match exe.as_deref() {
            Some(p) => info!("launching browser: {}", p),
            None => info!("no browser found by discovery, deferring to system default detection"),
        }

        let config = build_visible_config(exe.as_deref())?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut browser = browser;
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(anyhow!("Failed to open a tab: {}", e));
            }
        };

        // Best-effort stealth; a page that rejects the init script still works.
        if let Err(e) = page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(
                WEBDRIVER_MASK_SCRIPT,
            ))
            .await
        {
            warn!("webdriver mask injection failed (non-fatal): {}", e);
        }

        Ok(Self {
            browser: Some(browser),
            page,
            handler_task,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Gracefully close the browser. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            let _ = browser.close().await;
            let _ = browser.wait().await;
            self.handler_task.abort();
            info!("browser closed");
        }
    }
}

impl Drop for PortalBrowser {
    fn drop(&mut self) {
        // Drop cannot await; close on a spawned task to avoid zombie
        // Chromium processes when a run is interrupted mid-flight.
        let Some(mut browser) = self.browser.take() else {
            return;
        };
        self.handler_task.abort();
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        handle.spawn(async move {
            let _ = browser.close().await;
            let _ = browser.wait().await;
        });
    }
}
