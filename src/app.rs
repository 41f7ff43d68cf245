//! The whole-program flow: credentials in, one browser session, one verdict.
//!
//! Every state moves forward only; the single terminal-failure exit is the
//! error returned to `main`. The browser is released exactly once on every
//! path through [`execute_login_session`].

use std::io::{self, BufRead, Write};

use anyhow::anyhow;
use thiserror::Error;

use crate::browser::PortalBrowser;
use crate::classify::{classify, Verdict};
use crate::config::{self, AppPaths, FORM_READY_TIMEOUT, PORTAL_URL, POST_SUBMIT_TIMEOUT};
use crate::console::Console;
use crate::credentials::{Credential, CredentialStore, SaveOutcome};
use crate::eventlog::EventLog;
use crate::login::{InjectOutcome, PortalPage};

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("login script failed: {0}")]
    Injection(String),

    #[error("page inspection failed: {0}")]
    Inspection(String),
}

/// Everything one run learns about its own outcome.
#[derive(Clone, Debug)]
pub struct LoginReport {
    /// The injection script's status string, verbatim.
    pub script_result: String,
    pub url: String,
    pub title: String,
    pub verdict: Verdict,
}

// ── Credential acquisition ───────────────────────────────────────────────────

/// Offer any saved credential, otherwise prompt (re-prompting on empty
/// input), then offer to persist. Runs entirely on the console.
pub fn acquire_credentials<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    store: &CredentialStore,
) -> io::Result<Credential> {
    if let Some(saved) = store.load() {
        console.show_saved(&saved)?;
        if console.confirm("Use these credentials?")? {
            return Ok(saved);
        }
    }

    console.section("ENTER CREDENTIALS")?;
    let username = console.prompt_required("Username", "Username cannot be empty!")?;
    let password = console.prompt_secret_required("Password", "Password cannot be empty!")?;
    let credential = Credential::new_now(username, password);

    if console.confirm("Save these credentials for future runs?")? {
        match store.save(&credential) {
            SaveOutcome::Saved => console.say("✓ Credentials saved")?,
            // Reported and forgotten; a read-only disk must not block the login.
            SaveOutcome::Failed(e) => {
                console.say(&format!("⚠ Could not save credentials: {}", e))?
            }
        }
    }

    Ok(credential)
}

// ── Login flow ───────────────────────────────────────────────────────────────

/// Navigate, inject, submit, classify. Does not touch the browser lifecycle.
pub async fn perform_login<P: PortalPage + ?Sized>(
    portal: &P,
    credential: &Credential,
    log: &EventLog,
) -> Result<LoginReport, LoginError> {
    log.record(&format!("Starting login for user: {}", credential.username));

    log.record(&format!("Opening {}", PORTAL_URL));
    portal
        .navigate(PORTAL_URL)
        .await
        .map_err(|e| LoginError::Navigation(e.to_string()))?;

    let form_seen = portal
        .await_login_form(FORM_READY_TIMEOUT)
        .await
        .map_err(|e| LoginError::Inspection(e.to_string()))?;
    if !form_seen {
        log.record("Login form not detected in time, attempting injection anyway");
    }

    let before_submit = portal.current_url().await.unwrap_or_default();

    let script_result = portal
        .submit_credentials(&credential.username, &credential.password)
        .await
        .map_err(|e| LoginError::Injection(e.to_string()))?;
    log.record(&format!("Script result: {}", script_result));

    let outcome = InjectOutcome::from_status(&script_result);
    if !outcome.fields_filled() {
        log.record("Could not locate the login fields on the page");
    }
    if outcome.submitted() {
        portal
            .await_departure(&before_submit, POST_SUBMIT_TIMEOUT)
            .await
            .map_err(|e| LoginError::Inspection(e.to_string()))?;
    }

    let url = portal
        .current_url()
        .await
        .map_err(|e| LoginError::Inspection(e.to_string()))?;
    let title = portal
        .page_title()
        .await
        .map_err(|e| LoginError::Inspection(e.to_string()))?;
    log.record(&format!("Current URL: {}", url));
    log.record(&format!("Page title: {}", title));

    let verdict = classify(&url, &title);
    if !verdict.failure_hits.is_empty() {
        log.record(&format!(
            "Failure markers on page (informational): {}",
            verdict.failure_hits.join(", ")
        ));
    }
    log.record(&format!("Outcome: {}", verdict.summary_word()));

    Ok(LoginReport {
        script_result,
        url,
        title,
        verdict,
    })
}

/// Run the login against an already-launched portal and release the browser
/// exactly once, whatever happens in between. `on_result` fires between the
/// verdict and the release; this is where the summary is shown and the
/// user dismisses the still-open browser.
pub async fn execute_login_session<P, D, Fut>(
    portal: &mut P,
    credential: &Credential,
    log: &EventLog,
    on_result: D,
) -> Result<LoginReport, LoginError>
where
    P: PortalPage + ?Sized,
    D: FnOnce(LoginReport) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let outcome = perform_login(&*portal, credential, log).await;

    if let Ok(report) = &outcome {
        on_result(report.clone()).await;
    }

    portal.close().await;
    log.record("Browser closed");

    if let Err(e) = &outcome {
        log.record(&format!("Login attempt failed: {}", e));
    }

    outcome
}

// ── Summary ──────────────────────────────────────────────────────────────────

const SUMMARY_RULE: &str = "==================================================";

/// Plain-text closing summary. The script-result string is echoed verbatim.
pub fn render_summary(report: &LoginReport) -> String {
    let headline = if report.verdict.success {
        "LOGIN SUCCESSFUL"
    } else {
        "CHECK THE LOGIN RESULT MANUALLY"
    };

    let mut shown_url: String = report.url.chars().take(80).collect();
    if report.url.chars().count() > 80 {
        shown_url.push_str("...");
    }

    let mut out = format!(
        "\n{rule}\n{headline}\n{rule}\n\nStatus: {status}\nPage:   {url}\nTitle:  {title}\n",
        rule = SUMMARY_RULE,
        headline = headline,
        status = report.script_result,
        url = shown_url,
        title = report.title,
    );

    match &report.verdict.matched {
        Some(keyword) => out.push_str(&format!("\nMatched success marker: {}\n", keyword)),
        None => out.push_str(
            "\nNo success marker in the URL or title, look at the browser window.\n",
        ),
    }

    out
}

// ── Entry ────────────────────────────────────────────────────────────────────

/// The full run: banner, credentials, browser, login, summary, dismissal.
pub async fn run(paths: AppPaths) -> anyhow::Result<()> {
    let log = EventLog::new(paths.event_log.clone());
    let store = CredentialStore::new(paths.credentials.clone());

    let credential = tokio::task::spawn_blocking(move || {
        let mut console = Console::stdio();
        console.banner(config::APP_VERSION)?;
        acquire_credentials(&mut console, &store)
    })
    .await
    .map_err(|e| anyhow!("console task failed: {}", e))??;

    log.record("Launching browser...");
    let mut portal = PortalBrowser::launch()
        .await
        .map_err(|e| LoginError::Launch(e.to_string()))?;

    execute_login_session(&mut portal, &credential, &log, |report| async move {
        println!("{}", render_summary(&report));
        let _ = tokio::task::spawn_blocking(|| {
            let mut console = Console::stdio();
            console.wait_for_enter(
                "The browser stays open. Press Enter to close it and exit...",
            )
        })
        .await;
    })
    .await?;

    Ok(())
}
