//! Login injection: locate the form fields, fill them, submit.
//!
//! The page side is one static function executed via `Runtime.callFunctionOn`
//! with the credentials and selector lists passed as **call arguments**;
//! nothing user-controlled is ever spliced into script text. The function
//! walks prioritized selector lists (first match wins, no scoring: the
//! portal exposes no stable DOM contract) and reports back one of four fixed
//! status strings.
//!
//! [`PortalPage`] is the seam between the flow and the live browser; tests
//! drive the flow with a stub implementation.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::js_protocol::runtime::{CallArgument, CallFunctionOnParams};
use tracing::{debug, warn};

use crate::browser::PortalBrowser;
use crate::config::POLL_INTERVAL;

// ── Field resolution heuristics ──────────────────────────────────────────────

/// Username field candidates, most specific first.
pub const USERNAME_SELECTORS: &[&str] = &[
    "#login",
    "#username",
    "input[name=\"login\"]",
    "input[name=\"username\"]",
    "input[type=\"text\"]",
    "input[type=\"email\"]",
];

/// Password field candidates.
pub const PASSWORD_SELECTORS: &[&str] = &[
    "#password",
    "#pass",
    "input[name=\"password\"]",
    "input[type=\"password\"]",
];

/// Submit control candidates. When none match, the first `<form>` on the
/// page is submitted directly.
pub const SUBMIT_SELECTORS: &[&str] = &[
    "button[type=\"submit\"]",
    ".btn-login",
    ".login-button",
    "input[type=\"submit\"]",
    ".btn-primary",
];

// ── Injection statuses ───────────────────────────────────────────────────────

pub const STATUS_SUBMITTED: &str = "Форма отправлена";
pub const STATUS_SUBMITTED_VIA_FORM: &str = "Форма отправлена (через form.submit())";
pub const STATUS_NO_BUTTON: &str = "Поля заполнены, но кнопка не найдена";
pub const STATUS_FIELDS_MISSING: &str = "Не удалось найти все поля для ввода";

/// Parsed form of the status string the page script returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectOutcome {
    Submitted,
    SubmittedViaForm,
    FilledNoButton,
    FieldsMissing,
    /// A status the page script does not produce; treated as "nothing
    /// submitted" downstream.
    Unrecognized,
}

impl InjectOutcome {
    pub fn from_status(status: &str) -> Self {
        match status {
            STATUS_SUBMITTED => Self::Submitted,
            STATUS_SUBMITTED_VIA_FORM => Self::SubmittedViaForm,
            STATUS_NO_BUTTON => Self::FilledNoButton,
            STATUS_FIELDS_MISSING => Self::FieldsMissing,
            _ => Self::Unrecognized,
        }
    }

    /// Did the script at least get both fields filled in?
    pub fn fields_filled(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::SubmittedViaForm | Self::FilledNoButton
        )
    }

    /// Did the script trigger a submission the portal might respond to?
    pub fn submitted(&self) -> bool {
        matches!(self, Self::Submitted | Self::SubmittedViaForm)
    }
}

// ── Page-context script ──────────────────────────────────────────────────────

/// Fills both fields (with synthetic `input`/`change` events so reactive
/// frameworks observe the values) and clicks the first matching submit
/// control, falling back to submitting the first form.
const FILL_AND_SUBMIT_FN: &str = r#"
function(user, pass, userSelectors, passSelectors, buttonSelectors) {
    function setValue(selectors, value) {
        for (const selector of selectors) {
            const el = document.querySelector(selector);
            if (el) {
                el.value = value;
                el.dispatchEvent(new Event('input', { bubbles: true }));
                el.dispatchEvent(new Event('change', { bubbles: true }));
                return true;
            }
        }
        return false;
    }

    const userOk = setValue(userSelectors, user);
    const passOk = setValue(passSelectors, pass);

    if (!userOk || !passOk) {
        return 'Не удалось найти все поля для ввода';
    }

    for (const selector of buttonSelectors) {
        const btn = document.querySelector(selector);
        if (btn) {
            btn.click();
            return 'Форма отправлена';
        }
    }

    const forms = document.getElementsByTagName('form');
    if (forms.length > 0) {
        forms[0].submit();
        return 'Форма отправлена (через form.submit())';
    }

    return 'Поля заполнены, но кнопка не найдена';
}
"#;

/// Assemble the CDP call: static function declaration, values as arguments.
fn build_injection_call(username: &str, password: &str) -> Result<CallFunctionOnParams> {
    let arguments = vec![
        CallArgument::builder()
            .value(serde_json::json!(username))
            .build(),
        CallArgument::builder()
            .value(serde_json::json!(password))
            .build(),
        CallArgument::builder()
            .value(serde_json::json!(USERNAME_SELECTORS))
            .build(),
        CallArgument::builder()
            .value(serde_json::json!(PASSWORD_SELECTORS))
            .build(),
        CallArgument::builder()
            .value(serde_json::json!(SUBMIT_SELECTORS))
            .build(),
    ];

    CallFunctionOnParams::builder()
        .function_declaration(FILL_AND_SUBMIT_FN)
        .arguments(arguments)
        .return_by_value(true)
        .build()
        .map_err(|e| anyhow!("injection call assembly failed: {}", e))
}

/// `true` once the DOM is complete and some username candidate exists.
fn form_probe_script() -> String {
    let selectors = serde_json::to_string(USERNAME_SELECTORS).expect("static selector list");
    format!(
        "document.readyState === 'complete' && {}.some((s) => document.querySelector(s) !== null)",
        selectors
    )
}

// ── Portal seam ──────────────────────────────────────────────────────────────

/// What the login flow needs from a live portal page.
#[async_trait]
pub trait PortalPage: Send {
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Poll until the login form looks present, up to `timeout`. Returns
    /// whether it was seen; a `false` is a warning, not an error, and the
    /// injection still gets its chance.
    async fn await_login_form(&self, timeout: Duration) -> Result<bool>;

    /// Run the fill-and-submit script; returns its status string verbatim.
    async fn submit_credentials(&self, username: &str, password: &str) -> Result<String>;

    /// Poll until the page leaves `from_url`, up to `timeout`. A page that
    /// never moves simply flows into classification as-is.
    async fn await_departure(&self, from_url: &str, timeout: Duration) -> Result<()>;

    async fn current_url(&self) -> Result<String>;
    async fn page_title(&self) -> Result<String>;

    /// Release the underlying browser. Must be safe to call once per run.
    async fn close(&mut self);
}

#[async_trait]
impl PortalPage for PortalBrowser {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page()
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| anyhow!("navigation to {} failed: {}", url, e))
    }

    async fn await_login_form(&self, timeout: Duration) -> Result<bool> {
        let probe = form_probe_script();
        let start = std::time::Instant::now();

        loop {
            let ready = self
                .page()
                .evaluate(probe.clone())
                .await
                .ok()
                .and_then(|v| v.into_value::<bool>().ok())
                .unwrap_or(false);

            if ready {
                debug!(
                    "login form present after {}ms",
                    start.elapsed().as_millis()
                );
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                warn!(
                    "login form not seen within {}s, attempting injection anyway",
                    timeout.as_secs()
                );
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn submit_credentials(&self, username: &str, password: &str) -> Result<String> {
        let call = build_injection_call(username, password)?;
        let result = self
            .page()
            .evaluate_function(call)
            .await
            .map_err(|e| anyhow!("login script execution failed: {}", e))?;
        result
            .into_value::<String>()
            .map_err(|e| anyhow!("login script returned a non-string value: {}", e))
    }

    async fn await_departure(&self, from_url: &str, timeout: Duration) -> Result<()> {
        let start = std::time::Instant::now();
        loop {
            let here = self.current_url().await.unwrap_or_default();
            if !here.is_empty() && here != from_url {
                debug!("page moved to {} after {}ms", here, start.elapsed().as_millis());
                return Ok(());
            }
            if start.elapsed() >= timeout {
                debug!("page still on {} after {}s", from_url, timeout.as_secs());
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn current_url(&self) -> Result<String> {
        self.page()
            .url()
            .await
            .map(|u| u.unwrap_or_default())
            .map_err(|e| anyhow!("could not read page URL: {}", e))
    }

    async fn page_title(&self) -> Result<String> {
        self.page()
            .evaluate("document.title")
            .await
            .map_err(|e| anyhow!("could not read page title: {}", e))?
            .into_value::<String>()
            .map_err(|e| anyhow!("page title was not a string: {}", e))
    }

    async fn close(&mut self) {
        PortalBrowser::close(self).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_outcomes() {
        assert_eq!(
            InjectOutcome::from_status(STATUS_SUBMITTED),
            InjectOutcome::Submitted
        );
        assert_eq!(
            InjectOutcome::from_status(STATUS_SUBMITTED_VIA_FORM),
            InjectOutcome::SubmittedViaForm
        );
        assert_eq!(
            InjectOutcome::from_status(STATUS_NO_BUTTON),
            InjectOutcome::FilledNoButton
        );
        assert_eq!(
            InjectOutcome::from_status(STATUS_FIELDS_MISSING),
            InjectOutcome::FieldsMissing
        );
        assert_eq!(
            InjectOutcome::from_status("что-то ещё"),
            InjectOutcome::Unrecognized
        );

        assert!(InjectOutcome::Submitted.submitted());
        assert!(InjectOutcome::SubmittedViaForm.fields_filled());
        assert!(!InjectOutcome::FilledNoButton.submitted());
        assert!(!InjectOutcome::FieldsMissing.fields_filled());
    }

    #[test]
    fn page_script_produces_exactly_the_known_statuses() {
        // Guard against the script and the Rust-side constants drifting.
        for status in [
            STATUS_SUBMITTED,
            STATUS_SUBMITTED_VIA_FORM,
            STATUS_NO_BUTTON,
            STATUS_FIELDS_MISSING,
        ] {
            assert!(
                FILL_AND_SUBMIT_FN.contains(status),
                "script lost status: {}",
                status
            );
        }
    }

    #[test]
    fn credentials_travel_as_arguments_not_script_text() {
        let username = "stu'dent";
        let password = "p\"as\\s\nword";

        let call = build_injection_call(username, password).unwrap();

        // The declaration is the static script, untouched by the values.
        assert_eq!(call.function_declaration, FILL_AND_SUBMIT_FN);
        assert!(!call.function_declaration.contains("stu'dent"));

        let args = call.arguments.as_ref().expect("arguments present");
        assert_eq!(args.len(), 5);
        assert_eq!(
            args[0].value.as_ref().unwrap(),
            &serde_json::json!(username)
        );
        assert_eq!(
            args[1].value.as_ref().unwrap(),
            &serde_json::json!(password)
        );
        assert_eq!(
            args[2].value.as_ref().unwrap(),
            &serde_json::json!(USERNAME_SELECTORS)
        );
    }

    #[test]
    fn form_probe_checks_readiness_and_field_presence() {
        let probe = form_probe_script();
        assert!(probe.contains("document.readyState"));
        assert!(probe.contains("#login"));
        assert!(probe.contains("querySelector"));
    }
}
