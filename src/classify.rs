//! Heuristic login-outcome classification from URL/title keywords.
//!
//! This is a best-effort check, not a ground-truth one: no HTTP status, no
//! cookie inspection. The verdict keys off the success list alone; failure
//! keywords are matched and carried along for the log line, but a hit there
//! does not turn "verify manually" into "failed".

use std::sync::OnceLock;

use aho_corasick::AhoCorasick;

/// Any of these in the lower-cased URL or title reads as a successful login.
const SUCCESS_KEYWORDS: &[&str] = &[
    "dashboard",
    "main",
    "profile",
    "личный кабинет",
    "успешный вход",
];

/// Markers that usually mean the portal bounced us back to the login form.
/// Informational only; see the module docs.
const FAILURE_KEYWORDS: &[&str] = &["login", "auth", "ошибка", "error", "неверный"];

static SUCCESS_MATCHER: OnceLock<AhoCorasick> = OnceLock::new();
static FAILURE_MATCHER: OnceLock<AhoCorasick> = OnceLock::new();

fn success_matcher() -> &'static AhoCorasick {
    SUCCESS_MATCHER
        .get_or_init(|| AhoCorasick::new(SUCCESS_KEYWORDS).expect("valid success patterns"))
}

fn failure_matcher() -> &'static AhoCorasick {
    FAILURE_MATCHER
        .get_or_init(|| AhoCorasick::new(FAILURE_KEYWORDS).expect("valid failure patterns"))
}

/// Classification of one run's landing page.
#[derive(Clone, Debug)]
pub struct Verdict {
    /// True when any success keyword appears in the URL or title.
    pub success: bool,
    /// The first success keyword that matched, for the log line.
    pub matched: Option<String>,
    /// Failure keywords seen in the URL or title. Never gates `success`.
    pub failure_hits: Vec<String>,
}

impl Verdict {
    /// Human wording for the non-success case: the check is heuristic, so
    /// the absence of a success marker means "look at the browser", not
    /// "the login failed".
    pub fn summary_word(&self) -> &'static str {
        if self.success {
            "success"
        } else {
            "verify manually"
        }
    }
}

/// Judge a landing page by its URL and title.
pub fn classify(url: &str, title: &str) -> Verdict {
    let url = url.to_lowercase();
    let title = title.to_lowercase();

    let matched = success_matcher()
        .find(&url)
        .map(|m| SUCCESS_KEYWORDS[m.pattern().as_usize()])
        .or_else(|| {
            success_matcher()
                .find(&title)
                .map(|m| SUCCESS_KEYWORDS[m.pattern().as_usize()])
        });

    let mut failure_hits: Vec<String> = Vec::new();
    for hay in [&url, &title] {
        for m in failure_matcher().find_iter(hay) {
            let kw = FAILURE_KEYWORDS[m.pattern().as_usize()].to_string();
            if !failure_hits.contains(&kw) {
                failure_hits.push(kw);
            }
        }
    }

    Verdict {
        success: matched.is_some(),
        matched: matched.map(str::to_string),
        failure_hits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_url_is_success() {
        let v = classify("https://example.com/dashboard", "");
        assert!(v.success);
        assert_eq!(v.matched.as_deref(), Some("dashboard"));
    }

    #[test]
    fn title_match_is_success() {
        let v = classify("https://example.com/x", "My Dashboard");
        assert!(v.success);
    }

    #[test]
    fn russian_keyword_in_title_is_success() {
        let v = classify("https://example.com/x", "Личный кабинет студента");
        assert!(v.success);
        assert_eq!(v.matched.as_deref(), Some("личный кабинет"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(classify("https://example.com/DASHBOARD", "").success);
    }

    #[test]
    fn neutral_page_is_verify_manually() {
        let v = classify("https://example.com/welcome", "Welcome");
        assert!(!v.success);
        assert_eq!(v.summary_word(), "verify manually");
    }

    #[test]
    fn failure_keywords_never_gate_the_verdict() {
        // A page dripping with failure markers still reads "verify manually",
        // not "failed". The hits are recorded for the log.
        let v = classify("https://example.com/security/#/login", "Ошибка входа");
        assert!(!v.success);
        assert!(v.failure_hits.contains(&"login".to_string()));
        assert!(v.failure_hits.contains(&"ошибка".to_string()));
    }

    #[test]
    fn success_wins_even_with_failure_hits_present() {
        let v = classify("https://example.com/dashboard?from=login", "");
        assert!(v.success);
        assert!(!v.failure_hits.is_empty());
    }
}
