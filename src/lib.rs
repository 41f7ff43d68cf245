pub mod app;
pub mod browser;
pub mod classify;
pub mod config;
pub mod console;
pub mod credentials;
pub mod eventlog;
pub mod login;

// --- Primary exports ---
pub use app::{acquire_credentials, execute_login_session, render_summary, LoginError, LoginReport};
pub use classify::{classify, Verdict};
pub use config::AppPaths;
pub use console::Console;
pub use credentials::{Credential, CredentialStore, SaveOutcome};
pub use eventlog::{Append, EventLog};
pub use login::{InjectOutcome, PortalPage};
