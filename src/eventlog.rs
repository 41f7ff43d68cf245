//! Append-only run log: `[YYYY-MM-DD HH:MM:SS] message` lines.
//!
//! Every line is echoed to the console and appended to the log file. File
//! writes are best-effort: a failed append is reported in the returned
//! [`Append`] value and then ignored by callers. Logging is never on the
//! critical path of a run.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

/// Outcome of a single append. Callers discard this; tests don't.
#[derive(Debug)]
pub enum Append {
    Written,
    Ignored(std::io::Error),
}

impl Append {
    pub fn is_written(&self) -> bool {
        matches!(self, Append::Written)
    }
}

pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Echo `message` to the console and append it to the log file.
    pub fn record(&self, message: &str) -> Append {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{}] {}", stamp, message);
        println!("{}", line);

        match self.append_line(&line) {
            Ok(()) => Append::Written,
            Err(e) => {
                debug!("event log append failed ({}): {}", self.path.display(), e);
                Append::Ignored(e)
            }
        }
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_appends_timestamped_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path().join("log.txt"));

        assert!(log.record("first event").is_written());
        assert!(log.record("second event").is_written());

        let content = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] first event"));
        assert!(lines[1].ends_with("] second event"));
        // [YYYY-MM-DD HH:MM:SS] prefix: fixed width up to the closing bracket.
        assert_eq!(lines[0].find(']'), Some(20));
        assert!(lines[0].starts_with('['));
    }

    #[test]
    fn unwritable_path_is_ignored_not_fatal() {
        let log = EventLog::new("/nonexistent-dir/deeper/log.txt");
        match log.record("lost event") {
            Append::Ignored(_) => {}
            Append::Written => panic!("append into a missing directory should fail"),
        }
    }
}
