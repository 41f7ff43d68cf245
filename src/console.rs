//! Sequential console UI: banner, prompts, status output.
//!
//! [`Console`] is generic over its reader/writer so the prompt loops can be
//! exercised with scripted input in tests. The production instance wraps
//! stdin/stdout and switches password entry to a no-echo TTY read.

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use colored::Colorize;

use crate::credentials::Credential;

const RULE_WIDTH: usize = 60;

pub struct Console<R, W> {
    input: R,
    output: W,
    /// When set, secrets are read from the controlling TTY without echo.
    secret_from_tty: bool,
}

impl Console<BufReader<Stdin>, Stdout> {
    /// Console over the process stdio.
    pub fn stdio() -> Self {
        Self {
            input: BufReader::new(io::stdin()),
            output: io::stdout(),
            secret_from_tty: atty::is(atty::Stream::Stdin),
        }
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Console over arbitrary streams. Secrets are read from `input`.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            secret_from_tty: false,
        }
    }

    pub fn banner(&mut self, version: &str) -> io::Result<()> {
        let title = format!("AUTO LOGIN v{}", version);
        let pad = RULE_WIDTH.saturating_sub(title.len()) / 2;
        writeln!(self.output, "{}", "=".repeat(RULE_WIDTH).cyan().bold())?;
        writeln!(
            self.output,
            "{}{}",
            " ".repeat(pad),
            title.cyan().bold()
        )?;
        writeln!(self.output, "{}", "=".repeat(RULE_WIDTH).cyan().bold())?;
        writeln!(self.output, "Automated login for the student portal")?;
        writeln!(self.output, "{}", "=".repeat(RULE_WIDTH).cyan().bold())?;
        writeln!(self.output)?;
        Ok(())
    }

    pub fn section(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", "-".repeat(40))?;
        writeln!(self.output, "{}", title.bold())?;
        writeln!(self.output, "{}", "-".repeat(40))?;
        Ok(())
    }

    pub fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{}", line)
    }

    /// Show a stored credential with the password masked.
    pub fn show_saved(&mut self, credential: &Credential) -> io::Result<()> {
        writeln!(self.output, "{} Found saved credentials", "✓".green())?;
        writeln!(self.output, "  Username: {}", credential.username)?;
        writeln!(self.output, "  Password: {}", "*".repeat(8))?;
        writeln!(self.output, "  Saved:    {}", credential.saved)?;
        Ok(())
    }

    /// Yes/no question. Only `y`/`yes` (any case) counts as yes.
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "\n{} (y/n): ", question)?;
        self.output.flush()?;
        let answer = self.read_line()?;
        let answer = answer.trim().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }

    /// Prompt until a non-empty value is entered.
    pub fn prompt_required(&mut self, label: &str, empty_error: &str) -> io::Result<String> {
        loop {
            write!(self.output, "{}: ", label)?;
            self.output.flush()?;
            let value = self.read_line()?;
            let value = value.trim();
            if !value.is_empty() {
                return Ok(value.to_string());
            }
            writeln!(self.output, "{} {}", "✗".red(), empty_error)?;
        }
    }

    /// Like [`prompt_required`], but without echoing the entered value on a
    /// TTY.
    ///
    /// [`prompt_required`]: Console::prompt_required
    pub fn prompt_secret_required(
        &mut self,
        label: &str,
        empty_error: &str,
    ) -> io::Result<String> {
        loop {
            write!(self.output, "{}: ", label)?;
            self.output.flush()?;
            let value = self.read_secret()?;
            let value = value.trim();
            if !value.is_empty() {
                return Ok(value.to_string());
            }
            writeln!(self.output, "{} {}", "✗".red(), empty_error)?;
        }
    }

    /// Block until the user presses Enter.
    pub fn wait_for_enter(&mut self, message: &str) -> io::Result<()> {
        write!(self.output, "\n{}", message)?;
        self.output.flush()?;
        // EOF is as good as Enter here.
        let mut sink = String::new();
        let _ = self.input.read_line(&mut sink)?;
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        let n = self.input.read_line(&mut line)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "console input closed",
            ));
        }
        Ok(line)
    }

    fn read_secret(&mut self) -> io::Result<String> {
        if self.secret_from_tty {
            return rpassword::read_password();
        }
        if self.input.fill_buf()?.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "console input closed",
            ));
        }
        rpassword::read_password_from_bufread(&mut self.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(script: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn confirm_accepts_y_and_yes_only() {
        for (answer, expected) in [
            ("y\n", true),
            ("Y\n", true),
            ("yes\n", true),
            ("n\n", false),
            ("\n", false),
            ("sure\n", false),
        ] {
            let mut c = console(answer);
            assert_eq!(c.confirm("Use saved credentials?").unwrap(), expected);
        }
    }

    #[test]
    fn required_prompt_retries_until_non_empty() {
        let mut c = console("\n   \nstudent\n");
        let value = c.prompt_required("Username", "Username cannot be empty!").unwrap();
        assert_eq!(value, "student");

        let transcript = String::from_utf8_lossy(c.output.as_slice()).to_string();
        assert_eq!(transcript.matches("Username cannot be empty!").count(), 2);
    }

    #[test]
    fn secret_prompt_retries_until_non_empty() {
        let mut c = console("\nhunter2\n");
        let value = c
            .prompt_secret_required("Password", "Password cannot be empty!")
            .unwrap();
        assert_eq!(value, "hunter2");
    }

    #[test]
    fn exhausted_input_is_an_error_not_a_spin() {
        let mut c = console("\n\n");
        let err = c
            .prompt_required("Username", "Username cannot be empty!")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn saved_credential_is_masked() {
        let mut c = console("");
        c.show_saved(&Credential {
            username: "student".into(),
            password: "supersecret".into(),
            saved: "2026-01-01 10:00:00".into(),
        })
        .unwrap();
        let transcript = String::from_utf8_lossy(c.output.as_slice()).to_string();
        assert!(transcript.contains("student"));
        assert!(!transcript.contains("supersecret"));
        assert!(transcript.contains(&"*".repeat(8)));
    }
}
