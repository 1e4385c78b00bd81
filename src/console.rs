//! Line-oriented operator console
//!
//! Wraps any `BufRead`/`Write` pair so the interactive flows can be
//! driven from a terminal or from a script.

use std::io::{self, BufRead, IsTerminal, StdinLock, Stdout, Write};

use secrecy::SecretString;

pub struct Console<R, W> {
    input: R,
    output: W,
    /// Read passwords without echo from the controlling terminal
    hidden_secrets: bool,
}

impl Console<StdinLock<'static>, Stdout> {
    /// Console bound to the process streams. Passwords are only hidden
    /// when stdin is a terminal; piped input is read line by line.
    pub fn stdio() -> Self {
        let stdin = io::stdin();
        let hidden = stdin.is_terminal();
        Self::new(stdin.lock(), io::stdout()).hide_secrets(hidden)
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Console over arbitrary streams; secrets are read as plain lines
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            hidden_secrets: false,
        }
    }

    /// Read passwords through the controlling terminal without echo
    pub fn hide_secrets(mut self, hidden: bool) -> Self {
        self.hidden_secrets = hidden;
        self
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Print one line
    pub fn say(&mut self, message: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{}", message)?;
        self.output.flush()
    }

    /// Show a prompt and read one line without its terminator.
    /// Returns `None` once input is exhausted.
    pub fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;
        self.read_line()
    }

    /// Ask a yes/no question; anything but `y`/`yes` (or end of input) is no
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.prompt(&format!("{} (yes/no): ", question))?;
        Ok(answer.is_some_and(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes")))
    }

    /// Read a password, hidden when attached to a terminal
    pub fn prompt_secret(&mut self, label: &str) -> io::Result<Option<SecretString>> {
        if self.hidden_secrets {
            self.output.flush()?;
            return rpassword::prompt_password(label).map(|s| Some(SecretString::new(s)));
        }
        Ok(self.prompt(label)?.map(SecretString::new))
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_prompt_strips_line_ending_and_reports_eof() {
        let mut c = console("echo hi\r\nsecond\n");
        assert_eq!(c.prompt("> ").unwrap().as_deref(), Some("echo hi"));
        assert_eq!(c.prompt("> ").unwrap().as_deref(), Some("second"));
        assert_eq!(c.prompt("> ").unwrap(), None);
        assert_eq!(String::from_utf8(c.into_output()).unwrap(), "> > > ");
    }

    #[test]
    fn test_confirm_answers() {
        let mut c = console("YES\ny\nno\n\n");
        assert!(c.confirm("add?").unwrap());
        assert!(c.confirm("add?").unwrap());
        assert!(!c.confirm("add?").unwrap());
        assert!(!c.confirm("add?").unwrap());
        assert!(!c.confirm("add?").unwrap());
    }

    #[test]
    fn test_secret_from_script() {
        let mut c = console("hunter2\n");
        let secret = c.prompt_secret("Password: ").unwrap().unwrap();
        assert_eq!(secret.expose_secret(), "hunter2");
    }

    #[test]
    fn test_piped_secret_reads_the_next_line() {
        let mut c = console("yes\npw\n").hide_secrets(false);
        assert!(c.confirm("Generate a key pair?").unwrap());
        let secret = c.prompt_secret("Host password: ").unwrap().unwrap();
        assert_eq!(secret.expose_secret(), "pw");
        assert_eq!(c.prompt_secret("Host password: ").unwrap().map(|_| ()), None);
        assert!(String::from_utf8(c.into_output()).unwrap().ends_with("Host password: Host password: "));
    }
}
