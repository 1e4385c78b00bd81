//! Operator command parsing and routing
//!
//! One input line becomes one [`CommandIntent`]:
//!
//! - `exit` ends the command loop for the current host
//! - `fdownload <remote> <local>` copies a remote file here
//! - `fput <local> <remote>` copies a local file there
//! - anything else runs verbatim on the remote shell
//!
//! Keywords are case-insensitive. Transfer paths cannot contain spaces.

use std::io::{self, Write};
use std::path::PathBuf;

use colored::Colorize;

use crate::error::{FleetError, Result};
use crate::ssh::RemoteSession;

pub const DOWNLOAD_USAGE: &str = "fdownload <remote_path> <local_path>";
pub const UPLOAD_USAGE: &str = "fput <local_path> <remote_path>";

pub const HELP: &str = "Enter a command to run on the remote host.\n  \
exit                                   leave this host\n  \
fdownload <remote_path> <local_path>   download a file, e.g. fdownload /root/config.json config.json\n  \
fput <local_path> <remote_path>        upload a file, e.g. fput config.json /root/config.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandIntent {
    RunCommand(String),
    Upload { local: PathBuf, remote: String },
    Download { remote: String, local: PathBuf },
    Exit,
}

/// What the command loop does after an intent has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Parse one operator line.
///
/// Only a transfer keyword with the wrong number of arguments fails,
/// with [`FleetError::Usage`].
pub fn parse(line: &str) -> Result<CommandIntent> {
    if line.trim().eq_ignore_ascii_case("exit") {
        return Ok(CommandIntent::Exit);
    }

    let mut words = line.split_whitespace();
    let keyword = words.next().unwrap_or_default();

    if keyword.eq_ignore_ascii_case("fdownload") {
        return match words.collect::<Vec<_>>()[..] {
            [remote, local] => Ok(CommandIntent::Download {
                remote: remote.to_string(),
                local: PathBuf::from(local),
            }),
            _ => Err(FleetError::Usage(DOWNLOAD_USAGE)),
        };
    }

    if keyword.eq_ignore_ascii_case("fput") {
        return match words.collect::<Vec<_>>()[..] {
            [local, remote] => Ok(CommandIntent::Upload {
                local: PathBuf::from(local),
                remote: remote.to_string(),
            }),
            _ => Err(FleetError::Usage(UPLOAD_USAGE)),
        };
    }

    Ok(CommandIntent::RunCommand(line.to_string()))
}

/// Carry out an intent on an open session and report to `out`.
///
/// Remote failures are printed and swallowed; only writing to `out`
/// can fail.
pub fn dispatch<S, W>(intent: CommandIntent, session: &mut S, out: &mut W) -> io::Result<Flow>
where
    S: RemoteSession,
    W: Write,
{
    match intent {
        CommandIntent::Exit => return Ok(Flow::Exit),
        CommandIntent::RunCommand(command) => match session.exec(&command) {
            Ok(output) => {
                // A silent command still prints one empty line
                let text = output.preferred_text();
                write!(out, "{}", text)?;
                if !text.ends_with('\n') {
                    writeln!(out)?;
                }
            }
            Err(e) => report(out, &e)?,
        },
        CommandIntent::Download { remote, local } => match session.download(&remote, &local) {
            Ok(bytes) => writeln!(
                out,
                "Downloaded {} to {} ({} bytes)",
                remote,
                local.display(),
                bytes
            )?,
            Err(e) => report(out, &e)?,
        },
        CommandIntent::Upload { local, remote } => match session.upload(&local, &remote) {
            Ok(bytes) => writeln!(
                out,
                "Uploaded {} to {} ({} bytes)",
                local.display(),
                remote,
                bytes
            )?,
            Err(e) => report(out, &e)?,
        },
    }
    out.flush()?;
    Ok(Flow::Continue)
}

/// Print an error for the operator and keep going
pub fn report<W: Write>(out: &mut W, error: &FleetError) -> io::Result<()> {
    tracing::debug!(error = %error, "operation failed");
    writeln!(out, "{} {}", "Error:".red().bold(), error)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh::CommandOutput;
    use std::path::Path;

    #[test]
    fn test_exit_is_case_insensitive() {
        assert_eq!(parse("exit").unwrap(), CommandIntent::Exit);
        assert_eq!(parse("EXIT").unwrap(), CommandIntent::Exit);
        assert_eq!(parse("  Exit ").unwrap(), CommandIntent::Exit);
        assert_eq!(
            parse("exit 1").unwrap(),
            CommandIntent::RunCommand("exit 1".into())
        );
    }

    #[test]
    fn test_transfer_commands() {
        assert_eq!(
            parse("fdownload /root/config.json config.json").unwrap(),
            CommandIntent::Download {
                remote: "/root/config.json".into(),
                local: PathBuf::from("config.json"),
            }
        );
        assert_eq!(
            parse("FPUT  local.txt\t/root/local.txt").unwrap(),
            CommandIntent::Upload {
                local: PathBuf::from("local.txt"),
                remote: "/root/local.txt".into(),
            }
        );
    }

    #[test]
    fn test_wrong_argument_count_is_usage_error() {
        for line in ["fput", "fput a", "fput a b c", "fdownload", "fdownload x"] {
            assert!(matches!(parse(line), Err(FleetError::Usage(_))), "{:?}", line);
        }
        assert!(matches!(parse("fput"), Err(FleetError::Usage(UPLOAD_USAGE))));
        assert!(matches!(parse("fdownload a"), Err(FleetError::Usage(DOWNLOAD_USAGE))));
    }

    #[test]
    fn test_everything_else_runs_verbatim() {
        assert_eq!(
            parse("ls -la  /tmp").unwrap(),
            CommandIntent::RunCommand("ls -la  /tmp".into())
        );
        assert_eq!(
            parse("fputs x").unwrap(),
            CommandIntent::RunCommand("fputs x".into())
        );
    }

    struct Canned {
        output: CommandOutput,
        fail_transfers: bool,
    }

    impl RemoteSession for Canned {
        fn exec(&mut self, _command: &str) -> Result<CommandOutput> {
            Ok(self.output.clone())
        }

        fn download(&mut self, remote: &str, _local: &Path) -> Result<u64> {
            if self.fail_transfers {
                return Err(FleetError::RemoteNotFound(remote.to_string()));
            }
            Ok(3)
        }

        fn upload(&mut self, local: &Path, _remote: &str) -> Result<u64> {
            if self.fail_transfers {
                return Err(FleetError::LocalNotFound(local.display().to_string()));
            }
            Ok(5)
        }

        fn close(self) {}
    }

    fn run(intent: CommandIntent, session: &mut Canned) -> (Flow, String) {
        let mut out = Vec::new();
        let flow = dispatch(intent, session, &mut out).unwrap();
        (flow, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_run_command_prints_stdout_else_stderr() {
        let mut session = Canned {
            output: CommandOutput {
                stdout: b"hi\n".to_vec(),
                stderr: b"ignored\n".to_vec(),
                exit_status: Some(0),
            },
            fail_transfers: false,
        };
        let (flow, text) = run(CommandIntent::RunCommand("echo hi".into()), &mut session);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(text, "hi\n");

        session.output = CommandOutput {
            stdout: Vec::new(),
            stderr: b"bash: nope: command not found".to_vec(),
            exit_status: Some(127),
        };
        let (_, text) = run(CommandIntent::RunCommand("nope".into()), &mut session);
        assert_eq!(text, "bash: nope: command not found\n");
    }

    #[test]
    fn test_silent_command_prints_empty_line() {
        let mut session = Canned {
            output: CommandOutput {
                stdout: Vec::new(),
                stderr: Vec::new(),
                exit_status: Some(0),
            },
            fail_transfers: false,
        };
        let (flow, text) = run(CommandIntent::RunCommand("true".into()), &mut session);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(text, "\n");
    }

    #[test]
    fn test_transfer_reports() {
        let mut session = Canned {
            output: CommandOutput::default(),
            fail_transfers: false,
        };
        let (_, text) = run(parse("fput local.txt /root/local.txt").unwrap(), &mut session);
        assert!(text.contains("Uploaded local.txt to /root/local.txt"));

        session.fail_transfers = true;
        let (flow, text) = run(parse("fdownload /nope here.txt").unwrap(), &mut session);
        assert_eq!(flow, Flow::Continue);
        assert!(text.contains("Remote file not found: /nope"));
    }

    #[test]
    fn test_exit_flow() {
        let mut session = Canned {
            output: CommandOutput::default(),
            fail_transfers: false,
        };
        let (flow, text) = run(CommandIntent::Exit, &mut session);
        assert_eq!(flow, Flow::Exit);
        assert!(text.is_empty());
    }
}
