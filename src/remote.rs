// SPDX-FileCopyrightText: 2026 pmxdeploy contributors
// SPDX-License-Identifier: MIT

//! Remote command execution.
//!
//! Everything pmxdeploy does to the target host goes through the [`Remote`]
//! trait: run a command, run a command with sudo, upload a file, or probe a
//! condition. Tasks only ever see this seam, which keeps them testable
//! against a recording mock while production runs over SSH.
//!
//! The execution model is deliberately simple: one blocking command at a
//! time, no retries, no timeouts beyond what the transport enforces. A
//! non-zero exit aborts the calling task with the remote output attached,
//! except for [`probe`](Remote::probe) which folds every failure into a
//! boolean "no".

use ssh2::{OpenFlags, OpenType, Session};
use std::{
    io::{Read, Write},
    net::TcpStream,
    path::Path,
};
use tracing::{debug, warn};

/// Synchronous command-and-file-transfer seam against one remote host.
pub trait Remote {
    /// Run a command as the connecting user. Non-zero exit is an error.
    fn run(&self, cmd: &str) -> Result<String>;

    /// Run a command under sudo. Non-zero exit is an error.
    fn sudo(&self, cmd: &str) -> Result<String>;

    /// Write `content` to `path` on the remote host as the connecting user.
    fn upload(&self, content: &[u8], path: &Path) -> Result<()>;

    /// Run a check command, folding any failure into `false`.
    ///
    /// Used for the existence/is-directory probes that are allowed to fail
    /// without aborting a task.
    fn probe(&self, cmd: &str) -> bool;
}

/// Production [`Remote`] backed by an ssh2 session.
pub struct SshRemote {
    session: Session,
    host: String,
}

impl SshRemote {
    /// Connect to `host:22` and authenticate `user` via the SSH agent.
    pub fn connect(host: &str, user: &str) -> Result<Self> {
        debug!("connecting to {user}@{host}");
        let tcp = TcpStream::connect((host, 22))?;
        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;
        session.userauth_agent(user)?;

        Ok(Self {
            session,
            host: host.into(),
        })
    }

    fn exec(&self, cmd: &str) -> Result<(i32, String)> {
        debug!("[{}] {cmd}", self.host);
        let mut channel = self.session.channel_session()?;

        // INVARIANT: stderr is folded into the output stream on the remote
        // side. Draining two channel streams one after the other can stall
        // the session when a chatty command (apt, pip) fills the untouched
        // stream's window.
        channel.exec(merged_command(cmd).as_str())?;

        let mut message = String::new();
        channel.read_to_string(&mut message)?;
        channel.wait_close()?;
        let status = channel.exit_status()?;

        // INVARIANT: Chomp trailing newlines.
        let message = message
            .strip_suffix("\r\n")
            .or(message.strip_suffix('\n'))
            .map(ToString::to_string)
            .unwrap_or(message);

        Ok((status, message))
    }

    fn checked_exec(&self, cmd: &str) -> Result<String> {
        let (status, output) = self.exec(cmd)?;
        if status != 0 {
            return Err(RemoteError::CommandFailed {
                command: cmd.into(),
                status,
                output,
            });
        }

        Ok(output)
    }
}

impl Remote for SshRemote {
    fn run(&self, cmd: &str) -> Result<String> {
        self.checked_exec(cmd)
    }

    fn sudo(&self, cmd: &str) -> Result<String> {
        self.checked_exec(format!("sudo {cmd}").as_str())
    }

    fn upload(&self, content: &[u8], path: &Path) -> Result<()> {
        debug!("[{}] upload {} bytes to {}", self.host, content.len(), path.display());
        let sftp = self.session.sftp()?;
        let mut file = sftp.open_mode(
            path,
            OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
            0o600,
            OpenType::File,
        )?;
        file.write_all(content)?;

        Ok(())
    }

    fn probe(&self, cmd: &str) -> bool {
        match self.exec(cmd) {
            Ok((status, _)) => status == 0,
            Err(error) => {
                warn!("[{}] probe {cmd:?} failed: {error}", self.host);
                false
            }
        }
    }
}

/// Wrap a string in single quotes for safe use in a remote shell command.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn merged_command(cmd: &str) -> String {
    format!("{cmd} 2>&1")
}

/// Remote execution error types.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Failed to reach the remote host.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// SSH transport or authentication failure.
    #[error(transparent)]
    Ssh(#[from] ssh2::Error),

    /// Remote command exited non-zero.
    #[error("command {command:?} failed with status {status}:\n{output}")]
    CommandFailed {
        command: String,
        status: i32,
        output: String,
    },
}

/// Friendly result alias :3
pub type Result<T, E = RemoteError> = std::result::Result<T, E>;


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shell_quote_wraps_plain_values() {
        assert_eq!(shell_quote("/etc/pmxbot/main.conf"), "'/etc/pmxbot/main.conf'");
    }

    #[test]
    fn shell_quote_escapes_embedded_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn exec_folds_stderr_into_the_output_stream() {
        assert_eq!(
            merged_command("apt -q install -y python3.7-venv"),
            "apt -q install -y python3.7-venv 2>&1"
        );
    }

    #[test]
    fn command_failure_reports_output() {
        let error = RemoteError::CommandFailed {
            command: "apt update".into(),
            status: 100,
            output: "E: no network".into(),
        };

        let rendered = error.to_string();
        assert!(rendered.contains("apt update"));
        assert!(rendered.contains("E: no network"));
    }
}
