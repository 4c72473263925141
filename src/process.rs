// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External command plumbing.
//!
//! Everything chezup spawns goes through here: package managers, `uname`,
//! the vendor install script, and chezmoi itself. Commands come in two
//! flavors. An __interactive__ command inherits chezup's terminal so the
//! child can prompt the user (sudo passwords, chezmoi's own questions). A
//! __captured__ command runs detached from the terminal and hands back its
//! standard output for chezup to parse.
//!
//! The [`CommandRunner`] trait is the seam that keeps the rest of the crate
//! testable without spawning real processes.

use std::{
    ffi::{OsStr, OsString},
    path::PathBuf,
    process::Command,
};
use tracing::debug;

/// Layer of indirection for spawning external commands.
pub trait CommandRunner {
    /// Run command attached to the current terminal, blocking until it exits.
    ///
    /// # Errors
    ///
    /// - Return [`ProcessError::Spawn`] if the command cannot be started.
    /// - Return [`ProcessError::Failed`] if the command exits non-zero.
    fn run_interactive(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<()>;

    /// Run command detached from the terminal, returning its standard output.
    ///
    /// Trailing newlines are chomped from the returned output.
    ///
    /// # Errors
    ///
    /// - Return [`ProcessError::Spawn`] if the command cannot be started.
    /// - Return [`ProcessError::Failed`] if the command exits non-zero. The
    ///   error carries whatever the command wrote to stdout and stderr.
    fn run_captured(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<String>;
}

impl<R: CommandRunner> CommandRunner for &R {
    fn run_interactive(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<()> {
        (**self).run_interactive(cmd, args)
    }

    fn run_captured(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<String> {
        (**self).run_captured(cmd, args)
    }
}

/// Command invocation through [`std::process::Command`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Syscall;

impl CommandRunner for Syscall {
    fn run_interactive(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<()> {
        let cmd = cmd.as_ref();
        let (command, args) = expand_command_line(cmd, args);
        debug!("run interactive: {command}");

        let status = Command::new(cmd)
            .args(&args)
            .spawn()
            .map_err(|err| ProcessError::Spawn {
                source: err,
                command: command.clone(),
            })?
            .wait()
            .map_err(|err| ProcessError::Spawn {
                source: err,
                command: command.clone(),
            })?;

        if !status.success() {
            return Err(ProcessError::Failed {
                command,
                output: String::new(),
            });
        }

        Ok(())
    }

    fn run_captured(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<String> {
        let cmd = cmd.as_ref();
        let (command, args) = expand_command_line(cmd, args);
        debug!("run captured: {command}");

        let output = Command::new(cmd).args(&args).output().map_err(|err| {
            ProcessError::Spawn {
                source: err,
                command: command.clone(),
            }
        })?;

        let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
        let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

        if !output.status.success() {
            let mut message = String::new();
            if !stdout.is_empty() {
                message.push_str(format!("stdout: {stdout}").as_str());
            }
            if !stderr.is_empty() {
                message.push_str(format!("stderr: {stderr}").as_str());
            }

            return Err(ProcessError::Failed {
                command,
                output: chomp(message),
            });
        }

        Ok(chomp(stdout))
    }
}

/// Locate a binary on the command search path.
pub fn probe(bin: &str) -> Option<PathBuf> {
    which::which(bin).ok()
}

fn expand_command_line(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> (String, Vec<OsString>) {
    let args: Vec<OsString> = args.into_iter().map(|arg| arg.as_ref().to_os_string()).collect();
    let mut command = cmd.as_ref().to_string_lossy().into_owned();
    for arg in &args {
        command.push(' ');
        command.push_str(arg.to_string_lossy().as_ref());
    }

    (command, args)
}

// INVARIANT: Chomp trailing newlines.
fn chomp(message: String) -> String {
    message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message)
}

/// External command error types.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Command cannot be spawned or awaited at all.
    #[error("failed to spawn command {command:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        command: String,
    },

    /// Command ran but exited with a non-zero status.
    #[error("command {command:?} failed{}{output}", if output.is_empty() { "" } else { ":\n" })]
    Failed { command: String, output: String },
}

/// Friendly result alias :3
pub type Result<T, E = ProcessError> = std::result::Result<T, E>;
