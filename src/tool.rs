// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! chezmoi command adapter.
//!
//! chezup never manages dotfiles itself. Every dotfile operation is delegated
//! to the chezmoi binary that [`crate::install`] resolved, through the small
//! [`DotfileTool`] trait so the setup stages can be exercised in tests without
//! a real chezmoi around.

use crate::process::{CommandRunner, Syscall};

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use tracing::instrument;

/// Name of the managed tool's binary.
pub const TOOL_BIN: &str = "chezmoi";

/// Operations chezup delegates to the dotfile manager.
pub trait DotfileTool {
    /// Initialize the source directory, optionally from an existing repository.
    ///
    /// With `url` the tool clones that repository as its source state. With
    /// `apply` it also applies the cloned state to the home directory right
    /// away.
    ///
    /// # Errors
    ///
    /// - Return [`ToolError::Process`] if the tool fails or cannot be spawned.
    fn init(&self, url: Option<&str>, apply: bool) -> Result<()>;

    /// Place an existing dotfile under management.
    ///
    /// # Errors
    ///
    /// - Return [`ToolError::Process`] if the tool fails or cannot be spawned.
    fn add(&self, path: &Path) -> Result<()>;

    /// Ask the tool where its source directory lives.
    ///
    /// # Errors
    ///
    /// - Return [`ToolError::Process`] if the tool fails or cannot be spawned.
    /// - Return [`ToolError::EmptySourcePath`] if the tool prints nothing.
    fn source_dir(&self) -> Result<PathBuf>;
}

/// The real chezmoi binary.
///
/// Holds the resolved path from installation rather than relying on `$PATH`,
/// so a fallback install in `~/.local/bin` works in the same run that
/// performed it.
#[derive(Debug)]
pub struct Chezmoi<R: CommandRunner = Syscall> {
    bin: PathBuf,
    runner: R,
}

impl Chezmoi {
    /// Construct new adapter around the binary at `bin`.
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            runner: Syscall,
        }
    }
}

impl<R: CommandRunner> Chezmoi<R> {
    /// Construct new adapter with a custom command runner.
    pub fn with_runner(bin: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            bin: bin.into(),
            runner,
        }
    }
}

impl<R: CommandRunner> DotfileTool for Chezmoi<R> {
    #[instrument(skip(self), level = "debug")]
    fn init(&self, url: Option<&str>, apply: bool) -> Result<()> {
        let mut args: Vec<OsString> = vec!["init".into()];
        if let Some(url) = url {
            args.push(url.into());
        }
        if apply {
            args.push("--apply".into());
        }

        // Interactive so chezmoi can ask for credentials or template data.
        self.runner.run_interactive(&self.bin, args)?;

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn add(&self, path: &Path) -> Result<()> {
        self.runner
            .run_interactive(&self.bin, ["add".as_ref(), path.as_os_str()])?;

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn source_dir(&self) -> Result<PathBuf> {
        let output = self.runner.run_captured(&self.bin, ["source-path"])?;
        let path = output.trim();
        if path.is_empty() {
            return Err(ToolError::EmptySourcePath);
        }

        Ok(PathBuf::from(path))
    }
}

/// Dotfile manager invocation error types.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool invocation failed or could not be spawned.
    #[error(transparent)]
    Process(#[from] crate::process::ProcessError),

    /// Tool printed nothing where a source directory was expected.
    #[error("chezmoi reported an empty source directory path")]
    EmptySourcePath,
}

/// Friendly result alias :3
pub type Result<T, E = ToolError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::{Outcome, RecordingRunner};
    use pretty_assertions::assert_eq;

    #[test]
    fn init_from_url_with_apply() -> anyhow::Result<()> {
        let runner = RecordingRunner::new();
        let chezmoi = Chezmoi::with_runner("chezmoi", &runner);

        chezmoi.init(Some("https://github.com/user/dotfiles.git"), true)?;

        assert_eq!(
            runner.calls(),
            vec!["chezmoi init https://github.com/user/dotfiles.git --apply".to_string()],
        );

        Ok(())
    }

    #[test]
    fn init_from_url_without_apply() -> anyhow::Result<()> {
        let runner = RecordingRunner::new();
        let chezmoi = Chezmoi::with_runner("chezmoi", &runner);

        chezmoi.init(Some("https://github.com/user/dotfiles.git"), false)?;

        assert_eq!(
            runner.calls(),
            vec!["chezmoi init https://github.com/user/dotfiles.git".to_string()],
        );

        Ok(())
    }

    #[test]
    fn init_fresh_start() -> anyhow::Result<()> {
        let runner = RecordingRunner::new();
        let chezmoi = Chezmoi::with_runner("chezmoi", &runner);

        chezmoi.init(None, false)?;

        assert_eq!(runner.calls(), vec!["chezmoi init".to_string()]);

        Ok(())
    }

    #[test]
    fn add_passes_path_through() -> anyhow::Result<()> {
        let runner = RecordingRunner::new();
        let chezmoi = Chezmoi::with_runner("chezmoi", &runner);

        chezmoi.add(Path::new("/home/user/.bashrc"))?;

        assert_eq!(runner.calls(), vec!["chezmoi add /home/user/.bashrc".to_string()]);

        Ok(())
    }

    #[test]
    fn source_dir_trims_reported_path() -> anyhow::Result<()> {
        let runner = RecordingRunner::with_outcomes([Outcome::Ok(
            "/home/user/.local/share/chezmoi\n".to_string(),
        )]);
        let chezmoi = Chezmoi::with_runner("chezmoi", &runner);

        let result = chezmoi.source_dir()?;

        assert_eq!(result, PathBuf::from("/home/user/.local/share/chezmoi"));
        assert_eq!(runner.calls(), vec!["chezmoi source-path".to_string()]);

        Ok(())
    }

    #[test]
    fn source_dir_rejects_empty_output() {
        let runner = RecordingRunner::with_outcomes([Outcome::Ok("  \n".to_string())]);
        let chezmoi = Chezmoi::with_runner("chezmoi", &runner);

        let result = chezmoi.source_dir();

        assert!(matches!(result, Err(ToolError::EmptySourcePath)));
    }

    #[test]
    fn tool_failure_propagates() {
        let runner = RecordingRunner::with_outcomes([Outcome::Fail("no source state".to_string())]);
        let chezmoi = Chezmoi::with_runner("chezmoi", &runner);

        let result = chezmoi.source_dir();

        assert!(matches!(result, Err(ToolError::Process(_))));
    }
}
