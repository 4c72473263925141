// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevant path information for the files chezup needs to touch:
//! the user's home directory, chezmoi's configuration file, and the directory
//! the vendor install script drops binaries into.

use std::{env, path::PathBuf};

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine absolute path to chezmoi's configuration directory.
///
/// chezmoi resolves its configuration under `~/.config/chezmoi` on every
/// platform, honoring `$XDG_CONFIG_HOME` when set. It deliberately does not
/// use the native configuration directory on macOS or Windows, so neither do
/// we. Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [chezmoi configuration file](https://www.chezmoi.io/reference/configuration-file/)
pub fn tool_config_dir() -> Result<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home_dir()?.join(".config"),
    };

    Ok(base.join("chezmoi"))
}

/// Determine absolute path to chezmoi's configuration file.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn tool_config_file() -> Result<PathBuf> {
    tool_config_dir().map(|path| path.join("chezmoi.toml"))
}

/// Determine absolute path to the vendor install script's binary directory.
///
/// The `get.chezmoi.io` fallback installs into `~/.local/bin`, which may or
/// may not be on the user's `$PATH`.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn fallback_bin_dir() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".local").join("bin"))
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
