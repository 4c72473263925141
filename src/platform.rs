// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Host platform detection.
//!
//! chezup needs to know what operating system it is running on before it can
//! pick an installation strategy or decide which dotfile candidates to offer.
//! Detection is a fixed cascade that never blocks and never fails:
//!
//! 1. Classify `$OSTYPE` if the invoking shell exported it.
//! 2. Classify the output of `uname -s`.
//! 3. Check for Windows markers (`$windir`, `$SystemRoot`, `C:\Windows`),
//!    since `uname` does not exist outside of POSIX-ish environments.
//! 4. Give up and report [`Platform::Unknown`].
//!
//! An unrecognized host is not an error here. Later stages decide what they
//! can and cannot do with an unknown platform.

use crate::process::{CommandRunner, Syscall};

use std::{
    env,
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
};
use tracing::debug;

/// Host platform classification.
///
/// Closed set on purpose: every consumer branches exhaustively instead of
/// string-matching its way through half-remembered `uname` spellings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Unknown,
}

impl Platform {
    /// Detect the host platform.
    ///
    /// Runs the detection cascade described in the module documentation.
    /// Never fails; the worst case is [`Platform::Unknown`].
    pub fn detect() -> Self {
        if let Ok(os_type) = env::var("OSTYPE") {
            if let Some(platform) = classify(&os_type) {
                debug!("classified $OSTYPE {os_type:?} as {platform}");
                return platform;
            }
        }

        if let Ok(label) = Syscall.run_captured("uname", ["-s"]) {
            if let Some(platform) = classify(&label) {
                debug!("classified uname output {label:?} as {platform}");
                return platform;
            }
        }

        if has_windows_markers() {
            debug!("classified host as windows through environment markers");
            return Self::Windows;
        }

        Self::Unknown
    }
}

impl Display for Platform {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Windows => "windows",
            Self::Unknown => "unknown",
        };

        fmt.write_str(name)
    }
}

/// Classify an OS label from `$OSTYPE` or `uname -s`.
///
/// Substring matching is case-insensitive. The match order matters: "darwin"
/// contains "win", so it must be ruled out before the Windows patterns.
pub(crate) fn classify(label: &str) -> Option<Platform> {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return None;
    }

    if label.contains("linux") {
        Some(Platform::Linux)
    } else if label.contains("darwin") {
        Some(Platform::MacOs)
    } else if ["msys", "mingw", "cygwin", "win"]
        .iter()
        .any(|pattern| label.contains(pattern))
    {
        Some(Platform::Windows)
    } else {
        None
    }
}

fn has_windows_markers() -> bool {
    env::var_os("windir").is_some()
        || env::var_os("SystemRoot").is_some()
        || Path::new("C:\\Windows").is_dir()
}
