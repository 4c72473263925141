// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! chezmoi installation logic.
//!
//! chezup does not bundle chezmoi. It makes sure the real thing is available
//! before any other stage runs, using whatever installation method the host
//! offers.
//!
//! # Strategy Order
//!
//! Every platform maps to a fixed, ordered list of package managers. The
//! first one present on the system wins. When none are present, the vendor
//! install script from `get.chezmoi.io` is piped through `sh` as a last
//! resort, dropping the binary into `~/.local/bin`. An already installed
//! chezmoi short-circuits all of this.
//!
//! Installation failure is fatal by design. Nothing else chezup does makes
//! sense without the tool, so [`InstallError`] propagates straight up to the
//! process exit instead of being retried.

use crate::{path::fallback_bin_dir, platform::Platform, process::CommandRunner, tool::TOOL_BIN};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};
use tracing::{info, instrument, warn};

/// Package managers chezup knows how to drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Pacman,
    Snap,
    Brew,
    Winget,
    Scoop,
    Choco,
}

impl PackageManager {
    /// Binary probed for to decide whether this manager is present.
    pub fn bin(&self) -> &'static str {
        match self {
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Snap => "snap",
            Self::Brew => "brew",
            Self::Winget => "winget",
            Self::Scoop => "scoop",
            Self::Choco => "choco",
        }
    }

    /// Full command line that installs chezmoi through this manager.
    ///
    /// System-wide managers are wrapped in `sudo`; user-level managers are
    /// invoked directly.
    pub fn install_command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Apt => ("sudo", &["apt", "install", "-y", "chezmoi"]),
            Self::Dnf => ("sudo", &["dnf", "install", "-y", "chezmoi"]),
            Self::Pacman => ("sudo", &["pacman", "-S", "--noconfirm", "chezmoi"]),
            Self::Snap => ("sudo", &["snap", "install", "chezmoi", "--classic"]),
            Self::Brew => ("brew", &["install", "chezmoi"]),
            Self::Winget => ("winget", &["install", "--id", "twpayne.chezmoi", "-e"]),
            Self::Scoop => ("scoop", &["install", "chezmoi"]),
            Self::Choco => ("choco", &["install", "chezmoi", "-y"]),
        }
    }
}

impl Display for PackageManager {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.bin())
    }
}

/// Ordered installer strategies for a platform.
///
/// The capability table behind the whole installer: each platform maps to
/// the package managers chezup will try, in priority order.
pub fn strategies(platform: Platform) -> &'static [PackageManager] {
    match platform {
        Platform::Linux => &[
            PackageManager::Apt,
            PackageManager::Dnf,
            PackageManager::Pacman,
            PackageManager::Snap,
        ],
        Platform::MacOs => &[PackageManager::Brew],
        Platform::Windows => &[
            PackageManager::Winget,
            PackageManager::Scoop,
            PackageManager::Choco,
        ],
        Platform::Unknown => &[],
    }
}

/// Vendor install script piped through `sh` when no package manager exists.
const FALLBACK_SCRIPT: &str = r#"curl -fsLS get.chezmoi.io | sh -s -- -b "$HOME/.local/bin""#;

/// Ensures chezmoi is available before the wizard continues.
#[derive(Debug)]
pub struct Installer<P, R>
where
    P: Fn(&str) -> Option<PathBuf>,
    R: CommandRunner,
{
    platform: Platform,
    probe: P,
    runner: R,
}

impl<P, R> Installer<P, R>
where
    P: Fn(&str) -> Option<PathBuf>,
    R: CommandRunner,
{
    /// Construct new installer for target platform.
    pub fn new(platform: Platform, probe: P, runner: R) -> Self {
        Self {
            platform,
            probe,
            runner,
        }
    }

    /// Ensure chezmoi is present, installing it if necessary.
    ///
    /// Returns the path of the chezmoi binary that later stages should
    /// invoke. Performs no installation action when the tool is already on
    /// the search path.
    ///
    /// # Errors
    ///
    /// - Return [`InstallError::UnsupportedPlatform`] when the platform is
    ///   unknown and chezmoi is absent.
    /// - Return [`InstallError::NoInstallMethod`] when no package manager is
    ///   present and the vendor script cannot run.
    /// - Return [`InstallError::StillMissing`] when chezmoi remains absent
    ///   after an installation attempt.
    /// - Return [`InstallError::Process`] when the chosen install command
    ///   itself fails.
    #[instrument(skip(self), level = "debug")]
    pub fn ensure_installed(&self) -> Result<PathBuf> {
        if let Some(path) = (self.probe)(TOOL_BIN) {
            info!("chezmoi already installed at {}", path.display());
            return Ok(path);
        }

        if self.platform == Platform::Unknown {
            return Err(InstallError::UnsupportedPlatform);
        }

        match self.first_present_manager() {
            Some(manager) => {
                info!("installing chezmoi through {manager}");
                let (cmd, args) = manager.install_command();
                self.runner.run_interactive(cmd, args.iter())?;
                self.verify_installed(false)
            }
            None => {
                self.run_fallback_script()?;
                self.verify_installed(true)
            }
        }
    }

    fn first_present_manager(&self) -> Option<PackageManager> {
        strategies(self.platform)
            .iter()
            .copied()
            .find(|manager| (self.probe)(manager.bin()).is_some())
    }

    fn run_fallback_script(&self) -> Result<()> {
        if (self.probe)("sh").is_none() {
            return Err(InstallError::NoInstallMethod);
        }

        info!("no package manager found, running the vendor install script");
        self.runner.run_interactive("sh", ["-c", FALLBACK_SCRIPT])?;

        Ok(())
    }

    fn verify_installed(&self, check_fallback_dir: bool) -> Result<PathBuf> {
        if let Some(path) = (self.probe)(TOOL_BIN) {
            info!("chezmoi installed at {}", path.display());
            return Ok(path);
        }

        // INVARIANT: The vendor script installs outside the search path, so
        // only trust the fallback directory after that script ran.
        if check_fallback_dir {
            let fallback_dir = fallback_bin_dir()?;
            let candidate = fallback_dir.join(TOOL_BIN);
            if candidate.exists() {
                warn!(
                    "chezmoi installed at {}; consider adding {} to $PATH",
                    candidate.display(),
                    fallback_dir.display(),
                );
                return Ok(candidate);
            }
        }

        Err(InstallError::StillMissing)
    }
}

/// Installation error types. All of them are fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// Platform was classified as unknown, so no strategy list exists.
    #[error("unsupported platform, install chezmoi manually and re-run chezup")]
    UnsupportedPlatform,

    /// No package manager present and the vendor script cannot run here.
    #[error("no supported package manager found and no `sh` to run the vendor install script")]
    NoInstallMethod,

    /// Installation ran, yet chezmoi is still nowhere to be found.
    #[error("chezmoi is still missing after installation, install it manually and re-run chezup")]
    StillMissing,

    /// Chosen install command failed outright.
    #[error(transparent)]
    Process(#[from] crate::process::ProcessError),

    /// Home directory cannot be resolved for the fallback check.
    #[error(transparent)]
    NoWayHome(#[from] crate::path::NoWayHome),
}

/// Friendly result alias :3
pub type Result<T, E = InstallError> = std::result::Result<T, E>;
