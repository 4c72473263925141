// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Handles `chezmoi.toml`, the configuration file chezmoi reads from
//! `~/.config/chezmoi`. chezup only cares about a handful of entries: the
//! owner's identity under `[data]`, the diff pager, the editor command, and
//! at most one secret manager section. Everything else in the file belongs
//! to the user.
//!
//! # General Layout
//!
//! The whole document is kept as a plain TOML table instead of a typed
//! struct, so sections and keys chezup knows nothing about survive a round
//! trip untouched. Every mutation targets exactly one key inside one
//! section. Writing the same section twice therefore updates it in place
//! rather than emitting a second copy of the section header, and mutations
//! that change nothing leave the file alone entirely.

use crate::setup::require_nonempty;

use inquire::{Confirm, Select, Text};
use serde::Deserialize;
use std::{
    env,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use toml::{Table, Value};
use tracing::{info, instrument};

/// Diff pager configured for fresh installations.
pub const DEFAULT_DIFF_PAGER: &str = "less -R";

/// Owner identity exposed to chezmoi templates as `.name` and `.email`.
///
/// Read-only view over `[data]`; writes go through [`ChezmoiConfig`] one key
/// at a time so the changed flag stays honest.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// Secret managers chezmoi integrates with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecretManager {
    Onepassword,
    Bitwarden,
    Pass,
    Gopass,
    Keepassxc,
    Vault,
    Lastpass,
}

impl SecretManager {
    pub const ALL: [SecretManager; 7] = [
        SecretManager::Onepassword,
        SecretManager::Bitwarden,
        SecretManager::Pass,
        SecretManager::Gopass,
        SecretManager::Keepassxc,
        SecretManager::Vault,
        SecretManager::Lastpass,
    ];

    /// Configuration section chezmoi reads this manager's settings from.
    pub fn section(&self) -> &'static str {
        match self {
            Self::Onepassword => "onepassword",
            Self::Bitwarden => "bitwarden",
            Self::Pass => "pass",
            Self::Gopass => "gopass",
            Self::Keepassxc => "keepassxc",
            Self::Vault => "vault",
            Self::Lastpass => "lastpass",
        }
    }

    /// Client binary chezmoi shells out to for this manager.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Onepassword => "op",
            Self::Bitwarden => "bw",
            Self::Pass => "pass",
            Self::Gopass => "gopass",
            Self::Keepassxc => "keepassxc-cli",
            Self::Vault => "vault",
            Self::Lastpass => "lpass",
        }
    }

    /// Human readable name shown in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Onepassword => "1Password",
            Self::Bitwarden => "Bitwarden",
            Self::Pass => "pass",
            Self::Gopass => "gopass",
            Self::Keepassxc => "KeePassXC",
            Self::Vault => "Vault",
            Self::Lastpass => "LastPass",
        }
    }
}

impl Display for SecretManager {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.label())
    }
}

/// Answer to the secret manager prompt.
enum SecretChoice {
    Use(SecretManager),
    Skip,
}

impl Display for SecretChoice {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Use(manager) => fmt.write_str(manager.label()),
            Self::Skip => fmt.write_str("No secret manager"),
        }
    }
}

/// In-memory view of `chezmoi.toml`.
///
/// # Invariant
///
/// - Unrecognized sections and keys are preserved verbatim.
/// - Each mutation touches exactly one key, never a whole section.
/// - Mutations that change nothing do not mark the document changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChezmoiConfig {
    doc: Table,
    changed: bool,
}

impl ChezmoiConfig {
    /// Construct a fresh configuration for `identity`.
    pub fn with_identity(identity: &Identity) -> Self {
        let mut config = Self::default();
        config.set_identity(identity);
        config.set_diff_pager(DEFAULT_DIFF_PAGER);
        config
    }

    /// Identity currently recorded under `[data]`, if complete.
    ///
    /// Extra keys under `[data]` are the user's own template data and do not
    /// get in the way here.
    pub fn identity(&self) -> Option<Identity> {
        self.doc
            .get("data")
            .cloned()
            .and_then(|data| data.try_into().ok())
    }

    /// Whether the document already carries both identity fields.
    pub fn has_identity(&self) -> bool {
        self.identity().is_some()
    }

    /// Record the owner identity under `[data]`.
    pub fn set_identity(&mut self, identity: &Identity) {
        self.set_string_in("data", "name", identity.name.as_str());
        self.set_string_in("data", "email", identity.email.as_str());
    }

    /// Record the pager `chezmoi diff` pipes through.
    pub fn set_diff_pager(&mut self, pager: &str) {
        self.set_string_in("diff", "pager", pager);
    }

    /// Record the editor command `chezmoi edit` launches.
    pub fn set_editor(&mut self, editor: &str) {
        self.set_string_in("edit", "command", editor);
    }

    /// Record the client command of the chosen secret manager.
    pub fn set_secret_manager(&mut self, manager: SecretManager) {
        self.set_string_in(manager.section(), "command", manager.command());
    }

    /// Command configured under `section`, if any.
    pub fn section_command(&self, section: &str) -> Option<&str> {
        self.doc
            .get(section)
            .and_then(Value::as_table)
            .and_then(|table| table.get("command"))
            .and_then(Value::as_str)
    }

    fn set_string_in(&mut self, section: &str, key: &str, value: &str) {
        let entry = self
            .doc
            .entry(section.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
            self.changed = true;
        }
        let Some(table) = entry.as_table_mut() else {
            return;
        };

        if table.get(key).and_then(Value::as_str) == Some(value) {
            return;
        }

        table.insert(key.to_string(), Value::String(value.to_string()));
        self.changed = true;
    }
}

impl FromStr for ChezmoiConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let doc: Table = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;
        Ok(Self { doc, changed: false })
    }
}

impl Display for ChezmoiConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(&self.doc)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Interactive configuration stage.
///
/// Makes sure `chezmoi.toml` exists and carries the owner's identity, then
/// optionally collects an editor command and a secret manager. The file is
/// rewritten only when something actually changed, and the final contents
/// are printed back as confirmation.
///
/// Rewriting goes through a plain TOML table, so comments in an existing
/// file do not survive a rewrite. Runs that change nothing never rewrite.
///
/// # Errors
///
/// - Return [`ConfigError::Prompt`] if a prompt fails or the user cancels.
/// - Return [`ConfigError::Deserialize`] if an existing file is not valid
///   TOML.
/// - Return [`ConfigError::MakeDirectory`], [`ConfigError::Read`], or
///   [`ConfigError::Write`] on file system failures.
#[instrument(level = "debug")]
pub fn configure(config_file: &Path) -> Result<ChezmoiConfig> {
    let mut config = load_or_create(config_file)?;

    let advanced = Confirm::new("Configure advanced options (editor, secret manager)?")
        .with_default(true)
        .prompt()?;
    if advanced {
        let editor = prompt_editor()?;
        config.set_editor(editor.trim());

        if let SecretChoice::Use(manager) = prompt_secret_manager()? {
            config.set_secret_manager(manager);
        }
    }

    if config.changed {
        write_config(config_file, &config)?;
        info!("wrote configuration to {}", config_file.display());
    }

    println!("Configuration at {}:", config_file.display());
    println!("{config}");

    Ok(config)
}

fn load_or_create(config_file: &Path) -> Result<ChezmoiConfig> {
    if let Some(parent) = config_file.parent() {
        mkdirp::mkdirp(parent).map_err(|err| ConfigError::MakeDirectory {
            source: err,
            path: parent.to_path_buf(),
        })?;
    }

    if config_file.exists() {
        info!("found existing configuration at {}", config_file.display());
        let data = fs::read_to_string(config_file).map_err(|err| ConfigError::Read {
            source: err,
            path: config_file.to_path_buf(),
        })?;

        let mut config: ChezmoiConfig = data.parse()?;
        if !config.has_identity() {
            let identity = prompt_identity()?;
            config.set_identity(&identity);
        }

        Ok(config)
    } else {
        info!("creating configuration at {}", config_file.display());
        let identity = prompt_identity()?;
        Ok(ChezmoiConfig::with_identity(&identity))
    }
}

fn write_config(config_file: &Path, config: &ChezmoiConfig) -> Result<()> {
    let data = toml::ser::to_string_pretty(&config.doc).map_err(ConfigError::Serialize)?;
    fs::write(config_file, data).map_err(|err| ConfigError::Write {
        source: err,
        path: config_file.to_path_buf(),
    })?;

    Ok(())
}

fn prompt_identity() -> Result<Identity> {
    let (name_default, email_default) = git_identity_defaults();

    let name = prompt_required("Your full name:", name_default.as_deref())?;
    let email = prompt_required("Your email address:", email_default.as_deref())?;

    Ok(Identity { name, email })
}

fn prompt_required(message: &str, default: Option<&str>) -> Result<String> {
    let mut prompt = Text::new(message).with_validator(require_nonempty);
    if let Some(default) = default {
        prompt = prompt.with_default(default);
    }

    Ok(prompt.prompt()?.trim().to_string())
}

/// Seed identity prompts from the user's global git configuration.
fn git_identity_defaults() -> (Option<String>, Option<String>) {
    let Ok(config) = git2::Config::open_default() else {
        return (None, None);
    };

    let name = config.get_string("user.name").ok();
    let email = config.get_string("user.email").ok();

    (name, email)
}

fn prompt_editor() -> Result<String> {
    let default = default_editor();
    let editor = Text::new("Editor command for chezmoi edit:")
        .with_default(default.as_str())
        .with_validator(require_nonempty)
        .prompt()?;

    Ok(editor)
}

/// Editor chezmoi would pick up on its own, offered as the prompt default.
fn default_editor() -> String {
    for key in ["VISUAL", "EDITOR"] {
        if let Ok(value) = env::var(key) {
            if !value.trim().is_empty() {
                return value;
            }
        }
    }

    String::from("vim")
}

fn prompt_secret_manager() -> Result<SecretChoice> {
    let mut options: Vec<SecretChoice> = SecretManager::ALL
        .iter()
        .copied()
        .map(SecretChoice::Use)
        .collect();
    options.push(SecretChoice::Skip);

    Ok(Select::new("Secret manager integration:", options).prompt()?)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Prompt failed or was canceled by the user.
    #[error(transparent)]
    Prompt(#[from] inquire::InquireError),

    /// Cannot create configuration directory.
    #[error("cannot create directory {path:?}")]
    MakeDirectory {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Cannot read configuration file.
    #[error("cannot read {path:?}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Cannot write configuration file.
    #[error("cannot write {path:?}")]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
